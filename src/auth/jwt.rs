//! JWT token issuance and validation
//! Stateless HS256 tokens; expiry is the only invalidation mechanism

use crate::{config::AppConfig, error::AppError, models::user::User};
use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Signed identity claims
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,

    pub email: String,

    pub role: String,

    /// Issued at
    pub iat: i64,

    /// Not before
    pub nbf: i64,

    /// Expiration
    pub exp: i64,

    /// Issuer
    pub iss: String,

    /// JWT ID, random per token
    pub jti: String,
}

/// Encoded token plus its absolute expiry
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is malformed or has an invalid signature")]
    Malformed,

    #[error("token has expired")]
    Expired,
}

/// JWT service
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: String,
    ttl: Duration,
}

impl JwtService {
    /// Create JWT service from config
    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        Self::new(
            config.security.jwt_secret.expose_secret().as_bytes(),
            &config.security.jwt_issuer,
            Duration::seconds(config.security.token_ttl_secs as i64),
        )
    }

    pub fn new(secret: &[u8], issuer: &str, ttl: Duration) -> Result<Self, AppError> {
        // HS256 needs at least 32 bytes of key material
        if secret.len() < 32 {
            return Err(AppError::Config("JWT secret too short (min 32 chars)".to_string()));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.set_issuer(&[issuer]);
        validation.set_required_spec_claims(&["exp", "nbf", "iat", "iss", "sub"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            issuer: issuer.to_string(),
            ttl,
        })
    }

    /// Issue a token for the given user, valid from now for the configured TTL
    pub fn issue(&self, user: &User) -> Result<IssuedToken, AppError> {
        let now = Utc::now();
        let expires_at = now + self.ttl;

        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            role: user.role.as_str().to_string(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: expires_at.timestamp(),
            iss: self.issuer.clone(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = self.encode_claims(&claims)?;

        // Report the expiry at the precision actually embedded in the token
        let expires_at = Utc
            .timestamp_opt(claims.exp, 0)
            .single()
            .unwrap_or(expires_at);

        Ok(IssuedToken { token, expires_at })
    }

    pub(crate) fn encode_claims(&self, claims: &Claims) -> Result<String, AppError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key).map_err(|e| {
            tracing::error!("Failed to encode token: {:?}", e);
            AppError::Internal(format!("Failed to encode token: {}", e))
        })
    }

    /// Verify signature, structure, issuer and validity window
    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => {
                    tracing::debug!("Token expired");
                    TokenError::Expired
                }
                other => {
                    tracing::debug!("Token validation failed: {:?}", other);
                    TokenError::Malformed
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::Role;

    const SECRET: &[u8] = b"test_secret_key_32_characters_long!";

    fn service() -> JwtService {
        JwtService::new(SECRET, "auth-scaffold", Duration::hours(24)).unwrap()
    }

    fn user(role: Role) -> User {
        User {
            id: Uuid::new_v4(),
            name: "John Doe".to_string(),
            email: "john@example.com".to_string(),
            password_hash: String::new(),
            role,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_issue_and_decode() {
        let service = service();
        let user = user(Role::Admin);

        let issued = service.issue(&user).unwrap();
        assert!(issued.expires_at > Utc::now() + Duration::hours(23));

        let claims = service.decode(&issued.token).unwrap();
        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.email, "john@example.com");
        assert_eq!(claims.role, "admin");
        assert_eq!(claims.iss, "auth-scaffold");
        assert_eq!(claims.nbf, claims.iat);
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
        assert_eq!(claims.exp, issued.expires_at.timestamp());
    }

    #[test]
    fn test_tokens_issued_in_same_second_differ() {
        let service = service();
        let user = user(Role::User);

        let first = service.issue(&user).unwrap();
        let second = service.issue(&user).unwrap();
        assert_ne!(first.token, second.token);

        let a = service.decode(&first.token).unwrap();
        let b = service.decode(&second.token).unwrap();
        assert_ne!(a.jti, b.jti);
        assert_eq!(a.sub, b.sub);
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let service = service();
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            email: "john@example.com".to_string(),
            role: "user".to_string(),
            iat: now - 7200,
            nbf: now - 7200,
            exp: now - 1,
            iss: "auth-scaffold".to_string(),
            jti: Uuid::new_v4().to_string(),
        };
        let token = service.encode_claims(&claims).unwrap();

        assert_eq!(service.decode(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_tampered_token_is_malformed() {
        let service = service();
        let issued = service.issue(&user(Role::User)).unwrap();

        let mut parts: Vec<String> = issued.token.split('.').map(String::from).collect();
        parts[1] = format!("{}x", parts[1]);
        let tampered = parts.join(".");

        assert_eq!(service.decode(&tampered), Err(TokenError::Malformed));
    }

    #[test]
    fn test_foreign_secret_and_issuer_are_rejected() {
        let issued = service().issue(&user(Role::User)).unwrap();

        let other_secret =
            JwtService::new(b"another_secret_key_32_characters_long", "auth-scaffold", Duration::hours(1))
                .unwrap();
        assert_eq!(other_secret.decode(&issued.token), Err(TokenError::Malformed));

        let other_issuer = JwtService::new(SECRET, "someone-else", Duration::hours(1)).unwrap();
        assert_eq!(other_issuer.decode(&issued.token), Err(TokenError::Malformed));
    }

    #[test]
    fn test_garbage_tokens_are_malformed() {
        let service = service();
        assert_eq!(service.decode("invalid-token"), Err(TokenError::Malformed));
        assert_eq!(service.decode(""), Err(TokenError::Malformed));
    }

    #[test]
    fn test_short_secret_is_rejected() {
        assert!(JwtService::new(b"short", "auth-scaffold", Duration::hours(1)).is_err());
    }
}
