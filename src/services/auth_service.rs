//! 认证服务：注册、登录、令牌刷新

use crate::{
    auth::{jwt::JwtService, password::PasswordHasher},
    error::{AppError, FieldErrors},
    models::{
        auth::{AuthResponse, LoginRequest, RegisterRequest},
        user::{normalize_email, NewUser, Role, User},
    },
    repository::{UserStore, EMAIL_TAKEN},
};
use std::sync::Arc;

/// 用于不存在的账户，使登录失败的两条路径耗时一致
const DUMMY_PASSWORD: &str = "dummy-password-for-timing-equalization";

pub struct AuthService {
    store: Arc<dyn UserStore>,
    jwt_service: Arc<JwtService>,
    hasher: PasswordHasher,
    dummy_hash: String,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn UserStore>,
        jwt_service: Arc<JwtService>,
        hasher: PasswordHasher,
    ) -> Result<Self, AppError> {
        let dummy_hash = hasher.hash(DUMMY_PASSWORD)?;

        Ok(Self {
            store,
            jwt_service,
            hasher,
            dummy_hash,
        })
    }

    /// 用户注册
    pub async fn register(&self, req: RegisterRequest) -> Result<AuthResponse, AppError> {
        let req = req.normalized();

        if !req.passwords_match() {
            let mut errors = FieldErrors::new();
            errors.add("password_confirm", "Password confirmation does not match");
            return Err(AppError::validation("Password confirmation does not match", errors));
        }

        let mut errors = req.validate_fields();

        // 邮箱格式合法时才检查占用
        if errors.get("email").is_none() && self.store.find_by_email(&req.email).await?.is_some() {
            errors.add("email", EMAIL_TAKEN);
        }

        if !errors.is_empty() {
            return Err(AppError::validation("Validation failed", errors));
        }

        let password_hash = self.hash_password(req.password).await?;

        let user = self
            .store
            .create(NewUser {
                name: req.name,
                email: req.email,
                password_hash,
                role: Role::User,
            })
            .await?;

        tracing::info!(user_id = %user.id, "User registered");

        self.respond_with_token(user)
    }

    /// 用户登录
    ///
    /// 账户不存在与密码错误返回同一错误，且都执行一次密码校验
    pub async fn login(&self, req: LoginRequest) -> Result<AuthResponse, AppError> {
        let email = normalize_email(&req.email);

        let user = self.store.find_by_email(&email).await?;

        let Some(user) = user else {
            let _ = self
                .verify_password(req.password, self.dummy_hash.clone())
                .await;
            tracing::debug!("Login rejected");
            return Err(AppError::InvalidCredentials);
        };

        if let Err(e) = self
            .verify_password(req.password, user.password_hash.clone())
            .await
        {
            tracing::debug!(user_id = %user.id, "Login rejected");
            return Err(e);
        }

        tracing::info!(user_id = %user.id, "User logged in");

        self.respond_with_token(user)
    }

    /// 为已认证用户签发新令牌
    pub fn refresh(&self, user: User) -> Result<AuthResponse, AppError> {
        tracing::debug!(user_id = %user.id, "Token refreshed");
        self.respond_with_token(user)
    }

    fn respond_with_token(&self, user: User) -> Result<AuthResponse, AppError> {
        let issued = self.jwt_service.issue(&user)?;

        Ok(AuthResponse {
            token: issued.token,
            user,
            expires_at: issued.expires_at,
        })
    }

    async fn hash_password(&self, password: String) -> Result<String, AppError> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))?
    }

    async fn verify_password(&self, password: String, hash: String) -> Result<(), AppError> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| AppError::Internal(format!("Password verification task failed: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryUserStore;
    use chrono::Duration;

    fn service() -> AuthService {
        let store: Arc<dyn UserStore> = Arc::new(InMemoryUserStore::new());
        let jwt = Arc::new(
            JwtService::new(b"test_secret_key_32_characters_long!", "auth-scaffold", Duration::hours(24))
                .unwrap(),
        );
        AuthService::new(store, jwt, PasswordHasher::new(1024, 1, 1).unwrap()).unwrap()
    }

    fn register_request(email: &str) -> RegisterRequest {
        RegisterRequest {
            name: "John Doe".to_string(),
            email: email.to_string(),
            password: "password123".to_string(),
            password_confirm: "password123".to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_normalizes_and_defaults_role() {
        let service = service();
        let response = service.register(register_request("JOHN@EXAMPLE.COM")).await.unwrap();

        assert_eq!(response.user.email, "john@example.com");
        assert_eq!(response.user.role, Role::User);
        assert!(response.user.password_hash.starts_with("$argon2id$"));
        assert!(!response.token.is_empty());
    }

    #[tokio::test]
    async fn test_register_duplicate_email_any_case() {
        let service = service();
        service.register(register_request("john@example.com")).await.unwrap();

        match service.register(register_request("  John@Example.COM")).await {
            Err(AppError::Validation { message, details }) => {
                assert_eq!(message, "Validation failed");
                assert!(details["email"].contains("already taken"));
            }
            other => panic!("expected validation error, got {:?}", other.map(|r| r.user)),
        }
    }

    #[tokio::test]
    async fn test_register_password_mismatch() {
        let service = service();
        let req = RegisterRequest {
            password_confirm: "password456".to_string(),
            ..register_request("john@example.com")
        };

        match service.register(req).await {
            Err(AppError::Validation { message, details }) => {
                assert_eq!(message, "Password confirmation does not match");
                assert!(details.contains_key("password_confirm"));
            }
            other => panic!("expected validation error, got {:?}", other.map(|r| r.user)),
        }
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let service = service();
        service.register(register_request("john@example.com")).await.unwrap();

        let wrong_password = service
            .login(LoginRequest {
                email: "john@example.com".to_string(),
                password: "wrongpassword".to_string(),
            })
            .await
            .unwrap_err();
        let unknown_email = service
            .login(LoginRequest {
                email: "nobody@example.com".to_string(),
                password: "password123".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(wrong_password, AppError::InvalidCredentials));
        assert!(matches!(unknown_email, AppError::InvalidCredentials));
        assert_eq!(wrong_password.user_message(), unknown_email.user_message());
        assert_eq!(wrong_password.status_code(), unknown_email.status_code());
    }

    #[tokio::test]
    async fn test_login_normalizes_email() {
        let service = service();
        let registered = service.register(register_request("john@example.com")).await.unwrap();

        let response = service
            .login(LoginRequest {
                email: " JOHN@example.com ".to_string(),
                password: "password123".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(response.user.id, registered.user.id);
    }

    #[tokio::test]
    async fn test_refresh_issues_distinct_tokens() {
        let service = service();
        let registered = service.register(register_request("john@example.com")).await.unwrap();

        let first = service.refresh(registered.user.clone()).unwrap();
        let second = service.refresh(registered.user.clone()).unwrap();
        assert_ne!(first.token, second.token);
        assert_ne!(first.token, registered.token);
    }
}
