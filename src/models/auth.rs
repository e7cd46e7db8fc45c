//! Authentication-related models

use crate::error::FieldErrors;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::ValidateEmail;

use super::user::{normalize_email, User};

pub const NAME_MIN_CHARS: usize = 2;
pub const NAME_MAX_CHARS: usize = 100;
/// users.email is VARCHAR(255)
pub const EMAIL_MAX_CHARS: usize = 254;
pub const PASSWORD_MIN_CHARS: usize = 8;
pub const PASSWORD_MAX_CHARS: usize = 100;

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid email regex")
});

/// Registration request
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_confirm: String,
}

impl RegisterRequest {
    /// Trims the name, trims and lowercases the email. Passwords are left untouched.
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.email = normalize_email(&self.email);
        self
    }

    pub fn passwords_match(&self) -> bool {
        self.password == self.password_confirm
    }

    /// Field-level checks that need no store access.
    /// Expects a normalized request.
    pub fn validate_fields(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();

        let name_chars = self.name.chars().count();
        if name_chars == 0 {
            errors.add("name", "Name can not be blank");
        } else if !(NAME_MIN_CHARS..=NAME_MAX_CHARS).contains(&name_chars) {
            errors.add(
                "name",
                format!(
                    "Name must be between {} and {} characters",
                    NAME_MIN_CHARS, NAME_MAX_CHARS
                ),
            );
        }

        if self.email.is_empty() {
            errors.add("email", "Email can not be blank");
        } else if self.email.chars().count() > EMAIL_MAX_CHARS {
            errors.add(
                "email",
                format!("Email must be at most {} characters", EMAIL_MAX_CHARS),
            );
        } else if !is_valid_email(&self.email) {
            errors.add("email", "Email format is invalid");
        }

        let password_chars = self.password.chars().count();
        if password_chars == 0 {
            errors.add("password", "Password is required");
        } else {
            if password_chars < PASSWORD_MIN_CHARS {
                errors.add(
                    "password",
                    format!("Password must be at least {} characters long", PASSWORD_MIN_CHARS),
                );
            }
            if password_chars > PASSWORD_MAX_CHARS {
                errors.add(
                    "password",
                    format!("Password must be less than {} characters", PASSWORD_MAX_CHARS),
                );
            }
        }

        errors
    }
}

fn is_valid_email(email: &str) -> bool {
    email.validate_email() && EMAIL_PATTERN.is_match(email)
}

/// Login request
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Token issued on register, login and refresh
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
    pub expires_at: DateTime<Utc>,
}
