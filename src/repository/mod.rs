//! Credential store abstraction and its implementations

pub mod memory;
pub mod user_repo;

pub use memory::InMemoryUserStore;
pub use user_repo::PgUserRepository;

use crate::{
    error::AppError,
    models::user::{NewUser, User},
};
use async_trait::async_trait;
use uuid::Uuid;

/// Persistence for user accounts.
///
/// Implementations enforce case-insensitive email uniqueness themselves; `create`
/// reports a duplicate as a validation error on the `email` field.
#[async_trait]
pub trait UserStore: Send + Sync + 'static {
    async fn create(&self, new_user: NewUser) -> Result<User, AppError>;

    /// `email` must already be normalized
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<User>, AppError>;

    async fn health_check(&self) -> HealthStatus;
}

/// Result of a store liveness probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    Unhealthy(String),
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy)
    }
}

pub(crate) const EMAIL_TAKEN: &str = "Email is already taken";

pub(crate) fn email_taken() -> AppError {
    let mut errors = crate::error::FieldErrors::new();
    errors.add("email", EMAIL_TAKEN);
    AppError::validation("Validation failed", errors)
}
