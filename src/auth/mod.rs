//! Authentication and authorization module

pub mod jwt;
pub mod middleware;
pub mod password;

pub use jwt::{Claims, IssuedToken, JwtService, TokenError};
pub use middleware::{authenticate, bearer_token, check_role, jwt_auth_middleware, require_admin, CurrentUser};
pub use password::PasswordHasher;
