//! Session tokens and password hashing.

pub mod jwt;
pub mod password;
pub mod session;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{AuthConfig, SessionBackend};
use crate::database::{AdminUser, DatabaseError};

pub use jwt::{Claims, JwtResolver};
pub use password::{hash_password, verify_password};
pub use session::MemorySessionResolver;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid JWT secret")]
    InvalidSecret,

    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error(transparent)]
    Storage(#[from] DatabaseError),
}

/// Maps the session cookie to a user id
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn issue(&self, user: &AdminUser, ttl: Duration) -> Result<String, AuthError>;

    /// `None` for unknown, expired or tampered tokens
    async fn resolve(&self, token: &str) -> Result<Option<i64>, AuthError>;

    async fn revoke(&self, token: &str) -> Result<(), AuthError>;
}

pub fn resolver(config: &AuthConfig) -> Result<Arc<dyn IdentityResolver>, AuthError> {
    Ok(match config.session_backend {
        SessionBackend::Jwt => Arc::new(JwtResolver::new(&config.jwt_secret)?),
        SessionBackend::Memory => Arc::new(MemorySessionResolver::new()),
    })
}
