//! Authentication primitives.
//!
//! Provides password hashing, JWT issuance/verification and secure random
//! tokens that can be shared across `warden_api` and `warden_agent`.

pub mod jwt;
pub mod password;
pub mod random;

use thiserror::Error;

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    CredentialError,

    #[error("Token error: {0}")]
    TokenError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    /// The signing secret is empty: a deployment misconfiguration.
    #[error("Token signing secret is not configured")]
    MissingSecret,

    #[error("Internal error: {0}")]
    Internal(String),
}
