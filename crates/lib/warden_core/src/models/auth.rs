//! Authentication domain models.
//!
//! These are internal domain models; API request/response bodies live in
//! `warden_api` and use camelCase on the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which lifetime a JWT was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT claims embedded in access and refresh tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject user ID.
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "typ")]
    pub kind: TokenKind,
    /// Unique token id, so two tokens minted in the same second differ.
    pub jti: String,
    /// Issued at (unix timestamp).
    pub iat: i64,
    /// Expiry (unix timestamp).
    pub exp: i64,
}

/// Freshly issued access + refresh tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// User role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

/// Public view of a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub role: Role,
}

/// Full user record as kept by a [`crate::users::UserStore`].
///
/// Secrets (refresh token, OTP, reset token) are only ever stored as
/// SHA-256 digests.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub role: Role,
    pub password_hash: String,
    pub refresh_token_hash: Option<String>,
    pub otp_hash: Option<String>,
    pub otp_expires_at: Option<DateTime<Utc>>,
    pub reset_token_hash: Option<String>,
    pub reset_token_expires_at: Option<DateTime<Utc>>,
    pub failed_login_attempts: u32,
    pub locked_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    /// Build a fresh record with no outstanding tokens.
    pub fn new(id: String, email: String, name: Option<String>, password_hash: String) -> Self {
        Self {
            id,
            email,
            name,
            role: Role::User,
            password_hash,
            refresh_token_hash: None,
            otp_hash: None,
            otp_expires_at: None,
            reset_token_hash: None,
            reset_token_expires_at: None,
            failed_login_attempts: 0,
            locked_until: None,
            created_at: Utc::now(),
        }
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id.clone(),
            email: self.email.clone(),
            name: self.name.clone(),
            role: self.role,
        }
    }

    /// Whether a lockout is in force at `now`.
    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        self.locked_until.is_some_and(|until| now < until)
    }
}
