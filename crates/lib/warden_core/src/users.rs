// @zen-component: AUTH-UserStore
//
//! User-record store seam.
//!
//! Flows in `warden_api` read and write password hashes, token digests,
//! OTP state and lockout counters through [`UserStore`]. The in-memory
//! implementation is the default for a single process.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::auth::random::constant_time_eq;
use crate::models::auth::{Role, UserRecord};

/// User store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Email already registered")]
    DuplicateEmail,

    #[error("User not found: {0}")]
    NotFound(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// How many consecutive failures lock an account, and for how long.
#[derive(Debug, Clone, Copy)]
pub struct LockoutPolicy {
    pub max_attempts: u32,
    pub duration: Duration,
}

/// A secret digest with an expiry (OTP, reset token).
#[derive(Debug, Clone)]
pub struct ExpiringDigest {
    pub digest: String,
    pub expires_at: DateTime<Utc>,
}

/// Persistence for [`UserRecord`]s.
///
/// Every method that changes a record is a single atomic step. Flows never
/// read a record, edit the copy and write it back, so concurrent requests
/// cannot lose each other's changes or reuse a single-use secret.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Look up a user by e-mail (case-insensitive).
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<UserRecord>, StoreError>;

    /// Insert a new record and return it as stored. Fails on a duplicate
    /// e-mail. The first record in an empty store becomes [`Role::Admin`].
    async fn insert(&self, record: UserRecord) -> Result<UserRecord, StoreError>;

    /// Replace an existing record.
    async fn update(&self, record: UserRecord) -> Result<(), StoreError>;

    async fn count(&self) -> Result<usize, StoreError>;

    /// Count one failed login and return the record afterwards.
    ///
    /// An expired lock starts a fresh count. Reaching
    /// `policy.max_attempts` locks the account until `now + policy.duration`.
    /// While a lock is in force the record is left unchanged.
    async fn record_failed_login(
        &self,
        id: &str,
        policy: LockoutPolicy,
        now: DateTime<Utc>,
    ) -> Result<UserRecord, StoreError>;

    /// Clear the failure count and any lock, and store a new refresh digest.
    async fn record_login(&self, id: &str, refresh_digest: String) -> Result<UserRecord, StoreError>;

    /// Replace the refresh digest only if the stored one equals `expected`.
    ///
    /// `None` means no rotation happened (unknown user, reused or revoked token).
    async fn rotate_refresh_token(
        &self,
        id: &str,
        expected: &str,
        replacement: String,
    ) -> Result<Option<UserRecord>, StoreError>;

    /// Forget the refresh digest. Returns whether the user exists.
    async fn clear_refresh_token(&self, id: &str) -> Result<bool, StoreError>;

    /// Store a new OTP digest, replacing any outstanding one.
    async fn set_otp(&self, id: &str, otp: ExpiringDigest) -> Result<(), StoreError>;

    /// Consume a live OTP matching `otp_digest` and store `reset` in its place.
    /// Returns whether the OTP was consumed.
    async fn consume_otp(
        &self,
        id: &str,
        otp_digest: &str,
        reset: ExpiringDigest,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    /// Consume a live reset token matching `reset_digest` and set the new
    /// password hash. Also revokes the refresh token and clears any lockout.
    /// Returns whether the token was consumed.
    async fn consume_reset_token(
        &self,
        id: &str,
        reset_digest: &str,
        password_hash: String,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError>;
}

/// Whether `stored` is an unexpired digest equal to `presented`.
pub fn live_digest_matches(
    stored: Option<&str>,
    expires_at: Option<DateTime<Utc>>,
    presented: &str,
    now: DateTime<Utc>,
) -> bool {
    expires_at.is_some_and(|at| now < at)
        && stored.is_some_and(|digest| constant_time_eq(digest.as_bytes(), presented.as_bytes()))
}

/// Process-local user store.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<String, UserRecord>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `change` on one record while holding the write lock.
    async fn modify<T>(
        &self,
        id: &str,
        change: impl FnOnce(&mut UserRecord) -> T,
    ) -> Result<T, StoreError> {
        let mut users = self.users.write().await;
        let record = users
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        Ok(change(record))
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let wanted = normalize_email(email);
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| normalize_email(&u.email) == wanted)
            .cloned())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn insert(&self, mut record: UserRecord) -> Result<UserRecord, StoreError> {
        let wanted = normalize_email(&record.email);
        let mut users = self.users.write().await;
        if users.values().any(|u| normalize_email(&u.email) == wanted) {
            return Err(StoreError::DuplicateEmail);
        }
        if users.is_empty() {
            record.role = Role::Admin;
        }
        users.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn update(&self, record: UserRecord) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        match users.get_mut(&record.id) {
            Some(existing) => {
                *existing = record;
                Ok(())
            }
            None => Err(StoreError::NotFound(record.id)),
        }
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.users.read().await.len())
    }

    async fn record_failed_login(
        &self,
        id: &str,
        policy: LockoutPolicy,
        now: DateTime<Utc>,
    ) -> Result<UserRecord, StoreError> {
        self.modify(id, |record| {
            if record.is_locked(now) {
                return record.clone();
            }
            if record.locked_until.take().is_some() {
                record.failed_login_attempts = 0;
            }
            record.failed_login_attempts += 1;
            if record.failed_login_attempts >= policy.max_attempts {
                record.locked_until = Some(now + policy.duration);
            }
            record.clone()
        })
        .await
    }

    async fn record_login(&self, id: &str, refresh_digest: String) -> Result<UserRecord, StoreError> {
        self.modify(id, |record| {
            record.failed_login_attempts = 0;
            record.locked_until = None;
            record.refresh_token_hash = Some(refresh_digest);
            record.clone()
        })
        .await
    }

    async fn rotate_refresh_token(
        &self,
        id: &str,
        expected: &str,
        replacement: String,
    ) -> Result<Option<UserRecord>, StoreError> {
        let mut users = self.users.write().await;
        let Some(record) = users.get_mut(id) else {
            return Ok(None);
        };
        let matches = record
            .refresh_token_hash
            .as_deref()
            .is_some_and(|digest| constant_time_eq(digest.as_bytes(), expected.as_bytes()));
        if !matches {
            return Ok(None);
        }
        record.refresh_token_hash = Some(replacement);
        Ok(Some(record.clone()))
    }

    async fn clear_refresh_token(&self, id: &str) -> Result<bool, StoreError> {
        let mut users = self.users.write().await;
        match users.get_mut(id) {
            Some(record) => {
                record.refresh_token_hash = None;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_otp(&self, id: &str, otp: ExpiringDigest) -> Result<(), StoreError> {
        self.modify(id, |record| {
            record.otp_hash = Some(otp.digest);
            record.otp_expires_at = Some(otp.expires_at);
        })
        .await
    }

    async fn consume_otp(
        &self,
        id: &str,
        otp_digest: &str,
        reset: ExpiringDigest,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        self.modify(id, |record| {
            if !live_digest_matches(record.otp_hash.as_deref(), record.otp_expires_at, otp_digest, now) {
                return false;
            }
            record.otp_hash = None;
            record.otp_expires_at = None;
            record.reset_token_hash = Some(reset.digest);
            record.reset_token_expires_at = Some(reset.expires_at);
            true
        })
        .await
    }

    async fn consume_reset_token(
        &self,
        id: &str,
        reset_digest: &str,
        password_hash: String,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        self.modify(id, |record| {
            if !live_digest_matches(
                record.reset_token_hash.as_deref(),
                record.reset_token_expires_at,
                reset_digest,
                now,
            ) {
                return false;
            }
            record.password_hash = password_hash;
            record.reset_token_hash = None;
            record.reset_token_expires_at = None;
            record.refresh_token_hash = None;
            record.failed_login_attempts = 0;
            record.locked_until = None;
            true
        })
        .await
    }
}
