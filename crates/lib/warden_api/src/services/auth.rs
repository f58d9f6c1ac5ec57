// @zen-component: AUTH-TokenService
// @zen-component: AUTH-CredentialService
// @zen-component: AUTH-PasswordReset
//
//! Authentication service: login/register/refresh/reset flows over a
//! [`UserStore`], delegating crypto to `warden_core::auth`.

use chrono::{Duration, Utc};
use tracing::{info, warn};
use warden_core::auth::jwt::{ACCESS_TOKEN_EXPIRY_SECS, generate_tokens, verify_token_kind};
use warden_core::auth::password::{compare_passwords, hash_password_with_cost, validate_password_strength};
use warden_core::auth::random::{
    DEFAULT_OTP_LENGTH, generate_secure_otp, generate_secure_token, hash_token,
};
use warden_core::models::auth::{Role, TokenKind, TokenPair, User, UserRecord};
use warden_core::notify::OtpNotifier;
use warden_core::users::{ExpiringDigest, LockoutPolicy, UserStore, live_digest_matches};
use warden_core::uuid::uuidv4;

use crate::error::{AppError, AppResult};
use crate::models::TokenResponse;

/// Consecutive failed logins before the account locks.
pub const MAX_FAILED_LOGINS: u32 = 5;

/// Lockout duration: 15 minutes.
pub const LOCKOUT_MINUTES: i64 = 15;

/// OTP lifetime: 10 minutes.
pub const OTP_EXPIRY_MINUTES: i64 = 10;

/// Reset token lifetime: 15 minutes.
pub const RESET_TOKEN_EXPIRY_MINUTES: i64 = 15;

const INVALID_CREDENTIALS: &str = "Invalid credentials";
const INVALID_CODE: &str = "Invalid or expired code";

// ---------------------------------------------------------------------------
// Password hashing (bcrypt on the blocking pool)
// ---------------------------------------------------------------------------

/// Hash a password without blocking the async executor.
pub async fn hash_password(password: &str, cost: u32) -> AppResult<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || hash_password_with_cost(&password, cost))
        .await
        .map_err(|e| AppError::Internal(format!("hash task: {e}")))?
        .map_err(AppError::from)
}

/// Verify a password without blocking the async executor.
pub async fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let password = password.to_string();
    let hash = hash.to_string();
    tokio::task::spawn_blocking(move || compare_passwords(&password, &hash))
        .await
        .map_err(|e| AppError::Internal(format!("verify task: {e}")))
}

fn require_strong_password(password: &str) -> AppResult<()> {
    let strength = validate_password_strength(password);
    if strength.is_valid {
        Ok(())
    } else {
        Err(AppError::Validation(
            strength.message.unwrap_or_else(|| "Password is too weak".into()),
        ))
    }
}

fn lockout_policy() -> LockoutPolicy {
    LockoutPolicy {
        max_attempts: MAX_FAILED_LOGINS,
        duration: Duration::minutes(LOCKOUT_MINUTES),
    }
}

fn token_response(pair: TokenPair, user: User) -> TokenResponse {
    TokenResponse {
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
        expires_in: ACCESS_TOKEN_EXPIRY_SECS,
        token_type: "Bearer".to_string(),
        user,
    }
}

// ---------------------------------------------------------------------------
// Public auth operations
// ---------------------------------------------------------------------------

/// Register a new account and sign it in.
///
/// The store makes the first account the admin.
pub async fn register(
    users: &dyn UserStore,
    email: &str,
    password: &str,
    name: Option<&str>,
    jwt_secret: &[u8],
    hash_cost: u32,
) -> AppResult<TokenResponse> {
    let email = email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::Validation("A valid email is required".into()));
    }
    require_strong_password(password)?;

    if users.find_by_email(email).await?.is_some() {
        return Err(AppError::Conflict("Email already registered".into()));
    }

    let pw_hash = hash_password(password, hash_cost).await?;
    let id = uuidv4().to_string();
    let pair = generate_tokens(&id, jwt_secret)?;
    let mut record = UserRecord::new(id, email.to_string(), name.map(String::from), pw_hash);
    record.refresh_token_hash = Some(hash_token(&pair.refresh_token));

    let stored = users.insert(record).await?;
    info!(user_id = %stored.id, admin = stored.role == Role::Admin, "user registered");
    Ok(token_response(pair, stored.to_user()))
}

/// Authenticate with email + password.
///
/// Unknown e-mail and wrong password share one message. After
/// [`MAX_FAILED_LOGINS`] consecutive failures the account is locked for
/// [`LOCKOUT_MINUTES`].
pub async fn login(
    users: &dyn UserStore,
    email: &str,
    password: &str,
    jwt_secret: &[u8],
) -> AppResult<TokenResponse> {
    let Some(record) = users.find_by_email(email).await? else {
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
    };

    if record.is_locked(Utc::now()) {
        warn!(user_id = %record.id, "login attempt on locked account");
        return Err(AppError::Locked("Account temporarily locked".into()));
    }

    if !verify_password(password, &record.password_hash).await? {
        let after = users
            .record_failed_login(&record.id, lockout_policy(), Utc::now())
            .await?;
        if after.failed_login_attempts == MAX_FAILED_LOGINS && after.locked_until.is_some() {
            warn!(user_id = %record.id, "account locked after repeated failed logins");
        }
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
    }

    let pair = generate_tokens(&record.id, jwt_secret)?;
    let stored = users
        .record_login(&record.id, hash_token(&pair.refresh_token))
        .await?;
    info!(user_id = %stored.id, "user logged in");
    Ok(token_response(pair, stored.to_user()))
}

/// Exchange a refresh token for a new pair (single-use rotation).
pub async fn refresh(
    users: &dyn UserStore,
    refresh_token: &str,
    jwt_secret: &[u8],
) -> AppResult<TokenResponse> {
    let invalid = || AppError::Unauthorized("Invalid refresh token".into());

    let claims =
        verify_token_kind(refresh_token, jwt_secret, TokenKind::Refresh).ok_or_else(invalid)?;
    let pair = generate_tokens(&claims.user_id, jwt_secret)?;

    let Some(stored) = users
        .rotate_refresh_token(
            &claims.user_id,
            &hash_token(refresh_token),
            hash_token(&pair.refresh_token),
        )
        .await?
    else {
        warn!(user_id = %claims.user_id, "refresh token reuse or mismatch");
        return Err(invalid());
    };

    Ok(token_response(pair, stored.to_user()))
}

/// Logout: forget the stored refresh token.
pub async fn logout(users: &dyn UserStore, user_id: &str) -> AppResult<()> {
    if users.clear_refresh_token(user_id).await? {
        info!(user_id, "user logged out");
    }
    Ok(())
}

/// Start a password reset. Unknown e-mails are accepted silently.
pub async fn forgot_password(
    users: &dyn UserStore,
    notifier: &dyn OtpNotifier,
    email: &str,
) -> AppResult<()> {
    let Some(record) = users.find_by_email(email).await? else {
        return Ok(());
    };

    let otp = generate_secure_otp(DEFAULT_OTP_LENGTH);
    let pending = ExpiringDigest {
        digest: hash_token(&otp),
        expires_at: Utc::now() + Duration::minutes(OTP_EXPIRY_MINUTES),
    };
    users.set_otp(&record.id, pending).await?;

    notifier.send_otp(&record.email, &otp).await?;
    Ok(())
}

/// Check an OTP. On success the OTP is consumed and a reset token issued.
pub async fn verify_otp(users: &dyn UserStore, email: &str, otp: &str) -> AppResult<String> {
    let Some(record) = users.find_by_email(email).await? else {
        return Err(AppError::Unauthorized(INVALID_CODE.into()));
    };

    let now = Utc::now();
    let reset_token = generate_secure_token();
    let reset = ExpiringDigest {
        digest: hash_token(&reset_token),
        expires_at: now + Duration::minutes(RESET_TOKEN_EXPIRY_MINUTES),
    };
    if !users.consume_otp(&record.id, &hash_token(otp), reset, now).await? {
        return Err(AppError::Unauthorized(INVALID_CODE.into()));
    }

    Ok(reset_token)
}

/// Set a new password using a reset token. Signs out every session.
pub async fn reset_password(
    users: &dyn UserStore,
    email: &str,
    reset_token: &str,
    new_password: &str,
    hash_cost: u32,
) -> AppResult<()> {
    let invalid = || AppError::Unauthorized("Invalid or expired reset token".into());

    let Some(record) = users.find_by_email(email).await? else {
        return Err(invalid());
    };

    // A bad token is reported before a weak password.
    let presented = hash_token(reset_token);
    if !live_digest_matches(
        record.reset_token_hash.as_deref(),
        record.reset_token_expires_at,
        &presented,
        Utc::now(),
    ) {
        return Err(invalid());
    }
    require_strong_password(new_password)?;

    let pw_hash = hash_password(new_password, hash_cost).await?;
    if !users
        .consume_reset_token(&record.id, &presented, pw_hash, Utc::now())
        .await?
    {
        return Err(invalid());
    }
    info!(user_id = %record.id, "password reset");
    Ok(())
}
