// @zen-component: AUTH-LoginEndpoint
// @zen-component: AUTH-RegistrationEndpoint
// @zen-component: AUTH-TokenRefreshEndpoint
// @zen-component: AUTH-PasswordResetEndpoint
//
//! Authentication request handlers.

use axum::extract::State;
use axum::{Extension, Json};
use axum_extra::extract::cookie::CookieJar;
use warden_core::models::auth::User;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{
    ForgotPasswordRequest, LoginRequest, MessageResponse, RefreshRequest, RegisterRequest,
    ResetPasswordRequest, TokenResponse, VerifyOtpRequest, VerifyOtpResponse,
};
use crate::services::auth;
use crate::services::cookies::{
    REFRESH_COOKIE, access_cookie, clear_access_cookie, clear_refresh_cookie, refresh_cookie,
};

fn with_token_cookies(jar: CookieJar, resp: &TokenResponse, secure: bool) -> CookieJar {
    jar.add(access_cookie(&resp.access_token, secure))
        .add(refresh_cookie(&resp.refresh_token, secure))
}

/// `POST /auth/register`: create a new user account.
pub async fn register_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<RegisterRequest>,
) -> AppResult<(CookieJar, Json<TokenResponse>)> {
    let resp = auth::register(
        state.users.as_ref(),
        &body.email,
        &body.password,
        body.name.as_deref(),
        state.config.jwt_secret.as_bytes(),
        state.config.password_hash_cost,
    )
    .await?;
    let jar = with_token_cookies(jar, &resp, state.config.production);
    Ok((jar, Json(resp)))
}

/// `POST /auth/login`: authenticate with email + password.
pub async fn login_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<LoginRequest>,
) -> AppResult<(CookieJar, Json<TokenResponse>)> {
    let resp = auth::login(
        state.users.as_ref(),
        &body.email,
        &body.password,
        state.config.jwt_secret.as_bytes(),
    )
    .await?;
    let jar = with_token_cookies(jar, &resp, state.config.production);
    Ok((jar, Json(resp)))
}

/// `POST /auth/refresh`: exchange a refresh token (body or cookie) for a new pair.
pub async fn refresh_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Option<Json<RefreshRequest>>,
) -> AppResult<(CookieJar, Json<TokenResponse>)> {
    let token = body
        .and_then(|Json(b)| b.refresh_token)
        .or_else(|| jar.get(REFRESH_COOKIE).map(|c| c.value().to_string()))
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Invalid refresh token".into()))?;

    let resp = auth::refresh(
        state.users.as_ref(),
        &token,
        state.config.jwt_secret.as_bytes(),
    )
    .await?;
    let jar = with_token_cookies(jar, &resp, state.config.production);
    Ok((jar, Json(resp)))
}

/// `POST /auth/logout`: forget the refresh token and clear cookies.
pub async fn logout_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<MessageResponse>)> {
    auth::logout(state.users.as_ref(), user.user_id()).await?;
    let secure = state.config.production;
    let jar = jar
        .add(clear_access_cookie(secure))
        .add(clear_refresh_cookie(secure));
    Ok((jar, Json(MessageResponse::ok("Logged out"))))
}

/// `GET /auth/me`: the authenticated user.
pub async fn me_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> AppResult<Json<User>> {
    let record = state
        .users
        .find_by_id(user.user_id())
        .await?
        .ok_or_else(|| AppError::Unauthorized("Authentication required".into()))?;
    Ok(Json(record.to_user()))
}

/// `POST /auth/forgot-password`: e-mail a reset code.
pub async fn forgot_password_handler(
    State(state): State<AppState>,
    Json(body): Json<ForgotPasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    auth::forgot_password(state.users.as_ref(), state.notifier.as_ref(), &body.email).await?;
    Ok(Json(MessageResponse::ok(
        "If that account exists, a reset code has been sent",
    )))
}

/// `POST /auth/verify-otp`: trade a valid reset code for a reset token.
pub async fn verify_otp_handler(
    State(state): State<AppState>,
    Json(body): Json<VerifyOtpRequest>,
) -> AppResult<Json<VerifyOtpResponse>> {
    let reset_token = auth::verify_otp(state.users.as_ref(), &body.email, &body.otp).await?;
    Ok(Json(VerifyOtpResponse { reset_token }))
}

/// `POST /auth/reset-password`: set a new password.
pub async fn reset_password_handler(
    State(state): State<AppState>,
    Json(body): Json<ResetPasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    auth::reset_password(
        state.users.as_ref(),
        &body.email,
        &body.reset_token,
        &body.new_password,
        state.config.password_hash_cost,
    )
    .await?;
    Ok(Json(MessageResponse::ok("Password updated")))
}
