// @zen-component: AUTH-AccessControl
//
//! Authentication middleware: bearer/cookie token extraction and JWT verification.

use axum::http::header::AUTHORIZATION;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use warden_core::auth::jwt::verify_token_kind;
use warden_core::models::auth::{TokenClaims, TokenKind};

use crate::AppState;
use crate::error::AppError;
use crate::services::cookies::ACCESS_COOKIE;

/// Verified claims stored in request extensions.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub TokenClaims);

impl AuthenticatedUser {
    pub fn user_id(&self) -> &str {
        &self.0.user_id
    }
}

/// Pull the access token from `Authorization: Bearer` or the access cookie.
fn extract_token(request: &Request) -> Option<String> {
    if let Some(header) = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    {
        return header.strip_prefix("Bearer ").map(|t| t.trim().to_string());
    }
    CookieJar::from_headers(request.headers())
        .get(ACCESS_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}

/// Axum middleware: verifies the access token and injects
/// [`AuthenticatedUser`] into request extensions.
///
/// Missing, malformed, forged and expired tokens all get the same answer.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let unauthorized = || AppError::Unauthorized("Authentication required".into());

    let token = extract_token(&request).ok_or_else(unauthorized)?;
    let claims = verify_token_kind(&token, state.config.jwt_secret.as_bytes(), TokenKind::Access)
        .ok_or_else(unauthorized)?;

    request.extensions_mut().insert(AuthenticatedUser(claims));

    Ok(next.run(request).await)
}
