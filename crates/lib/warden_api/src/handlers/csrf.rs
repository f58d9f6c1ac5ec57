//! CSRF token endpoint.

use axum::{Extension, Json};

use crate::error::{AppError, AppResult};
use crate::middleware::csrf::CsrfToken;
use crate::models::CsrfTokenResponse;

/// `GET /api/csrf-token`: return the token the middleware just set as a cookie.
pub async fn csrf_token_handler(
    token: Option<Extension<CsrfToken>>,
) -> AppResult<Json<CsrfTokenResponse>> {
    let Extension(CsrfToken(csrf_token)) =
        token.ok_or_else(|| AppError::Internal("csrf middleware not installed".into()))?;
    Ok(Json(CsrfTokenResponse { csrf_token }))
}
