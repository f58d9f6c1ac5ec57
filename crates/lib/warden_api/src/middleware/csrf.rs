// @zen-component: AUTH-CsrfGuard
//
//! CSRF double-submit protection.
//!
//! [`set_csrf_token`] mints a token into the `XSRF-TOKEN` cookie;
//! [`validate_csrf_token`] requires every non-GET request to echo that
//! cookie in the `x-xsrf-token` header.

use axum::{
    extract::{Request, State},
    http::{HeaderValue, Method, header::SET_COOKIE},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{debug, error};
use warden_core::auth::random::{constant_time_eq, generate_csrf_token};

use crate::AppState;
use crate::error::AppError;
use crate::services::cookies::{CSRF_COOKIE, csrf_cookie};

/// Header carrying the echoed CSRF token.
pub const CSRF_HEADER: &str = "x-xsrf-token";

/// CSRF token minted for the current request.
#[derive(Debug, Clone)]
pub struct CsrfToken(pub String);

/// Mint a CSRF token, expose it to the handler and set it as a cookie.
pub async fn set_csrf_token(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = generate_csrf_token();
    request.extensions_mut().insert(CsrfToken(token.clone()));

    let mut response = next.run(request).await;
    let cookie = csrf_cookie(&token, state.config.production);
    match HeaderValue::from_str(&cookie.to_string()) {
        Ok(value) => {
            response.headers_mut().append(SET_COOKIE, value);
        }
        Err(e) => {
            error!(error = %e, "failed to encode CSRF cookie");
            return AppError::Internal("csrf cookie".into()).into_response();
        }
    }
    response
}

/// Whether the request carries matching cookie and header tokens.
pub fn csrf_tokens_match(request: &Request) -> bool {
    let jar = CookieJar::from_headers(request.headers());
    let cookie = jar.get(CSRF_COOKIE).map(|c| c.value());
    let header = request
        .headers()
        .get(CSRF_HEADER)
        .and_then(|v| v.to_str().ok());

    match (cookie, header) {
        (Some(cookie), Some(header)) if !cookie.is_empty() => {
            constant_time_eq(cookie.as_bytes(), header.as_bytes())
        }
        _ => false,
    }
}

/// Reject state-changing requests without a matching CSRF token.
///
/// GET requests pass through untouched.
pub async fn validate_csrf_token(request: Request, next: Next) -> Result<Response, AppError> {
    if request.method() == Method::GET {
        return Ok(next.run(request).await);
    }

    if !csrf_tokens_match(&request) {
        debug!(method = %request.method(), path = %request.uri().path(), "csrf validation failed");
        return Err(AppError::Forbidden("Invalid CSRF token".into()));
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::header::COOKIE;

    use super::*;

    fn request(cookie: Option<&str>, header: Option<&str>) -> Request {
        let mut builder = axum::http::Request::builder().method(Method::POST).uri("/x");
        if let Some(c) = cookie {
            builder = builder.header(COOKIE, format!("{CSRF_COOKIE}={c}"));
        }
        if let Some(h) = header {
            builder = builder.header(CSRF_HEADER, h);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn matching_tokens_pass() {
        assert!(csrf_tokens_match(&request(Some("abc123"), Some("abc123"))));
    }

    #[test]
    fn missing_or_mismatched_tokens_fail() {
        assert!(!csrf_tokens_match(&request(None, Some("abc123"))));
        assert!(!csrf_tokens_match(&request(Some("abc123"), None)));
        assert!(!csrf_tokens_match(&request(Some("abc123"), Some("abc124"))));
        assert!(!csrf_tokens_match(&request(Some(""), Some(""))));
        assert!(!csrf_tokens_match(&request(None, None)));
    }
}
