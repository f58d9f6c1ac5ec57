// @zen-component: CFG-CookieAuth
//
//! Cookie service: builds the auth and anti-forgery cookies.

use axum_extra::extract::cookie::{Cookie, SameSite};
use time::Duration;
use warden_core::auth::jwt::{ACCESS_TOKEN_EXPIRY_SECS, REFRESH_TOKEN_EXPIRY_SECS};

/// Cookie name for the access token.
pub const ACCESS_COOKIE: &str = "warden_access";
/// Cookie name for the refresh token.
pub const REFRESH_COOKIE: &str = "warden_refresh";
/// Cookie name for the CSRF token (readable by client script).
pub const CSRF_COOKIE: &str = "XSRF-TOKEN";

/// Path the refresh cookie is scoped to.
const REFRESH_PATH: &str = "/auth";

/// CSRF cookie lifetime: 24 hours.
const CSRF_MAX_AGE_HOURS: i64 = 24;

/// Build a httpOnly cookie for the access token.
pub fn access_cookie(token: &str, secure: bool) -> Cookie<'static> {
    Cookie::build((ACCESS_COOKIE.to_string(), token.to_string()))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/".to_string())
        .max_age(Duration::seconds(ACCESS_TOKEN_EXPIRY_SECS))
        .build()
}

/// Build a httpOnly cookie for the refresh token (7 days).
pub fn refresh_cookie(token: &str, secure: bool) -> Cookie<'static> {
    Cookie::build((REFRESH_COOKIE.to_string(), token.to_string()))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path(REFRESH_PATH.to_string())
        .max_age(Duration::seconds(REFRESH_TOKEN_EXPIRY_SECS))
        .build()
}

/// Build the CSRF cookie.
///
/// Not httpOnly: client script reads it and echoes it in `x-xsrf-token`.
/// `SameSite=None` lets the separately hosted front end send it.
pub fn csrf_cookie(token: &str, secure: bool) -> Cookie<'static> {
    Cookie::build((CSRF_COOKIE.to_string(), token.to_string()))
        .http_only(false)
        .secure(secure)
        .same_site(SameSite::None)
        .path("/".to_string())
        .max_age(Duration::hours(CSRF_MAX_AGE_HOURS))
        .build()
}

/// Build an expired cookie to clear the access token.
pub fn clear_access_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build((ACCESS_COOKIE.to_string(), String::new()))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/".to_string())
        .max_age(Duration::ZERO)
        .build()
}

/// Build an expired cookie to clear the refresh token.
pub fn clear_refresh_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build((REFRESH_COOKIE.to_string(), String::new()))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path(REFRESH_PATH.to_string())
        .max_age(Duration::ZERO)
        .build()
}
