//! Router-level auth tests: CSRF guard, registration, login lockout,
//! refresh rotation and the password-reset flow.

mod common;

use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::{Method, StatusCode};
use common::{PASSWORD, TestApp, cookie_value};
use serde_json::json;
use warden_api::middleware::csrf::CSRF_HEADER;

#[tokio::test]
async fn csrf_endpoint_sets_readable_cookie() {
    let app = TestApp::new().await;
    let resp = app.raw(Method::GET, "/api/csrf-token", None, &[]).await;

    assert_eq!(resp.status, StatusCode::OK);
    let token = resp.body["csrfToken"].as_str().unwrap();
    assert_eq!(token.len(), 128);

    let cookie = resp.set_cookie("XSRF-TOKEN").expect("csrf cookie");
    assert_eq!(cookie_value(&cookie), token);
    assert!(!cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=None"));
    assert!(cookie.contains("Path=/"));
}

#[tokio::test]
async fn post_without_csrf_never_reaches_handler() {
    let app = TestApp::new().await;
    let body = json!({ "email": "ada@example.com", "password": PASSWORD });

    let resp = app
        .raw(Method::POST, "/auth/register", Some(body.clone()), &[])
        .await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);
    assert_eq!(resp.body["message"], "Invalid CSRF token");

    // Header without cookie
    let resp = app
        .raw(
            Method::POST,
            "/auth/register",
            Some(body.clone()),
            &[(CSRF_HEADER, app.csrf.clone())],
        )
        .await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);

    // Mismatched pair
    let resp = app
        .raw(
            Method::POST,
            "/auth/register",
            Some(body),
            &[
                (COOKIE.as_str(), format!("XSRF-TOKEN={}", app.csrf)),
                (CSRF_HEADER, "0".repeat(128)),
            ],
        )
        .await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);

    assert_eq!(app.user_count().await, 0);
}

#[tokio::test]
async fn register_then_me_with_bearer() {
    let app = TestApp::new().await;
    let resp = app
        .send(
            Method::POST,
            "/auth/register",
            Some(json!({ "email": "ada@example.com", "password": PASSWORD, "name": "Ada" })),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["tokenType"], "Bearer");
    assert_eq!(resp.body["expiresIn"], 900);
    assert!(resp.set_cookie("warden_access").unwrap().contains("HttpOnly"));
    assert!(resp.set_cookie("warden_refresh").unwrap().contains("Path=/auth"));

    let access = resp.body["accessToken"].as_str().unwrap();
    let me = app.send(Method::GET, "/auth/me", None, Some(access)).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["email"], "ada@example.com");
    assert_eq!(me.body["name"], "Ada");
}

#[tokio::test]
async fn me_accepts_access_cookie() {
    let app = TestApp::new().await;
    let (access, _) = app.register("ada@example.com").await;

    let resp = app
        .raw(
            Method::GET,
            "/auth/me",
            None,
            &[(COOKIE.as_str(), format!("warden_access={access}"))],
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
}

#[tokio::test]
async fn me_rejects_missing_and_refresh_tokens() {
    let app = TestApp::new().await;
    let (_, refresh) = app.register("ada@example.com").await;

    let resp = app.raw(Method::GET, "/auth/me", None, &[]).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);

    let resp = app.send(Method::GET, "/auth/me", None, Some(&refresh)).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);

    let resp = app
        .raw(
            Method::GET,
            "/auth/me",
            None,
            &[(AUTHORIZATION.as_str(), "Bearer not.a.jwt".to_string())],
        )
        .await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp.body["message"], "Authentication required");
}

#[tokio::test]
async fn weak_password_and_duplicate_email_rejected() {
    let app = TestApp::new().await;
    let resp = app
        .send(
            Method::POST,
            "/auth/register",
            Some(json!({ "email": "ada@example.com", "password": "short" })),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);

    app.register("ada@example.com").await;
    let resp = app
        .send(
            Method::POST,
            "/auth/register",
            Some(json!({ "email": "ADA@example.com", "password": PASSWORD })),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn login_failures_share_one_message_and_lock_the_account() {
    let app = TestApp::new().await;
    app.register("ada@example.com").await;

    let unknown = app
        .send(
            Method::POST,
            "/auth/login",
            Some(json!({ "email": "nobody@example.com", "password": PASSWORD })),
            None,
        )
        .await;
    assert_eq!(unknown.status, StatusCode::UNAUTHORIZED);

    let wrong = json!({ "email": "ada@example.com", "password": "Wr0ng!pass" });
    for _ in 0..5 {
        let resp = app
            .send(Method::POST, "/auth/login", Some(wrong.clone()), None)
            .await;
        assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
        assert_eq!(resp.body["message"], unknown.body["message"]);
    }

    // Even the right password is refused while locked.
    let resp = app
        .send(
            Method::POST,
            "/auth/login",
            Some(json!({ "email": "ada@example.com", "password": PASSWORD })),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::LOCKED);
}

#[tokio::test]
async fn refresh_rotates_and_rejects_reuse() {
    let app = TestApp::new().await;
    let (_, refresh) = app.register("ada@example.com").await;

    let first = app
        .send(
            Method::POST,
            "/auth/refresh",
            Some(json!({ "refreshToken": refresh })),
            None,
        )
        .await;
    assert_eq!(first.status, StatusCode::OK);
    assert_ne!(first.body["refreshToken"], refresh.as_str());

    let reused = app
        .send(
            Method::POST,
            "/auth/refresh",
            Some(json!({ "refreshToken": refresh })),
            None,
        )
        .await;
    assert_eq!(reused.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn refresh_reads_cookie_when_body_is_absent() {
    let app = TestApp::new().await;
    let (_, refresh) = app.register("ada@example.com").await;

    let resp = app
        .raw(
            Method::POST,
            "/auth/refresh",
            None,
            &[
                (
                    COOKIE.as_str(),
                    format!("XSRF-TOKEN={}; warden_refresh={refresh}", app.csrf),
                ),
                (CSRF_HEADER, app.csrf.clone()),
            ],
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK, "{}", resp.body);
}

#[tokio::test]
async fn logout_revokes_refresh_token() {
    let app = TestApp::new().await;
    let (access, refresh) = app.register("ada@example.com").await;

    let resp = app
        .send(Method::POST, "/auth/logout", None, Some(&access))
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    let cleared = resp.set_cookie("warden_access").expect("cleared cookie");
    assert!(cookie_value(&cleared).is_empty());

    let resp = app
        .send(
            Method::POST,
            "/auth/refresh",
            Some(json!({ "refreshToken": refresh })),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn password_reset_flow() {
    let app = TestApp::new().await;
    let (_, refresh) = app.register("ada@example.com").await;

    // Unknown addresses get the same answer and no code.
    let resp = app
        .send(
            Method::POST,
            "/auth/forgot-password",
            Some(json!({ "email": "nobody@example.com" })),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(app.notifier.last_otp().is_none());

    let resp = app
        .send(
            Method::POST,
            "/auth/forgot-password",
            Some(json!({ "email": "ada@example.com" })),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    let otp = app.notifier.last_otp().expect("otp sent");
    assert_eq!(otp.len(), 6);

    let verify = json!({ "email": "ada@example.com", "otp": otp });
    let resp = app
        .send(Method::POST, "/auth/verify-otp", Some(verify.clone()), None)
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    let reset_token = resp.body["resetToken"].as_str().unwrap().to_string();
    assert_eq!(reset_token.len(), 64);

    // The code is single use.
    let resp = app
        .send(Method::POST, "/auth/verify-otp", Some(verify), None)
        .await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);

    let new_password = "N3w!password";
    let resp = app
        .send(
            Method::POST,
            "/auth/reset-password",
            Some(json!({
                "email": "ada@example.com",
                "resetToken": reset_token,
                "newPassword": new_password,
            })),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);

    // Old sessions are gone, the new password works.
    let resp = app
        .send(
            Method::POST,
            "/auth/refresh",
            Some(json!({ "refreshToken": refresh })),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);

    let resp = app
        .send(
            Method::POST,
            "/auth/login",
            Some(json!({ "email": "ada@example.com", "password": new_password })),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
}
