//! Shared harness for router integration tests: in-memory stores, a
//! capturing OTP notifier and a client that carries the CSRF cookie/header.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, Method, Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;
use warden_api::config::ApiConfig;
use warden_api::middleware::csrf::CSRF_HEADER;
use warden_api::{AppState, router};
use warden_core::audit::ActionLog;
use warden_core::auth::AuthError;
use warden_core::guardrail::Guardrail;
use warden_core::notify::OtpNotifier;
use warden_core::users::{InMemoryUserStore, UserStore};

pub const PASSWORD: &str = "Sup3r$ecret";

/// Records every OTP instead of sending it.
#[derive(Default)]
pub struct CapturingNotifier {
    pub sent: Mutex<Vec<(String, String)>>,
}

impl CapturingNotifier {
    pub fn last_otp(&self) -> Option<String> {
        self.sent.lock().unwrap().last().map(|(_, otp)| otp.clone())
    }
}

#[async_trait]
impl OtpNotifier for CapturingNotifier {
    async fn send_otp(&self, email: &str, otp: &str) -> Result<(), AuthError> {
        self.sent
            .lock()
            .unwrap()
            .push((email.to_string(), otp.to_string()));
        Ok(())
    }
}

pub fn test_config() -> ApiConfig {
    ApiConfig {
        bind_addr: "127.0.0.1:0".into(),
        jwt_secret: "test-secret".into(),
        production: false,
        password_hash_cost: 4,
        admin_user_ids: vec![],
        cors_origin: None,
    }
}

/// A router plus handles on its collaborators.
pub struct TestApp {
    pub app: Router,
    pub users: Arc<InMemoryUserStore>,
    pub notifier: Arc<CapturingNotifier>,
    pub actions: ActionLog,
    pub csrf: String,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    /// `Set-Cookie` values whose name matches.
    pub fn set_cookie(&self, name: &str) -> Option<String> {
        self.headers
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|v| v.starts_with(&format!("{name}=")))
            .map(String::from)
    }
}

/// Value part of a `Set-Cookie` header line.
pub fn cookie_value(set_cookie: &str) -> &str {
    let pair = set_cookie.split(';').next().unwrap_or_default();
    pair.split_once('=').map(|(_, v)| v).unwrap_or_default()
}

impl TestApp {
    pub async fn new() -> Self {
        let users = Arc::new(InMemoryUserStore::new());
        let notifier = Arc::new(CapturingNotifier::default());
        let actions = ActionLog::in_memory();
        let state = AppState {
            config: test_config(),
            users: users.clone(),
            notifier: notifier.clone(),
            guardrail: Arc::new(Guardrail::in_memory()),
            actions: actions.clone(),
        };

        let mut app = Self {
            app: router(state),
            users,
            notifier,
            actions,
            csrf: String::new(),
        };
        let resp = app.raw(Method::GET, "/api/csrf-token", None, &[]).await;
        assert_eq!(resp.status, StatusCode::OK);
        app.csrf = resp.body["csrfToken"].as_str().unwrap().to_string();
        app
    }

    pub async fn user_count(&self) -> usize {
        self.users.count().await.unwrap()
    }

    /// Send a request with arbitrary extra headers and no implicit CSRF.
    pub async fn raw(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        headers: &[(&str, String)],
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, value);
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let resp = self
            .app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .expect("request");
        let status = resp.status();
        let headers = resp.headers().clone();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .expect("read body");
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Send a request carrying the CSRF pair and an optional bearer token.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        bearer: Option<&str>,
    ) -> TestResponse {
        let mut headers = vec![
            (COOKIE.as_str(), format!("XSRF-TOKEN={}", self.csrf)),
            (CSRF_HEADER, self.csrf.clone()),
        ];
        if let Some(token) = bearer {
            headers.push((AUTHORIZATION.as_str(), format!("Bearer {token}")));
        }
        self.raw(method, uri, body, &headers).await
    }

    /// Register an account and return its access and refresh tokens.
    pub async fn register(&self, email: &str) -> (String, String) {
        let resp = self
            .send(
                Method::POST,
                "/auth/register",
                Some(json!({ "email": email, "password": PASSWORD })),
                None,
            )
            .await;
        assert_eq!(resp.status, StatusCode::OK, "register: {}", resp.body);
        (
            resp.body["accessToken"].as_str().unwrap().to_string(),
            resp.body["refreshToken"].as_str().unwrap().to_string(),
        )
    }
}
