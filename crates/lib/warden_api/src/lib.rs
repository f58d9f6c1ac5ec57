//! # warden_api
//!
//! HTTP API library for Warden.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use std::sync::Arc;

use axum::Router;
use axum::http::{HeaderName, HeaderValue, Method, header};
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;
use warden_core::audit::ActionLog;
use warden_core::guardrail::Guardrail;
use warden_core::notify::OtpNotifier;
use warden_core::users::UserStore;

use crate::config::ApiConfig;
use crate::handlers::{agent, auth, csrf};
use crate::middleware::csrf::CSRF_HEADER;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// API configuration.
    pub config: ApiConfig,
    /// User-record store.
    pub users: Arc<dyn UserStore>,
    /// OTP delivery channel.
    pub notifier: Arc<dyn OtpNotifier>,
    /// Input/output guardrail and sensitive-op rate limiter.
    pub guardrail: Arc<Guardrail>,
    /// Agent action log.
    pub actions: ActionLog,
}

fn cors_layer(config: &ApiConfig) -> CorsLayer {
    let origin = config
        .cors_origin
        .as_deref()
        .and_then(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(origin, error = %e, "ignoring invalid CORS_ORIGIN");
                None
            }
        });

    match origin {
        // Credentialed requests need an explicit origin and header list.
        Some(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_credentials(true)
            .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
            .allow_headers([
                header::AUTHORIZATION,
                header::CONTENT_TYPE,
                HeaderName::from_static(CSRF_HEADER),
            ]),
        None => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    }
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    // CSRF token issuance
    let csrf_routes = Router::new()
        .route("/api/csrf-token", get(csrf::csrf_token_handler))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::csrf::set_csrf_token,
        ));

    // Public routes (no auth required)
    let public = Router::new()
        .route("/auth/register", post(auth::register_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/refresh", post(auth::refresh_handler))
        .route("/auth/forgot-password", post(auth::forgot_password_handler))
        .route("/auth/verify-otp", post(auth::verify_otp_handler))
        .route("/auth/reset-password", post(auth::reset_password_handler));

    // Protected routes (require auth)
    let protected = Router::new()
        .route("/auth/logout", post(auth::logout_handler))
        .route("/auth/me", get(auth::me_handler))
        .route("/agent/validate-input", post(agent::validate_input_handler))
        .route("/agent/validate-output", post(agent::validate_output_handler))
        .route("/agent/filter", post(agent::filter_handler))
        .route("/agent/preflight", post(agent::preflight_handler))
        .route(
            "/agent/actions",
            get(agent::list_actions_handler)
                .post(agent::record_action_handler)
                .delete(agent::clear_actions_handler),
        )
        .route("/agent/actions/stats", get(agent::action_stats_handler))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    let cors = cors_layer(&state.config);

    Router::new()
        .merge(csrf_routes)
        .merge(public)
        .merge(protected)
        .layer(axum::middleware::from_fn(middleware::csrf::validate_csrf_token))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
