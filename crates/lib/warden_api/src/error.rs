//! Application error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::models::ErrorResponse;

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level errors with HTTP status mapping.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Locked: {0}")]
    Locked(String),

    #[error("Too many requests: {0}")]
    TooManyRequests(String),

    #[error("Internal server error")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, message) = match &self {
            AppError::Validation(m) => (StatusCode::BAD_REQUEST, "validation_error", m.as_str()),
            AppError::NotFound(m) => (StatusCode::NOT_FOUND, "not_found", m.as_str()),
            AppError::Conflict(m) => (StatusCode::CONFLICT, "conflict", m.as_str()),
            AppError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, "unauthorized", m.as_str()),
            AppError::Forbidden(m) => (StatusCode::FORBIDDEN, "forbidden", m.as_str()),
            AppError::Locked(m) => (StatusCode::LOCKED, "locked", m.as_str()),
            AppError::TooManyRequests(m) => {
                (StatusCode::TOO_MANY_REQUESTS, "too_many_requests", m.as_str())
            }
            AppError::Internal(detail) => {
                error!(detail = %detail, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error",
                )
            }
        };
        let body = Json(ErrorResponse {
            error: error.to_string(),
            message: message.to_string(),
        });
        (status, body).into_response()
    }
}

impl From<warden_core::auth::AuthError> for AppError {
    fn from(e: warden_core::auth::AuthError) -> Self {
        use warden_core::auth::AuthError;
        match e {
            AuthError::CredentialError => AppError::Unauthorized("Invalid credentials".into()),
            AuthError::TokenError(_) => AppError::Unauthorized("Invalid or expired token".into()),
            AuthError::ValidationError(msg) => AppError::Validation(msg),
            AuthError::MissingSecret => AppError::Internal("token signing secret missing".into()),
            AuthError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl From<warden_core::users::StoreError> for AppError {
    fn from(e: warden_core::users::StoreError) -> Self {
        use warden_core::users::StoreError;
        match e {
            StoreError::DuplicateEmail => AppError::Conflict("Email already registered".into()),
            StoreError::NotFound(id) => AppError::NotFound(format!("user {id}")),
            StoreError::Unavailable(msg) => AppError::Internal(msg),
        }
    }
}
