//! Application error types.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::models::ErrorResponse;

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level errors with HTTP status mapping.
///
/// `InvalidCredentials` deliberately covers both a failed login and a
/// failed refresh — unknown identity, wrong password, and an
/// unknown/rotated/expired refresh secret all produce the same shape, so
/// callers learn nothing about which part was wrong.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Not authenticated")]
    Unauthenticated,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Invalid or revoked session")]
    SessionRevoked,

    #[error("Too many attempts")]
    Throttled { retry_after_secs: i64 },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal server error")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, message) = match &self {
            AppError::Validation(m) => (StatusCode::BAD_REQUEST, "validation_error", m.clone()),
            AppError::Conflict(m) => (StatusCode::CONFLICT, "conflict", m.clone()),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "invalid_credentials",
                "Invalid credentials".to_string(),
            ),
            AppError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                "unauthenticated",
                "Not authenticated".to_string(),
            ),
            AppError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "invalid_token",
                "Invalid or expired token".to_string(),
            ),
            AppError::SessionRevoked => (
                StatusCode::UNAUTHORIZED,
                "session_revoked",
                "Invalid or revoked session".to_string(),
            ),
            AppError::Throttled { .. } => (
                StatusCode::TOO_MANY_REQUESTS,
                "throttled",
                "Too many attempts. Try again later.".to_string(),
            ),
            AppError::NotFound(m) => (StatusCode::NOT_FOUND, "not_found", m.clone()),
            AppError::Internal(m) => {
                tracing::error!(error = %m, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error".to_string(),
                )
            }
        };

        let retry_after = match &self {
            AppError::Throttled { retry_after_secs } => Some((*retry_after_secs).max(0)),
            _ => None,
        };

        let body = Json(ErrorResponse {
            error: error.to_string(),
            message,
            retry_after,
        });
        let mut response = (status, body).into_response();
        if let Some(secs) = retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs as u64));
        }
        response
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => AppError::NotFound("row not found".into()),
            _ => AppError::Internal(e.to_string()),
        }
    }
}

impl From<latch_core::auth::AuthError> for AppError {
    fn from(e: latch_core::auth::AuthError) -> Self {
        match e {
            // Signing failures are server faults, never the caller's.
            latch_core::auth::AuthError::TokenError(msg) => AppError::Internal(msg),
            latch_core::auth::AuthError::DbError(e) => AppError::from(e),
            latch_core::auth::AuthError::Internal(msg) => AppError::Internal(msg),
        }
    }
}
