//! Request and response DTOs.
//!
//! Wire shapes use camelCase field names; domain models live in
//! `latch_core::models`.

use serde::{Deserialize, Serialize};

/// `POST /auth/register` request body.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// `POST /auth/login` request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// User as exposed to callers. Never carries the password hash.
#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

impl From<latch_core::models::auth::User> for UserResponse {
    fn from(user: latch_core::models::auth::User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// Envelope for endpoints returning the authenticated/created user.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthUserResponse {
    pub user: UserResponse,
}

/// Generic message envelope (refresh, logout).
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Error envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    /// Seconds until a throttled caller may retry. Only set on 429s.
    #[serde(
        rename = "retryAfter",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub retry_after: Option<i64>,
}
