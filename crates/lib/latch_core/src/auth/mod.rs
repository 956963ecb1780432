//! Authentication and session-lifecycle logic.
//!
//! Provides password hashing, JWT management, and the database queries
//! shared by the API layer: user records and revocable refresh sessions.

pub mod jwt;
pub mod password;
pub mod queries;
pub mod sessions;

use thiserror::Error;

/// Authentication errors.
///
/// Credential mismatches are not errors at this layer — verification
/// returns `false`/`None`/absent and the API layer decides what the
/// caller sees. These variants cover genuine faults only.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Token error: {0}")]
    TokenError(String),

    #[error("Database error: {0}")]
    DbError(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}
