//! Authentication domain models.
//!
//! These are internal domain models, distinct from the API crate's DTOs
//! (which carry `#[serde(rename)]` for camelCase etc.).

use serde::{Deserialize, Serialize};

/// Domain user. Never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// User with password hash (for internal auth flows).
#[derive(Debug, Clone)]
pub struct UserWithPassword {
    pub user: User,
    pub password_hash: String,
}

/// A session record, one per refresh lineage hop.
///
/// The refresh secret is stored as issued — it is itself the bearer
/// credential and the row's lookup key. Revocation is monotonic: the flag
/// is only ever flipped to true.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub refresh_secret: String,
    /// Advisory client metadata, non-authoritative.
    pub user_agent: Option<String>,
    /// Advisory client metadata, non-authoritative.
    pub ip: Option<String>,
    pub expires_at: chrono::DateTime<chrono::Utc>,
    pub revoked: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// JWT claims embedded in access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject — user ID (standard JWT `sub` claim).
    pub sub: String,
    /// User email.
    pub email: String,
    /// Session id, for the liveness check at the auth gate.
    pub sid: String,
    /// Expiry (unix timestamp).
    pub exp: i64,
    /// Issued at (unix timestamp).
    pub iat: i64,
}
