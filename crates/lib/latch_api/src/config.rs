//! API server configuration.

use latch_core::auth::jwt::resolve_jwt_secret;
use latch_core::auth::password::DEFAULT_BCRYPT_COST;

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:3100").
    pub bind_addr: String,
    /// PostgreSQL connection URL.
    pub pg_connection_url: String,
    /// Authentication parameters.
    pub auth: AuthConfig,
}

/// Authentication parameters: token lifetimes, hashing cost, throttle
/// windows. One value per recognized option; the signing algorithm is
/// fixed (HS256) and deliberately not configurable per request.
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// JWT signing secret.
    pub jwt_secret: String,
    /// Access token lifetime in seconds.
    pub access_ttl_secs: i64,
    /// Refresh secret entropy in bytes.
    pub refresh_secret_len: usize,
    /// Refresh session lifetime in days.
    pub refresh_expiry_days: i64,
    /// Minimum accepted password length.
    pub password_min_length: usize,
    /// bcrypt cost factor.
    pub bcrypt_cost: u32,
    /// Rate-limit window in seconds.
    pub rate_limit_window_secs: i64,
    /// Maximum attempts per rate-limit window.
    pub rate_limit_max_attempts: u32,
    /// Days a revoked session is retained before the sweep deletes it.
    pub session_retention_grace_days: i32,
}

impl AuthConfig {
    /// Defaults for every knob except the secret: 15-minute access
    /// tokens, 30-day refresh sessions with 64-byte secrets, 8-char
    /// password minimum, bcrypt cost 12, 5 attempts per minute.
    pub fn with_secret(jwt_secret: String) -> Self {
        Self {
            jwt_secret,
            access_ttl_secs: 15 * 60,
            refresh_secret_len: 64,
            refresh_expiry_days: 30,
            password_min_length: 8,
            bcrypt_cost: DEFAULT_BCRYPT_COST,
            rate_limit_window_secs: 60,
            rate_limit_max_attempts: 5,
            session_retention_grace_days: 7,
        }
    }
}

impl ApiConfig {
    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// | Variable           | Default                                     |
    /// |--------------------|---------------------------------------------|
    /// | `BIND_ADDR`        | `127.0.0.1:3100`                            |
    /// | `DATABASE_URL`     | `postgres://localhost:5432/latch`           |
    /// | `JWT_SECRET` / `AUTH_SECRET` | generated & persisted to file     |
    pub fn from_env() -> Self {
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3100".into()),
            pg_connection_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost:5432/latch".into()),
            auth: AuthConfig::with_secret(resolve_jwt_secret()),
        }
    }
}
