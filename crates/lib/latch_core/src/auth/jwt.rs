//! JWT access-token generation and verification.
//!
//! Access tokens are short-lived HS256 credentials carrying
//! `{sub, email, sid}`. Verification pins the accepted algorithm: a token
//! declaring anything but HS256 in its header fails, whatever its
//! signature says.

use std::path::PathBuf;

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::distr::Alphanumeric;
use rand::{Rng, rng};
use tracing::info;

use super::AuthError;
use crate::models::auth::AccessClaims;

/// The one algorithm this service signs and accepts.
const SIGNING_ALGORITHM: Algorithm = Algorithm::HS256;

/// Generate a signed JWT access token for the given user and session.
pub fn generate_access_token(
    user_id: &str,
    email: &str,
    session_id: &str,
    secret: &[u8],
    ttl_secs: i64,
) -> Result<String, AuthError> {
    let now = Utc::now();
    let claims = AccessClaims {
        sub: user_id.to_string(),
        email: email.to_string(),
        sid: session_id.to_string(),
        exp: (now + Duration::seconds(ttl_secs)).timestamp(),
        iat: now.timestamp(),
    };
    encode(
        &Header::new(SIGNING_ALGORITHM),
        &claims,
        &EncodingKey::from_secret(secret),
    )
    .map_err(|e| AuthError::TokenError(format!("jwt encode: {e}")))
}

/// Verify a JWT access token, returning the claims on success.
///
/// `None` covers every rejection uniformly: bad signature, malformed
/// input, expiry, and a header naming a foreign algorithm.
pub fn verify_access_token(token: &str, secret: &[u8]) -> Option<AccessClaims> {
    let key = DecodingKey::from_secret(secret);
    let mut validation = Validation::new(SIGNING_ALGORITHM);
    validation.validate_exp = true;
    decode::<AccessClaims>(token, &key, &validation)
        .ok()
        .map(|data| data.claims)
}

/// Resolve the JWT secret: env var `JWT_SECRET` → `AUTH_SECRET` → persisted file.
pub fn resolve_jwt_secret() -> String {
    if let Ok(secret) = std::env::var("JWT_SECRET")
        && !secret.is_empty()
    {
        return secret;
    }
    if let Ok(secret) = std::env::var("AUTH_SECRET")
        && !secret.is_empty()
    {
        return secret;
    }
    // Generate and persist
    let secret_path = jwt_secret_path();
    if let Ok(existing) = std::fs::read_to_string(&secret_path) {
        let trimmed = existing.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    let secret: String = rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect();
    if let Some(parent) = secret_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let _ = std::fs::write(&secret_path, &secret);
    info!(path = %secret_path.display(), "generated new JWT secret");
    secret
}

/// Path to the persisted JWT secret file.
fn jwt_secret_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("latch")
        .join("jwt-secret")
}
