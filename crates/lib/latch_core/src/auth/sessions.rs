//! Session lifecycle: creation, rotation, revocation, and the sweep.
//!
//! A session binds one refresh secret to a user. Rotation is the core
//! state machine: the old row is revoked by an atomic claiming UPDATE
//! before the replacement row exists, so under concurrent rotations of
//! the same secret exactly one caller wins and the rest observe the
//! already-revoked state. Losing the create after the claim only costs
//! the caller a fresh login.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sqlx::PgPool;
use tracing::debug;

use super::AuthError;
use crate::models::auth::Session;
use crate::uuid::uuidv7;

/// Attempts at creating a session before a persistent unique-violation on
/// the refresh secret is treated as an internal fault. With 64-byte
/// secrets a single collision is already beyond plausible.
const CREATE_RETRY_LIMIT: u32 = 3;

/// Client metadata attached to a session. Advisory only.
#[derive(Debug, Clone, Default)]
pub struct SessionMetadata {
    pub user_agent: Option<String>,
    pub ip: Option<String>,
}

/// A freshly created session: its id plus the plaintext refresh secret.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub id: String,
    pub refresh_secret: String,
}

/// Result of a successful rotation.
#[derive(Debug, Clone)]
pub struct RotatedSession {
    pub session_id: String,
    pub refresh_secret: String,
    pub user_id: String,
    pub email: String,
}

/// Generate a cryptographically random refresh secret
/// (`len_bytes` of entropy, base64url without padding).
pub fn generate_refresh_secret(len_bytes: usize) -> String {
    let mut bytes = vec![0u8; len_bytes];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Create a session for a user, returning the id and plaintext secret.
///
/// Retries on a refresh-secret unique violation instead of surfacing it.
pub async fn create_session(
    pool: &PgPool,
    user_id: &str,
    metadata: &SessionMetadata,
    expiry_days: i64,
    secret_len: usize,
) -> Result<NewSession, AuthError> {
    let expires_at = Utc::now() + Duration::days(expiry_days);

    for attempt in 0..CREATE_RETRY_LIMIT {
        let id = uuidv7();
        let secret = generate_refresh_secret(secret_len);

        let result = sqlx::query(
            "INSERT INTO sessions (id, user_id, refresh_secret, user_agent, ip, expires_at) \
             VALUES ($1, $2::uuid, $3, $4, $5, $6)",
        )
        .bind(id)
        .bind(user_id)
        .bind(&secret)
        .bind(&metadata.user_agent)
        .bind(&metadata.ip)
        .bind(expires_at)
        .execute(pool)
        .await;

        match result {
            Ok(_) => {
                return Ok(NewSession {
                    id: id.to_string(),
                    refresh_secret: secret,
                });
            }
            Err(e) if is_unique_violation(&e) => {
                debug!(attempt, "refresh secret collision, regenerating");
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(AuthError::Internal(
        "refresh secret collision persisted across retries".into(),
    ))
}

/// Rotate a refresh secret: atomically revoke the session it names and
/// create a replacement carrying forward metadata.
///
/// Returns `None` when the secret is unknown, revoked, or expired — the
/// three cases are indistinguishable to the caller. An expired row found
/// on the miss path is lazily revoked.
pub async fn rotate(
    pool: &PgPool,
    old_secret: &str,
    metadata: &SessionMetadata,
    expiry_days: i64,
    secret_len: usize,
) -> Result<Option<RotatedSession>, AuthError> {
    // Atomic claim: exactly one concurrent caller flips revoked for a
    // given live secret; everyone else sees no row.
    let claimed = sqlx::query_as::<_, (String, Option<String>, Option<String>)>(
        "UPDATE sessions SET revoked = TRUE \
         WHERE refresh_secret = $1 AND NOT revoked AND expires_at > now() \
         RETURNING user_id::text, user_agent, ip",
    )
    .bind(old_secret)
    .fetch_optional(pool)
    .await?;

    let Some((user_id, old_agent, old_ip)) = claimed else {
        // Lazy cleanup: an expired-but-unrevoked row is revoked here and
        // stays a miss, not a distinct error.
        sqlx::query(
            "UPDATE sessions SET revoked = TRUE \
             WHERE refresh_secret = $1 AND NOT revoked AND expires_at <= now()",
        )
        .bind(old_secret)
        .execute(pool)
        .await?;
        return Ok(None);
    };

    let Some(email) = super::queries::get_user_email(pool, &user_id).await? else {
        // Owner deleted out from under the session; the claim already
        // killed the old secret, so this is just a miss.
        return Ok(None);
    };

    let merged = SessionMetadata {
        user_agent: metadata.user_agent.clone().or(old_agent),
        ip: metadata.ip.clone().or(old_ip),
    };
    let new = create_session(pool, &user_id, &merged, expiry_days, secret_len).await?;

    Ok(Some(RotatedSession {
        session_id: new.id,
        refresh_secret: new.refresh_secret,
        user_id,
        email,
    }))
}

/// Fetch a session by id.
pub async fn find_by_id(pool: &PgPool, session_id: &str) -> Result<Option<Session>, AuthError> {
    let row = sqlx::query_as::<
        _,
        (
            String,
            String,
            String,
            Option<String>,
            Option<String>,
            DateTime<Utc>,
            bool,
            DateTime<Utc>,
        ),
    >(
        "SELECT id::text, user_id::text, refresh_secret, user_agent, ip, \
                expires_at, revoked, created_at \
         FROM sessions WHERE id = $1::uuid",
    )
    .bind(session_id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(
        |(id, user_id, refresh_secret, user_agent, ip, expires_at, revoked, created_at)| Session {
            id,
            user_id,
            refresh_secret,
            user_agent,
            ip,
            expires_at,
            revoked,
            created_at,
        },
    ))
}

/// Fetch a session by refresh secret.
pub async fn find_by_refresh_secret(
    pool: &PgPool,
    refresh_secret: &str,
) -> Result<Option<Session>, AuthError> {
    let row = sqlx::query_as::<
        _,
        (
            String,
            String,
            String,
            Option<String>,
            Option<String>,
            DateTime<Utc>,
            bool,
            DateTime<Utc>,
        ),
    >(
        "SELECT id::text, user_id::text, refresh_secret, user_agent, ip, \
                expires_at, revoked, created_at \
         FROM sessions WHERE refresh_secret = $1",
    )
    .bind(refresh_secret)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(
        |(id, user_id, refresh_secret, user_agent, ip, expires_at, revoked, created_at)| Session {
            id,
            user_id,
            refresh_secret,
            user_agent,
            ip,
            expires_at,
            revoked,
            created_at,
        },
    ))
}

/// Revoke a session by id. Revoking an already-revoked session is a no-op
/// success.
pub async fn revoke_session(pool: &PgPool, session_id: &str) -> Result<(), AuthError> {
    sqlx::query("UPDATE sessions SET revoked = TRUE WHERE id = $1::uuid AND NOT revoked")
        .bind(session_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Revoke a session by refresh secret. Idempotent.
pub async fn revoke_by_token(pool: &PgPool, refresh_secret: &str) -> Result<(), AuthError> {
    sqlx::query("UPDATE sessions SET revoked = TRUE WHERE refresh_secret = $1 AND NOT revoked")
        .bind(refresh_secret)
        .execute(pool)
        .await?;
    Ok(())
}

/// Revoke all non-revoked sessions of a user ("log out everywhere").
/// Returns the number of sessions revoked.
pub async fn revoke_all_for_user(pool: &PgPool, user_id: &str) -> Result<u64, AuthError> {
    let result =
        sqlx::query("UPDATE sessions SET revoked = TRUE WHERE user_id = $1::uuid AND NOT revoked")
            .bind(user_id)
            .execute(pool)
            .await?;
    Ok(result.rows_affected())
}

/// Delete sessions that are expired, or revoked and older than the
/// retention grace period. Returns the number of rows removed.
///
/// Safe to run concurrently with every other operation — nothing here
/// assumes a swept row still exists.
pub async fn sweep_expired(pool: &PgPool, grace_days: i32) -> Result<u64, AuthError> {
    let result = sqlx::query(
        "DELETE FROM sessions \
         WHERE expires_at < now() \
            OR (revoked AND created_at < now() - make_interval(days => $1))",
    )
    .bind(grace_days)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_secret_has_requested_entropy() {
        // 64 bytes → 86 base64url chars without padding.
        let secret = generate_refresh_secret(64);
        assert_eq!(secret.len(), 86);
    }

    #[test]
    fn refresh_secret_is_url_safe() {
        let secret = generate_refresh_secret(64);
        assert!(
            secret
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn refresh_secrets_do_not_repeat() {
        let a = generate_refresh_secret(64);
        let b = generate_refresh_secret(64);
        assert_ne!(a, b);
    }
}
