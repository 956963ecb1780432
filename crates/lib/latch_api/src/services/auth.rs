//! Authentication service — register/login/refresh/logout orchestration.
//!
//! Every flow that mints credentials goes through `issue_for`: create a
//! session row, then sign an access token naming it. Login and refresh
//! fail with one uniform error whatever actually went wrong, so neither
//! endpoint works as a user-existence or session-state oracle.

use sqlx::PgPool;
use tracing::{info, warn};

use latch_core::auth::sessions::{self, SessionMetadata};
use latch_core::auth::{jwt, password, queries};
use latch_core::models::auth::User;

use crate::config::AuthConfig;
use crate::error::{AppError, AppResult};

/// Credentials handed to a caller after register/login.
#[derive(Debug)]
pub struct IssuedCredentials {
    pub user: User,
    pub access_token: String,
    pub refresh_secret: String,
}

/// Credentials handed to a caller after a refresh rotation.
#[derive(Debug)]
pub struct RefreshedCredentials {
    pub access_token: String,
    pub refresh_secret: String,
}

/// Register a new user account and open its first session.
pub async fn register(
    pool: &PgPool,
    config: &AuthConfig,
    name: &str,
    email: &str,
    plaintext: &str,
    metadata: &SessionMetadata,
) -> AppResult<IssuedCredentials> {
    let name = name.trim();
    let email = email.trim();
    if name.is_empty() || email.is_empty() || plaintext.is_empty() {
        return Err(AppError::Validation(
            "Name, email and password are required".into(),
        ));
    }
    if plaintext.len() < config.password_min_length {
        return Err(AppError::Validation(format!(
            "Password must be at least {} characters",
            config.password_min_length
        )));
    }

    if queries::email_exists(pool, email).await? {
        warn!(email, "registration rejected, email already taken");
        return Err(AppError::Conflict("Email already registered".into()));
    }

    let hash = password::hash_password(plaintext, config.bcrypt_cost)?;
    let user = queries::create_user(pool, name, email, &hash).await?;
    info!(user_id = %user.id, "user created");

    issue_for(pool, config, user, metadata).await
}

/// Authenticate with email + password and open a session.
pub async fn login(
    pool: &PgPool,
    config: &AuthConfig,
    email: &str,
    plaintext: &str,
    metadata: &SessionMetadata,
) -> AppResult<IssuedCredentials> {
    if email.is_empty() || plaintext.is_empty() {
        return Err(AppError::Validation("Email and password are required".into()));
    }

    // Same error for unknown email and wrong password.
    let Some(found) = queries::find_user_by_email(pool, email).await? else {
        return Err(AppError::InvalidCredentials);
    };
    if !password::verify_password(plaintext, &found.password_hash)? {
        return Err(AppError::InvalidCredentials);
    }

    info!(user_id = %found.user.id, "login succeeded");
    issue_for(pool, config, found.user, metadata).await
}

/// Rotate a refresh secret: single-use exchange for a fresh session and
/// access token. Any rotate failure is the uniform credentials error.
pub async fn refresh(
    pool: &PgPool,
    config: &AuthConfig,
    old_secret: &str,
    metadata: &SessionMetadata,
) -> AppResult<RefreshedCredentials> {
    let Some(rotated) = sessions::rotate(
        pool,
        old_secret,
        metadata,
        config.refresh_expiry_days,
        config.refresh_secret_len,
    )
    .await?
    else {
        return Err(AppError::InvalidCredentials);
    };

    let access_token = jwt::generate_access_token(
        &rotated.user_id,
        &rotated.email,
        &rotated.session_id,
        config.jwt_secret.as_bytes(),
        config.access_ttl_secs,
    )?;

    info!(user_id = %rotated.user_id, session_id = %rotated.session_id, "session rotated");
    Ok(RefreshedCredentials {
        access_token,
        refresh_secret: rotated.refresh_secret,
    })
}

/// Revoke the session named by a refresh secret, if one was presented.
/// Always succeeds; safe to call unauthenticated and to repeat.
pub async fn logout(pool: &PgPool, refresh_secret: Option<&str>) -> AppResult<()> {
    if let Some(secret) = refresh_secret {
        sessions::revoke_by_token(pool, secret).await?;
    }
    Ok(())
}

/// Revoke every live session of a user ("log out everywhere").
pub async fn logout_all(pool: &PgPool, user_id: &str) -> AppResult<u64> {
    let revoked = sessions::revoke_all_for_user(pool, user_id).await?;
    info!(user_id, revoked, "revoked all sessions");
    Ok(revoked)
}

/// Fetch the authenticated user's record.
pub async fn me(pool: &PgPool, user_id: &str) -> AppResult<User> {
    queries::get_user_by_id(pool, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}

/// Create a session and sign an access token naming it.
async fn issue_for(
    pool: &PgPool,
    config: &AuthConfig,
    user: User,
    metadata: &SessionMetadata,
) -> AppResult<IssuedCredentials> {
    let session = sessions::create_session(
        pool,
        &user.id,
        metadata,
        config.refresh_expiry_days,
        config.refresh_secret_len,
    )
    .await?;

    let access_token = jwt::generate_access_token(
        &user.id,
        &user.email,
        &session.id,
        config.jwt_secret.as_bytes(),
        config.access_ttl_secs,
    )?;

    info!(user_id = %user.id, session_id = %session.id, "session created");
    Ok(IssuedCredentials {
        user,
        access_token,
        refresh_secret: session.refresh_secret,
    })
}
