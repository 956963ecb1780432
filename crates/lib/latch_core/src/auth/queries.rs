//! User-record database queries.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::AuthError;
use crate::models::auth::{User, UserWithPassword};

/// Fetch a user by email, including the password hash.
pub async fn find_user_by_email(
    pool: &PgPool,
    email: &str,
) -> Result<Option<UserWithPassword>, AuthError> {
    let row = sqlx::query_as::<_, (String, String, String, String, DateTime<Utc>)>(
        "SELECT id::text, name, email, password_hash, created_at FROM users WHERE email = $1",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(|(id, name, email, password_hash, created_at)| UserWithPassword {
        user: User {
            id,
            name,
            email,
            created_at,
        },
        password_hash,
    }))
}

/// Create a new user, returning the stored record (no hash).
pub async fn create_user(
    pool: &PgPool,
    name: &str,
    email: &str,
    password_hash: &str,
) -> Result<User, AuthError> {
    let (id, created_at) = sqlx::query_as::<_, (String, DateTime<Utc>)>(
        "INSERT INTO users (name, email, password_hash) VALUES ($1, $2, $3) \
         RETURNING id::text, created_at",
    )
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .fetch_one(pool)
    .await?;
    Ok(User {
        id,
        name: name.to_string(),
        email: email.to_string(),
        created_at,
    })
}

/// Check whether an email is already registered.
pub async fn email_exists(pool: &PgPool, email: &str) -> Result<bool, AuthError> {
    let exists =
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(pool)
            .await?;
    Ok(exists)
}

/// Fetch a user by id.
pub async fn get_user_by_id(pool: &PgPool, user_id: &str) -> Result<Option<User>, AuthError> {
    let row = sqlx::query_as::<_, (String, String, DateTime<Utc>)>(
        "SELECT name, email, created_at FROM users WHERE id = $1::uuid",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(|(name, email, created_at)| User {
        id: user_id.to_string(),
        name,
        email,
        created_at,
    }))
}

/// Fetch just a user's email by id.
pub async fn get_user_email(pool: &PgPool, user_id: &str) -> Result<Option<String>, AuthError> {
    let email = sqlx::query_scalar::<_, String>("SELECT email FROM users WHERE id = $1::uuid")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(email)
}
