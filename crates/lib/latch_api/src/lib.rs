//! # latch_api
//!
//! HTTP API library for Latch.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};

use latch_core::ratelimit::RateLimiter;

use crate::config::ApiConfig;
use crate::handlers::auth;

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool.
    pub pool: PgPool,
    /// API configuration.
    pub config: ApiConfig,
    /// Process-local rate-limit counters.
    pub limiter: Arc<RateLimiter>,
}

impl AppState {
    /// Build state with a fresh rate limiter.
    pub fn new(pool: PgPool, config: ApiConfig) -> Self {
        Self {
            pool,
            config,
            limiter: Arc::new(RateLimiter::new()),
        }
    }
}

/// Run embedded database migrations.
///
/// Delegates to `latch_core::migrate::migrate()` which owns the migration files.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    latch_core::migrate::migrate(pool).await
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Credential-check endpoints sit behind the brute-force gate.
    let gated = Router::new()
        .route("/auth/register", post(auth::register_handler))
        .route("/auth/login", post(auth::login_handler))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::rate_limit::rate_limit_auth,
        ));

    // Refresh and logout authenticate by the refresh cookie itself.
    let public = Router::new()
        .route("/auth/refresh", post(auth::refresh_handler))
        .route("/auth/logout", post(auth::logout_handler));

    // Protected routes (require a live session)
    let protected = Router::new()
        .route("/auth/me", get(auth::me_handler))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    Router::new()
        .merge(gated)
        .merge(public)
        .merge(protected)
        .layer(cors)
        .with_state(state)
}
