//! Authentication request handlers.
//!
//! Thin cookie-aware wrappers over `services::auth`: each handler
//! delegates to the service, then sets or clears the credential cookies
//! on the way out.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::{
    Extension, Json,
    extract::{ConnectInfo, FromRequestParts, State},
    http::{StatusCode, header, request::Parts},
};
use axum_extra::extract::cookie::CookieJar;

use latch_core::auth::sessions::SessionMetadata;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{AuthUserResponse, LoginRequest, MessageResponse, RegisterRequest};
use crate::services::auth;
use crate::services::cookies::{
    REFRESH_COOKIE, access_cookie, clear_access_cookie, clear_refresh_cookie, refresh_cookie,
};

/// Advisory client metadata (user agent, peer address) pulled from the
/// request. Extraction never fails; absent pieces stay `None`.
#[derive(Debug, Clone)]
pub struct ClientMeta(pub SessionMetadata);

impl<S> FromRequestParts<S> for ClientMeta
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_agent = parts
            .headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let ip = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|info| info.0.ip().to_string());
        Ok(ClientMeta(SessionMetadata { user_agent, ip }))
    }
}

/// `POST /auth/register` — create a user account, open its first
/// session, and set both credential cookies.
pub async fn register_handler(
    State(state): State<AppState>,
    ClientMeta(meta): ClientMeta,
    jar: CookieJar,
    Json(body): Json<RegisterRequest>,
) -> AppResult<(StatusCode, CookieJar, Json<AuthUserResponse>)> {
    let issued = auth::register(
        &state.pool,
        &state.config.auth,
        &body.name,
        &body.email,
        &body.password,
        &meta,
    )
    .await?;

    let jar = set_credentials(jar, &state, &issued.access_token, &issued.refresh_secret);
    Ok((
        StatusCode::CREATED,
        jar,
        Json(AuthUserResponse {
            user: issued.user.into(),
        }),
    ))
}

/// `POST /auth/login` — authenticate and set both credential cookies.
pub async fn login_handler(
    State(state): State<AppState>,
    ClientMeta(meta): ClientMeta,
    jar: CookieJar,
    Json(body): Json<LoginRequest>,
) -> AppResult<(CookieJar, Json<AuthUserResponse>)> {
    let issued = auth::login(
        &state.pool,
        &state.config.auth,
        &body.email,
        &body.password,
        &meta,
    )
    .await?;

    let jar = set_credentials(jar, &state, &issued.access_token, &issued.refresh_secret);
    Ok((
        jar,
        Json(AuthUserResponse {
            user: issued.user.into(),
        }),
    ))
}

/// `POST /auth/refresh` — rotate the refresh cookie and reissue the
/// access cookie. The old refresh secret is dead after this call.
pub async fn refresh_handler(
    State(state): State<AppState>,
    ClientMeta(meta): ClientMeta,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<MessageResponse>)> {
    let old_secret = jar
        .get(REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .ok_or(AppError::InvalidCredentials)?;

    let refreshed = auth::refresh(&state.pool, &state.config.auth, &old_secret, &meta).await?;

    let jar = set_credentials(
        jar,
        &state,
        &refreshed.access_token,
        &refreshed.refresh_secret,
    );
    Ok((
        jar,
        Json(MessageResponse {
            message: "Tokens refreshed".into(),
        }),
    ))
}

/// `POST /auth/logout` — revoke the presented refresh secret (if any)
/// and clear both cookies. Idempotent; never fails on a missing or
/// already-revoked secret.
pub async fn logout_handler(
    State(state): State<AppState>,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<MessageResponse>)> {
    let secret = jar.get(REFRESH_COOKIE).map(|c| c.value().to_string());
    auth::logout(&state.pool, secret.as_deref()).await?;

    let jar = jar.add(clear_access_cookie()).add(clear_refresh_cookie());
    Ok((
        jar,
        Json(MessageResponse {
            message: "Logged out".into(),
        }),
    ))
}

/// `GET /auth/me` — the authenticated user's record. Runs behind
/// `require_auth`.
pub async fn me_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> AppResult<Json<AuthUserResponse>> {
    let user = auth::me(&state.pool, &user.user_id).await?;
    Ok(Json(AuthUserResponse { user: user.into() }))
}

fn set_credentials(
    jar: CookieJar,
    state: &AppState,
    access_token: &str,
    refresh_secret: &str,
) -> CookieJar {
    let config = &state.config.auth;
    jar.add(access_cookie(access_token, config.access_ttl_secs))
        .add(refresh_cookie(refresh_secret, config.refresh_expiry_days))
}
