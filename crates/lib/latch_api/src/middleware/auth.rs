//! Authentication middleware — cookie extraction, JWT verification, and
//! the session liveness check.
//!
//! Verifying the token alone is not enough: access tokens are stateless
//! and stay cryptographically valid until expiry, so every authenticated
//! request also confirms the session named by the token's `sid` claim is
//! still live in the store. That one lookup per request is what makes
//! revocation take effect before the token's natural expiry.

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;

use latch_core::auth::{jwt, sessions};
use latch_core::models::auth::AccessClaims;

use crate::AppState;
use crate::error::AppError;
use crate::services::cookies::ACCESS_COOKIE;

/// Identity attached to request extensions after a successful gate pass.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub email: String,
}

/// Axum middleware: requires a valid access cookie referencing a live
/// session, and injects `AuthenticatedUser` into request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claims = verify_request(&state, request.headers())
        .await?
        .ok_or(AppError::Unauthenticated)?;

    request.extensions_mut().insert(AuthenticatedUser {
        user_id: claims.sub,
        email: claims.email,
    });

    Ok(next.run(request).await)
}

/// Axum middleware: same verification as `require_auth`, but any failure
/// silently continues with no identity attached — never blocks.
pub async fn optional_auth(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    if let Ok(Some(claims)) = verify_request(&state, request.headers()).await {
        request.extensions_mut().insert(AuthenticatedUser {
            user_id: claims.sub,
            email: claims.email,
        });
    }
    next.run(request).await
}

/// Shared verification core: cookie → signature/expiry → session liveness.
///
/// `Ok(None)` means no credential was presented at all; errors cover a
/// presented-but-rejected credential.
async fn verify_request(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<Option<AccessClaims>, AppError> {
    let jar = CookieJar::from_headers(headers);
    let Some(cookie) = jar.get(ACCESS_COOKIE) else {
        return Ok(None);
    };

    let claims = jwt::verify_access_token(cookie.value(), state.config.auth.jwt_secret.as_bytes())
        .ok_or(AppError::InvalidToken)?;

    // Liveness: the session referenced by the token must exist and not be
    // revoked.
    match sessions::find_by_id(&state.pool, &claims.sid).await? {
        Some(session) if !session.revoked => Ok(Some(claims)),
        _ => Err(AppError::SessionRevoked),
    }
}
