//! Rate-limit middleware for brute-force-able auth endpoints.
//!
//! Two independent keyspaces: caller address and claimed email. The
//! address check runs first; only if it passes does the email check run.
//! Either failure short-circuits before the handler, so a throttled
//! request never commits a side effect. Address-only limiting would let
//! a distributed attacker hammer one account, and email-only limiting
//! would let one shared NAT address lock out unrelated users — each key
//! covers the other's blind spot.

use std::net::SocketAddr;

use axum::{
    body::{Body, to_bytes},
    extract::{ConnectInfo, Request, State},
    http::HeaderValue,
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Duration;
use tracing::{debug, warn};

use latch_core::ratelimit::RateDecision;

use crate::AppState;
use crate::error::AppError;

/// Cap on buffered request bodies while peeking at the email field.
const MAX_BUFFERED_BODY: usize = 64 * 1024;

/// Axum middleware: fixed-window throttle keyed by caller address, then
/// by the email carried in the request body.
pub async fn rate_limit_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let config = &state.config.auth;
    let window = Duration::seconds(config.rate_limit_window_secs);
    let ip = client_ip(&request);

    debug!(ip = %ip, path = %request.uri().path(), "checking rate limit by address");
    let ip_decision = state
        .limiter
        .check(&format!("ip:{ip}"), config.rate_limit_max_attempts, window);
    if !ip_decision.allowed {
        warn!(ip = %ip, "rate limit exceeded for address");
        return Ok(throttled_response(config.rate_limit_max_attempts, &ip_decision));
    }

    // The email check needs the body; buffer it and hand the bytes back
    // to the handler untouched.
    let (parts, body) = request.into_parts();
    let bytes = to_bytes(body, MAX_BUFFERED_BODY)
        .await
        .map_err(|_| AppError::Validation("Request body too large".into()))?;

    if let Some(email) = email_from_body(&bytes) {
        let email_decision = state.limiter.check(
            &format!("email:{}", email.to_lowercase()),
            config.rate_limit_max_attempts,
            window,
        );
        if !email_decision.allowed {
            warn!(email = %email, "rate limit exceeded for identity");
            return Ok(throttled_response(
                config.rate_limit_max_attempts,
                &email_decision,
            ));
        }
    }

    let request = Request::from_parts(parts, Body::from(bytes));
    let mut response = next.run(request).await;
    apply_headers(&mut response, config.rate_limit_max_attempts, &ip_decision);
    Ok(response)
}

/// Caller address from connect info; "unknown" when the listener was not
/// set up with connect info (shared fallback key — still a throttle).
fn client_ip(request: &Request) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip().to_string())
        .unwrap_or_else(|| "unknown".into())
}

/// Pull the claimed email out of a JSON body, if there is one.
fn email_from_body(bytes: &[u8]) -> Option<String> {
    serde_json::from_slice::<serde_json::Value>(bytes)
        .ok()?
        .get("email")?
        .as_str()
        .map(str::to_owned)
}

fn throttled_response(limit: u32, decision: &RateDecision) -> Response {
    let mut response = AppError::Throttled {
        retry_after_secs: decision.retry_after_secs(),
    }
    .into_response();
    apply_headers(&mut response, limit, decision);
    response
}

fn apply_headers(response: &mut Response, limit: u32, decision: &RateDecision) {
    let headers = response.headers_mut();
    headers.insert("X-RateLimit-Limit", HeaderValue::from(limit));
    headers.insert("X-RateLimit-Remaining", HeaderValue::from(decision.remaining));
    if let Ok(value) = HeaderValue::from_str(&decision.reset_at.to_rfc3339()) {
        headers.insert("X-RateLimit-Reset", value);
    }
}
