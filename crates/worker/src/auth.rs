// SPDX-License-Identifier: MIT

//! Bearer-token auth middleware: constant-time comparison, query-string
//! token for WebSocket upgrades, a short exemption list for
//! unauthenticated routes.

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use cw_core::ErrorCode;

use crate::state::AppState;

/// Constant-time byte comparison so a timing side channel can't leak how
/// many leading bytes of the token an attacker guessed correctly.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

fn validate_bearer(headers: &HeaderMap, expected: Option<&str>) -> Result<(), Response> {
    let Some(expected) = expected else { return Ok(()) };

    let provided = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    match provided {
        Some(token) if constant_time_eq(token.as_bytes(), expected.as_bytes()) => Ok(()),
        _ => Err(ErrorCode::Unauthorized.to_http_response("missing or invalid bearer token").into_response()),
    }
}

/// Validate a token passed as a `token=` query parameter, the only
/// practical way a browser/mobile WebSocket client can authenticate an
/// upgrade request.
pub fn validate_ws_query(query: &str, expected: Option<&str>) -> Result<(), ErrorCode> {
    let Some(expected) = expected else { return Ok(()) };

    let token = query.split('&').find_map(|pair| pair.strip_prefix("token="));
    match token {
        Some(token) if constant_time_eq(token.as_bytes(), expected.as_bytes()) => Ok(()),
        _ => Err(ErrorCode::Unauthorized),
    }
}

/// Exempt `/health` (so load balancers can probe unauthenticated) and
/// every terminal WebSocket stream (authenticated via query token inside
/// the handler instead, since browsers cannot set upgrade headers).
fn is_exempt(path: &str) -> bool {
    path == "/health" || (path.starts_with("/v1/terminals/") && path.ends_with("/stream"))
}

pub async fn auth_layer(State(state): State<AppState>, request: Request<Body>, next: Next) -> Response {
    if is_exempt(request.uri().path()) {
        return next.run(request).await;
    }

    if let Err(response) = validate_bearer(request.headers(), state.config.auth_token.as_deref()) {
        return response;
    }

    next.run(request).await
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
