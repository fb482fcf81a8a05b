// SPDX-License-Identifier: MIT

//! Transport-edge error mapping: every internal error type the route
//! handlers can produce is converted to `cw_core::ErrorCode`'s shared
//! `{error:{code,message}}` envelope here, in one place.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use cw_core::ErrorCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Wraps any error this crate surfaces to a client, carrying the
/// `ErrorCode` it maps to so every transport (HTTP, SSE, WS) renders it
/// the same way.
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.code.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.code.to_error_body(self.message))).into_response()
    }
}

impl From<cw_engine::EngineError> for ApiError {
    fn from(err: cw_engine::EngineError) -> Self {
        Self { code: err.to_error_code(), message: err.to_string() }
    }
}

impl From<cw_terminal::TerminalError> for ApiError {
    fn from(err: cw_terminal::TerminalError) -> Self {
        Self { code: terminal_error_code(&err), message: err.to_string() }
    }
}

/// `cw-terminal` has no HTTP awareness of its own; map its closed error
/// set to the shared taxonomy here, at the one crate that does.
pub fn terminal_error_code(err: &cw_terminal::TerminalError) -> ErrorCode {
    use cw_terminal::TerminalError::*;
    match err {
        SessionNotFound(_) | NoSessionForThread(_) => ErrorCode::TerminalNotFound,
        SessionExited(_) => ErrorCode::SessionAlreadyExited,
        NotRunning(_) => ErrorCode::SessionAlreadyExited,
        TooManySessions(_) => ErrorCode::TerminalCapacityReached,
        InputTooLarge(_, _) => ErrorCode::PayloadTooLarge,
        CursorExpired => ErrorCode::TerminalCursorExpired,
        Spawn(_) | Io(_) => ErrorCode::Internal,
    }
}
