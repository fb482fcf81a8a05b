// SPDX-License-Identifier: MIT

//! Unified error codes shared across HTTP, SSE, and WebSocket transports.
//!
//! Client input, authorization, not-found, conflict, precondition, upstream,
//! and capacity errors each get a stable machine code and an HTTP status.

use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of machine-readable error codes the Worker can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Client input
    InvalidJson,
    PayloadTooLarge,
    InvalidCursor,
    InvalidLimit,
    InvalidArchivedFlag,
    InvalidThreadId,
    InvalidJobId,
    InvalidApprovalId,
    InvalidDecision,
    InvalidExecPolicyAmendment,
    InvalidDecisionForKind,
    InvalidPushToken,
    InvalidPushPlatform,
    InvalidPushEnvironment,
    ProjectNotAllowed,

    // Authorization
    Unauthorized,

    // Not found
    ThreadNotFound,
    JobNotFound,
    ApprovalNotFound,
    TerminalNotFound,

    // Conflict
    ThreadHasActiveJob,
    CursorExpired,
    ThreadCursorExpired,
    TerminalCursorExpired,
    SessionAlreadyExited,

    // Upstream
    UpstreamMalformed,
    UpstreamTimeout,
    UpstreamCrashed,

    // Capacity
    TerminalCapacityReached,

    Internal,
}

impl ErrorCode {
    pub fn http_status(&self) -> u16 {
        use ErrorCode::*;
        match self {
            InvalidJson
            | InvalidCursor
            | InvalidLimit
            | InvalidArchivedFlag
            | InvalidThreadId
            | InvalidJobId
            | InvalidApprovalId
            | InvalidDecision
            | InvalidExecPolicyAmendment
            | InvalidDecisionForKind
            | InvalidPushToken
            | InvalidPushPlatform
            | InvalidPushEnvironment
            | ProjectNotAllowed => 400,
            PayloadTooLarge => 413,
            Unauthorized => 401,
            ThreadNotFound | JobNotFound | ApprovalNotFound | TerminalNotFound => 404,
            ThreadHasActiveJob
            | CursorExpired
            | ThreadCursorExpired
            | TerminalCursorExpired
            | SessionAlreadyExited => 409,
            TerminalCapacityReached => 429,
            UpstreamMalformed | UpstreamCrashed => 502,
            UpstreamTimeout => 504,
            Internal => 500,
        }
    }

    pub fn as_str(&self) -> &'static str {
        use ErrorCode::*;
        match self {
            InvalidJson => "INVALID_JSON",
            PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            InvalidCursor => "INVALID_CURSOR",
            InvalidLimit => "INVALID_LIMIT",
            InvalidArchivedFlag => "INVALID_ARCHIVED_FLAG",
            InvalidThreadId => "INVALID_THREAD_ID",
            InvalidJobId => "INVALID_JOB_ID",
            InvalidApprovalId => "INVALID_APPROVAL_ID",
            InvalidDecision => "INVALID_DECISION",
            InvalidExecPolicyAmendment => "INVALID_EXEC_POLICY_AMENDMENT",
            InvalidDecisionForKind => "INVALID_DECISION_FOR_KIND",
            InvalidPushToken => "INVALID_PUSH_TOKEN",
            InvalidPushPlatform => "INVALID_PUSH_PLATFORM",
            InvalidPushEnvironment => "INVALID_PUSH_ENVIRONMENT",
            ProjectNotAllowed => "PROJECT_NOT_ALLOWED",
            Unauthorized => "UNAUTHORIZED",
            ThreadNotFound => "THREAD_NOT_FOUND",
            JobNotFound => "JOB_NOT_FOUND",
            ApprovalNotFound => "APPROVAL_NOT_FOUND",
            TerminalNotFound => "TERMINAL_NOT_FOUND",
            ThreadHasActiveJob => "THREAD_HAS_ACTIVE_JOB",
            CursorExpired => "CURSOR_EXPIRED",
            ThreadCursorExpired => "THREAD_CURSOR_EXPIRED",
            TerminalCursorExpired => "TERMINAL_CURSOR_EXPIRED",
            SessionAlreadyExited => "SESSION_ALREADY_EXITED",
            UpstreamMalformed => "UPSTREAM_MALFORMED",
            UpstreamTimeout => "UPSTREAM_TIMEOUT",
            UpstreamCrashed => "UPSTREAM_CRASHED",
            TerminalCapacityReached => "TERMINAL_CAPACITY_REACHED",
            Internal => "INTERNAL",
        }
    }

    /// WebSocket close code to use when this error ends the connection:
    /// `1008` for bad input, `1011` for internal faults.
    pub fn ws_close_code(&self) -> u16 {
        if self.http_status() < 500 {
            1008
        } else {
            1011
        }
    }

    pub fn to_error_body(&self, message: impl Into<String>) -> ErrorBody {
        ErrorBody { code: self.as_str().to_owned(), message: message.into() }
    }

    pub fn to_http_response(
        &self,
        message: impl Into<String>,
    ) -> (StatusCode, Json<ErrorResponse>) {
        let status =
            StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorResponse { error: self.to_error_body(message) };
        (status, Json(body))
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level error response envelope: `{"error": {"code", "message"}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
