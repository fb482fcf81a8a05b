// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn conflict_codes_map_to_409() {
    for code in [
        ErrorCode::ThreadHasActiveJob,
        ErrorCode::CursorExpired,
        ErrorCode::ThreadCursorExpired,
        ErrorCode::TerminalCursorExpired,
        ErrorCode::SessionAlreadyExited,
    ] {
        assert_eq!(code.http_status(), 409, "{code:?}");
    }
}

#[test]
fn not_found_codes_map_to_404() {
    for code in [
        ErrorCode::ThreadNotFound,
        ErrorCode::JobNotFound,
        ErrorCode::ApprovalNotFound,
        ErrorCode::TerminalNotFound,
    ] {
        assert_eq!(code.http_status(), 404, "{code:?}");
    }
}

#[test]
fn payload_too_large_is_413() {
    assert_eq!(ErrorCode::PayloadTooLarge.http_status(), 413);
}

#[test]
fn upstream_timeout_is_504_and_crash_is_502() {
    assert_eq!(ErrorCode::UpstreamTimeout.http_status(), 504);
    assert_eq!(ErrorCode::UpstreamCrashed.http_status(), 502);
    assert_eq!(ErrorCode::UpstreamMalformed.http_status(), 502);
}

#[test]
fn ws_close_code_splits_on_5xx() {
    assert_eq!(ErrorCode::InvalidDecision.ws_close_code(), 1008);
    assert_eq!(ErrorCode::Internal.ws_close_code(), 1011);
}

#[test]
fn to_error_body_carries_code_and_message() {
    let body = ErrorCode::JobNotFound.to_error_body("no such job");
    assert_eq!(body.code, "JOB_NOT_FOUND");
    assert_eq!(body.message, "no such job");
}
