// SPDX-License-Identifier: MIT

//! Engine-level errors, each mapped to a `cw_core::ErrorCode` at
//! construction so HTTP/SSE/WS frontdoors never need their own mapping
//! table.

use cw_core::ErrorCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("project not allowed: {0}")]
    ProjectNotAllowed(String),

    #[error("thread not found: {0}")]
    ThreadNotFound(String),

    #[error("job not found: {0}")]
    JobNotFound(String),

    #[error("approval not found: {0}")]
    ApprovalNotFound(String),

    #[error("thread {0} already has an active job")]
    ThreadHasActiveJob(String),

    #[error("cursor expired")]
    CursorExpired,

    #[error("thread cursor expired")]
    ThreadCursorExpired,

    #[error("invalid cursor")]
    InvalidCursor,

    #[error("invalid limit")]
    InvalidLimit,

    #[error("decision {0:?} is not valid for approval kind {1:?}")]
    InvalidDecisionForKind(cw_core::DecisionValue, cw_core::ApprovalKind),

    #[error("accept_with_execpolicy_amendment requires a non-empty list of non-empty tokens")]
    InvalidExecPolicyAmendment,

    #[error(transparent)]
    Rpc(#[from] cw_rpc::RpcError),

    #[error(transparent)]
    Store(#[from] cw_store::StoreError),
}

impl EngineError {
    pub fn to_error_code(&self) -> ErrorCode {
        match self {
            Self::ProjectNotAllowed(_) => ErrorCode::ProjectNotAllowed,
            Self::ThreadNotFound(_) => ErrorCode::ThreadNotFound,
            Self::JobNotFound(_) => ErrorCode::JobNotFound,
            Self::ApprovalNotFound(_) => ErrorCode::ApprovalNotFound,
            Self::ThreadHasActiveJob(_) => ErrorCode::ThreadHasActiveJob,
            Self::CursorExpired => ErrorCode::CursorExpired,
            Self::ThreadCursorExpired => ErrorCode::ThreadCursorExpired,
            Self::InvalidCursor => ErrorCode::InvalidCursor,
            Self::InvalidLimit => ErrorCode::InvalidLimit,
            Self::InvalidDecisionForKind(..) => ErrorCode::InvalidDecisionForKind,
            Self::InvalidExecPolicyAmendment => ErrorCode::InvalidExecPolicyAmendment,
            Self::Rpc(rpc_err) => rpc_err.to_error_code(),
            Self::Store(_) => ErrorCode::Internal,
        }
    }
}
