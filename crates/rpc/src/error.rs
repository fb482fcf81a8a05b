// SPDX-License-Identifier: MIT

//! Errors internal to the RPC bridge. These are mapped to
//! `cw_core::ErrorCode` at the point a caller surfaces them to a client.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("malformed upstream message: {0}")]
    Malformed(String),

    #[error("upstream request timed out")]
    Timeout,

    #[error("upstream agent process crashed or exited: {0}")]
    Crashed(String),

    #[error("the bridge has already been stopped")]
    Stopped,

    #[error("failed to spawn agent subprocess: {0}")]
    Spawn(#[source] std::io::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("failed to encode outgoing message: {0}")]
    Encode(#[from] serde_json::Error),
}

impl RpcError {
    pub fn to_error_code(&self) -> cw_core::ErrorCode {
        match self {
            Self::Malformed(_) | Self::Encode(_) => cw_core::ErrorCode::UpstreamMalformed,
            Self::Timeout => cw_core::ErrorCode::UpstreamTimeout,
            Self::Crashed(_) | Self::Stopped | Self::Spawn(_) | Self::Io(_) => cw_core::ErrorCode::UpstreamCrashed,
        }
    }
}
