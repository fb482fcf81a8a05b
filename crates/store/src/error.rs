// SPDX-License-Identifier: MIT

//! Persistence errors. The store itself never decides HTTP status; callers
//! map `NotFound` to the appropriate `cw_core::ErrorCode` for the resource
//! in question.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("row not found")]
    NotFound,

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("failed to (de)serialize stored JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("background task panicked or was cancelled")]
    TaskJoin(#[from] tokio::task::JoinError),
}
