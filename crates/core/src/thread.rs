// SPDX-License-Identifier: MIT

//! Thread: a conversation context bound to a working directory, owned by
//! the agent and mirrored in the Worker's cache.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::ThreadId;

/// A conversation context bound to a working directory.
///
/// Threads are created and mutated by the agent; the Worker mirrors them
/// in the cache store and tracks loaded state as a process-local set
/// (see `cw_engine::state::EngineState::loaded_threads`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thread {
    pub id: ThreadId,
    pub working_dir: String,
    pub preview: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_provider: Option<String>,
    #[serde(default)]
    pub archived: bool,
}

impl Thread {
    pub fn new(id: ThreadId, working_dir: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            working_dir: working_dir.into(),
            preview: String::new(),
            created_at: now,
            updated_at: now,
            model_provider: None,
            archived: false,
        }
    }
}
