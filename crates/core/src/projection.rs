// SPDX-License-Identifier: MIT

//! Thread-Event Projection: the merged, thread-scoped view over every job's
//! event log, used to answer "what happened on this thread" without the
//! client tracking per-job cursors.

use serde::{Deserialize, Serialize};

use crate::event::EventEnvelope;

/// One entry in a thread's projected event stream: the underlying job
/// event plus the position (`threadCursor`) it occupies in the projection,
/// distinct from the event's own per-job `seq`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadEventEntry {
    pub thread_cursor: u64,
    #[serde(flatten)]
    pub event: EventEnvelope,
}

impl ThreadEventEntry {
    pub fn new(thread_cursor: u64, event: EventEnvelope) -> Self {
        Self { thread_cursor, event }
    }
}

#[cfg(test)]
#[path = "projection_tests.rs"]
mod tests;
