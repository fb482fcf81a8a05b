// SPDX-License-Identifier: MIT

//! Job: a single execution ("turn") initiated by a client message.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ApprovalId, JobId, ThreadId};

/// Lifecycle state of a `Job`. `Queued`, `Running`, and `WaitingApproval`
/// are active; `Done`, `Failed`, and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    Queued,
    Running,
    WaitingApproval,
    Done,
    Failed,
    Cancelled,
}

impl JobState {
    /// `QUEUED | RUNNING | WAITING_APPROVAL` — at most one such job per thread.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Queued | Self::Running | Self::WaitingApproval)
    }

    /// `DONE | FAILED | CANCELLED` — a job never leaves a terminal state.
    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "QUEUED",
            Self::Running => "RUNNING",
            Self::WaitingApproval => "WAITING_APPROVAL",
            Self::Done => "DONE",
            Self::Failed => "FAILED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

/// A single execution ("turn") initiated by a client message.
///
/// A job exclusively owns its event log and subscriber set (held by
/// `cw_engine::event_log::EventLog`, keyed by `id`). Only events are
/// evicted over time — the job record itself lives for the process
/// lifetime once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: JobId,
    pub thread_id: ThreadId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turn_id: Option<String>,
    pub state: JobState,
    /// Next `seq` to assign in this job's event log (mirrors
    /// `EventLog::next_seq`, kept here too so a job snapshot is self
    /// describing without consulting the log).
    pub next_seq: u64,
    /// Lowest `seq` still retained in this job's event log.
    pub first_seq: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terminal_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub pending_approval_ids: BTreeSet<ApprovalId>,
    #[serde(default)]
    pub finished_emitted: bool,
}

impl Job {
    pub fn new(thread_id: ThreadId) -> Self {
        let now = Utc::now();
        Self {
            id: JobId::new(),
            thread_id,
            turn_id: None,
            state: JobState::Queued,
            next_seq: 0,
            first_seq: 0,
            error: None,
            created_at: now,
            updated_at: now,
            terminal_at: None,
            pending_approval_ids: BTreeSet::new(),
            finished_emitted: false,
        }
    }

    /// Transition to a new state, touching `updated_at` and, if the new
    /// state is terminal, stamping `terminal_at` once.
    pub fn transition_to(&mut self, next: JobState) {
        self.state = next;
        self.updated_at = Utc::now();
        if next.is_terminal() && self.terminal_at.is_none() {
            self.terminal_at = Some(self.updated_at);
        }
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
