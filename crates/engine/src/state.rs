// SPDX-License-Identifier: MIT

//! Process-wide shared state: the job table, approval table, thread
//! cache, and their correlation indices.
//!
//! One container, one `tokio::sync::Mutex` per logical owner — this
//! doesn't need finer-grained locking than that.

use std::collections::{HashMap, HashSet};

use cw_core::{Approval, ApprovalId, Job, JobId, Thread, ThreadId};
use tokio::sync::Mutex;

use crate::event_log::EventLog;
use crate::projection::CachedProjection;

/// Thread cache mirror plus the process-local "is this thread loaded"
/// set (`activateThread`).
#[derive(Default)]
pub struct ThreadState {
    pub threads: HashMap<ThreadId, Thread>,
    pub loaded: HashSet<ThreadId>,
}

/// The job table and its two correlation indices (strategies (a) and (b);
/// strategy (c) scans `jobs` directly for the newest active job on a
/// thread).
#[derive(Default)]
pub struct JobState {
    pub jobs: HashMap<JobId, Job>,
    /// Strategy (a): exact `(threadId, turnId)` -> job.
    pub job_by_turn: HashMap<(ThreadId, String), JobId>,
    /// Strategy (b): a thread's job that is still waiting for its first
    /// `turnId` to arrive.
    pub pending_job_by_thread: HashMap<ThreadId, JobId>,
}

/// The approval table and its upstream-request-id correlation index.
#[derive(Default)]
pub struct ApprovalState {
    pub approvals: HashMap<ApprovalId, Approval>,
    /// Upstream JSON-RPC request id (rendered to its JSON text form) ->
    /// approval id, so a server-originated request can be resolved back
    /// to the approval record when the decision is ready to send.
    pub by_upstream_request_id: HashMap<String, ApprovalId>,
}

pub struct EngineState {
    pub threads: Mutex<ThreadState>,
    pub jobs: Mutex<JobState>,
    pub approvals: Mutex<ApprovalState>,
    pub event_logs: Mutex<HashMap<JobId, EventLog>>,
    pub projection_cache: Mutex<HashMap<ThreadId, CachedProjection>>,
}

impl Default for EngineState {
    fn default() -> Self {
        Self {
            threads: Mutex::new(ThreadState::default()),
            jobs: Mutex::new(JobState::default()),
            approvals: Mutex::new(ApprovalState::default()),
            event_logs: Mutex::new(HashMap::new()),
            projection_cache: Mutex::new(HashMap::new()),
        }
    }
}

impl EngineState {
    pub fn new() -> Self {
        Self::default()
    }
}
