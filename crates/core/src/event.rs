// SPDX-License-Identifier: MIT

//! Event envelope: the append-only, per-job wire record exposed to clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::JobId;

/// The closed set of event types a job's event log can contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventType {
    #[serde(rename = "job.created")]
    JobCreated,
    #[serde(rename = "job.state")]
    JobState,
    #[serde(rename = "job.finished")]
    JobFinished,
    #[serde(rename = "turn.started")]
    TurnStarted,
    #[serde(rename = "turn.completed")]
    TurnCompleted,
    #[serde(rename = "item.started")]
    ItemStarted,
    #[serde(rename = "item.completed")]
    ItemCompleted,
    #[serde(rename = "item.agentMessage.delta")]
    ItemAgentMessageDelta,
    #[serde(rename = "item.commandExecution.outputDelta")]
    ItemCommandExecutionOutputDelta,
    #[serde(rename = "item.fileChange.outputDelta")]
    ItemFileChangeOutputDelta,
    #[serde(rename = "approval.required")]
    ApprovalRequired,
    #[serde(rename = "approval.resolved")]
    ApprovalResolved,
    #[serde(rename = "thread.started")]
    ThreadStarted,
    #[serde(rename = "error")]
    Error,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::JobCreated => "job.created",
            Self::JobState => "job.state",
            Self::JobFinished => "job.finished",
            Self::TurnStarted => "turn.started",
            Self::TurnCompleted => "turn.completed",
            Self::ItemStarted => "item.started",
            Self::ItemCompleted => "item.completed",
            Self::ItemAgentMessageDelta => "item.agentMessage.delta",
            Self::ItemCommandExecutionOutputDelta => "item.commandExecution.outputDelta",
            Self::ItemFileChangeOutputDelta => "item.fileChange.outputDelta",
            Self::ApprovalRequired => "approval.required",
            Self::ApprovalResolved => "approval.resolved",
            Self::ThreadStarted => "thread.started",
            Self::Error => "error",
        }
    }
}

/// Append-only record exposed to clients: `{type, ts, jobId, seq, payload}`.
///
/// `seq` is strictly monotonic per job, starting at 0. `payload` is an open
/// structured value: a pass-through of the upstream agent's payload
/// augmented with correlation fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventEnvelope {
    #[serde(rename = "type")]
    pub kind: EventType,
    pub ts: DateTime<Utc>,
    pub job_id: JobId,
    pub seq: u64,
    pub payload: serde_json::Value,
}

impl EventEnvelope {
    pub fn new(kind: EventType, job_id: JobId, seq: u64, payload: serde_json::Value) -> Self {
        Self { kind, ts: Utc::now(), job_id, seq, payload }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
