// SPDX-License-Identifier: MIT

//! Approval: a pending decision point raised by the upstream agent for a
//! sensitive action.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ApprovalId, JobId, ThreadId};

/// The two kinds of approval the upstream agent can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalKind {
    CommandExecution,
    FileChange,
}

impl ApprovalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CommandExecution => "command_execution",
            Self::FileChange => "file_change",
        }
    }
}

/// The client's decision on a pending approval. `Accept`, `AcceptForSession`
/// and `Decline` apply to both kinds; `AcceptWithExecPolicyAmendment` only
/// applies to `ApprovalKind::CommandExecution` — rejected for `FileChange`
/// as `INVALID_DECISION_FOR_KIND`. `Cancel` withdraws the approval without
/// resuming the upstream job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "value", rename_all = "snake_case")]
pub enum DecisionValue {
    Accept,
    AcceptForSession,
    #[serde(rename = "accept_with_execpolicy_amendment")]
    AcceptWithExecPolicyAmendment {
        #[serde(default)]
        amended_command: Vec<String>,
    },
    Decline,
    Cancel,
}

impl DecisionValue {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accept => "accept",
            Self::AcceptForSession => "accept_for_session",
            Self::AcceptWithExecPolicyAmendment { .. } => "accept_with_execpolicy_amendment",
            Self::Decline => "decline",
            Self::Cancel => "cancel",
        }
    }

    /// Only `CommandExecution` approvals accept an exec-policy amendment.
    pub fn compatible_with(&self, kind: ApprovalKind) -> bool {
        !matches!(self, Self::AcceptWithExecPolicyAmendment { .. }) || kind == ApprovalKind::CommandExecution
    }
}

/// A resolved decision recorded against an approval.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    pub approval_id: ApprovalId,
    #[serde(flatten)]
    pub value: DecisionValue,
    pub decided_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
}

/// A pending or resolved approval raised by the upstream agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Approval {
    pub id: ApprovalId,
    pub job_id: JobId,
    pub thread_id: ThreadId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turn_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
    pub kind: ApprovalKind,
    /// Upstream JSON-RPC request id this approval must reply to.
    pub upstream_request_id: serde_json::Value,
    pub upstream_method: String,
    /// Opaque request payload forwarded from the upstream agent, shown to
    /// the client as-is.
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision: Option<Decision>,
}

impl Approval {
    pub fn new(
        job_id: JobId,
        thread_id: ThreadId,
        kind: ApprovalKind,
        upstream_request_id: serde_json::Value,
        upstream_method: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            id: ApprovalId::new(),
            job_id,
            thread_id,
            turn_id: None,
            item_id: None,
            kind,
            upstream_request_id,
            upstream_method: upstream_method.into(),
            payload,
            created_at: Utc::now(),
            decision: None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.decision.is_some()
    }
}

#[cfg(test)]
#[path = "approval_tests.rs"]
mod tests;
