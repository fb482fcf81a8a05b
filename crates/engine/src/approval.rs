// SPDX-License-Identifier: MIT

//! Approval resolution. Approval *creation* (on a correlated
//! `requestApproval` server request) lives in `dispatch.rs`, which owns
//! the upstream message loop.

use cw_core::{ApprovalId, ApprovalKind, Decision, DecisionValue, EventType, Job, JobId, JobState};
use serde_json::Value;

use crate::error::EngineError;
use crate::job::{append_event, finish_job_once, get_job};
use crate::Engine;

pub struct ApproveRequest {
    pub approval_id: ApprovalId,
    pub decision: DecisionValue,
    pub decline_reason: Option<String>,
    pub actor: Option<String>,
}

/// `approve`'s result, carrying enough to render the
/// `{status:"submitted"|"already_submitted", decision}` response without the
/// caller re-deriving it from job state.
pub struct ApproveOutcome {
    pub job: Job,
    pub decision: DecisionValue,
    pub already_submitted: bool,
}

/// Map a client decision to the payload the upstream agent expects.
fn decision_to_upstream_payload(decision: &DecisionValue, decline_reason: Option<&str>) -> Value {
    match decision {
        DecisionValue::Accept => serde_json::json!("accept"),
        DecisionValue::AcceptForSession => serde_json::json!("acceptForSession"),
        DecisionValue::Decline => serde_json::json!({ "decline": { "reason": decline_reason } }),
        DecisionValue::Cancel => serde_json::json!("cancel"),
        DecisionValue::AcceptWithExecPolicyAmendment { amended_command } => {
            serde_json::json!({ "acceptWithExecpolicyAmendment": { "execpolicy_amendment": amended_command } })
        }
    }
}

fn validate_decision(decision: &DecisionValue, kind: ApprovalKind) -> Result<(), EngineError> {
    if !decision.compatible_with(kind) {
        return Err(EngineError::InvalidDecisionForKind(decision.clone(), kind));
    }
    if let DecisionValue::AcceptWithExecPolicyAmendment { amended_command } = decision {
        let valid = !amended_command.is_empty() && amended_command.iter().all(|token| !token.is_empty());
        if !valid {
            return Err(EngineError::InvalidExecPolicyAmendment);
        }
    }
    Ok(())
}

/// `approve(jobId, {approvalId, decision, execPolicyAmendment?,
/// declineReason?})`: idempotent — replays the first decision verbatim on
/// repeat. Resumes the job to `RUNNING` once its pending set empties.
pub async fn approve(engine: &Engine, job_id: JobId, req: ApproveRequest) -> Result<ApproveOutcome, EngineError> {
    let (existing_decision, kind, upstream_request_id) = {
        let approvals = engine.state.approvals.lock().await;
        let approval = approvals.approvals.get(&req.approval_id).ok_or_else(|| EngineError::ApprovalNotFound(req.approval_id.as_str().to_string()))?;
        if approval.job_id != job_id {
            return Err(EngineError::ApprovalNotFound(req.approval_id.as_str().to_string()));
        }
        (approval.decision.clone(), approval.kind, approval.upstream_request_id.clone())
    };

    if let Some(decision) = existing_decision {
        let job = get_job(engine, job_id).await?;
        return Ok(ApproveOutcome { job, decision: decision.value, already_submitted: true });
    }

    validate_decision(&req.decision, kind)?;

    let decision = Decision { approval_id: req.approval_id.clone(), value: req.decision.clone(), decided_at: chrono::Utc::now(), actor: req.actor.clone() };

    let upstream_payload = decision_to_upstream_payload(&req.decision, req.decline_reason.as_deref());
    engine.upstream.bridge().respond(upstream_request_id, upstream_payload).await?;

    let pending_empty = {
        let mut approvals = engine.state.approvals.lock().await;
        if let Some(approval) = approvals.approvals.get_mut(&req.approval_id) {
            approval.decision = Some(decision.clone());
        }
        approvals.by_upstream_request_id.retain(|_, id| id != &req.approval_id);

        let mut jobs = engine.state.jobs.lock().await;
        let pending_empty = if let Some(job) = jobs.jobs.get_mut(&job_id) {
            job.pending_approval_ids.remove(&req.approval_id);
            job.pending_approval_ids.is_empty()
        } else {
            false
        };
        pending_empty
    };

    engine.store.record_decision(req.approval_id.clone(), decision.clone()).await?;
    append_event(engine, &job_id, EventType::ApprovalResolved, serde_json::json!({ "approvalId": req.approval_id.as_str(), "value": decision.value.as_str() })).await;

    if pending_empty {
        let mut jobs = engine.state.jobs.lock().await;
        if let Some(job) = jobs.jobs.get_mut(&job_id) {
            if !job.state.is_terminal() {
                job.transition_to(JobState::Running);
            }
        }
        drop(jobs);
        append_event(engine, &job_id, EventType::JobState, serde_json::json!({"state": JobState::Running.as_str()})).await;
    }

    let job = get_job(engine, job_id).await?;
    if job.state.is_terminal() {
        finish_job_once(engine, &job.id).await;
    }
    engine.store.upsert_job(job.clone()).await?;
    Ok(ApproveOutcome { job, decision: decision.value, already_submitted: false })
}

#[cfg(test)]
#[path = "approval_tests.rs"]
mod tests;
