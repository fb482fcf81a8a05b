// SPDX-License-Identifier: MIT

//! The long-running dispatcher: consumes `cw_rpc::BridgeEvent`s, applies
//! job correlation, and drives the state-transition table.

use std::sync::Arc;

use cw_core::{ApprovalKind, EventType, JobId, JobState, ThreadId};
use cw_rpc::{BridgeEvent, JsonRpcErrorObject, NotificationMessage, ServerRequestMessage};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::job::{append_event, finish_job_once, invalidate_cached_projection};
use crate::Engine;

/// Run the dispatch loop until the bridge's event channel closes (i.e.
/// the agent subprocess has exited and `stop()` tore the bridge down).
/// Intended to be spawned as its own task alongside the bridge.
pub async fn run(engine: Arc<Engine>, mut events: tokio::sync::broadcast::Receiver<BridgeEvent>) {
    loop {
        match events.recv().await {
            Ok(event) => handle_event(&engine, event).await,
            Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "dispatcher lagged behind the bridge's event stream");
            }
            Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
        }
    }
}

async fn handle_event(engine: &Engine, event: BridgeEvent) {
    match event {
        BridgeEvent::Notification(notification) => handle_notification(engine, &notification).await,
        BridgeEvent::ServerRequest(request) => handle_server_request(engine, &request).await,
        BridgeEvent::Stderr(line) => handle_stderr(&line),
        BridgeEvent::ProtocolError(line) => warn!(line = %line, "upstream protocol error"),
        BridgeEvent::Exit(code) => warn!(code = ?code, "agent subprocess exited; in-flight jobs remain in their last known state"),
    }
}

/// Known rollout-progress noise the agent subprocess writes to stderr.
/// Filtered to `debug` unless `CW_SHOW_AGENT_STDERR_NOISE` is set.
const KNOWN_STDERR_NOISE: &[&str] = &["rollout"];

fn handle_stderr(line: &str) {
    let show_noise = std::env::var_os("CW_SHOW_AGENT_STDERR_NOISE").is_some();
    if !show_noise && KNOWN_STDERR_NOISE.iter().any(|noise| line.contains(noise)) {
        debug!(line = %line, "agent stderr (filtered noise)");
    } else {
        info!(line = %line, "agent stderr");
    }
}

/// Resolve `(threadId, turnId?)` to a job id by the three-strategy order:
/// exact `(thread, turn)`, this thread's still-pending job (filled in on
/// first hit), or the newest active job for the thread.
async fn correlate_job(engine: &Engine, thread_id: &ThreadId, turn_id: Option<&str>) -> Option<JobId> {
    let mut jobs = engine.state.jobs.lock().await;

    if let Some(turn_id) = turn_id {
        if let Some(job_id) = jobs.job_by_turn.get(&(thread_id.clone(), turn_id.to_string())).cloned() {
            return Some(job_id);
        }
    }

    if let Some(job_id) = jobs.pending_job_by_thread.get(thread_id).cloned() {
        if let (Some(turn_id), Some(job)) = (turn_id, jobs.jobs.get_mut(&job_id)) {
            job.turn_id = Some(turn_id.to_string());
            jobs.job_by_turn.insert((thread_id.clone(), turn_id.to_string()), job_id.clone());
        }
        jobs.pending_job_by_thread.remove(thread_id);
        return Some(job_id);
    }

    crate::job::newest_active_job(&jobs, thread_id).map(|job| job.id.clone())
}

fn extract_thread_turn(params: &Option<Value>) -> (Option<ThreadId>, Option<String>) {
    let params = params.as_ref();
    let thread_id = params.and_then(|p| p.get("threadId")).and_then(Value::as_str).map(ThreadId::from_raw);
    let turn_id = params.and_then(|p| p.get("turnId")).and_then(Value::as_str).map(str::to_owned);
    (thread_id, turn_id)
}

/// Apply a state transition, honoring the invariant that a job never
/// leaves a terminal state once reached.
async fn set_job_state(engine: &Engine, job_id: &JobId, state: JobState) {
    let applied = {
        let mut jobs = engine.state.jobs.lock().await;
        match jobs.jobs.get_mut(job_id) {
            Some(job) if !job.state.is_terminal() => {
                job.transition_to(state);
                true
            }
            _ => false,
        }
    };
    if !applied {
        return;
    }
    append_event(engine, job_id, EventType::JobState, serde_json::json!({"state": state.as_str()})).await;
    if let Ok(job) = crate::job::get_job(engine, job_id.clone()).await {
        let _ = engine.store.upsert_job(job).await;
        if state.is_terminal() {
            finish_job_once(engine, job_id).await;
            invalidate_cached_projection(engine, &engine_thread_of(engine, job_id).await).await;
        }
    }
}

async fn engine_thread_of(engine: &Engine, job_id: &JobId) -> ThreadId {
    let jobs = engine.state.jobs.lock().await;
    jobs.jobs.get(job_id).map(|j| j.thread_id.clone()).unwrap_or_else(ThreadId::new)
}

/// Unknown notification methods are ignored for forward compatibility.
async fn handle_notification(engine: &Engine, notification: &NotificationMessage) {
    let (thread_id, turn_id) = extract_thread_turn(&notification.params);
    let Some(thread_id) = thread_id else {
        debug!(method = %notification.method, "notification missing threadId, ignored");
        return;
    };

    match notification.method.as_str() {
        "thread/started" => {
            append_thread_started(engine, &thread_id).await;
        }
        "turn/started" => {
            if let Some(job_id) = correlate_job(engine, &thread_id, turn_id.as_deref()).await {
                {
                    let mut jobs = engine.state.jobs.lock().await;
                    if let (Some(turn_id), Some(job)) = (turn_id.as_deref(), jobs.jobs.get_mut(&job_id)) {
                        if job.turn_id.is_none() {
                            job.turn_id = Some(turn_id.to_string());
                            jobs.job_by_turn.insert((thread_id.clone(), turn_id.to_string()), job_id.clone());
                        }
                    }
                }
                set_job_state(engine, &job_id, JobState::Running).await;
                append_event(engine, &job_id, EventType::TurnStarted, notification.params.clone().unwrap_or(Value::Null)).await;
            }
        }
        "turn/completed" => {
            if let Some(job_id) = correlate_job(engine, &thread_id, turn_id.as_deref()).await {
                let outcome = notification.params.as_ref().and_then(|p| p.get("status")).and_then(Value::as_str).unwrap_or("completed");
                let (next_state, error) = match outcome {
                    "failed" => (JobState::Failed, notification.params.as_ref().and_then(|p| p.get("error")).and_then(|e| e.get("message")).and_then(Value::as_str).map(str::to_owned)),
                    "interrupted" => (JobState::Cancelled, None),
                    _ => (JobState::Done, None),
                };
                if let Some(message) = &error {
                    let mut jobs = engine.state.jobs.lock().await;
                    if let Some(job) = jobs.jobs.get_mut(&job_id) {
                        job.error = Some(message.clone());
                    }
                }
                append_event(engine, &job_id, EventType::TurnCompleted, notification.params.clone().unwrap_or(Value::Null)).await;
                set_job_state(engine, &job_id, next_state).await;
            }
        }
        "item/started" => forward_item_event(engine, &thread_id, turn_id.as_deref(), EventType::ItemStarted, &notification.params).await,
        "item/completed" => forward_item_event(engine, &thread_id, turn_id.as_deref(), EventType::ItemCompleted, &notification.params).await,
        "item/agentMessage/delta" => forward_item_event(engine, &thread_id, turn_id.as_deref(), EventType::ItemAgentMessageDelta, &notification.params).await,
        "item/commandExecution/outputDelta" => forward_item_event(engine, &thread_id, turn_id.as_deref(), EventType::ItemCommandExecutionOutputDelta, &notification.params).await,
        "item/fileChange/outputDelta" => forward_item_event(engine, &thread_id, turn_id.as_deref(), EventType::ItemFileChangeOutputDelta, &notification.params).await,
        "error" => forward_item_event(engine, &thread_id, turn_id.as_deref(), EventType::Error, &notification.params).await,
        other => debug!(method = other, "unknown upstream notification, ignored"),
    }
}

async fn append_thread_started(engine: &Engine, thread_id: &ThreadId) {
    let jobs = engine.state.jobs.lock().await;
    if let Some(job) = crate::job::newest_active_job(&jobs, thread_id) {
        let job_id = job.id.clone();
        drop(jobs);
        append_event(engine, &job_id, EventType::ThreadStarted, serde_json::json!({"threadId": thread_id.as_str()})).await;
    }
}

async fn forward_item_event(engine: &Engine, thread_id: &ThreadId, turn_id: Option<&str>, kind: EventType, params: &Option<Value>) {
    if let Some(job_id) = correlate_job(engine, thread_id, turn_id).await {
        append_event(engine, &job_id, kind, params.clone().unwrap_or(Value::Null)).await;
    }
}

/// Server-originated requests: only approval requests are supported.
/// Unsupported methods get `-32601`; uncorrelatable approvals get a
/// dropped `-32000`.
async fn handle_server_request(engine: &Engine, request: &ServerRequestMessage) {
    let kind = match request.method.as_str() {
        "item/commandExecution/requestApproval" => ApprovalKind::CommandExecution,
        "item/fileChange/requestApproval" => ApprovalKind::FileChange,
        other => {
            warn!(method = other, "unsupported upstream server request");
            let _ = engine.upstream.bridge().respond_error(request.id.clone(), JsonRpcErrorObject::method_not_found(other)).await;
            return;
        }
    };

    let (thread_id, turn_id) = extract_thread_turn(&request.params);
    let Some(thread_id) = thread_id else {
        warn!("approval request missing threadId, dropped");
        let _ = engine.upstream.bridge().respond_error(request.id.clone(), JsonRpcErrorObject::server_error("cannot correlate approval request to a job: missing threadId")).await;
        return;
    };

    let Some(job_id) = correlate_job(engine, &thread_id, turn_id.as_deref()).await else {
        warn!(thread_id = %thread_id, "approval request could not be correlated to any job, dropped");
        let _ = engine.upstream.bridge().respond_error(request.id.clone(), JsonRpcErrorObject::server_error("cannot correlate approval request to a job")).await;
        return;
    };

    let item_id = request.params.as_ref().and_then(|p| p.get("itemId")).and_then(Value::as_str).map(str::to_owned);
    let mut approval = cw_core::Approval::new(job_id.clone(), thread_id.clone(), kind, request.id.clone(), request.method.clone(), request.params.clone().unwrap_or(Value::Null));
    approval.turn_id = turn_id;
    approval.item_id = item_id;
    let approval_id = approval.id.clone();

    {
        let mut jobs = engine.state.jobs.lock().await;
        if let Some(job) = jobs.jobs.get_mut(&job_id) {
            job.pending_approval_ids.insert(approval_id.clone());
        }
    }
    {
        let mut approvals = engine.state.approvals.lock().await;
        approvals.by_upstream_request_id.insert(request.id.to_string(), approval_id.clone());
        approvals.approvals.insert(approval_id.clone(), approval.clone());
    }

    if let Err(err) = engine.store.insert_approval(approval.clone()).await {
        warn!(error = %err, "failed to persist approval");
    }

    // "State transitions appear before the side effects they cause" —
    // job.state(WAITING_APPROVAL) is emitted before approval.required.
    set_job_state(engine, &job_id, JobState::WaitingApproval).await;
    append_event(engine, &job_id, EventType::ApprovalRequired, serde_json::json!({"approvalId": approval_id.as_str(), "kind": kind.as_str(), "payload": approval.payload})).await;
    engine.notify_push(thread_id, job_id, crate::push::PushReason::ApprovalRequired, "Approval needed", format!("A {} needs your decision", kind.as_str())).await;
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
