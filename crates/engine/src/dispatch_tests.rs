// SPDX-License-Identifier: MIT

use super::*;
use cw_core::{Job, Thread};
use cw_rpc::process::SpawnSpec;
use cw_rpc::RpcBridge;

fn shell_spec(script: &str) -> SpawnSpec {
    SpawnSpec { command: "sh".into(), args: vec!["-c".into(), script.into()], cwd: None, env: vec![] }
}

async fn test_engine() -> Engine {
    // `cat` echoes whatever we write back to us on stdout, which is never
    // valid JSON-RPC, so every `respond`/`respondError` call just becomes a
    // harmless protocol error on our own loop — fine, these tests never
    // await upstream responses.
    let bridge = RpcBridge::start(shell_spec("cat >/dev/null")).expect("spawn");
    Engine::new(cw_store::Store::open_in_memory().expect("open store"), crate::upstream::UpstreamClient::new(bridge), vec![])
}

async fn seed_pending_job(engine: &Engine, thread_id: &ThreadId) -> JobId {
    let job = Job::new(thread_id.clone());
    let job_id = job.id.clone();
    {
        let mut jobs = engine.state.jobs.lock().await;
        jobs.pending_job_by_thread.insert(thread_id.clone(), job_id.clone());
        jobs.jobs.insert(job_id.clone(), job);
    }
    {
        let mut logs = engine.state.event_logs.lock().await;
        logs.insert(job_id.clone(), crate::event_log::EventLog::new(job_id.clone()));
    }
    engine.store.upsert_thread(Thread::new(thread_id.clone(), "/workspace")).await.expect("seed thread");
    job_id
}

#[tokio::test]
async fn turn_started_correlates_via_the_pending_job_and_fills_in_turn_id() {
    let engine = test_engine().await;
    let thread_id = ThreadId::new();
    let job_id = seed_pending_job(&engine, &thread_id).await;

    let notification = NotificationMessage { method: "turn/started".into(), params: Some(serde_json::json!({"threadId": thread_id.as_str(), "turnId": "turn-9"})) };
    handle_notification(&engine, &notification).await;

    let job = crate::job::get_job(&engine, job_id).await.expect("job");
    assert_eq!(job.state, JobState::Running);
    assert_eq!(job.turn_id.as_deref(), Some("turn-9"));

    let jobs = engine.state.jobs.lock().await;
    assert!(jobs.pending_job_by_thread.get(&thread_id).is_none(), "pending slot cleared once filled");
}

#[tokio::test]
async fn turn_completed_failed_transitions_to_failed_and_records_the_error() {
    let engine = test_engine().await;
    let thread_id = ThreadId::new();
    let job_id = seed_pending_job(&engine, &thread_id).await;

    let started = NotificationMessage { method: "turn/started".into(), params: Some(serde_json::json!({"threadId": thread_id.as_str(), "turnId": "turn-1"})) };
    handle_notification(&engine, &started).await;

    let completed = NotificationMessage {
        method: "turn/completed".into(),
        params: Some(serde_json::json!({"threadId": thread_id.as_str(), "turnId": "turn-1", "status": "failed", "error": {"message": "agent blew up"}})),
    };
    handle_notification(&engine, &completed).await;

    let job = crate::job::get_job(&engine, job_id).await.expect("job");
    assert_eq!(job.state, JobState::Failed);
    assert_eq!(job.error.as_deref(), Some("agent blew up"));
    assert!(job.finished_emitted);
}

#[tokio::test]
async fn turn_completed_interrupted_transitions_to_cancelled() {
    let engine = test_engine().await;
    let thread_id = ThreadId::new();
    let job_id = seed_pending_job(&engine, &thread_id).await;
    let started = NotificationMessage { method: "turn/started".into(), params: Some(serde_json::json!({"threadId": thread_id.as_str(), "turnId": "turn-1"})) };
    handle_notification(&engine, &started).await;

    let completed = NotificationMessage { method: "turn/completed".into(), params: Some(serde_json::json!({"threadId": thread_id.as_str(), "turnId": "turn-1", "status": "interrupted"})) };
    handle_notification(&engine, &completed).await;

    let job = crate::job::get_job(&engine, job_id).await.expect("job");
    assert_eq!(job.state, JobState::Cancelled);
}

#[tokio::test]
async fn unknown_notification_method_is_ignored_without_error() {
    let engine = test_engine().await;
    let notification = NotificationMessage { method: "totally/unknown".into(), params: Some(serde_json::json!({"threadId": "TH-x"})) };
    handle_notification(&engine, &notification).await;
}

#[tokio::test]
async fn command_execution_approval_request_moves_the_job_to_waiting_approval() {
    let engine = test_engine().await;
    let thread_id = ThreadId::new();
    let job_id = seed_pending_job(&engine, &thread_id).await;
    let started = NotificationMessage { method: "turn/started".into(), params: Some(serde_json::json!({"threadId": thread_id.as_str(), "turnId": "turn-1"})) };
    handle_notification(&engine, &started).await;

    let request = ServerRequestMessage { id: serde_json::json!("srv-1"), method: "item/commandExecution/requestApproval".into(), params: Some(serde_json::json!({"threadId": thread_id.as_str(), "turnId": "turn-1", "itemId": "item-1"})) };
    handle_server_request(&engine, &request).await;

    let job = crate::job::get_job(&engine, job_id).await.expect("job");
    assert_eq!(job.state, JobState::WaitingApproval);
    assert_eq!(job.pending_approval_ids.len(), 1);

    let approvals = engine.state.approvals.lock().await;
    assert_eq!(approvals.approvals.len(), 1);
    assert_eq!(approvals.by_upstream_request_id.get("\"srv-1\"").map(|id| id.as_str()), job.pending_approval_ids.iter().next().map(|id| id.as_str()));
}

#[tokio::test]
async fn approval_request_that_cannot_correlate_is_dropped_without_panicking() {
    let engine = test_engine().await;
    let request = ServerRequestMessage { id: serde_json::json!("srv-2"), method: "item/fileChange/requestApproval".into(), params: Some(serde_json::json!({"threadId": "TH-nonexistent"})) };
    handle_server_request(&engine, &request).await;

    let approvals = engine.state.approvals.lock().await;
    assert!(approvals.approvals.is_empty());
}

#[tokio::test]
async fn unsupported_server_request_method_does_not_create_an_approval() {
    let engine = test_engine().await;
    let request = ServerRequestMessage { id: serde_json::json!("srv-3"), method: "some/unsupported/method".into(), params: None };
    handle_server_request(&engine, &request).await;

    let approvals = engine.state.approvals.lock().await;
    assert!(approvals.approvals.is_empty());
}
