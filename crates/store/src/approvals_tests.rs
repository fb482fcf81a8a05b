// SPDX-License-Identifier: MIT

use super::*;
use crate::connection::Store;
use cw_core::{DecisionValue, ThreadId};

async fn store_with_job() -> (Store, JobId) {
    let store = Store::open_in_memory().expect("open");
    let thread = cw_core::Thread::new(ThreadId::new(), "/workspace");
    store.upsert_thread(thread.clone()).await.expect("upsert thread");
    let job = cw_core::Job::new(thread.id);
    let job_id = job.id.clone();
    store.upsert_job(job).await.expect("upsert job");
    (store, job_id)
}

fn sample_approval(job_id: JobId, thread_id: cw_core::ThreadId) -> Approval {
    Approval::new(job_id, thread_id, ApprovalKind::CommandExecution, serde_json::json!(7), "execCommandApproval", serde_json::json!({"command": ["ls"]}))
}

#[tokio::test]
async fn insert_then_get_round_trips_an_approval() {
    let (store, job_id) = store_with_job().await;
    let approval = sample_approval(job_id.clone(), cw_core::ThreadId::new());
    store.insert_approval(approval.clone()).await.expect("insert");

    let fetched = store.get_approval(approval.id.clone()).await.expect("get").expect("present");
    assert_eq!(fetched.upstream_method, "execCommandApproval");
    assert!(!fetched.is_resolved());
}

#[tokio::test]
async fn record_decision_marks_approval_resolved() {
    let (store, job_id) = store_with_job().await;
    let approval = sample_approval(job_id.clone(), cw_core::ThreadId::new());
    store.insert_approval(approval.clone()).await.expect("insert");

    let decision = Decision { approval_id: approval.id.clone(), value: DecisionValue::Accept, decided_at: chrono::Utc::now(), actor: Some("client".into()) };
    store.record_decision(approval.id.clone(), decision).await.expect("record");

    let fetched = store.get_approval(approval.id).await.expect("get").expect("present");
    assert!(fetched.is_resolved());
}

#[tokio::test]
async fn list_pending_approvals_excludes_resolved() {
    let (store, job_id) = store_with_job().await;
    let thread_id = cw_core::ThreadId::new();
    let resolved = sample_approval(job_id.clone(), thread_id.clone());
    let pending = sample_approval(job_id.clone(), thread_id);
    store.insert_approval(resolved.clone()).await.expect("insert resolved");
    store.insert_approval(pending.clone()).await.expect("insert pending");

    let decision = Decision { approval_id: resolved.id.clone(), value: DecisionValue::Decline, decided_at: chrono::Utc::now(), actor: None };
    store.record_decision(resolved.id, decision).await.expect("record");

    let still_pending = store.list_pending_approvals_for_job(job_id).await.expect("list");
    assert_eq!(still_pending.len(), 1);
    assert_eq!(still_pending[0].id, pending.id);
}
