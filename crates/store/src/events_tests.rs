// SPDX-License-Identifier: MIT

use super::*;
use crate::connection::Store;
use cw_core::{EventType, Job, ThreadId};

async fn store_with_job() -> (Store, JobId) {
    let store = Store::open_in_memory().expect("open");
    let thread = cw_core::Thread::new(ThreadId::new(), "/workspace");
    store.upsert_thread(thread.clone()).await.expect("upsert thread");
    let job = Job::new(thread.id);
    let job_id = job.id.clone();
    store.upsert_job(job).await.expect("upsert job");
    (store, job_id)
}

#[tokio::test]
async fn appended_events_list_back_in_seq_order() {
    let (store, job_id) = store_with_job().await;
    store.append_event(EventEnvelope::new(EventType::JobCreated, job_id.clone(), 0, serde_json::json!({}))).await.expect("append 0");
    store.append_event(EventEnvelope::new(EventType::JobState, job_id.clone(), 1, serde_json::json!({"state": "RUNNING"}))).await.expect("append 1");

    let events = store.list_events_for_job(job_id).await.expect("list");
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].seq, 0);
    assert_eq!(events[1].seq, 1);
    assert!(matches!(events[1].kind, EventType::JobState));
}

#[tokio::test]
async fn re_appending_the_same_seq_is_a_no_op() {
    let (store, job_id) = store_with_job().await;
    store.append_event(EventEnvelope::new(EventType::JobCreated, job_id.clone(), 0, serde_json::json!({"first": true}))).await.expect("append");
    store.append_event(EventEnvelope::new(EventType::JobCreated, job_id.clone(), 0, serde_json::json!({"first": false}))).await.expect("append again");

    let events = store.list_events_for_job(job_id).await.expect("list");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].payload, serde_json::json!({"first": true}));
}

#[tokio::test]
async fn thread_scan_flattens_events_across_every_job_on_the_thread() {
    let store = Store::open_in_memory().expect("open");
    let thread = cw_core::Thread::new(ThreadId::new(), "/workspace");
    store.upsert_thread(thread.clone()).await.expect("upsert thread");

    let first_job = Job::new(thread.id.clone());
    let second_job = Job::new(thread.id.clone());
    store.upsert_job(first_job.clone()).await.expect("upsert first job");
    store.upsert_job(second_job.clone()).await.expect("upsert second job");

    store.append_event(EventEnvelope::new(EventType::JobCreated, first_job.id.clone(), 0, serde_json::json!({}))).await.expect("append");
    store.append_event(EventEnvelope::new(EventType::JobCreated, second_job.id.clone(), 0, serde_json::json!({}))).await.expect("append");
    store.append_event(EventEnvelope::new(EventType::JobFinished, first_job.id.clone(), 1, serde_json::json!({}))).await.expect("append");

    let events = store.list_events_for_thread(thread.id).await.expect("scan");
    assert_eq!(events.len(), 3);
}

#[tokio::test]
async fn thread_scan_is_empty_for_a_thread_with_no_jobs() {
    let store = Store::open_in_memory().expect("open");
    let thread = cw_core::Thread::new(ThreadId::new(), "/workspace");
    store.upsert_thread(thread.clone()).await.expect("upsert thread");

    let events = store.list_events_for_thread(thread.id).await.expect("scan");
    assert!(events.is_empty());
}
