// SPDX-License-Identifier: MIT

use super::*;
use crate::connection::Store;

async fn store_with_thread() -> (Store, ThreadId) {
    let store = Store::open_in_memory().expect("open");
    let thread = cw_core::Thread::new(ThreadId::new(), "/workspace");
    let thread_id = thread.id.clone();
    store.upsert_thread(thread).await.expect("upsert thread");
    (store, thread_id)
}

#[tokio::test]
async fn upsert_then_get_round_trips_a_job() {
    let (store, thread_id) = store_with_thread().await;
    let mut job = Job::new(thread_id);
    job.pending_approval_ids.insert(ApprovalId::new());
    store.upsert_job(job.clone()).await.expect("upsert");

    let fetched = store.get_job(job.id.clone()).await.expect("get").expect("present");
    assert_eq!(fetched.state, JobState::Queued);
    assert_eq!(fetched.pending_approval_ids, job.pending_approval_ids);
}

#[tokio::test]
async fn active_job_for_thread_finds_the_running_job() {
    let (store, thread_id) = store_with_thread().await;
    let mut job = Job::new(thread_id.clone());
    job.transition_to(JobState::Running);
    store.upsert_job(job.clone()).await.expect("upsert");

    let active = store.active_job_for_thread(thread_id).await.expect("query").expect("present");
    assert_eq!(active.id, job.id);
}

#[tokio::test]
async fn active_job_for_thread_is_none_once_terminal() {
    let (store, thread_id) = store_with_thread().await;
    let mut job = Job::new(thread_id.clone());
    job.transition_to(JobState::Done);
    store.upsert_job(job).await.expect("upsert");

    let active = store.active_job_for_thread(thread_id).await.expect("query");
    assert!(active.is_none());
}

#[tokio::test]
async fn list_jobs_for_thread_returns_all_jobs() {
    let (store, thread_id) = store_with_thread().await;
    let job_a = Job::new(thread_id.clone());
    let job_b = Job::new(thread_id.clone());
    store.upsert_job(job_a).await.expect("upsert a");
    store.upsert_job(job_b).await.expect("upsert b");

    let jobs = store.list_jobs_for_thread(thread_id).await.expect("list");
    assert_eq!(jobs.len(), 2);
}
