// SPDX-License-Identifier: MIT

use super::*;
use crate::connection::Store;
use cw_core::{EventType, JobId};

async fn store_with_thread() -> (Store, ThreadId) {
    let store = Store::open_in_memory().expect("open");
    let thread = cw_core::Thread::new(ThreadId::new(), "/workspace");
    let id = thread.id.clone();
    store.upsert_thread(thread).await.expect("upsert thread");
    (store, id)
}

fn entry(cursor: u64, seq: u64) -> ThreadEventEntry {
    ThreadEventEntry::new(cursor, EventEnvelope::new(EventType::ItemCompleted, JobId::new(), seq, serde_json::json!({})))
}

#[tokio::test]
async fn replace_then_page_round_trips_entries_in_order() {
    let (store, thread_id) = store_with_thread().await;
    let entries = vec![entry(0, 0), entry(1, 1), entry(2, 2)];
    store.replace_projection(thread_id.clone(), entries).await.expect("replace");

    let page = store.get_projection_page(thread_id, -1, 2).await.expect("page");
    assert_eq!(page.len(), 2);
    assert_eq!(page[0].thread_cursor, 0);
    assert_eq!(page[1].thread_cursor, 1);
}

#[tokio::test]
async fn replace_projection_clears_prior_rows() {
    let (store, thread_id) = store_with_thread().await;
    store.replace_projection(thread_id.clone(), vec![entry(0, 0), entry(1, 1)]).await.expect("replace 1");
    store.replace_projection(thread_id.clone(), vec![entry(0, 0)]).await.expect("replace 2");

    let len = store.projection_len(thread_id).await.expect("len");
    assert_eq!(len, 1);
}

#[tokio::test]
async fn invalidate_projection_removes_all_rows() {
    let (store, thread_id) = store_with_thread().await;
    store.replace_projection(thread_id.clone(), vec![entry(0, 0)]).await.expect("replace");
    store.invalidate_projection(thread_id.clone()).await.expect("invalidate");

    let len = store.projection_len(thread_id).await.expect("len");
    assert_eq!(len, 0);
}
