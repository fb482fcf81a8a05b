// SPDX-License-Identifier: MIT

use super::*;
use cw_core::{EventType, Job, Thread};
use cw_rpc::{process::SpawnSpec, RpcBridge};

fn shell_spec(script: &str) -> SpawnSpec {
    SpawnSpec { command: "sh".into(), args: vec!["-c".into(), script.into()], cwd: None, env: vec![] }
}

async fn engine_with_script(script: &str) -> Engine {
    let bridge = RpcBridge::start(shell_spec(script)).expect("start agent");
    Engine::new(cw_store::Store::open_in_memory().expect("open store"), crate::upstream::UpstreamClient::new(bridge), vec![])
}

const THREAD_READ_SUCCESS: &str = r#"
i=0
while IFS= read -r line; do
  i=$((i+1))
  printf '{"jsonrpc":"2.0","id":%d,"result":{"turns":[{"id":"turn-1","status":"completed","items":[{"type":"userMessage","id":"item-1","text":"hi"}]}]}}\n' "$i"
done
"#;

const ALWAYS_ERRORS: &str = r#"
i=0
while IFS= read -r line; do
  i=$((i+1))
  printf '{"jsonrpc":"2.0","id":%d,"error":{"code":-32000,"message":"upstream down"}}\n' "$i"
done
"#;

#[tokio::test]
async fn fresh_in_memory_snapshot_is_paged_without_touching_upstream() {
    let engine = engine_with_script(ALWAYS_ERRORS).await;
    let thread_id = ThreadId::new();
    let job_id = JobId::new();
    let entries = vec![
        EventEnvelope::new(EventType::JobCreated, job_id.clone(), 0, serde_json::json!({})),
        EventEnvelope::new(EventType::JobFinished, job_id, 1, serde_json::json!({})),
    ];
    {
        let mut cache = engine.state.projection_cache.lock().await;
        cache.insert(thread_id.clone(), CachedProjection::new(entries));
    }

    let (page, _next_cursor, has_more) = get_thread_events(&engine, thread_id, None, None).await.expect("page");
    assert_eq!(page.len(), 2);
    assert!(!has_more);
}

#[tokio::test]
async fn stale_cache_miss_rebuilds_from_upstream_thread_read() {
    let engine = engine_with_script(THREAD_READ_SUCCESS).await;
    let thread_id = ThreadId::new();

    let (page, _next_cursor, _has_more) = get_thread_events(&engine, thread_id.clone(), None, None).await.expect("page");
    assert_eq!(page.len(), 1);
    assert!(matches!(page[0].event.kind, EventType::ItemCompleted));

    let cache = engine.state.projection_cache.lock().await;
    assert!(cache.get(&thread_id).expect("cached after rebuild").is_fresh());
}

#[tokio::test]
async fn degrade_path_scans_the_store_when_upstream_and_cache_are_both_unavailable() {
    let engine = engine_with_script(ALWAYS_ERRORS).await;
    let thread_id = ThreadId::new();
    let thread = Thread::new(thread_id.clone(), "/workspace");
    engine.store.upsert_thread(thread).await.expect("seed thread");

    let job = Job::new(thread_id.clone());
    let job_id = job.id.clone();
    engine.store.upsert_job(job).await.expect("seed job");
    engine.store.append_event(EventEnvelope::new(EventType::JobCreated, job_id, 0, serde_json::json!({}))).await.expect("seed event");

    let (page, _next_cursor, has_more) = get_thread_events(&engine, thread_id, None, None).await.expect("page");
    assert_eq!(page.len(), 1);
    assert!(!has_more);
}
