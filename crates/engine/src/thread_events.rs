// SPDX-License-Identifier: MIT

//! Orchestrates the Thread-Event Projection's two-tier cache and degrade
//! path. `projection.rs` holds the pure building blocks; this module
//! owns the stateful fallback chain across them:
//!
//! 1. a fresh in-memory snapshot (`CachedProjection`, TTL 5s) is paged
//!    directly;
//! 2. otherwise rebuild from the upstream agent's `thread/read` plus the
//!    active job's live events, refresh both cache tiers, and page that;
//! 3. if the rebuild fails and a stale in-memory snapshot exists, page
//!    that rather than fail the request;
//! 4. otherwise fall back to the durable store's flat "events ever run on
//!    this thread" scan, which survives both an upstream outage and a
//!    cold in-memory cache after restart.

use cw_core::{EventEnvelope, ThreadEventEntry, ThreadId};
use tracing::warn;

use crate::error::EngineError;
use crate::job::newest_active_job;
use crate::projection::{build_projection, paginate, CachedProjection};
use crate::Engine;

/// `getThreadEvents`: resolve the limit, then walk the cache/rebuild/
/// degrade chain to produce a cursor-paged slice.
pub async fn get_thread_events(engine: &Engine, thread_id: ThreadId, cursor: Option<i64>, limit: Option<usize>) -> Result<(Vec<ThreadEventEntry>, i64, bool), EngineError> {
    let limit = crate::projection::resolve_limit(limit)?;
    let cursor = cursor.unwrap_or(-1);

    if let Some(entries) = fresh_snapshot(engine, &thread_id).await {
        return paginate(&entries, cursor, limit);
    }

    match rebuild(engine, &thread_id).await {
        Ok(entries) => paginate(&entries, cursor, limit),
        Err(err) => {
            warn!(thread_id = %thread_id, error = %err, "thread projection rebuild failed, falling back");
            if let Some(entries) = stale_snapshot(engine, &thread_id).await {
                return paginate(&entries, cursor, limit);
            }
            let entries = degrade_path(engine, &thread_id).await?;
            paginate(&entries, cursor, limit)
        }
    }
}

async fn fresh_snapshot(engine: &Engine, thread_id: &ThreadId) -> Option<Vec<EventEnvelope>> {
    let cache = engine.state.projection_cache.lock().await;
    let cached = cache.get(thread_id)?;
    cached.is_fresh().then(|| cached.entries.clone())
}

async fn stale_snapshot(engine: &Engine, thread_id: &ThreadId) -> Option<Vec<EventEnvelope>> {
    let cache = engine.state.projection_cache.lock().await;
    cache.get(thread_id).map(|cached| cached.entries.clone())
}

/// Rebuild the projection from the agent's `thread/read` and the active
/// job's live events, then refresh both cache tiers.
async fn rebuild(engine: &Engine, thread_id: &ThreadId) -> Result<Vec<EventEnvelope>, EngineError> {
    let thread_read_result = engine.upstream.thread_read(serde_json::json!({ "threadId": thread_id.as_str() })).await?;

    let active_job = {
        let jobs = engine.state.jobs.lock().await;
        newest_active_job(&jobs, thread_id).cloned()
    };

    let live_events = match &active_job {
        Some(job) => {
            let logs = engine.state.event_logs.lock().await;
            logs.get(&job.id).map(|log| log.list_events(None)).transpose()?.map(|(events, _)| events).unwrap_or_default()
        }
        None => Vec::new(),
    };

    let entries = build_projection(&thread_read_result, active_job.as_ref(), &live_events);

    {
        let mut cache = engine.state.projection_cache.lock().await;
        cache.insert(thread_id.clone(), CachedProjection::new(entries.clone()));
    }

    let durable_entries: Vec<ThreadEventEntry> = entries.iter().enumerate().map(|(i, event)| ThreadEventEntry::new(i as u64, event.clone())).collect();
    if let Err(err) = engine.store.replace_projection(thread_id.clone(), durable_entries).await {
        warn!(thread_id = %thread_id, error = %err, "failed to persist rebuilt thread projection");
    }

    Ok(entries)
}

/// Flat scan of every job event ever persisted for this thread, used only
/// when both the in-memory cache and the upstream agent are unavailable.
/// `threadCursor` here is the scan's own row index, distinct from the
/// cursor space a fresh rebuild would have assigned.
async fn degrade_path(engine: &Engine, thread_id: &ThreadId) -> Result<Vec<EventEnvelope>, EngineError> {
    Ok(engine.store.list_events_for_thread(thread_id.clone()).await?)
}

#[cfg(test)]
#[path = "thread_events_tests.rs"]
mod tests;
