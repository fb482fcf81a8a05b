// SPDX-License-Identifier: MIT

//! Thread-Event Projection: linearize the agent's `thread/read` turns
//! into per-turn envelopes, append the active job's live events, and
//! cursor-page the result.

use std::time::{Duration, Instant};

use cw_core::{EventEnvelope, EventType, Job, JobId, JobState, ThreadEventEntry};
use serde_json::Value;

use crate::error::EngineError;

/// In-memory snapshot TTL.
pub const SNAPSHOT_TTL: Duration = Duration::from_secs(5);
pub const DEFAULT_PAGE_LIMIT: usize = 200;
pub const MAX_PAGE_LIMIT: usize = 1000;

/// The in-memory tier of the two-tier projection cache.
pub struct CachedProjection {
    pub entries: Vec<EventEnvelope>,
    built_at: Instant,
}

impl CachedProjection {
    pub fn new(entries: Vec<EventEnvelope>) -> Self {
        Self { entries, built_at: Instant::now() }
    }

    pub fn is_fresh(&self) -> bool {
        self.built_at.elapsed() < SNAPSHOT_TTL
    }
}

/// Map a turn's upstream `status` to the job state it represents.
fn map_turn_status(status: &str) -> Option<JobState> {
    match status {
        "completed" => Some(JobState::Done),
        "failed" => Some(JobState::Failed),
        "interrupted" => Some(JobState::Cancelled),
        "inProgress" => Some(JobState::Running),
        _ => None,
    }
}

/// Per-turn envelope construction. `live_job_id` is `Some` when this turn
/// is the one currently owned by an in-memory `Job` (matched by `turnId`).
fn build_turn_envelopes(turn: &Value, live_job_id: Option<&JobId>) -> Vec<EventEnvelope> {
    let mut out = Vec::new();
    let turn_id = turn.get("id").and_then(Value::as_str).unwrap_or_default();
    let synthetic_job_id = live_job_id.cloned().unwrap_or_else(|| JobId::from_raw(format!("JOB-hist-{turn_id}")));

    if let Some(items) = turn.get("items").and_then(Value::as_array) {
        for item in items {
            let item_type = item.get("type").and_then(Value::as_str).unwrap_or_default();
            if item_type != "userMessage" && item_type != "agentMessage" {
                continue;
            }
            let mut payload = serde_json::json!({
                "type": item_type,
                "id": item.get("id").cloned().unwrap_or(Value::Null),
            });
            if let Some(content) = item.get("content") {
                payload["content"] = content.clone();
            } else if let Some(text) = item.get("text") {
                payload["text"] = text.clone();
            }
            out.push(EventEnvelope::new(EventType::ItemCompleted, synthetic_job_id.clone(), 0, payload));
        }
    }

    let status = turn.get("status").and_then(Value::as_str).unwrap_or("");
    if let Some(state) = map_turn_status(status) {
        let is_phantom_running = state == JobState::Running && live_job_id.is_none();
        if !is_phantom_running {
            out.push(EventEnvelope::new(EventType::JobState, synthetic_job_id.clone(), 0, serde_json::json!({"state": state.as_str()})));
            if state.is_terminal() {
                out.push(EventEnvelope::new(EventType::JobFinished, synthetic_job_id.clone(), 0, serde_json::json!({})));
            }
        }
    }

    if let Some(error_message) = turn.get("error").and_then(|e| e.get("message")).and_then(Value::as_str) {
        out.push(EventEnvelope::new(EventType::Error, synthetic_job_id, 0, serde_json::json!({"message": error_message})));
    }

    out
}

/// Build the full, unpaginated projection: historical turns from the
/// agent's `thread/read` result, followed by the active job's in-memory
/// live events, if any.
pub fn build_projection(thread_read_result: &Value, active_job: Option<&Job>, live_events: &[EventEnvelope]) -> Vec<EventEnvelope> {
    let mut out = Vec::new();

    if let Some(turns) = thread_read_result.get("turns").and_then(Value::as_array) {
        for turn in turns {
            let turn_id = turn.get("id").and_then(Value::as_str);
            let live_job_id = active_job.filter(|job| job.turn_id.as_deref() == turn_id).map(|job| &job.id);
            out.extend(build_turn_envelopes(turn, live_job_id));
        }
    }

    if active_job.is_some() {
        out.extend_from_slice(live_events);
    }

    out
}

/// Cursor-page a built projection. `cursor = -1` means "from start";
/// `cursor >= total` is `THREAD_CURSOR_EXPIRED`.
pub fn paginate(entries: &[EventEnvelope], cursor: i64, limit: usize) -> Result<(Vec<ThreadEventEntry>, i64, bool), EngineError> {
    let total = entries.len() as i64;
    if cursor >= total {
        return Err(EngineError::ThreadCursorExpired);
    }
    let start = (cursor + 1).max(0) as usize;
    let end = (start + limit).min(entries.len());

    let page: Vec<ThreadEventEntry> = entries[start..end].iter().enumerate().map(|(i, event)| ThreadEventEntry::new((start + i) as u64, event.clone())).collect();
    let next_cursor = page.last().map(|e| e.thread_cursor as i64).unwrap_or(cursor);
    let has_more = end < entries.len();
    Ok((page, next_cursor, has_more))
}

/// Validate and clamp a client-supplied page limit (default 200, max
/// 1000).
pub fn resolve_limit(requested: Option<usize>) -> Result<usize, EngineError> {
    match requested {
        None => Ok(DEFAULT_PAGE_LIMIT),
        Some(0) => Err(EngineError::InvalidLimit),
        Some(n) if n > MAX_PAGE_LIMIT => Err(EngineError::InvalidLimit),
        Some(n) => Ok(n),
    }
}

#[cfg(test)]
#[path = "projection_tests.rs"]
mod tests;
