// SPDX-License-Identifier: MIT

use super::*;
use cw_core::{JobId, ThreadId};

fn sample_thread_read() -> Value {
    serde_json::json!({
        "turns": [
            {
                "id": "turn-1",
                "status": "completed",
                "items": [
                    {"type": "userMessage", "id": "item-1", "text": "hi"},
                    {"type": "agentMessage", "id": "item-2", "content": {"blocks": []}},
                ],
            },
            {
                "id": "turn-2",
                "status": "failed",
                "error": {"message": "boom"},
                "items": [],
            },
            {
                "id": "turn-3",
                "status": "inProgress",
                "items": [{"type": "userMessage", "id": "item-3", "text": "still going"}],
            },
        ],
    })
}

#[test]
fn completed_turn_emits_items_then_job_state_then_finished() {
    let read = sample_thread_read();
    let envelopes = build_projection(&read, None, &[]);

    let turn_1: Vec<_> = envelopes.iter().filter(|e| e.job_id.as_str().contains("turn-1")).collect();
    assert_eq!(turn_1.len(), 4, "2 items + job.state + job.finished");
    assert_eq!(turn_1[0].kind, EventType::ItemCompleted);
    assert_eq!(turn_1[1].kind, EventType::ItemCompleted);
    assert_eq!(turn_1[2].kind, EventType::JobState);
    assert_eq!(turn_1[2].payload["state"], "DONE");
    assert_eq!(turn_1[3].kind, EventType::JobFinished);
}

#[test]
fn failed_turn_with_error_emits_state_finished_and_error() {
    let read = sample_thread_read();
    let envelopes = build_projection(&read, None, &[]);

    let turn_2: Vec<_> = envelopes.iter().filter(|e| e.job_id.as_str().contains("turn-2")).collect();
    assert_eq!(turn_2.len(), 3, "job.state + job.finished + error, no items");
    assert_eq!(turn_2[0].payload["state"], "FAILED");
    assert_eq!(turn_2[1].kind, EventType::JobFinished);
    assert_eq!(turn_2[2].kind, EventType::Error);
    assert_eq!(turn_2[2].payload["message"], "boom");
}

#[test]
fn in_progress_turn_without_a_live_job_skips_the_phantom_running_state() {
    let read = sample_thread_read();
    let envelopes = build_projection(&read, None, &[]);

    let turn_3: Vec<_> = envelopes.iter().filter(|e| e.job_id.as_str().contains("turn-3")).collect();
    assert_eq!(turn_3.len(), 1, "only the item, no job.state(RUNNING) without a live job");
    assert_eq!(turn_3[0].kind, EventType::ItemCompleted);
}

#[test]
fn in_progress_turn_matching_the_active_job_emits_running_state_under_the_real_job_id() {
    let read = sample_thread_read();
    let mut job = cw_core::Job::new(ThreadId::new());
    job.turn_id = Some("turn-3".to_string());
    let live_id = job.id.clone();

    let envelopes = build_projection(&read, Some(&job), &[]);
    let turn_3: Vec<_> = envelopes.iter().filter(|e| e.job_id == live_id).collect();
    assert_eq!(turn_3.len(), 2, "item + job.state(RUNNING) under the live job id");
    assert_eq!(turn_3[1].payload["state"], "RUNNING");
}

#[test]
fn active_job_live_events_are_appended_after_historical_turns() {
    let read = sample_thread_read();
    let job = cw_core::Job::new(ThreadId::new());
    let live = vec![EventEnvelope::new(EventType::ItemAgentMessageDelta, job.id.clone(), 0, serde_json::json!({"delta": "x"}))];

    let envelopes = build_projection(&read, Some(&job), &live);
    assert_eq!(envelopes.last().unwrap().kind, EventType::ItemAgentMessageDelta);
}

#[test]
fn paginate_from_start_returns_the_first_page_and_preserves_cursor_semantics() {
    let entries: Vec<EventEnvelope> = (0..5).map(|i| EventEnvelope::new(EventType::ItemCompleted, JobId::new(), i, serde_json::json!({}))).collect();

    let (page, next_cursor, has_more) = paginate(&entries, -1, 2).expect("page");
    assert_eq!(page.len(), 2);
    assert_eq!(page[0].thread_cursor, 0);
    assert_eq!(page[1].thread_cursor, 1);
    assert_eq!(next_cursor, 1);
    assert!(has_more);
}

#[test]
fn paginate_continuing_from_a_cursor_returns_the_tail() {
    let entries: Vec<EventEnvelope> = (0..5).map(|i| EventEnvelope::new(EventType::ItemCompleted, JobId::new(), i, serde_json::json!({}))).collect();

    let (page, next_cursor, has_more) = paginate(&entries, 3, 10).expect("page");
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].thread_cursor, 4);
    assert_eq!(next_cursor, 4);
    assert!(!has_more);
}

#[test]
fn paginate_with_cursor_at_or_past_the_end_is_expired() {
    let entries: Vec<EventEnvelope> = (0..3).map(|i| EventEnvelope::new(EventType::ItemCompleted, JobId::new(), i, serde_json::json!({}))).collect();

    let err = paginate(&entries, 3, 10).unwrap_err();
    assert!(matches!(err, EngineError::ThreadCursorExpired));
}

#[test]
fn paginate_on_an_empty_projection_with_the_initial_cursor_is_empty_not_expired() {
    let entries: Vec<EventEnvelope> = Vec::new();
    let (page, next_cursor, has_more) = paginate(&entries, -1, 200).expect("page");
    assert!(page.is_empty());
    assert_eq!(next_cursor, -1);
    assert!(!has_more);
}

#[test]
fn resolve_limit_defaults_clamps_and_rejects_zero() {
    assert_eq!(resolve_limit(None).unwrap(), DEFAULT_PAGE_LIMIT);
    assert_eq!(resolve_limit(Some(50)).unwrap(), 50);
    assert!(matches!(resolve_limit(Some(0)).unwrap_err(), EngineError::InvalidLimit));
    assert!(matches!(resolve_limit(Some(MAX_PAGE_LIMIT + 1)).unwrap_err(), EngineError::InvalidLimit));
}

#[test]
fn cached_projection_reports_freshness_against_the_ttl() {
    let cached = CachedProjection::new(vec![]);
    assert!(cached.is_fresh());
}
