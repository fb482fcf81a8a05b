// SPDX-License-Identifier: MIT

use super::*;
use cw_core::JobId;

fn push_n(log: &mut EventLog, n: u64) {
    for i in 0..n {
        log.append(EventType::ItemAgentMessageDelta, serde_json::json!({"i": i}));
    }
}

#[test]
fn null_cursor_returns_everything_retained() {
    let mut log = EventLog::new(JobId::new());
    push_n(&mut log, 3);
    let (events, next) = log.list_events(None).expect("ok");
    assert_eq!(events.len(), 3);
    assert_eq!(next, 2);
}

#[test]
fn cursor_in_range_returns_the_tail() {
    let mut log = EventLog::new(JobId::new());
    push_n(&mut log, 5);
    let (events, next) = log.list_events(Some(2)).expect("ok");
    assert_eq!(events.iter().map(|e| e.seq).collect::<Vec<_>>(), vec![3, 4]);
    assert_eq!(next, 4);
}

#[test]
fn cursor_at_the_tail_returns_empty_and_preserves_cursor() {
    let mut log = EventLog::new(JobId::new());
    push_n(&mut log, 3);
    let (events, next) = log.list_events(Some(2)).expect("ok");
    assert!(events.is_empty());
    assert_eq!(next, 2);
}

#[test]
fn cursor_older_than_retention_window_is_expired() {
    let mut log = EventLog::with_retention(JobId::new(), 100);
    push_n(&mut log, 250);
    assert_eq!(log.first_seq(), 150);

    let err = log.list_events(Some(5)).unwrap_err();
    assert!(matches!(err, EngineError::CursorExpired));

    let (events, _) = log.list_events(Some(200)).expect("ok");
    assert_eq!(events.len(), 49);
    assert_eq!(events.first().unwrap().seq, 201);
    assert_eq!(events.last().unwrap().seq, 249);
}

#[test]
fn retention_drops_from_the_front_and_advances_first_seq() {
    let mut log = EventLog::with_retention(JobId::new(), 2);
    push_n(&mut log, 5);
    assert_eq!(log.first_seq(), 3);
    assert_eq!(log.next_seq(), 5);
}

#[test]
fn subscriber_receives_events_appended_after_subscribing() {
    let mut log = EventLog::new(JobId::new());
    let (_id, mut rx) = log.subscribe();
    log.append(EventType::JobCreated, serde_json::json!({}));

    let received = rx.try_recv().expect("event delivered");
    assert_eq!(received.seq, 0);
}

#[test]
fn dropped_subscriber_does_not_break_future_appends() {
    let mut log = EventLog::new(JobId::new());
    let (id, rx) = log.subscribe();
    drop(rx);
    log.unsubscribe(id);

    // Should not panic despite no live subscribers.
    log.append(EventType::JobCreated, serde_json::json!({}));
}
