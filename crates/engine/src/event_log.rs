// SPDX-License-Identifier: MIT

//! Per-job append-only event log with bounded retention and cursor-based
//! replay: append, bounded drop-from-front, and offset-based replay, kept
//! in-memory since retention is an event count (2000), not bytes.

use std::collections::VecDeque;

use cw_core::{EventEnvelope, EventType, JobId};
use serde_json::Value;
use tokio::sync::mpsc;

use crate::error::EngineError;

/// Default retention, in events, per job.
pub const DEFAULT_RETENTION: usize = 2000;

pub type SubscriberId = u64;

/// A per-job append-only sequence with live fan-out and cursor replay.
pub struct EventLog {
    job_id: JobId,
    events: VecDeque<EventEnvelope>,
    next_seq: u64,
    first_seq: u64,
    retention: usize,
    subscribers: Vec<(SubscriberId, mpsc::UnboundedSender<EventEnvelope>)>,
    next_subscriber_id: SubscriberId,
}

impl EventLog {
    pub fn new(job_id: JobId) -> Self {
        Self::with_retention(job_id, DEFAULT_RETENTION)
    }

    pub fn with_retention(job_id: JobId, retention: usize) -> Self {
        Self { job_id, events: VecDeque::new(), next_seq: 0, first_seq: 0, retention, subscribers: Vec::new(), next_subscriber_id: 0 }
    }

    pub fn first_seq(&self) -> u64 {
        self.first_seq
    }

    pub fn next_seq(&self) -> u64 {
        self.next_seq
    }

    /// Assign the next `seq`, append, and notify every subscriber in
    /// registration order. Subscriber send failures (a dropped receiver)
    /// are swallowed so they never disrupt other subscribers.
    pub fn append(&mut self, kind: EventType, payload: Value) -> EventEnvelope {
        let seq = self.next_seq;
        self.next_seq += 1;
        let envelope = EventEnvelope::new(kind, self.job_id.clone(), seq, payload);
        self.events.push_back(envelope.clone());

        while self.events.len() > self.retention {
            self.events.pop_front();
            self.first_seq += 1;
        }

        self.subscribers.retain(|(_, tx)| tx.send(envelope.clone()).is_ok());
        envelope
    }

    pub fn subscribe(&mut self) -> (SubscriberId, mpsc::UnboundedReceiver<EventEnvelope>) {
        let id = self.next_subscriber_id;
        self.next_subscriber_id += 1;
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push((id, tx));
        (id, rx)
    }

    pub fn unsubscribe(&mut self, id: SubscriberId) {
        self.subscribers.retain(|(existing, _)| *existing != id);
    }

    /// Cursor replay: `cursor == null` starts from `firstSeq - 1`; an
    /// in-range integer cursor returns everything after it; a cursor older
    /// than the retained window is `CURSOR_EXPIRED`.
    pub fn list_events(&self, cursor: Option<i64>) -> Result<(Vec<EventEnvelope>, i64), EngineError> {
        let floor = self.first_seq as i64 - 1;
        let effective = cursor.unwrap_or(floor);
        if effective < floor {
            return Err(EngineError::CursorExpired);
        }

        let events: Vec<EventEnvelope> = self.events.iter().filter(|e| e.seq as i64 > effective).cloned().collect();
        let next_cursor = events.last().map(|e| e.seq as i64).unwrap_or(effective);
        Ok((events, next_cursor))
    }
}

#[cfg(test)]
#[path = "event_log_tests.rs"]
mod tests;
