// SPDX-License-Identifier: MIT

//! Append-only job event audit log. Distinct from `cw-engine`'s in-memory
//! bounded replay log: this table is never evicted, so a crashed Worker
//! can be audited after restart even though the in-memory cursor log is
//! gone.

use cw_core::{EventEnvelope, JobId};
use rusqlite::{params, Row};

use crate::connection::Store;
use crate::error::StoreError;

fn row_to_event(row: &Row<'_>) -> rusqlite::Result<EventEnvelope> {
    let payload_raw: String = row.get("payload")?;
    let payload: serde_json::Value = serde_json::from_str(&payload_raw).unwrap_or(serde_json::Value::Null);
    let kind_raw: String = row.get("event_type")?;
    let kind = serde_json::from_value(serde_json::Value::String(kind_raw))
        .map_err(|e| rusqlite::Error::InvalidColumnType(0, e.to_string(), rusqlite::types::Type::Text))?;

    Ok(EventEnvelope { kind, ts: row.get("ts")?, job_id: JobId::from_raw(row.get::<_, String>("job_id")?), seq: row.get::<_, i64>("seq")? as u64, payload })
}

impl Store {
    pub async fn append_event(&self, event: EventEnvelope) -> Result<(), StoreError> {
        let payload_json = serde_json::to_string(&event.payload)?;
        let event_type = event.kind.as_str().to_owned();

        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO job_events (job_id, seq, event_type, ts, payload) VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT (job_id, seq) DO NOTHING",
                params![event.job_id.as_str(), event.seq as i64, event_type, event.ts, payload_json],
            )?;
            Ok(())
        })
        .await
    }

    /// Audit-log read: every persisted event for a job, in `seq` order.
    pub async fn list_events_for_job(&self, job_id: JobId) -> Result<Vec<EventEnvelope>, StoreError> {
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare("SELECT * FROM job_events WHERE job_id = ?1 ORDER BY seq ASC")?;
            let rows = stmt.query_map(params![job_id.as_str()], row_to_event)?;
            rows.collect::<rusqlite::Result<Vec<_>>>().map_err(StoreError::from)
        })
        .await
    }

    /// Degrade-path read for the Thread-Event Projection: every persisted
    /// event across every job ever run on a thread, flattened and ordered
    /// by timestamp then `seq`, used when the projection cache and the
    /// upstream agent are both unavailable.
    pub async fn list_events_for_thread(&self, thread_id: cw_core::ThreadId) -> Result<Vec<EventEnvelope>, StoreError> {
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT job_events.* FROM job_events
                 JOIN jobs ON jobs.id = job_events.job_id
                 WHERE jobs.thread_id = ?1
                 ORDER BY job_events.ts ASC, job_events.seq ASC",
            )?;
            let rows = stmt.query_map(params![thread_id.as_str()], row_to_event)?;
            rows.collect::<rusqlite::Result<Vec<_>>>().map_err(StoreError::from)
        })
        .await
    }
}

#[cfg(test)]
#[path = "events_tests.rs"]
mod tests;
