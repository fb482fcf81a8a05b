// SPDX-License-Identifier: MIT

//! Durable tier of the Thread-Event Projection cache: the materialized
//! `(threadId, threadCursor) -> envelope` table.

use cw_core::{EventEnvelope, ThreadEventEntry, ThreadId};
use rusqlite::{params, Row};

use crate::connection::Store;
use crate::error::StoreError;

fn row_to_entry(row: &Row<'_>) -> rusqlite::Result<ThreadEventEntry> {
    let thread_cursor: i64 = row.get("thread_cursor")?;
    let envelope_raw: String = row.get("envelope")?;
    let event: EventEnvelope = serde_json::from_str(&envelope_raw).map_err(|e| rusqlite::Error::InvalidColumnType(0, e.to_string(), rusqlite::types::Type::Text))?;
    Ok(ThreadEventEntry::new(thread_cursor as u64, event))
}

impl Store {
    /// Replace a thread's materialized projection wholesale. Called on
    /// (re)build after a cache miss or invalidation.
    pub async fn replace_projection(&self, thread_id: ThreadId, entries: Vec<ThreadEventEntry>) -> Result<(), StoreError> {
        let rows: Result<Vec<(i64, String)>, serde_json::Error> =
            entries.into_iter().map(|entry| Ok((entry.thread_cursor as i64, serde_json::to_string(&entry.event)?))).collect();
        let rows = rows?;

        self.with_conn(move |conn| {
            let tx = conn.unchecked_transaction()?;
            tx.execute("DELETE FROM thread_event_projection WHERE thread_id = ?1", params![thread_id.as_str()])?;
            for (cursor, envelope_json) in &rows {
                tx.execute("INSERT INTO thread_event_projection (thread_id, thread_cursor, envelope) VALUES (?1, ?2, ?3)", params![thread_id.as_str(), cursor, envelope_json])?;
            }
            tx.commit()?;
            Ok(())
        })
        .await
    }

    pub async fn get_projection_page(&self, thread_id: ThreadId, from_cursor: i64, limit: i64) -> Result<Vec<ThreadEventEntry>, StoreError> {
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare("SELECT * FROM thread_event_projection WHERE thread_id = ?1 AND thread_cursor > ?2 ORDER BY thread_cursor ASC LIMIT ?3")?;
            let rows = stmt.query_map(params![thread_id.as_str(), from_cursor, limit], row_to_entry)?;
            rows.collect::<rusqlite::Result<Vec<_>>>().map_err(StoreError::from)
        })
        .await
    }

    pub async fn projection_len(&self, thread_id: ThreadId) -> Result<i64, StoreError> {
        self.with_conn(move |conn| conn.query_row("SELECT count(*) FROM thread_event_projection WHERE thread_id = ?1", params![thread_id.as_str()], |row| row.get(0)).map_err(StoreError::from)).await
    }

    pub async fn invalidate_projection(&self, thread_id: ThreadId) -> Result<(), StoreError> {
        self.with_conn(move |conn| {
            conn.execute("DELETE FROM thread_event_projection WHERE thread_id = ?1", params![thread_id.as_str()])?;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
#[path = "projection_tests.rs"]
mod tests;
