// SPDX-License-Identifier: MIT

//! Thread persistence: the cache store's mirror of agent-owned threads.

use cw_core::{Thread, ThreadId};
use rusqlite::{params, OptionalExtension, Row};

use crate::connection::Store;
use crate::error::StoreError;

fn row_to_thread(row: &Row<'_>) -> rusqlite::Result<Thread> {
    Ok(Thread {
        id: ThreadId::from_raw(row.get::<_, String>("id")?),
        working_dir: row.get("working_dir")?,
        preview: row.get("preview")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        model_provider: row.get("model_provider")?,
        archived: row.get::<_, i64>("archived")? != 0,
    })
}

impl Store {
    pub async fn upsert_thread(&self, thread: Thread) -> Result<(), StoreError> {
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO threads (id, working_dir, preview, model_provider, archived, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT (id) DO UPDATE SET
                    working_dir = excluded.working_dir,
                    preview = excluded.preview,
                    model_provider = excluded.model_provider,
                    archived = excluded.archived,
                    updated_at = excluded.updated_at",
                params![
                    thread.id.as_str(),
                    thread.working_dir,
                    thread.preview,
                    thread.model_provider,
                    thread.archived as i64,
                    thread.created_at,
                    thread.updated_at,
                ],
            )?;
            Ok(())
        })
        .await
    }

    pub async fn get_thread(&self, id: ThreadId) -> Result<Option<Thread>, StoreError> {
        self.with_conn(move |conn| {
            conn.query_row("SELECT * FROM threads WHERE id = ?1", params![id.as_str()], row_to_thread).optional().map_err(StoreError::from)
        })
        .await
    }

    /// List threads, optionally filtered by archived state, newest first.
    pub async fn list_threads(&self, archived: Option<bool>) -> Result<Vec<Thread>, StoreError> {
        self.with_conn(move |conn| {
            let mut collect = |sql: &str, params: &[&dyn rusqlite::ToSql]| -> rusqlite::Result<Vec<Thread>> {
                let mut stmt = conn.prepare(sql)?;
                let rows = stmt.query_map(params, row_to_thread)?;
                rows.collect()
            };
            let threads = match archived {
                Some(flag) => collect("SELECT * FROM threads WHERE archived = ?1 ORDER BY updated_at DESC", params![flag as i64]),
                None => collect("SELECT * FROM threads ORDER BY updated_at DESC", params![]),
            }?;
            Ok(threads)
        })
        .await
    }

    pub async fn set_thread_archived(&self, id: ThreadId, archived: bool) -> Result<(), StoreError> {
        self.with_conn(move |conn| {
            let updated = conn.execute("UPDATE threads SET archived = ?1 WHERE id = ?2", params![archived as i64, id.as_str()])?;
            if updated == 0 {
                return Err(StoreError::NotFound);
            }
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
#[path = "threads_tests.rs"]
mod tests;
