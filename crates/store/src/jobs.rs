// SPDX-License-Identifier: MIT

//! Job persistence.

use std::collections::BTreeSet;

use cw_core::{ApprovalId, Job, JobId, JobState, ThreadId};
use rusqlite::{params, OptionalExtension, Row};

use crate::connection::Store;
use crate::error::StoreError;

fn job_state_to_str(state: JobState) -> &'static str {
    state.as_str()
}

fn job_state_from_str(raw: &str) -> rusqlite::Result<JobState> {
    match raw {
        "QUEUED" => Ok(JobState::Queued),
        "RUNNING" => Ok(JobState::Running),
        "WAITING_APPROVAL" => Ok(JobState::WaitingApproval),
        "DONE" => Ok(JobState::Done),
        "FAILED" => Ok(JobState::Failed),
        "CANCELLED" => Ok(JobState::Cancelled),
        other => Err(rusqlite::Error::InvalidColumnType(0, format!("unknown job state {other}"), rusqlite::types::Type::Text)),
    }
}

fn row_to_job(row: &Row<'_>) -> rusqlite::Result<Job> {
    let pending_raw: String = row.get("pending_approval_ids")?;
    let pending_ids: Vec<String> = serde_json::from_str(&pending_raw).unwrap_or_default();

    Ok(Job {
        id: JobId::from_raw(row.get::<_, String>("id")?),
        thread_id: ThreadId::from_raw(row.get::<_, String>("thread_id")?),
        turn_id: row.get("turn_id")?,
        state: job_state_from_str(&row.get::<_, String>("state")?)?,
        next_seq: row.get::<_, i64>("next_seq")? as u64,
        first_seq: row.get::<_, i64>("first_seq")? as u64,
        error: row.get("error")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        terminal_at: row.get("terminal_at")?,
        pending_approval_ids: pending_ids.into_iter().map(ApprovalId::from_raw).collect::<BTreeSet<_>>(),
        finished_emitted: row.get::<_, i64>("finished_emitted")? != 0,
    })
}

impl Store {
    pub async fn upsert_job(&self, job: Job) -> Result<(), StoreError> {
        let pending_ids: Vec<&str> = job.pending_approval_ids.iter().map(ApprovalId::as_str).collect();
        let pending_json = serde_json::to_string(&pending_ids)?;

        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO jobs (id, thread_id, turn_id, state, next_seq, first_seq, error, created_at, updated_at, terminal_at, pending_approval_ids, finished_emitted)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                 ON CONFLICT (id) DO UPDATE SET
                    turn_id = excluded.turn_id,
                    state = excluded.state,
                    next_seq = excluded.next_seq,
                    first_seq = excluded.first_seq,
                    error = excluded.error,
                    updated_at = excluded.updated_at,
                    terminal_at = excluded.terminal_at,
                    pending_approval_ids = excluded.pending_approval_ids,
                    finished_emitted = excluded.finished_emitted",
                params![
                    job.id.as_str(),
                    job.thread_id.as_str(),
                    job.turn_id,
                    job_state_to_str(job.state),
                    job.next_seq as i64,
                    job.first_seq as i64,
                    job.error,
                    job.created_at,
                    job.updated_at,
                    job.terminal_at,
                    pending_json,
                    job.finished_emitted as i64,
                ],
            )?;
            Ok(())
        })
        .await
    }

    pub async fn get_job(&self, id: JobId) -> Result<Option<Job>, StoreError> {
        self.with_conn(move |conn| conn.query_row("SELECT * FROM jobs WHERE id = ?1", params![id.as_str()], row_to_job).optional().map_err(StoreError::from)).await
    }

    /// Jobs for a thread, newest first.
    pub async fn list_jobs_for_thread(&self, thread_id: ThreadId) -> Result<Vec<Job>, StoreError> {
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare("SELECT * FROM jobs WHERE thread_id = ?1 ORDER BY created_at DESC")?;
            let rows = stmt.query_map(params![thread_id.as_str()], row_to_job)?;
            rows.collect::<rusqlite::Result<Vec<_>>>().map_err(StoreError::from)
        })
        .await
    }

    /// The unique active job for a thread, if any (at most one enforced
    /// upstream).
    pub async fn active_job_for_thread(&self, thread_id: ThreadId) -> Result<Option<Job>, StoreError> {
        self.with_conn(move |conn| {
            conn.query_row(
                "SELECT * FROM jobs WHERE thread_id = ?1 AND state IN ('QUEUED', 'RUNNING', 'WAITING_APPROVAL') LIMIT 1",
                params![thread_id.as_str()],
                row_to_job,
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
    }
}

#[cfg(test)]
#[path = "jobs_tests.rs"]
mod tests;
