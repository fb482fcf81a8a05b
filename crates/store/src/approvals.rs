// SPDX-License-Identifier: MIT

//! Approval persistence.

use cw_core::{Approval, ApprovalId, ApprovalKind, Decision, JobId};
use rusqlite::{params, OptionalExtension, Row};

use crate::connection::Store;
use crate::error::StoreError;

fn kind_to_str(kind: ApprovalKind) -> &'static str {
    kind.as_str()
}

fn kind_from_str(raw: &str) -> rusqlite::Result<ApprovalKind> {
    match raw {
        "command_execution" => Ok(ApprovalKind::CommandExecution),
        "file_change" => Ok(ApprovalKind::FileChange),
        other => Err(rusqlite::Error::InvalidColumnType(0, format!("unknown approval kind {other}"), rusqlite::types::Type::Text)),
    }
}

fn row_to_approval(row: &Row<'_>) -> rusqlite::Result<Approval> {
    let upstream_request_id_raw: String = row.get("upstream_request_id")?;
    let upstream_request_id: serde_json::Value = serde_json::from_str(&upstream_request_id_raw).unwrap_or(serde_json::Value::Null);
    let payload_raw: String = row.get("payload")?;
    let payload: serde_json::Value = serde_json::from_str(&payload_raw).unwrap_or(serde_json::Value::Null);
    let decision_raw: Option<String> = row.get("decision")?;
    let decision = decision_raw.and_then(|raw| serde_json::from_str::<Decision>(&raw).ok());

    Ok(Approval {
        id: cw_core::ApprovalId::from_raw(row.get::<_, String>("id")?),
        job_id: JobId::from_raw(row.get::<_, String>("job_id")?),
        thread_id: cw_core::ThreadId::from_raw(row.get::<_, String>("thread_id")?),
        turn_id: row.get("turn_id")?,
        item_id: row.get("item_id")?,
        kind: kind_from_str(&row.get::<_, String>("kind")?)?,
        upstream_request_id,
        upstream_method: row.get("upstream_method")?,
        payload,
        created_at: row.get("created_at")?,
        decision,
    })
}

impl Store {
    pub async fn insert_approval(&self, approval: Approval) -> Result<(), StoreError> {
        let upstream_request_id_json = serde_json::to_string(&approval.upstream_request_id)?;
        let payload_json = serde_json::to_string(&approval.payload)?;
        let decision_json = approval.decision.as_ref().map(serde_json::to_string).transpose()?;

        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO approvals (id, job_id, thread_id, turn_id, item_id, kind, upstream_request_id, upstream_method, payload, created_at, decision)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    approval.id.as_str(),
                    approval.job_id.as_str(),
                    approval.thread_id.as_str(),
                    approval.turn_id,
                    approval.item_id,
                    kind_to_str(approval.kind),
                    upstream_request_id_json,
                    approval.upstream_method,
                    payload_json,
                    approval.created_at,
                    decision_json,
                ],
            )?;
            Ok(())
        })
        .await
    }

    pub async fn get_approval(&self, id: ApprovalId) -> Result<Option<Approval>, StoreError> {
        self.with_conn(move |conn| conn.query_row("SELECT * FROM approvals WHERE id = ?1", params![id.as_str()], row_to_approval).optional().map_err(StoreError::from)).await
    }

    /// Record the resolving decision. No-op beyond updating `decision` —
    /// the row's other fields describe the original request and never
    /// change.
    pub async fn record_decision(&self, id: ApprovalId, decision: Decision) -> Result<(), StoreError> {
        let decision_json = serde_json::to_string(&decision)?;
        self.with_conn(move |conn| {
            let updated = conn.execute("UPDATE approvals SET decision = ?1 WHERE id = ?2", params![decision_json, id.as_str()])?;
            if updated == 0 {
                return Err(StoreError::NotFound);
            }
            Ok(())
        })
        .await
    }

    pub async fn list_pending_approvals_for_job(&self, job_id: JobId) -> Result<Vec<Approval>, StoreError> {
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare("SELECT * FROM approvals WHERE job_id = ?1 AND decision IS NULL ORDER BY created_at ASC")?;
            let rows = stmt.query_map(params![job_id.as_str()], row_to_approval)?;
            rows.collect::<rusqlite::Result<Vec<_>>>().map_err(StoreError::from)
        })
        .await
    }
}

#[cfg(test)]
#[path = "approvals_tests.rs"]
mod tests;
