// SPDX-License-Identifier: MIT

//! Table definitions for the cache store. Threads, jobs, and approvals are
//! cached mirrors of agent-owned state; `job_events` is an append-only
//! audit log distinct from `cw-engine`'s in-memory, bounded-retention
//! replay log.

pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS threads (
    id              TEXT PRIMARY KEY,
    working_dir     TEXT NOT NULL,
    preview         TEXT NOT NULL DEFAULT '',
    model_provider  TEXT,
    archived        INTEGER NOT NULL DEFAULT 0,
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_threads_archived_updated
    ON threads (archived, updated_at DESC);

CREATE TABLE IF NOT EXISTS jobs (
    id                    TEXT PRIMARY KEY,
    thread_id             TEXT NOT NULL REFERENCES threads (id) ON DELETE CASCADE,
    turn_id               TEXT,
    state                 TEXT NOT NULL,
    next_seq              INTEGER NOT NULL DEFAULT 0,
    first_seq             INTEGER NOT NULL DEFAULT 0,
    error                 TEXT,
    created_at            TEXT NOT NULL,
    updated_at            TEXT NOT NULL,
    terminal_at           TEXT,
    pending_approval_ids  TEXT NOT NULL DEFAULT '[]',
    finished_emitted      INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_jobs_thread_state
    ON jobs (thread_id, state);

CREATE TABLE IF NOT EXISTS job_events (
    job_id     TEXT NOT NULL REFERENCES jobs (id) ON DELETE CASCADE,
    seq        INTEGER NOT NULL,
    event_type TEXT NOT NULL,
    ts         TEXT NOT NULL,
    payload    TEXT NOT NULL,
    PRIMARY KEY (job_id, seq)
);

CREATE TABLE IF NOT EXISTS approvals (
    id                   TEXT PRIMARY KEY,
    job_id               TEXT NOT NULL REFERENCES jobs (id) ON DELETE CASCADE,
    thread_id            TEXT NOT NULL REFERENCES threads (id) ON DELETE CASCADE,
    turn_id              TEXT,
    item_id              TEXT,
    kind                 TEXT NOT NULL,
    upstream_request_id  TEXT NOT NULL,
    upstream_method      TEXT NOT NULL,
    payload              TEXT NOT NULL,
    created_at           TEXT NOT NULL,
    decision             TEXT
);

CREATE INDEX IF NOT EXISTS idx_approvals_job
    ON approvals (job_id);

CREATE TABLE IF NOT EXISTS thread_event_projection (
    thread_id      TEXT NOT NULL REFERENCES threads (id) ON DELETE CASCADE,
    thread_cursor  INTEGER NOT NULL,
    envelope       TEXT NOT NULL,
    PRIMARY KEY (thread_id, thread_cursor)
);

CREATE TABLE IF NOT EXISTS push_devices (
    token         TEXT PRIMARY KEY,
    platform      TEXT NOT NULL,
    bundle_id     TEXT NOT NULL,
    environment   TEXT NOT NULL,
    device_name   TEXT,
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL,
    last_seen_at  TEXT NOT NULL
);
"#;

/// Apply the schema and pragmas. Idempotent: safe to call on every
/// process start.
pub fn apply(conn: &rusqlite::Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.execute_batch(SCHEMA_SQL)
}
