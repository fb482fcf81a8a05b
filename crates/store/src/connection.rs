// SPDX-License-Identifier: MIT

//! Store handle: one `rusqlite::Connection` behind a blocking mutex. Every
//! query runs inside `spawn_blocking`, the same pattern the PTY backend
//! uses to reap child processes without blocking the async runtime.
//!
//! A single connection is sufficient here: the cache store serializes its
//! own writes, and there is no independent-reader concurrency requirement
//! to justify a pool.

use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use rusqlite::Connection;

use crate::error::StoreError;
use crate::schema;

#[derive(Clone)]
pub struct Store {
    pub(crate) conn: Arc<Mutex<Connection>>,
}

impl Store {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        schema::apply(&conn)?;
        Ok(Self { conn: Arc::new(Mutex::new(conn)) })
    }

    /// An in-memory store, for tests and the `--no-persistence` escape
    /// hatch.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        schema::apply(&conn)?;
        Ok(Self { conn: Arc::new(Mutex::new(conn)) })
    }

    /// Run a blocking closure against the connection on the blocking
    /// thread pool, holding the mutex only for the closure's duration.
    pub(crate) async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock();
            f(&guard)
        })
        .await?
    }
}

#[cfg(test)]
#[path = "connection_tests.rs"]
mod tests;
