// SPDX-License-Identifier: MIT

//! The cache store: a SQLite-backed mirror of agent-owned state (threads,
//! jobs, approvals) plus an append-only audit log and push-device
//! registry.

pub mod approvals;
pub mod connection;
pub mod error;
pub mod events;
pub mod jobs;
pub mod projection;
pub mod push;
pub mod schema;
pub mod threads;

pub use connection::Store;
pub use error::StoreError;
