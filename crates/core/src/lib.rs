// SPDX-License-Identifier: MIT

//! Shared data model for the Worker: threads, jobs, events, approvals,
//! terminal sessions, push devices, and the closed error taxonomy.
//!
//! This crate performs no I/O. It exists so `cw-engine`, `cw-terminal`,
//! `cw-store`, and `cw-worker` share one definition of the wire and
//! persistence shapes described in the data model.

pub mod approval;
pub mod error;
pub mod event;
pub mod ids;
pub mod job;
pub mod projection;
pub mod push;
pub mod terminal;
pub mod thread;

pub use approval::{Approval, ApprovalKind, Decision, DecisionValue};
pub use error::ErrorCode;
pub use event::{EventEnvelope, EventType};
pub use ids::{ApprovalId, JobId, SessionId, ThreadId};
pub use job::{Job, JobState};
pub use projection::ThreadEventEntry;
pub use push::{PushDevice, PushEnvironment, PushPlatform};
pub use terminal::{ShellStateFlags, TerminalFrame, TerminalSession, TerminalStatus};
pub use thread::Thread;
