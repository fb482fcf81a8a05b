// SPDX-License-Identifier: MIT

use cw_core::{SessionId, ThreadId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TerminalError {
    #[error("terminal session {0} not found")]
    SessionNotFound(SessionId),
    #[error("thread {0} has no open terminal session")]
    NoSessionForThread(ThreadId),
    #[error("terminal session {0} has already exited")]
    SessionExited(SessionId),
    #[error("terminal session {0} is not running")]
    NotRunning(SessionId),
    #[error("maximum of {0} concurrent terminal sessions reached")]
    TooManySessions(usize),
    #[error("input payload of {0} bytes exceeds the {1}-byte limit")]
    InputTooLarge(usize, usize),
    #[error("replay cursor has expired")]
    CursorExpired,
    #[error("failed to spawn shell: {0}")]
    Spawn(#[source] anyhow::Error),
    #[error("pty io error: {0}")]
    Io(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TerminalError>;
