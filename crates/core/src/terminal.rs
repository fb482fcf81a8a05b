// SPDX-License-Identifier: MIT

//! Terminal session model: a PTY-backed shell multiplexed to zero or more
//! attached clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{SessionId, ThreadId};

/// Lifecycle state of a terminal session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TerminalStatus {
    Running,
    Closing,
    Exited,
}

impl TerminalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Closing => "closing",
            Self::Exited => "exited",
        }
    }
}

/// Shell-state flags parsed from the PTY output stream's
/// `__CW_STATE__:<busy|idle>:<jobs>` marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShellStateFlags {
    pub foreground_busy: bool,
    pub background_jobs: u32,
}

impl ShellStateFlags {
    pub const fn idle() -> Self {
        Self { foreground_busy: false, background_jobs: 0 }
    }

    /// Parse a `__CW_STATE__:<busy|idle>:<jobs>` marker body (the text after
    /// the `__CW_STATE__:` prefix). Returns `None` if the marker is
    /// malformed and should be dropped rather than applied.
    pub fn parse_marker_body(body: &str) -> Option<Self> {
        let mut parts = body.splitn(2, ':');
        let busy_token = parts.next()?;
        let jobs_token = parts.next()?;
        let foreground_busy = match busy_token {
            "busy" => true,
            "idle" => false,
            _ => return None,
        };
        let background_jobs = jobs_token.trim().parse().ok()?;
        Some(Self { foreground_busy, background_jobs })
    }
}

/// A single frame emitted on a terminal's scrollback stream: either a
/// chunk of raw PTY output or the terminal's exit notice.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TerminalFrame {
    Output {
        offset: u64,
        /// Raw bytes, base64-encoded on the wire since PTY output is not
        /// guaranteed valid UTF-8.
        #[serde(with = "base64_bytes")]
        data: Vec<u8>,
    },
    Exit {
        offset: u64,
        exit_code: Option<i32>,
    },
}

mod base64_bytes {
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&base64::engine::general_purpose::STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        base64::engine::general_purpose::STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}

/// A PTY-backed shell multiplexed to zero or more attached clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerminalSession {
    pub id: SessionId,
    pub thread_id: ThreadId,
    pub status: TerminalStatus,
    pub shell_state: ShellStateFlags,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    pub cols: u16,
    pub rows: u16,
}

impl TerminalSession {
    pub fn new(thread_id: ThreadId, cols: u16, rows: u16) -> Self {
        let now = Utc::now();
        Self {
            id: SessionId::new(),
            thread_id,
            status: TerminalStatus::Running,
            shell_state: ShellStateFlags::idle(),
            created_at: now,
            updated_at: now,
            exit_code: None,
            cols,
            rows,
        }
    }

    pub fn mark_exited(&mut self, exit_code: Option<i32>) {
        self.status = TerminalStatus::Exited;
        self.exit_code = exit_code;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
#[path = "terminal_tests.rs"]
mod tests;
