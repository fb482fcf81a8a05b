// SPDX-License-Identifier: MIT

//! The Terminal Session Manager: a per-thread pool of `SessionHandle`s,
//! multi-client attach/detach, and the periodic safe-idle sweep.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use cw_core::{SessionId, TerminalFrame, TerminalStatus, ThreadId};
use tokio::sync::{broadcast, RwLock};
use tracing::{info, warn};

use crate::error::{Result, TerminalError};
use crate::session::SessionHandle;

/// Terminal-manager-wide limits, mirrored from `cw-worker`'s config.
#[derive(Debug, Clone)]
pub struct TerminalLimits {
    pub max_sessions: usize,
    pub max_input_bytes: usize,
    pub max_scrollback_bytes: usize,
    pub idle_ttl: Duration,
    pub sweep_interval: Duration,
}

impl Default for TerminalLimits {
    fn default() -> Self {
        Self {
            max_sessions: 16,
            max_input_bytes: 64 * 1024,
            max_scrollback_bytes: crate::scrollback::DEFAULT_MAX_SCROLLBACK_BYTES,
            idle_ttl: Duration::from_secs(20 * 60),
            sweep_interval: Duration::from_secs(10),
        }
    }
}

pub struct OpenOutcome {
    pub session: SessionHandle,
    pub reused: bool,
}

pub struct AttachOutcome {
    pub session: SessionHandle,
    pub replay: Vec<TerminalFrame>,
    pub receiver: broadcast::Receiver<TerminalFrame>,
}

struct ManagerState {
    by_id: HashMap<SessionId, SessionHandle>,
    by_thread: HashMap<ThreadId, SessionId>,
}

/// Owns every live terminal session. Cheap to clone: the state lives
/// behind an `Arc<RwLock<_>>`.
#[derive(Clone)]
pub struct TerminalManager {
    state: Arc<RwLock<ManagerState>>,
    shell: String,
    limits: TerminalLimits,
}

impl TerminalManager {
    pub fn new(shell: impl Into<String>, limits: TerminalLimits) -> Self {
        Self { state: Arc::new(RwLock::new(ManagerState { by_id: HashMap::new(), by_thread: HashMap::new() })), shell: shell.into(), limits }
    }

    /// `openSession`: reuse a running session for the thread if one
    /// exists; otherwise enforce `maxSessions` and spawn a fresh one.
    pub async fn open_session(&self, thread_id: ThreadId, cwd: PathBuf, cols: u16, rows: u16) -> Result<OpenOutcome> {
        {
            let state = self.state.read().await;
            if let Some(id) = state.by_thread.get(&thread_id) {
                if let Some(session) = state.by_id.get(id) {
                    if session.shared.lock().await.status == TerminalStatus::Running {
                        session.touch().await;
                        return Ok(OpenOutcome { session: session.clone(), reused: true });
                    }
                }
            }
        }

        {
            let state = self.state.read().await;
            if state.by_id.len() >= self.limits.max_sessions {
                return Err(TerminalError::TooManySessions(self.limits.max_sessions));
            }
        }

        let cols = cols.clamp(10, 500);
        let rows = rows.clamp(5, 300);
        let session = SessionHandle::spawn(thread_id.clone(), self.shell.clone(), cwd, cols, rows, self.limits.max_scrollback_bytes)?;

        {
            let mut state = self.state.write().await;
            state.by_thread.insert(thread_id.clone(), session.id.clone());
            state.by_id.insert(session.id.clone(), session.clone());
        }

        info!(session_id = %session.id, thread_id = %thread_id, "terminal session opened");
        Ok(OpenOutcome { session, reused: false })
    }

    pub async fn get(&self, session_id: &SessionId) -> Result<SessionHandle> {
        self.state.read().await.by_id.get(session_id).cloned().ok_or_else(|| TerminalError::SessionNotFound(session_id.clone()))
    }

    pub async fn get_for_thread(&self, thread_id: &ThreadId) -> Option<SessionHandle> {
        let state = self.state.read().await;
        let id = state.by_thread.get(thread_id)?;
        state.by_id.get(id).cloned()
    }

    /// `attachClient`: compute replay from `fromSeq`, subscribe to live
    /// frames, and touch the session's activity clock.
    pub async fn attach_client(&self, session_id: &SessionId, from_seq: i64) -> Result<AttachOutcome> {
        let session = self.get(session_id).await?;
        let receiver = session.subscribe();
        let replay = session.replay(from_seq).await?;
        session.note_attach().await;
        Ok(AttachOutcome { session, replay, receiver })
    }

    /// `detachClient`: drop a client's listener; if the session has
    /// already exited and no clients remain, reap it.
    pub async fn detach_client(&self, session_id: &SessionId) {
        let Ok(session) = self.get(session_id).await else { return };
        let remaining = session.note_detach().await;
        if remaining == 0 && session.status().await == TerminalStatus::Exited {
            self.reap(session_id).await;
        }
    }

    /// `writeInput`: only while running; enforces `maxInputBytes`.
    pub async fn write_input(&self, session_id: &SessionId, data: Bytes) -> Result<()> {
        let session = self.get(session_id).await?;
        session.write_input(data, self.limits.max_input_bytes).await
    }

    /// `resizeSession`: clamp to the documented bounds and forward.
    pub async fn resize_session(&self, session_id: &SessionId, cols: u16, rows: u16) -> Result<()> {
        let session = self.get(session_id).await?;
        session.resize(cols, rows).await
    }

    /// `closeSession`: mark closing and signal the PTY; cleanup is
    /// otherwise driven by the backend's exit callback.
    pub async fn close_session(&self, session_id: &SessionId, force: bool) -> Result<()> {
        let session = self.get(session_id).await?;
        session.close(force).await;
        if force {
            self.reap(session_id).await;
        }
        Ok(())
    }

    async fn reap(&self, session_id: &SessionId) {
        let mut state = self.state.write().await;
        if let Some(session) = state.by_id.remove(session_id) {
            state.by_thread.retain(|_, id| id != &session.id);
        }
    }

    /// Remove a session from the pool once it has exited and every
    /// attached client has detached.
    pub async fn reap_if_idle(&self, session_id: &SessionId) {
        let exited = {
            let state = self.state.read().await;
            match state.by_id.get(session_id) {
                Some(session) => session.shared.lock().await.status == TerminalStatus::Exited,
                None => return,
            }
        };
        if exited {
            self.reap(session_id).await;
        }
    }

    /// Eligible-for-reclamation sessions: no attached clients, shell
    /// foreground idle, zero background jobs, no surviving children, and
    /// past `idleTtlMs` since last activity.
    async fn sweep_once(&self) {
        let candidates: Vec<SessionHandle> = {
            let state = self.state.read().await;
            state.by_id.values().cloned().collect()
        };

        for session in candidates {
            let eligible = {
                let guard = session.shared.lock().await;
                guard.status == TerminalStatus::Running
                    && guard.attached_clients == 0
                    && !guard.shell_state.foreground_busy
                    && guard.shell_state.background_jobs == 0
                    && chrono::Utc::now().signed_duration_since(guard.last_active_at).to_std().unwrap_or(Duration::ZERO) >= self.limits.idle_ttl
            };
            if !eligible {
                continue;
            }
            if has_live_children(&session).await {
                continue;
            }

            warn!(session_id = %session.id, "idle sweep reclaiming terminal session");
            session.close(false).await;
        }
    }

    /// Spawn the periodic sweep task. Intended to run for the lifetime of
    /// the process alongside the Worker's other long-running tasks.
    pub fn spawn_sweep_task(self) -> tokio::task::JoinHandle<()> {
        let interval = self.limits.sweep_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                self.sweep_once().await;
            }
        })
    }
}

/// `pgrep -P <pid>` returning nothing means no surviving children. A
/// pipe-mode session with no PID is treated as having no children.
async fn has_live_children(session: &SessionHandle) -> bool {
    let pid = session.shared.lock().await.child_pid;
    let Some(pid) = pid else { return false };

    match tokio::process::Command::new("pgrep").arg("-P").arg(pid.to_string()).output().await {
        Ok(output) => !output.stdout.is_empty(),
        Err(err) => {
            warn!(error = %err, "pgrep unavailable, assuming no live children");
            false
        }
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
