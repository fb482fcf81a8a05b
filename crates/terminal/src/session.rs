// SPDX-License-Identifier: MIT

//! A single PTY-backed session: one backend-driving task pumping output
//! through the shell-state filter into scrollback and a broadcast
//! channel, plus the handle callers use to write input, resize, and close
//! it.

use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use cw_core::{ShellStateFlags, TerminalFrame, TerminalStatus};
use cw_core::{SessionId, ThreadId};
use tokio::sync::{broadcast, mpsc, Mutex};
use tracing::{debug, warn};

use crate::error::{Result, TerminalError};
use crate::pty::{self, Backend};
use crate::scrollback::Scrollback;

const FRAME_CHANNEL_CAPACITY: usize = 1024;

pub struct SharedState {
    pub status: TerminalStatus,
    pub shell_state: ShellStateFlags,
    pub cols: u16,
    pub rows: u16,
    pub last_active_at: DateTime<Utc>,
    pub exit_code: Option<i32>,
    pub supports_shell_state_hooks: bool,
    pub transport_mode: &'static str,
    pub child_pid: Option<u32>,
    pub scrollback: Scrollback,
    pub attached_clients: usize,
}

/// A live terminal session plus the channels used to talk to its backend
/// task. Cheap to clone: everything that matters is behind the `Arc`s.
#[derive(Clone)]
pub struct SessionHandle {
    pub id: SessionId,
    pub thread_id: ThreadId,
    pub shared: Arc<Mutex<SharedState>>,
    input_tx: mpsc::Sender<Bytes>,
    resize_tx: mpsc::Sender<(u16, u16)>,
    frame_tx: broadcast::Sender<TerminalFrame>,
}

impl SessionHandle {
    pub fn spawn(thread_id: ThreadId, shell: String, cwd: PathBuf, cols: u16, rows: u16, max_scrollback_bytes: usize) -> Result<Self> {
        let outcome = pty::spawn_shell(&shell, &cwd, cols, rows).map_err(TerminalError::Spawn)?;
        let mut backend = outcome.backend;
        let child_pid = backend.child_pid();
        let supports_shell_state_hooks = backend.supports_shell_state_hooks();

        let (output_tx, mut output_rx) = mpsc::channel::<Bytes>(256);
        let (input_tx, input_rx) = mpsc::channel::<Bytes>(256);
        let (resize_tx, resize_rx) = mpsc::channel::<(u16, u16)>(4);
        let (frame_tx, _) = broadcast::channel::<TerminalFrame>(FRAME_CHANNEL_CAPACITY);

        let shared = Arc::new(Mutex::new(SharedState {
            status: TerminalStatus::Running,
            shell_state: ShellStateFlags::idle(),
            cols,
            rows,
            last_active_at: Utc::now(),
            exit_code: None,
            supports_shell_state_hooks,
            transport_mode: outcome.transport_mode,
            child_pid,
            scrollback: Scrollback::new(max_scrollback_bytes),
            attached_clients: 0,
        }));

        let (exit_tx, exit_rx) = tokio::sync::oneshot::channel::<Option<i32>>();
        tokio::spawn(async move {
            match backend.run(output_tx, input_rx, resize_rx).await {
                Ok(status) => {
                    debug!(code = ?status.code, signal = ?status.signal, "terminal backend exited");
                    let _ = exit_tx.send(status.code);
                }
                Err(err) => {
                    warn!(error = %err, "terminal backend task ended in error");
                    let _ = exit_tx.send(None);
                }
            }
        });

        let id = SessionId::new();
        let pump_shared = Arc::clone(&shared);
        let pump_frame_tx = frame_tx.clone();
        tokio::spawn(async move {
            let mut filter = crate::shell_state::ShellStateFilter::new();
            while let Some(chunk) = output_rx.recv().await {
                let visible = filter.process(&chunk);
                let mut guard = pump_shared.lock().await;
                guard.shell_state = filter.flags;
                if !visible.is_empty() {
                    let frame = guard.scrollback.push_output(visible);
                    let _ = pump_frame_tx.send(frame);
                }
            }

            // The backend task dropped its output sender only once `run`
            // returned, so its exit code is already on the channel (or the
            // task died without sending, in which case we treat it as None).
            let exit_code = exit_rx.await.unwrap_or(None);
            let mut guard = pump_shared.lock().await;
            guard.status = TerminalStatus::Exited;
            guard.shell_state = ShellStateFlags::idle();
            guard.exit_code = exit_code;
            let frame = guard.scrollback.push_exit(exit_code);
            let _ = pump_frame_tx.send(frame);
        });

        Ok(Self { id, thread_id, shared, input_tx, resize_tx, frame_tx })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TerminalFrame> {
        self.frame_tx.subscribe()
    }

    pub async fn replay(&self, from_seq: i64) -> Result<Vec<TerminalFrame>> {
        let guard = self.shared.lock().await;
        guard.scrollback.replay(from_seq)
    }

    pub async fn write_input(&self, data: Bytes, max_input_bytes: usize) -> Result<()> {
        {
            let mut guard = self.shared.lock().await;
            if guard.status != TerminalStatus::Running {
                return Err(TerminalError::NotRunning(self.id.clone()));
            }
            if data.len() > max_input_bytes {
                return Err(TerminalError::InputTooLarge(data.len(), max_input_bytes));
            }
            guard.last_active_at = Utc::now();
        }
        self.input_tx.send(data).await.map_err(|_| TerminalError::NotRunning(self.id.clone()))
    }

    pub async fn resize(&self, cols: u16, rows: u16) -> Result<()> {
        let cols = cols.clamp(10, 500);
        let rows = rows.clamp(5, 300);
        {
            let mut guard = self.shared.lock().await;
            guard.cols = cols;
            guard.rows = rows;
            guard.last_active_at = Utc::now();
        }
        let _ = self.resize_tx.try_send((cols, rows));
        Ok(())
    }

    pub async fn touch(&self) {
        self.shared.lock().await.last_active_at = Utc::now();
    }

    /// Record a client attaching, for the idle sweep's "no attached
    /// clients" eligibility check.
    pub async fn note_attach(&self) {
        let mut guard = self.shared.lock().await;
        guard.attached_clients += 1;
        guard.last_active_at = Utc::now();
    }

    /// Record a client detaching. Returns the remaining attached count.
    pub async fn note_detach(&self) -> usize {
        let mut guard = self.shared.lock().await;
        guard.attached_clients = guard.attached_clients.saturating_sub(1);
        guard.attached_clients
    }

    pub async fn status(&self) -> TerminalStatus {
        self.shared.lock().await.status
    }

    pub async fn close(&self, force: bool) {
        {
            let mut guard = self.shared.lock().await;
            if guard.status == TerminalStatus::Exited {
                return;
            }
            guard.status = TerminalStatus::Closing;
        }
        if let Some(pid) = self.shared.lock().await.child_pid {
            let pid = nix::unistd::Pid::from_raw(pid as i32);
            let signal = if force { nix::sys::signal::Signal::SIGKILL } else { nix::sys::signal::Signal::SIGHUP };
            let _ = nix::sys::signal::kill(pid, signal);
        }
    }
}
