// SPDX-License-Identifier: MIT

pub mod nbio;
pub mod native;
pub mod pipe;

use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use bytes::Bytes;
use tokio::sync::mpsc;
use tracing::warn;

#[derive(Debug, Clone, Copy)]
pub struct ExitStatus {
    pub code: Option<i32>,
    pub signal: Option<i32>,
}

/// Terminal backend abstraction over a real PTY or the pipe-mode fallback.
///
/// `run` takes ownership of the backend for the lifetime of the task that
/// drives it; resize requests arrive on `resize_rx` rather than through a
/// separate method so a single task owns the backend's mutable state.
pub trait Backend: Send + 'static {
    fn run(
        &mut self,
        output_tx: mpsc::Sender<Bytes>,
        input_rx: mpsc::Receiver<Bytes>,
        resize_rx: mpsc::Receiver<(u16, u16)>,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<ExitStatus>> + Send + '_>>;

    fn child_pid(&self) -> Option<u32>;

    fn supports_shell_state_hooks(&self) -> bool;
}

pub struct SpawnOutcome {
    pub backend: Box<dyn Backend>,
    pub transport_mode: &'static str,
}

/// Candidate argument vectors to try in order before giving up on a
/// native PTY: `-f`, `-i`, `[]` for zsh; any other shell just gets its
/// bare argv, tried once.
fn argv_candidates(shell: &str) -> Vec<Vec<String>> {
    let basename = shell.rsplit('/').next().unwrap_or(shell);
    if basename == "zsh" {
        vec![vec![shell.to_owned(), "-f".into()], vec![shell.to_owned(), "-i".into()], vec![shell.to_owned()]]
    } else {
        vec![vec![shell.to_owned()]]
    }
}

/// Spawn `shell` under a PTY at `cwd`, retrying alternate argument vectors
/// on `posix_spawnp`-class failures, finally falling back to pipe mode.
pub fn spawn_shell(shell: &str, cwd: &Path, cols: u16, rows: u16) -> anyhow::Result<SpawnOutcome> {
    for argv in argv_candidates(shell) {
        match native::NativePty::spawn(&argv, cwd, cols, rows) {
            Ok(pty) => return Ok(SpawnOutcome { backend: Box::new(pty), transport_mode: "pty" }),
            Err(err) => warn!(argv = ?argv, error = %err, "pty spawn attempt failed, trying next"),
        }
    }

    warn!(shell, "all pty spawn attempts failed, falling back to pipe mode");
    let argv = vec![shell.to_owned()];
    let backend = pipe::PipeBackend::spawn(&argv, cwd)?;
    Ok(SpawnOutcome { backend: Box::new(backend), transport_mode: "pipe" })
}
