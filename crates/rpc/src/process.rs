// SPDX-License-Identifier: MIT

//! Subprocess lifecycle for the upstream agent: spawn, newline-framed
//! stdout/stderr readers, and stdin writes (`start()`/`stop()`).
//!
//! Modeled on the reader/processor/writer task split used by stdio MCP
//! server clients (three tasks, bounded mpsc channels between them),
//! adapted to a child process instead of the current process's own stdio.

use std::process::{ExitStatus, Stdio};

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{ChildStdin, Command};
use tokio::sync::{mpsc, oneshot};

use crate::error::RpcError;

/// Parameters needed to spawn the upstream agent subprocess.
#[derive(Debug, Clone)]
pub struct SpawnSpec {
    pub command: String,
    pub args: Vec<String>,
    pub cwd: Option<String>,
    pub env: Vec<(String, String)>,
}

/// A line read from the child's stdout or stderr.
#[derive(Debug, Clone)]
pub struct Line(pub String);

/// Handles to a running agent subprocess.
///
/// The `Child` itself, and the task that waits on it, live inside the
/// task spawned by `spawn()` — this struct only exposes the stdin
/// half plus a `kill` signal, so the bridge's single dispatch loop can
/// own writes without also owning the wait future.
pub struct AgentProcess {
    stdin: ChildStdin,
    kill_tx: Option<oneshot::Sender<()>>,
    pid: Option<u32>,
}

impl AgentProcess {
    /// Spawn the subprocess and start its stdout/stderr reader tasks plus
    /// its wait task.
    ///
    /// Returns the process handle, receivers for newline-framed stdout
    /// lines (the message stream) and stderr lines (the log stream), and
    /// a one-shot that resolves with the exit status once the child
    /// exits (by itself or via `stop()`).
    pub fn spawn(
        spec: &SpawnSpec,
    ) -> Result<(Self, mpsc::Receiver<Line>, mpsc::Receiver<Line>, oneshot::Receiver<std::io::Result<ExitStatus>>), RpcError> {
        let mut command = Command::new(&spec.command);
        command.args(&spec.args).stdin(Stdio::piped()).stdout(Stdio::piped()).stderr(Stdio::piped()).kill_on_drop(true);
        if let Some(cwd) = &spec.cwd {
            command.current_dir(cwd);
        }
        for (key, value) in &spec.env {
            command.env(key, value);
        }

        let mut child = command.spawn().map_err(RpcError::Spawn)?;
        let pid = child.id();

        let stdout = child.stdout.take().ok_or_else(|| RpcError::Spawn(std::io::Error::other("no stdout pipe")))?;
        let stderr = child.stderr.take().ok_or_else(|| RpcError::Spawn(std::io::Error::other("no stderr pipe")))?;
        let stdin = child.stdin.take().ok_or_else(|| RpcError::Spawn(std::io::Error::other("no stdin pipe")))?;

        let (stdout_tx, stdout_rx) = mpsc::channel(256);
        let (stderr_tx, stderr_rx) = mpsc::channel(256);
        let (exit_tx, exit_rx) = oneshot::channel();
        let (kill_tx, kill_rx) = oneshot::channel();

        tokio::spawn(read_lines(stdout, stdout_tx));
        tokio::spawn(read_lines(stderr, stderr_tx));
        tokio::spawn(supervise(child, kill_rx, exit_tx));

        Ok((Self { stdin, kill_tx: Some(kill_tx), pid }, stdout_rx, stderr_rx, exit_rx))
    }

    /// Write one message line to the child's stdin, appending the
    /// newline the wire framing requires.
    pub async fn write_line(&mut self, line: &str) -> Result<(), RpcError> {
        self.stdin.write_all(line.as_bytes()).await?;
        self.stdin.write_all(b"\n").await?;
        self.stdin.flush().await?;
        Ok(())
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Signal the supervising task to kill the child. Idempotent: a
    /// second call is a no-op.
    pub fn request_stop(&mut self) {
        if let Some(tx) = self.kill_tx.take() {
            let _ = tx.send(());
        }
    }
}

async fn supervise(mut child: tokio::process::Child, kill_rx: oneshot::Receiver<()>, exit_tx: oneshot::Sender<std::io::Result<ExitStatus>>) {
    tokio::select! {
        status = child.wait() => {
            let _ = exit_tx.send(status);
        }
        _ = kill_rx => {
            let _ = child.start_kill();
            let status = child.wait().await;
            let _ = exit_tx.send(status);
        }
    }
}

async fn read_lines<R>(reader: R, tx: mpsc::Sender<Line>)
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if tx.send(Line(line)).await.is_err() {
                    break;
                }
            }
            Ok(None) => break,
            Err(err) => {
                tracing::debug!(err = %err, "agent subprocess pipe read error");
                break;
            }
        }
    }
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
