// SPDX-License-Identifier: MIT

//! Pipe-based fallback backend used when every PTY spawn attempt fails.
//! No PTY means no `TIOCSWINSZ` and no shell-state hooks, but the shell
//! is at least reachable.

use std::path::Path;
use std::process::Stdio;

use anyhow::Context;
use bytes::Bytes;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;

use super::{Backend, ExitStatus};

pub struct PipeBackend {
    child: Child,
}

impl PipeBackend {
    pub fn spawn(argv: &[String], cwd: &Path) -> anyhow::Result<Self> {
        let mut command = Command::new(&argv[0]);
        command.args(&argv[1..]).current_dir(cwd).env("TERM", "dumb").stdin(Stdio::piped()).stdout(Stdio::piped()).stderr(Stdio::piped());
        let child = command.spawn().context("pipe-mode spawn failed")?;
        Ok(Self { child })
    }
}

impl Backend for PipeBackend {
    fn run(
        &mut self,
        output_tx: mpsc::Sender<Bytes>,
        mut input_rx: mpsc::Receiver<Bytes>,
        mut resize_rx: mpsc::Receiver<(u16, u16)>,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = anyhow::Result<ExitStatus>> + Send + '_>> {
        Box::pin(async move {
            let mut stdout = self.child.stdout.take().context("child stdout missing")?;
            let mut stderr = self.child.stderr.take().context("child stderr missing")?;
            let mut stdin = self.child.stdin.take().context("child stdin missing")?;
            let mut out_buf = vec![0u8; 8192];
            let mut err_buf = vec![0u8; 8192];

            loop {
                tokio::select! {
                    result = stdout.read(&mut out_buf) => {
                        match result {
                            Ok(0) => break,
                            Ok(n) => { if output_tx.send(Bytes::copy_from_slice(&out_buf[..n])).await.is_err() { break; } }
                            Err(e) => return Err(e.into()),
                        }
                    }
                    result = stderr.read(&mut err_buf) => {
                        match result {
                            Ok(0) => {}
                            Ok(n) => { if output_tx.send(Bytes::copy_from_slice(&err_buf[..n])).await.is_err() { break; } }
                            Err(e) => return Err(e.into()),
                        }
                    }
                    input = input_rx.recv() => {
                        match input {
                            Some(data) => { let _ = stdin.write_all(&data).await; }
                            None => { drop(stdin.shutdown().await); break; }
                        }
                    }
                    // Pipe mode has no PTY to resize; drain the channel so
                    // senders don't block, the resize itself is a no-op.
                    resize = resize_rx.recv() => {
                        if resize.is_none() {
                            continue;
                        }
                    }
                }
            }

            let status = self.child.wait().await.context("waiting on pipe-mode child")?;
            Ok(ExitStatus { code: status.code(), signal: None })
        })
    }

    fn child_pid(&self) -> Option<u32> {
        self.child.id()
    }

    fn supports_shell_state_hooks(&self) -> bool {
        false
    }
}
