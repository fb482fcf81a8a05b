// SPDX-License-Identifier: MIT

//! `forkpty`-based shell backend: fork/exec/`AsyncFd`, extended with a
//! working-directory chdir in the child.

use std::ffi::CString;
use std::os::fd::AsRawFd;
use std::path::Path;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;

use anyhow::{bail, Context};
use bytes::Bytes;
use nix::libc;
use nix::pty::{forkpty, ForkptyResult, Winsize};
use nix::sys::signal::{kill, Signal};
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::{chdir, execvp, ForkResult, Pid};
use tokio::io::unix::AsyncFd;
use tokio::sync::mpsc;
use tracing::warn;

use super::nbio::{read_chunk, set_nonblocking, write_all, PtyFd};
use super::{Backend, ExitStatus};

pub struct NativePty {
    master: AsyncFd<PtyFd>,
    child_pid: Pid,
    cols: Arc<AtomicU16>,
    rows: Arc<AtomicU16>,
}

impl NativePty {
    /// Spawn `argv[0]` under a fresh PTY in `cwd`. `argv` must be non-empty.
    // forkpty is unsafe: the child is partially initialized until it execs.
    #[allow(unsafe_code)]
    pub fn spawn(argv: &[String], cwd: &Path, cols: u16, rows: u16) -> anyhow::Result<Self> {
        let winsize = Winsize { ws_col: cols, ws_row: rows, ws_xpixel: 0, ws_ypixel: 0 };

        // SAFETY: forkpty's child side is handled entirely below via chdir/execvp,
        // neither of which touch Rust-managed heap state from the parent.
        let ForkptyResult { master, fork_result } = unsafe { forkpty(&winsize, None) }.context("forkpty failed")?;

        match fork_result {
            ForkResult::Child => {
                if chdir(cwd).is_err() {
                    // Best-effort: an unreachable cwd shouldn't wedge the child, just
                    // leave it in whatever directory forkpty inherited.
                }
                std::env::set_var("TERM", "xterm-256color");

                let c_args: Vec<CString> =
                    argv.iter().map(|s| CString::new(s.as_bytes())).collect::<Result<_, _>>().context("invalid command argument")?;
                execvp(&c_args[0], &c_args).context("execvp failed")?;
                unreachable!("execvp only returns on error");
            }
            ForkResult::Parent { child } => {
                set_nonblocking(&master)?;
                let afd = AsyncFd::new(PtyFd(master)).context("AsyncFd::new failed")?;
                Ok(Self { master: afd, child_pid: child, cols: Arc::new(AtomicU16::new(cols)), rows: Arc::new(AtomicU16::new(rows)) })
            }
        }
    }

    // TIOCSWINSZ requires a raw ioctl call.
    #[allow(unsafe_code)]
    fn apply_resize(&self, cols: u16, rows: u16) -> anyhow::Result<()> {
        self.cols.store(cols, Ordering::Relaxed);
        self.rows.store(rows, Ordering::Relaxed);
        let ws = Winsize { ws_col: cols, ws_row: rows, ws_xpixel: 0, ws_ypixel: 0 };
        // SAFETY: TIOCSWINSZ is well-defined for a valid PTY master fd and a
        // fully initialized Winsize.
        let ret = unsafe { libc::ioctl(self.master.as_raw_fd(), libc::TIOCSWINSZ, &ws) };
        if ret < 0 {
            bail!("TIOCSWINSZ ioctl failed: {}", std::io::Error::last_os_error());
        }
        Ok(())
    }
}

impl Backend for NativePty {
    fn run(
        &mut self,
        output_tx: mpsc::Sender<Bytes>,
        mut input_rx: mpsc::Receiver<Bytes>,
        mut resize_rx: mpsc::Receiver<(u16, u16)>,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = anyhow::Result<ExitStatus>> + Send + '_>> {
        let pid = self.child_pid;
        Box::pin(async move {
            let mut buf = vec![0u8; 8192];
            let mut input_closed = false;

            loop {
                if input_closed {
                    match read_chunk(&self.master, &mut buf).await {
                        Ok(0) => break,
                        Ok(n) => {
                            if output_tx.send(Bytes::copy_from_slice(&buf[..n])).await.is_err() {
                                break;
                            }
                        }
                        Err(e) if e.raw_os_error() == Some(libc::EIO) => break,
                        Err(e) => return Err(e.into()),
                    }
                } else {
                    tokio::select! {
                        result = read_chunk(&self.master, &mut buf) => {
                            match result {
                                Ok(0) => break,
                                Ok(n) => {
                                    if output_tx.send(Bytes::copy_from_slice(&buf[..n])).await.is_err() {
                                        break;
                                    }
                                }
                                Err(e) if e.raw_os_error() == Some(libc::EIO) => break,
                                Err(e) => return Err(e.into()),
                            }
                        }
                        input = input_rx.recv() => {
                            match input {
                                Some(data) => write_all(&self.master, &data).await?,
                                None => input_closed = true,
                            }
                        }
                        resize = resize_rx.recv() => {
                            if let Some((cols, rows)) = resize {
                                if let Err(err) = self.apply_resize(cols, rows) {
                                    warn!(error = %err, "pty resize failed");
                                }
                            }
                        }
                    }
                }
            }

            let status = tokio::task::spawn_blocking(move || wait_for_exit(pid)).await.context("join wait thread")??;
            Ok(status)
        })
    }

    fn child_pid(&self) -> Option<u32> {
        Some(self.child_pid.as_raw() as u32)
    }

    fn supports_shell_state_hooks(&self) -> bool {
        true
    }
}

impl Drop for NativePty {
    fn drop(&mut self) {
        let _ = kill(self.child_pid, Signal::SIGHUP);
        let _ = waitpid(self.child_pid, Some(WaitPidFlag::WNOHANG));
    }
}

fn wait_for_exit(pid: Pid) -> anyhow::Result<ExitStatus> {
    loop {
        match waitpid(pid, None) {
            Ok(WaitStatus::Exited(_, code)) => return Ok(ExitStatus { code: Some(code), signal: None }),
            Ok(WaitStatus::Signaled(_, sig, _)) => return Ok(ExitStatus { code: None, signal: Some(sig as i32) }),
            Ok(_) => continue,
            Err(nix::errno::Errno::EINTR) => continue,
            Err(e) => bail!("waitpid failed: {e}"),
        }
    }
}
