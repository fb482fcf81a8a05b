// SPDX-License-Identifier: MIT

//! Worker configuration, derived via `clap::Parser`: every knob is a
//! `--flag`/env pair with a sane default, plus a handful of
//! `Duration`-returning helpers so callers never re-derive a unit
//! conversion.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::error::ConfigError;

#[derive(Debug, Clone, Parser)]
#[command(name = "cwd", about = "Bridges a coding-agent subprocess to HTTP/SSE/WebSocket clients")]
pub struct Config {
    /// Interface to bind the HTTP server on.
    #[arg(long, default_value = "127.0.0.1", env = "CW_HOST")]
    pub host: String,

    /// Port to bind the HTTP server on.
    #[arg(long, default_value_t = 4850, env = "CW_PORT")]
    pub port: u16,

    /// Bearer token clients must present. Unset disables auth entirely
    /// (local development only).
    #[arg(long, env = "CW_AUTH_TOKEN")]
    pub auth_token: Option<String>,

    /// Command used to spawn the upstream agent subprocess.
    #[arg(long, env = "CW_AGENT_COMMAND")]
    pub agent_command: String,

    /// Arguments passed to the upstream agent subprocess.
    #[arg(long = "agent-arg", env = "CW_AGENT_ARGS", value_delimiter = ' ')]
    pub agent_args: Vec<String>,

    /// Working directory the agent subprocess is spawned in. Defaults to
    /// the Worker process's own cwd.
    #[arg(long, env = "CW_AGENT_CWD")]
    pub agent_cwd: Option<String>,

    /// Path to the JSON file listing allow-listed projects. Unset means
    /// no project may be selected.
    #[arg(long, env = "CW_PROJECTS_FILE")]
    pub projects_file: Option<PathBuf>,

    /// SQLite database path for the cache store. `:memory:` opens an
    /// in-memory store that does not survive a restart.
    #[arg(long, default_value = "cw-worker.sqlite3", env = "CW_DB_PATH")]
    pub db_path: String,

    /// Per-job in-memory event log retention, in events.
    #[arg(long, default_value_t = cw_engine::DEFAULT_RETENTION, env = "CW_EVENT_RETENTION")]
    pub event_retention: usize,

    /// Shell used to spawn terminal sessions.
    #[arg(long, default_value = "/bin/bash", env = "CW_TERMINAL_SHELL")]
    pub terminal_shell: String,

    /// Maximum concurrently open terminal sessions.
    #[arg(long, default_value_t = 16, env = "CW_TERMINAL_MAX_SESSIONS")]
    pub terminal_max_sessions: usize,

    /// Maximum bytes accepted in a single terminal input write.
    #[arg(long, default_value_t = 64 * 1024, env = "CW_TERMINAL_MAX_INPUT_BYTES")]
    pub terminal_max_input_bytes: usize,

    /// Maximum bytes retained per terminal session's scrollback buffer.
    #[arg(long, default_value_t = 2 * 1024 * 1024, env = "CW_TERMINAL_MAX_SCROLLBACK_BYTES")]
    pub terminal_max_scrollback_bytes: usize,

    /// Idle duration, in milliseconds, before a terminal session becomes
    /// eligible for the idle sweep.
    #[arg(long, default_value_t = 20 * 60 * 1000, env = "CW_TERMINAL_IDLE_TTL_MS")]
    pub terminal_idle_ttl_ms: u64,

    /// Interval, in milliseconds, between idle-sweep passes.
    #[arg(long, default_value_t = 10_000, env = "CW_TERMINAL_SWEEP_INTERVAL_MS")]
    pub terminal_sweep_interval_ms: u64,

    /// Heartbeat interval, in milliseconds, for both SSE comment pings
    /// and terminal WebSocket `ping` frames.
    #[arg(long, default_value_t = 15_000, env = "CW_HEARTBEAT_MS")]
    pub heartbeat_ms: u64,

    /// Timeout, in milliseconds, for a single upstream JSON-RPC request
    /// (mirrors `cw_rpc::bridge::UPSTREAM_TIMEOUT`; exposed here so an
    /// operator can tune it without a rebuild).
    #[arg(long, default_value_t = 120_000, env = "CW_UPSTREAM_TIMEOUT_MS")]
    pub upstream_timeout_ms: u64,

    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty, env = "CW_LOG_FORMAT")]
    pub log_format: LogFormat,

    /// Log verbosity, as a `tracing-subscriber` env-filter directive
    /// (e.g. `info`, `cw_worker=debug,cw_engine=debug`).
    #[arg(long, default_value = "info", env = "CW_LOG_LEVEL")]
    pub log_level: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl Config {
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_ms)
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_millis(self.upstream_timeout_ms)
    }

    pub fn terminal_limits(&self) -> cw_terminal::TerminalLimits {
        cw_terminal::TerminalLimits {
            max_sessions: self.terminal_max_sessions,
            max_input_bytes: self.terminal_max_input_bytes,
            max_scrollback_bytes: self.terminal_max_scrollback_bytes,
            idle_ttl: Duration::from_millis(self.terminal_idle_ttl_ms),
            sweep_interval: Duration::from_millis(self.terminal_sweep_interval_ms),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Reject configurations that would silently misbehave rather than
    /// fail loudly at startup.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.agent_command.trim().is_empty() {
            return Err(ConfigError::Invalid("agent-command must not be empty".into()));
        }
        if self.event_retention == 0 {
            return Err(ConfigError::Invalid("event-retention must be greater than zero".into()));
        }
        if self.terminal_max_input_bytes == 0 {
            return Err(ConfigError::Invalid("terminal-max-input-bytes must be greater than zero".into()));
        }
        if self.terminal_max_sessions == 0 {
            return Err(ConfigError::Invalid("terminal-max-sessions must be greater than zero".into()));
        }
        if self.heartbeat_ms == 0 {
            return Err(ConfigError::Invalid("heartbeat-ms must be greater than zero".into()));
        }
        Ok(())
    }
}
