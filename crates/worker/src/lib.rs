// SPDX-License-Identifier: MIT

//! cw-worker: bridges a coding-agent subprocess's JSON-RPC protocol to
//! HTTP/SSE/WebSocket clients. The composition root: build shared state,
//! spawn the background tasks, build the router, serve with graceful
//! shutdown.

pub mod auth;
pub mod config;
pub mod error;
pub mod projects;
pub mod push_sink;
pub mod routes;
pub mod state;

use std::sync::Arc;

use cw_engine::Engine;
use cw_rpc::{RpcBridge, SpawnSpec};
use cw_terminal::TerminalManager;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;

use crate::config::Config;
use crate::push_sink::LoggingPushSink;
use crate::state::AppState;

/// Run the Worker until shutdown (Ctrl-C or the agent subprocess exiting).
pub async fn run(config: Config) -> anyhow::Result<()> {
    config.validate()?;

    let allowed_projects = projects::load(config.projects_file.as_deref())?;

    let store = if config.db_path == ":memory:" { cw_store::Store::open_in_memory()? } else { cw_store::Store::open(&config.db_path)? };

    let spawn_spec = SpawnSpec { command: config.agent_command.clone(), args: config.agent_args.clone(), cwd: config.agent_cwd.clone(), env: Vec::new() };
    let bridge = RpcBridge::start_with_timeout(spawn_spec, config.upstream_timeout())?;
    let upstream = cw_engine::UpstreamClient::new(bridge.clone());

    let mut engine = Engine::new(store, upstream, allowed_projects).with_push_sink(Arc::new(LoggingPushSink));
    engine.event_retention = config.event_retention;
    let engine = Arc::new(engine);

    tokio::spawn(cw_engine::dispatch::run(Arc::clone(&engine), bridge.subscribe()));

    let terminals = TerminalManager::new(config.terminal_shell.clone(), config.terminal_limits());
    terminals.clone().spawn_sweep_task();

    let config = Arc::new(config);
    let state = AppState { engine, terminals, config: Arc::clone(&config) };
    let router = routes::build_router(state);

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, auth_enabled = config.auth_token.is_some(), "cw-worker listening");

    axum::serve(listener, router).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
