// SPDX-License-Identifier: MIT

//! Shared application state handed to every route handler: one
//! `Arc`-wrapped bundle passed to `axum::Router::with_state`.

use std::sync::Arc;

use cw_engine::Engine;
use cw_terminal::TerminalManager;

use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
    pub terminals: TerminalManager,
    pub config: Arc<Config>,
}
