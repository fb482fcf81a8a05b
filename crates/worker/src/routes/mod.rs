// SPDX-License-Identifier: MIT

//! Route table assembly: a flat `Router::new().route(...)` chain, CORS
//! and auth layered on top, state attached last.

mod health;
mod jobs;
mod projects;
mod push;
mod terminals;
mod threads;

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::auth_layer;
use crate::state::AppState;

/// Request bodies are capped at 1 MiB for JSON.
const MAX_JSON_BODY_BYTES: usize = 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/v1/projects", get(projects::list_projects))
        .route("/v1/threads", post(threads::create_thread).get(threads::list_threads))
        .route("/v1/threads/import", post(threads::import_thread))
        .route("/v1/threads/{id}/activate", post(threads::activate_thread))
        .route("/v1/threads/{id}/archive", post(threads::archive_thread))
        .route("/v1/threads/{id}/unarchive", post(threads::unarchive_thread))
        .route("/v1/threads/{id}/export", get(threads::export_thread))
        .route("/v1/threads/{id}/events", get(threads::thread_events))
        .route("/v1/threads/{id}/turns", post(threads::start_turn))
        .route("/v1/threads/{id}/terminal", get(terminals::terminal_state))
        .route("/v1/threads/{id}/terminal/open", post(terminals::open_terminal))
        .route("/v1/jobs/{id}", get(jobs::get_job))
        .route("/v1/jobs/{id}/events", get(jobs::job_events))
        .route("/v1/jobs/{id}/approve", post(jobs::approve_job))
        .route("/v1/jobs/{id}/cancel", post(jobs::cancel_job))
        .route("/v1/push/devices/register", post(push::register_device))
        .route("/v1/push/devices/unregister", post(push::unregister_device))
        .route("/v1/terminals/{id}/resize", post(terminals::resize_terminal))
        .route("/v1/terminals/{id}/close", post(terminals::close_terminal))
        .route("/v1/terminals/{id}/stream", get(terminals::stream_terminal))
        .layer(middleware::from_fn_with_state(state.clone(), auth_layer))
        .layer(DefaultBodyLimit::max(MAX_JSON_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
