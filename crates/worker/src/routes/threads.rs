// SPDX-License-Identifier: MIT

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use cw_core::{ErrorCode, Thread, ThreadId};
use cw_engine::job::CreateThreadRequest;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateThreadBody {
    project_selector: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    approval_policy: Option<Value>,
    #[serde(default)]
    sandbox: Option<Value>,
}

pub async fn create_thread(State(state): State<AppState>, Json(body): Json<CreateThreadBody>) -> Result<impl IntoResponse, ApiError> {
    let req = CreateThreadRequest { project_selector: body.project_selector, name: body.name, approval_policy: body.approval_policy, sandbox: body.sandbox };
    let thread = cw_engine::job::create_thread(&state.engine, req).await?;
    Ok((StatusCode::CREATED, Json(thread)))
}

#[derive(Deserialize)]
pub struct ListThreadsQuery {
    archived: Option<bool>,
}

pub async fn list_threads(State(state): State<AppState>, Query(query): Query<ListThreadsQuery>) -> Result<Json<Vec<Thread>>, ApiError> {
    let threads = cw_engine::job::list_threads(&state.engine, query.archived).await?;
    Ok(Json(threads))
}

pub async fn activate_thread(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Thread>, ApiError> {
    let thread = cw_engine::job::activate_thread(&state.engine, ThreadId::from_raw(id)).await?;
    Ok(Json(thread))
}

async fn set_archived(state: &AppState, id: String, archived: bool) -> Result<Json<Thread>, ApiError> {
    let thread_id = ThreadId::from_raw(id);
    state.engine.store.set_thread_archived(thread_id.clone(), archived).await.map_err(|_| ApiError::new(ErrorCode::ThreadNotFound, "thread not found"))?;
    let thread = state.engine.store.get_thread(thread_id.clone()).await.map_err(cw_engine::EngineError::from)?.ok_or_else(|| ApiError::new(ErrorCode::ThreadNotFound, "thread not found"))?;
    Ok(Json(thread))
}

pub async fn archive_thread(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Thread>, ApiError> {
    set_archived(&state, id, true).await
}

pub async fn unarchive_thread(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Thread>, ApiError> {
    set_archived(&state, id, false).await
}

/// Export: a thin pass-through of the cached thread row plus its
/// projected history.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadExport {
    thread: Thread,
    events: Vec<cw_core::ThreadEventEntry>,
}

pub async fn export_thread(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<ThreadExport>, ApiError> {
    let thread_id = ThreadId::from_raw(id);
    let thread = state.engine.store.get_thread(thread_id.clone()).await.map_err(cw_engine::EngineError::from)?.ok_or_else(|| ApiError::new(ErrorCode::ThreadNotFound, "thread not found"))?;
    let (events, _next_cursor, _has_more) = cw_engine::thread_events::get_thread_events(&state.engine, thread_id, None, Some(cw_engine::projection::MAX_PAGE_LIMIT)).await?;
    Ok(Json(ThreadExport { thread, events }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportThreadBody {
    thread: Thread,
}

pub async fn import_thread(State(state): State<AppState>, Json(body): Json<ImportThreadBody>) -> Result<impl IntoResponse, ApiError> {
    state.engine.store.upsert_thread(body.thread.clone()).await.map_err(cw_engine::EngineError::from)?;
    Ok((StatusCode::CREATED, Json(body.thread)))
}

#[derive(Deserialize)]
pub struct ThreadEventsQuery {
    cursor: Option<i64>,
    limit: Option<usize>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadEventsResponse {
    events: Vec<cw_core::ThreadEventEntry>,
    next_cursor: i64,
    has_more: bool,
}

pub async fn thread_events(State(state): State<AppState>, Path(id): Path<String>, Query(query): Query<ThreadEventsQuery>) -> Result<Json<ThreadEventsResponse>, ApiError> {
    let (events, next_cursor, has_more) = cw_engine::thread_events::get_thread_events(&state.engine, ThreadId::from_raw(id), query.cursor, query.limit).await?;
    Ok(Json(ThreadEventsResponse { events, next_cursor, has_more }))
}

#[derive(Deserialize)]
pub struct StartTurnBody {
    input: Value,
}

pub async fn start_turn(State(state): State<AppState>, Path(id): Path<String>, Json(body): Json<StartTurnBody>) -> Result<impl IntoResponse, ApiError> {
    let job = cw_engine::job::start_turn(&state.engine, ThreadId::from_raw(id), body.input).await?;
    Ok((StatusCode::ACCEPTED, Json(job)))
}
