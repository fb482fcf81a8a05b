// SPDX-License-Identifier: MIT

//! Terminal session control plane plus the `/v1/terminals/{id}/stream`
//! WebSocket handler. The control routes are plain JSON/HTTP, matching
//! the other route modules in this crate; the streaming handler follows
//! the usual axum upgrade/select-loop shape.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, Query, RawQuery, State, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use cw_core::{ErrorCode, SessionId, TerminalFrame, TerminalSession, ThreadId};
use cw_terminal::session::SessionHandle;
use cw_terminal::TerminalError;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

use crate::auth;
use crate::error::{terminal_error_code, ApiError};
use crate::state::AppState;

async fn to_dto(session: &SessionHandle) -> TerminalSession {
    let guard = session.shared.lock().await;
    TerminalSession {
        id: session.id.clone(),
        thread_id: session.thread_id.clone(),
        status: guard.status,
        shell_state: guard.shell_state,
        created_at: guard.last_active_at,
        updated_at: guard.last_active_at,
        exit_code: guard.exit_code,
        cols: guard.cols,
        rows: guard.rows,
    }
}

pub async fn terminal_state(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<TerminalSession>, ApiError> {
    let thread_id = ThreadId::from_raw(id);
    let session = state.terminals.get_for_thread(&thread_id).await.ok_or_else(|| ApiError::new(ErrorCode::TerminalNotFound, "no terminal session for thread"))?;
    Ok(Json(to_dto(&session).await))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenTerminalBody {
    #[serde(default = "default_cols")]
    cols: u16,
    #[serde(default = "default_rows")]
    rows: u16,
}

fn default_cols() -> u16 {
    80
}

fn default_rows() -> u16 {
    24
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenTerminalResponse {
    session: TerminalSession,
    ws_path: String,
    reused: bool,
}

pub async fn open_terminal(State(state): State<AppState>, Path(id): Path<String>, Json(body): Json<OpenTerminalBody>) -> Result<impl IntoResponse, ApiError> {
    let thread_id = ThreadId::from_raw(id);
    let thread = state.engine.store.get_thread(thread_id.clone()).await.map_err(cw_engine::EngineError::from)?.ok_or_else(|| ApiError::new(ErrorCode::ThreadNotFound, "thread not found"))?;

    let outcome = state.terminals.open_session(thread_id, PathBuf::from(thread.working_dir), body.cols, body.rows).await?;
    let dto = to_dto(&outcome.session).await;
    let ws_path = format!("/v1/terminals/{}/stream?fromSeq=-1", dto.id.as_str());
    Ok((StatusCode::CREATED, Json(OpenTerminalResponse { session: dto, ws_path, reused: outcome.reused })))
}

#[derive(Deserialize)]
pub struct ResizeTerminalBody {
    cols: u16,
    rows: u16,
}

pub async fn resize_terminal(State(state): State<AppState>, Path(id): Path<String>, Json(body): Json<ResizeTerminalBody>) -> Result<StatusCode, ApiError> {
    state.terminals.resize_session(&SessionId::from_raw(id), body.cols, body.rows).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct CloseTerminalBody {
    #[serde(default)]
    force: bool,
}

pub async fn close_terminal(State(state): State<AppState>, Path(id): Path<String>, Json(body): Json<CloseTerminalBody>) -> Result<StatusCode, ApiError> {
    state.terminals.close_session(&SessionId::from_raw(id), body.force).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamQuery {
    #[serde(default)]
    from_seq: Option<i64>,
}

/// `GET /v1/terminals/{id}/stream?fromSeq=`: exempted from the bearer-header
/// middleware (browsers cannot set upgrade headers), so the token travels in
/// the query string instead and is checked here.
pub async fn stream_terminal(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<StreamQuery>,
    RawQuery(raw_query): RawQuery,
    ws: WebSocketUpgrade,
) -> Response {
    if let Err(code) = auth::validate_ws_query(raw_query.as_deref().unwrap_or(""), state.config.auth_token.as_deref()) {
        return code.to_http_response("missing or invalid token").into_response();
    }

    let session_id = SessionId::from_raw(id);
    let from_seq = query.from_seq.unwrap_or(-1);
    let heartbeat = state.config.heartbeat_interval();

    ws.on_upgrade(move |socket| handle_terminal_ws(socket, state, session_id, from_seq, heartbeat)).into_response()
}

fn frame_offset(frame: &TerminalFrame) -> u64 {
    match frame {
        TerminalFrame::Output { offset, .. } | TerminalFrame::Exit { offset, .. } => *offset,
    }
}

async fn send_json(socket: &mut WebSocket, value: serde_json::Value) -> bool {
    let text = serde_json::to_string(&value).unwrap_or_else(|_| "{}".to_string());
    socket.send(Message::Text(text.into())).await.is_ok()
}

async fn close_with_error(mut socket: WebSocket, err: &TerminalError) {
    let code = terminal_error_code(err);
    let _ = send_json(&mut socket, json!({"type": "error", "code": code.as_str(), "message": err.to_string()})).await;
    let _ = socket
        .send(Message::Close(Some(axum::extract::ws::CloseFrame { code: code.ws_close_code(), reason: err.to_string().into() })))
        .await;
}

/// Per-connection loop: replay + live forwarding from the session's
/// broadcast channel, a server-driven heartbeat, and the client message
/// protocol (`input`/`resize`/`ping`/`pong`/`detach`).
async fn handle_terminal_ws(mut socket: WebSocket, state: AppState, session_id: SessionId, from_seq: i64, heartbeat: Duration) {
    let attach = match state.terminals.attach_client(&session_id, from_seq).await {
        Ok(outcome) => outcome,
        Err(err) => {
            close_with_error(socket, &err).await;
            return;
        }
    };
    let session = attach.session;
    let mut receiver = attach.receiver;

    let cwd = match state.engine.store.get_thread(session.thread_id.clone()).await {
        Ok(Some(thread)) => thread.working_dir,
        _ => String::new(),
    };
    let seq = attach.replay.last().map(|f| frame_offset(f) as i64).unwrap_or(from_seq);

    if !send_json(&mut socket, json!({"type": "ready", "sessionId": session.id.as_str(), "threadId": session.thread_id.as_str(), "cwd": cwd, "seq": seq})).await {
        state.terminals.detach_client(&session_id).await;
        return;
    }

    for frame in &attach.replay {
        let encoded = serde_json::to_value(frame).unwrap_or_else(|_| json!({}));
        if !send_json(&mut socket, encoded).await {
            state.terminals.detach_client(&session_id).await;
            return;
        }
    }

    let mut ticker = tokio::time::interval(heartbeat);
    ticker.tick().await; // first tick fires immediately; discard it
    let mut missed_beats = 0u32;

    loop {
        tokio::select! {
            frame = receiver.recv() => {
                match frame {
                    Ok(frame) => {
                        let encoded = serde_json::to_value(&frame).unwrap_or_else(|_| json!({}));
                        if !send_json(&mut socket, encoded).await {
                            break;
                        }
                        if matches!(frame, TerminalFrame::Exit { .. }) {
                            let _ = socket.send(Message::Close(None)).await;
                            break;
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                }
            }

            _ = ticker.tick() => {
                missed_beats += 1;
                if missed_beats >= 2 {
                    debug!(session_id = %session_id, "terminal websocket idle past heartbeat, closing");
                    let _ = socket.send(Message::Close(Some(axum::extract::ws::CloseFrame { code: 1011, reason: "idle".into() }))).await;
                    break;
                }
                if !send_json(&mut socket, json!({"type": "ping"})).await {
                    break;
                }
            }

            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        missed_beats = 0;
                        if !handle_client_message(&mut socket, &state, &session_id, &text).await {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => { missed_beats = 0; }
                    Some(Err(_)) => {
                        let _ = socket.send(Message::Close(Some(axum::extract::ws::CloseFrame { code: 1011, reason: "transport error".into() }))).await;
                        break;
                    }
                }
            }
        }
    }

    state.terminals.detach_client(&session_id).await;
}

/// Returns `false` when the connection should close.
async fn handle_client_message(socket: &mut WebSocket, state: &AppState, session_id: &SessionId, text: &str) -> bool {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(text) else {
        return send_json(socket, json!({"type": "error", "code": ErrorCode::InvalidJson.as_str(), "message": "malformed frame"})).await;
    };
    let kind = value.get("type").and_then(|v| v.as_str()).unwrap_or("");

    match kind {
        "input" => {
            let Some(data) = value.get("data").and_then(|v| v.as_str()) else {
                return send_json(socket, json!({"type": "error", "message": "input frame missing data"})).await;
            };
            match state.terminals.write_input(session_id, bytes::Bytes::copy_from_slice(data.as_bytes())).await {
                Ok(()) => true,
                Err(err) => send_json(socket, json!({"type": "error", "code": terminal_error_code(&err).as_str(), "message": err.to_string()})).await,
            }
        }
        "resize" => {
            let cols = value.get("cols").and_then(|v| v.as_u64()).unwrap_or(80) as u16;
            let rows = value.get("rows").and_then(|v| v.as_u64()).unwrap_or(24) as u16;
            match state.terminals.resize_session(session_id, cols, rows).await {
                Ok(()) => true,
                Err(err) => send_json(socket, json!({"type": "error", "code": terminal_error_code(&err).as_str(), "message": err.to_string()})).await,
            }
        }
        "ping" => send_json(socket, json!({"type": "pong"})).await,
        "pong" => true,
        "detach" => false,
        other => send_json(socket, json!({"type": "error", "code": ErrorCode::InvalidJson.as_str(), "message": format!("unknown message type: {other}")})).await,
    }
}
