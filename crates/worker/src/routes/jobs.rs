// SPDX-License-Identifier: MIT

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::header::ACCEPT;
use axum::http::HeaderMap;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::IntoResponse;
use axum::Json;
use cw_core::{EventType, Job, JobId};
use cw_engine::approval::ApproveRequest;
use futures_util::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::error::ApiError;
use crate::state::AppState;

pub async fn get_job(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Job>, ApiError> {
    let job = cw_engine::job::get_job(&state.engine, JobId::from_raw(id)).await?;
    Ok(Json(job))
}

#[derive(Deserialize)]
pub struct JobEventsQuery {
    cursor: Option<i64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JobEventsResponse {
    events: Vec<cw_core::EventEnvelope>,
    next_cursor: i64,
}

fn wants_sse(headers: &HeaderMap) -> bool {
    headers.get(ACCEPT).and_then(|value| value.to_str().ok()).is_some_and(|value| value.contains("text/event-stream"))
}

/// `GET /v1/jobs/{id}/events`: a plain JSON page by default, or an SSE
/// stream when the client asks for `text/event-stream`.
pub async fn job_events(State(state): State<AppState>, Path(id): Path<String>, Query(query): Query<JobEventsQuery>, headers: HeaderMap) -> Result<axum::response::Response, ApiError> {
    let job_id = JobId::from_raw(id);

    if wants_sse(&headers) {
        return job_events_sse(state, job_id, query.cursor).await.map(IntoResponse::into_response);
    }

    let (events, next_cursor) = cw_engine::job::list_events(&state.engine, job_id, query.cursor).await?;
    Ok(Json(JobEventsResponse { events, next_cursor }).into_response())
}

async fn job_events_sse(state: AppState, job_id: JobId, cursor: Option<i64>) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let job = cw_engine::job::get_job(&state.engine, job_id.clone()).await?;
    let (replay, _next_cursor) = cw_engine::job::list_events(&state.engine, job_id.clone(), cursor).await?;

    let (tx, rx) = mpsc::unbounded_channel::<cw_core::EventEnvelope>();
    for event in replay {
        let _ = tx.send(event);
    }

    if !job.state.is_terminal() {
        if let Ok((subscriber_id, mut live_rx)) = cw_engine::job::subscribe(&state.engine, job_id.clone()).await {
            let engine = Arc::clone(&state.engine);
            let job_id_for_task = job_id.clone();
            tokio::spawn(async move {
                while let Some(event) = live_rx.recv().await {
                    let is_finished = matches!(event.kind, EventType::JobFinished);
                    if tx.send(event).is_err() {
                        break;
                    }
                    if is_finished {
                        break;
                    }
                }
                cw_engine::job::unsubscribe(&engine, job_id_for_task, subscriber_id).await;
            });
        }
    }

    let stream = UnboundedReceiverStream::new(rx).map(|event| {
        let data = serde_json::to_string(&event).unwrap_or_else(|_| "{}".to_string());
        Ok(Event::default().id(event.seq.to_string()).event(event.kind.as_str()).data(data))
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::new().interval(state.config.heartbeat_interval()).text("ping")))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveBody {
    approval_id: String,
    decision: cw_core::DecisionValue,
    #[serde(default)]
    decline_reason: Option<String>,
    #[serde(default)]
    actor: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ApproveResponse {
    status: &'static str,
    decision: cw_core::DecisionValue,
}

pub async fn approve_job(State(state): State<AppState>, Path(id): Path<String>, Json(body): Json<ApproveBody>) -> Result<Json<ApproveResponse>, ApiError> {
    let req = ApproveRequest { approval_id: body.approval_id.into(), decision: body.decision, decline_reason: body.decline_reason, actor: body.actor };
    let outcome = cw_engine::approval::approve(&state.engine, JobId::from_raw(id), req).await?;
    let status = if outcome.already_submitted { "already_submitted" } else { "submitted" };
    Ok(Json(ApproveResponse { status, decision: outcome.decision }))
}

pub async fn cancel_job(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Job>, ApiError> {
    let job = cw_engine::job::cancel(&state.engine, JobId::from_raw(id)).await?;
    Ok(Json(job))
}
