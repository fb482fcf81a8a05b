// SPDX-License-Identifier: MIT

//! Client-facing job/thread operations. Free functions over `&Engine`
//! (`pub async fn handle_x(state: &Store, ...)`) rather than methods on a
//! god object.

use cw_core::{Job, JobId, JobState, Thread, ThreadId};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::warn;

use crate::error::EngineError;
use crate::event_log::{EventLog, SubscriberId};
use crate::{Engine, ProjectDescriptor};

fn row_to_thread(value: &Value, fallback_id: Option<&str>) -> Thread {
    let id = value.get("threadId").or_else(|| value.get("id")).and_then(Value::as_str).or(fallback_id).map(ThreadId::from_raw).unwrap_or_else(ThreadId::new);
    let working_dir = value.get("workingDir").or_else(|| value.get("cwd")).and_then(Value::as_str).unwrap_or_default();
    let mut thread = Thread::new(id, working_dir);
    if let Some(preview) = value.get("preview").and_then(Value::as_str) {
        thread.preview = preview.to_string();
    }
    if let Some(provider) = value.get("modelProvider").and_then(Value::as_str) {
        thread.model_provider = Some(provider.to_string());
    }
    if let Some(archived) = value.get("archived").and_then(Value::as_bool) {
        thread.archived = archived;
    }
    thread
}

fn resolve_project<'a>(projects: &'a [ProjectDescriptor], selector: &str) -> Result<&'a ProjectDescriptor, EngineError> {
    projects.iter().find(|p| p.id == selector).ok_or_else(|| EngineError::ProjectNotAllowed(selector.to_string()))
}

pub struct CreateThreadRequest {
    pub project_selector: String,
    pub name: Option<String>,
    pub approval_policy: Option<Value>,
    pub sandbox: Option<Value>,
}

/// `createThread`: resolve the project (allow-list check), start the
/// thread upstream, optionally name it, mark it loaded, and cache it.
pub async fn create_thread(engine: &Engine, req: CreateThreadRequest) -> Result<Thread, EngineError> {
    let project = resolve_project(&engine.allowed_projects, &req.project_selector)?;

    let mut params = serde_json::json!({ "cwd": project.path });
    if let Some(policy) = &req.approval_policy {
        params["approvalPolicy"] = policy.clone();
    }
    if let Some(sandbox) = &req.sandbox {
        params["sandbox"] = sandbox.clone();
    }

    let result = engine.upstream.thread_start(params).await?;
    let mut thread = row_to_thread(&result, None);

    if let Some(name) = &req.name {
        engine.upstream.thread_name_set(serde_json::json!({ "threadId": thread.id.as_str(), "name": name })).await?;
        thread.preview = name.clone();
    }

    {
        let mut threads = engine.state.threads.lock().await;
        threads.loaded.insert(thread.id.clone());
        threads.threads.insert(thread.id.clone(), thread.clone());
    }

    engine.store.upsert_thread(thread.clone()).await?;
    engine.store.invalidate_projection(thread.id.clone()).await?;
    invalidate_cached_projection(engine, &thread.id).await;

    Ok(thread)
}

/// `listThreads`: invoke upstream `thread/list`, mirror results to cache.
pub async fn list_threads(engine: &Engine, archived: Option<bool>) -> Result<Vec<Thread>, EngineError> {
    let params = match archived {
        Some(archived) => serde_json::json!({ "archived": archived }),
        None => serde_json::json!({}),
    };
    let result = engine.upstream.thread_list(params).await?;
    let rows = result.get("threads").and_then(Value::as_array).cloned().unwrap_or_default();
    let threads: Vec<Thread> = rows.iter().map(|row| row_to_thread(row, None)).collect();

    for thread in &threads {
        engine.store.upsert_thread(thread.clone()).await?;
    }

    Ok(threads)
}

/// `activateThread`: return the cached DTO if already loaded this
/// process, otherwise resume it upstream and mark it loaded.
pub async fn activate_thread(engine: &Engine, thread_id: ThreadId) -> Result<Thread, EngineError> {
    {
        let threads = engine.state.threads.lock().await;
        if threads.loaded.contains(&thread_id) {
            if let Some(thread) = threads.threads.get(&thread_id) {
                return Ok(thread.clone());
            }
        }
    }

    let result = engine.upstream.thread_resume(serde_json::json!({ "threadId": thread_id.as_str() })).await?;
    let thread = row_to_thread(&result, Some(thread_id.as_str()));

    {
        let mut threads = engine.state.threads.lock().await;
        threads.loaded.insert(thread.id.clone());
        threads.threads.insert(thread.id.clone(), thread.clone());
    }
    engine.store.upsert_thread(thread.clone()).await?;

    Ok(thread)
}

/// Scan for the unique newest active job on a thread (job correlation
/// strategy (c), used by the `THREAD_HAS_ACTIVE_JOB` precondition in
/// `startTurn`).
pub(crate) fn newest_active_job<'a>(jobs: &'a crate::state::JobState, thread_id: &ThreadId) -> Option<&'a Job> {
    jobs.jobs.values().filter(|job| &job.thread_id == thread_id && job.state.is_active()).max_by_key(|job| job.created_at)
}

/// `startTurn`: reject if the thread already has an active job; lazily
/// resume the thread; create a `QUEUED` job and drive it to `RUNNING` or
/// `FAILED` depending on the upstream `turn/start` outcome.
pub async fn start_turn(engine: &Engine, thread_id: ThreadId, input: Value) -> Result<Job, EngineError> {
    {
        let jobs = engine.state.jobs.lock().await;
        if newest_active_job(&jobs, &thread_id).is_some() {
            return Err(EngineError::ThreadHasActiveJob(thread_id.as_str().to_string()));
        }
    }

    activate_thread(engine, thread_id.clone()).await?;

    let job = Job::new(thread_id.clone());
    let job_id = job.id.clone();

    {
        let mut jobs = engine.state.jobs.lock().await;
        jobs.pending_job_by_thread.insert(thread_id.clone(), job_id.clone());
        jobs.jobs.insert(job_id.clone(), job);
    }
    {
        let mut logs = engine.state.event_logs.lock().await;
        logs.insert(job_id.clone(), EventLog::with_retention(job_id.clone(), engine.event_retention));
    }

    append_event(engine, &job_id, cw_core::EventType::JobCreated, serde_json::json!({})).await;
    append_event(engine, &job_id, cw_core::EventType::JobState, serde_json::json!({"state": JobState::Queued.as_str()})).await;

    let result = engine.upstream.turn_start(serde_json::json!({ "threadId": thread_id.as_str(), "input": input })).await;

    match result {
        Ok(value) => {
            let turn_id = value.get("turnId").and_then(Value::as_str).map(str::to_owned);
            let mut jobs = engine.state.jobs.lock().await;
            if let Some(job) = jobs.jobs.get_mut(&job_id) {
                if let Some(turn_id) = turn_id {
                    jobs.job_by_turn.insert((thread_id.clone(), turn_id.clone()), job_id.clone());
                    job.turn_id = Some(turn_id);
                }
                job.transition_to(JobState::Running);
                jobs.pending_job_by_thread.remove(&thread_id);
            }
        }
        Err(err) => {
            let mut jobs = engine.state.jobs.lock().await;
            if let Some(job) = jobs.jobs.get_mut(&job_id) {
                job.error = Some(err.to_string());
                job.transition_to(JobState::Failed);
                jobs.pending_job_by_thread.remove(&thread_id);
            }
        }
    }

    let job = get_job(engine, job_id.clone()).await?;
    append_event(engine, &job_id, cw_core::EventType::JobState, serde_json::json!({"state": job.state.as_str()})).await;
    if job.state.is_terminal() {
        finish_job_once(engine, &job_id).await;
    }
    engine.store.upsert_job(job.clone()).await?;

    Ok(job)
}

pub async fn get_job(engine: &Engine, job_id: JobId) -> Result<Job, EngineError> {
    let jobs = engine.state.jobs.lock().await;
    jobs.jobs.get(&job_id).cloned().ok_or_else(|| EngineError::JobNotFound(job_id.as_str().to_string()))
}

pub async fn list_events(engine: &Engine, job_id: JobId, cursor: Option<i64>) -> Result<(Vec<cw_core::EventEnvelope>, i64), EngineError> {
    let logs = engine.state.event_logs.lock().await;
    let log = logs.get(&job_id).ok_or_else(|| EngineError::JobNotFound(job_id.as_str().to_string()))?;
    log.list_events(cursor)
}

pub async fn subscribe(engine: &Engine, job_id: JobId) -> Result<(SubscriberId, mpsc::UnboundedReceiver<cw_core::EventEnvelope>), EngineError> {
    let mut logs = engine.state.event_logs.lock().await;
    let log = logs.get_mut(&job_id).ok_or_else(|| EngineError::JobNotFound(job_id.as_str().to_string()))?;
    Ok(log.subscribe())
}

pub async fn unsubscribe(engine: &Engine, job_id: JobId, subscriber_id: SubscriberId) {
    let mut logs = engine.state.event_logs.lock().await;
    if let Some(log) = logs.get_mut(&job_id) {
        log.unsubscribe(subscriber_id);
    }
}

/// `cancel`: always accepted. A terminal job returns its current
/// snapshot unchanged; a job with no `turnId` yet is cancelled locally;
/// otherwise the actual transition arrives later via `turn/completed`.
pub async fn cancel(engine: &Engine, job_id: JobId) -> Result<Job, EngineError> {
    let snapshot = get_job(engine, job_id.clone()).await?;
    if snapshot.state.is_terminal() {
        return Ok(snapshot);
    }

    let Some(turn_id) = snapshot.turn_id.clone() else {
        let mut jobs = engine.state.jobs.lock().await;
        if let Some(job) = jobs.jobs.get_mut(&job_id) {
            job.transition_to(JobState::Cancelled);
        }
        drop(jobs);
        append_event(engine, &job_id, cw_core::EventType::JobState, serde_json::json!({"state": JobState::Cancelled.as_str()})).await;
        finish_job_once(engine, &job_id).await;
        return get_job(engine, job_id).await;
    };

    if let Err(err) = engine.upstream.turn_interrupt(serde_json::json!({ "threadId": snapshot.thread_id.as_str(), "turnId": turn_id })).await {
        warn!(job_id = %job_id, error = %err, "turn/interrupt failed; job remains in its last known state");
    }

    get_job(engine, job_id).await
}

/// Append to a job's event log and persist asynchronously.
pub(crate) async fn append_event(engine: &Engine, job_id: &JobId, kind: cw_core::EventType, payload: Value) {
    let envelope = {
        let mut logs = engine.state.event_logs.lock().await;
        match logs.get_mut(job_id) {
            Some(log) => log.append(kind, payload),
            None => return,
        }
    };
    if let Err(err) = engine.store.append_event(envelope).await {
        warn!(job_id = %job_id, error = %err, "failed to persist job event");
    }
}

/// Emit `job.finished` at most once per job, guarded by `finishedEmitted`.
pub(crate) async fn finish_job_once(engine: &Engine, job_id: &JobId) {
    let should_emit = {
        let mut jobs = engine.state.jobs.lock().await;
        match jobs.jobs.get_mut(job_id) {
            Some(job) if !job.finished_emitted => {
                job.finished_emitted = true;
                true
            }
            _ => false,
        }
    };
    if should_emit {
        let (payload, thread_id, state) = {
            let jobs = engine.state.jobs.lock().await;
            let job = jobs.jobs.get(job_id);
            let error = job.and_then(|j| j.error.clone());
            let thread_id = job.map(|j| j.thread_id.clone()).unwrap_or_else(ThreadId::new);
            let state = job.map(|j| j.state).unwrap_or(JobState::Done);
            (serde_json::json!({ "error": error }), thread_id, state)
        };
        append_event(engine, job_id, cw_core::EventType::JobFinished, payload).await;
        engine.notify_push(thread_id, job_id.clone(), crate::push::PushReason::JobFinished, "Job finished", format!("Job reached state {}", state.as_str())).await;
    }
}

pub(crate) async fn invalidate_cached_projection(engine: &Engine, thread_id: &ThreadId) {
    let mut cache = engine.state.projection_cache.lock().await;
    cache.remove(thread_id);
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
