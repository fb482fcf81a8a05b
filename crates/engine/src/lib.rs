// SPDX-License-Identifier: MIT

//! The job/approval state machine: correlates the agent's JSON-RPC
//! traffic to client-facing jobs and approvals, maintains each job's
//! event log, and projects a thread's full history on demand.

pub mod approval;
pub mod dispatch;
pub mod error;
pub mod event_log;
pub mod job;
pub mod projection;
pub mod push;
pub mod state;
pub mod thread_events;
pub mod upstream;

use std::sync::Arc;

pub use error::EngineError;
pub use event_log::DEFAULT_RETENTION;
pub use push::{NoopPushSink, PushNotification, PushReason, PushSink};
pub use state::EngineState;
pub use upstream::UpstreamClient;

/// An allow-listed project a thread may be created under. Loaded by the
/// caller (the Worker's configuration layer) — config loading is not this
/// crate's concern, only the allow-list check against it is.
#[derive(Debug, Clone)]
pub struct ProjectDescriptor {
    pub id: String,
    pub path: String,
}

/// The engine's composed context: shared state, the cache store, and the
/// upstream client, bundled into one `Arc`-wrapped struct for its handler
/// functions.
pub struct Engine {
    pub state: EngineState,
    pub store: cw_store::Store,
    pub upstream: UpstreamClient,
    pub allowed_projects: Vec<ProjectDescriptor>,
    pub event_retention: usize,
    pub push_sink: Arc<dyn PushSink>,
}

impl Engine {
    pub fn new(store: cw_store::Store, upstream: UpstreamClient, allowed_projects: Vec<ProjectDescriptor>) -> Self {
        Self { state: EngineState::new(), store, upstream, allowed_projects, event_retention: DEFAULT_RETENTION, push_sink: Arc::new(NoopPushSink) }
    }

    pub fn with_push_sink(mut self, sink: Arc<dyn PushSink>) -> Self {
        self.push_sink = sink;
        self
    }

    /// Fan a notification out to every device on file. Device lookups and
    /// delivery failures never fail the caller: push is best-effort.
    pub async fn notify_push(&self, thread_id: cw_core::ThreadId, job_id: cw_core::JobId, reason: PushReason, title: impl Into<String>, body: impl Into<String>) {
        let devices = match self.store.list_push_devices().await {
            Ok(devices) => devices,
            Err(err) => {
                tracing::warn!(error = %err, "failed to load push devices");
                return;
            }
        };
        if devices.is_empty() {
            return;
        }
        let notification = PushNotification { thread_id, job_id, reason, title: title.into(), body: body.into() };
        for device in &devices {
            self.push_sink.deliver(device, &notification);
        }
    }
}
