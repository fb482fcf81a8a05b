// SPDX-License-Identifier: MIT

//! The RPC bridge: spawns and supervises the agent subprocess, multiplexes
//! concurrent requests over its stdio, and fans notifications /
//! server-originated requests / stderr / protocol errors / exit out to
//! subscribers.
//!
//! Correlation uses a request-id-keyed oneshot-callback table, the same
//! shape used by stdio MCP server clients, adapted so the Worker is the
//! one issuing requests instead of answering them.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::{broadcast, mpsc, oneshot, Mutex};
use tokio_util::sync::CancellationToken;

use crate::error::RpcError;
use crate::message::{classify_line, IncomingMessage, JsonRpcErrorObject, NotificationMessage, OutgoingMessage, ServerRequestMessage};
use crate::process::{AgentProcess, Line, SpawnSpec};

/// Upstream requests time out after 120s and resolve locally.
pub const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(120);

/// Events fanned out to bridge subscribers. Multiple subscribers may
/// exist (the dispatcher in `cw-engine` and, e.g., a diagnostics tap);
/// each gets its own broadcast receiver.
#[derive(Debug, Clone)]
pub enum BridgeEvent {
    Notification(Arc<NotificationMessage>),
    ServerRequest(Arc<ServerRequestMessage>),
    /// One line of agent subprocess stderr, unfiltered.
    Stderr(Arc<str>),
    /// A stdout line that failed shape classification. Logged upstream,
    /// never tears down the connection.
    ProtocolError(Arc<str>),
    /// The subprocess exited, with its exit code if one was available.
    Exit(Option<i32>),
}

type PendingTable = Arc<Mutex<HashMap<String, oneshot::Sender<Result<Value, JsonRpcErrorObject>>>>>;

/// A started agent subprocess bridge. Cloning shares the same running
/// subprocess and pending-request table.
#[derive(Clone)]
pub struct RpcBridge {
    write_tx: mpsc::Sender<OutgoingMessage>,
    pending: PendingTable,
    next_id: Arc<AtomicU64>,
    events_tx: broadcast::Sender<BridgeEvent>,
    cancel: CancellationToken,
    timeout: Duration,
}

impl RpcBridge {
    /// `start()`: spawn the subprocess with the given command/args/cwd/env;
    /// attach newline-framed readers to stdout and stderr; begin the read
    /// loop. Requests time out after [`UPSTREAM_TIMEOUT`]; use
    /// [`RpcBridge::start_with_timeout`] to override it.
    pub fn start(spec: SpawnSpec) -> Result<Self, RpcError> {
        Self::start_with_timeout(spec, UPSTREAM_TIMEOUT)
    }

    /// Same as [`RpcBridge::start`], but with a caller-supplied request
    /// timeout (`CW_UPSTREAM_TIMEOUT_MS`).
    pub fn start_with_timeout(spec: SpawnSpec, timeout: Duration) -> Result<Self, RpcError> {
        let (mut proc, mut stdout_rx, mut stderr_rx, exit_rx) = AgentProcess::spawn(&spec)?;

        let (write_tx, mut write_rx) = mpsc::channel::<OutgoingMessage>(256);
        let pending: PendingTable = Arc::new(Mutex::new(HashMap::new()));
        let (events_tx, _) = broadcast::channel(1024);
        let cancel = CancellationToken::new();

        let bridge = Self { write_tx, pending: Arc::clone(&pending), next_id: Arc::new(AtomicU64::new(1)), events_tx: events_tx.clone(), cancel: cancel.clone(), timeout };

        // Forward the one-shot exit notification onto a channel so the
        // main loop below can select over it just like the other queues.
        let (exit_tx, mut exit_signal_rx) = mpsc::channel(1);
        tokio::spawn(async move {
            let status = exit_rx.await;
            let _ = exit_tx.send(status).await;
        });

        let loop_cancel = cancel.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = loop_cancel.cancelled() => {
                        proc.request_stop();
                    }
                    write = write_rx.recv() => {
                        match write {
                            Some(message) => {
                                if let Ok(line) = message.to_line() {
                                    if proc.write_line(&line).await.is_err() {
                                        break;
                                    }
                                }
                            }
                            None => break,
                        }
                    }
                    line = stdout_rx.recv() => {
                        match line {
                            Some(Line(text)) => dispatch_stdout_line(&text, &pending, &events_tx).await,
                            None => break,
                        }
                    }
                    line = stderr_rx.recv() => {
                        if let Some(Line(text)) = line {
                            let _ = events_tx.send(BridgeEvent::Stderr(Arc::from(text.as_str())));
                        }
                    }
                    status = exit_signal_rx.recv() => {
                        let code = status.and_then(|r| r.ok()).and_then(|s| s.code());
                        fail_all_pending(&pending, RpcError::Crashed(format!("agent subprocess exited, code={code:?}"))).await;
                        let _ = events_tx.send(BridgeEvent::Exit(code));
                        break;
                    }
                }
            }
            proc.request_stop();
        });

        Ok(bridge)
    }

    /// `stop()`: terminate the subprocess; fail all pending requests with
    /// a terminal error.
    pub async fn stop(&self) {
        self.cancel.cancel();
        fail_all_pending(&self.pending, RpcError::Stopped).await;
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BridgeEvent> {
        self.events_tx.subscribe()
    }

    /// Issue a request upstream and await its response, timing out after
    /// [`UPSTREAM_TIMEOUT`]. A timeout fails only this call; the upstream
    /// connection and other in-flight requests are unaffected.
    pub async fn request(&self, method: impl Into<String>, params: Option<Value>) -> Result<Value, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let id_value = Value::from(id);
        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id_value_key(&id_value), tx);

        if self.write_tx.send(OutgoingMessage::request(id_value.clone(), method, params)).await.is_err() {
            self.pending.lock().await.remove(&id_value_key(&id_value));
            return Err(RpcError::Stopped);
        }

        match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(Ok(value))) => Ok(value),
            Ok(Ok(Err(jsonrpc_error))) => Err(RpcError::Malformed(jsonrpc_error.message)),
            Ok(Err(_)) => Err(RpcError::Stopped),
            Err(_) => {
                self.pending.lock().await.remove(&id_value_key(&id_value));
                Err(RpcError::Timeout)
            }
        }
    }

    /// Send a one-way notification to the agent subprocess.
    pub async fn notify(&self, method: impl Into<String>, params: Option<Value>) -> Result<(), RpcError> {
        self.write_tx.send(OutgoingMessage::notification(method, params)).await.map_err(|_| RpcError::Stopped)
    }

    /// Reply to a server-originated request with a success result.
    pub async fn respond(&self, id: Value, result: Value) -> Result<(), RpcError> {
        self.write_tx.send(OutgoingMessage::response(id, result)).await.map_err(|_| RpcError::Stopped)
    }

    /// Reply to a server-originated request with a JSON-RPC error.
    pub async fn respond_error(&self, id: Value, error: JsonRpcErrorObject) -> Result<(), RpcError> {
        self.write_tx.send(OutgoingMessage::error_response(id, error)).await.map_err(|_| RpcError::Stopped)
    }
}

fn id_value_key(id: &Value) -> String {
    id.to_string()
}

async fn dispatch_stdout_line(text: &str, pending: &PendingTable, events_tx: &broadcast::Sender<BridgeEvent>) {
    match classify_line(text) {
        Ok(IncomingMessage::Response(response)) => {
            let key = id_value_key(&response.id);
            if let Some(tx) = pending.lock().await.remove(&key) {
                let outcome = match response.error {
                    Some(error) => Err(error),
                    None => Ok(response.result.unwrap_or(Value::Null)),
                };
                let _ = tx.send(outcome);
            } else {
                let _ = events_tx.send(BridgeEvent::ProtocolError(Arc::from(format!("response for unknown request id {key}").as_str())));
            }
        }
        Ok(IncomingMessage::ServerRequest(request)) => {
            let _ = events_tx.send(BridgeEvent::ServerRequest(Arc::new(request)));
        }
        Ok(IncomingMessage::Notification(notification)) => {
            let _ = events_tx.send(BridgeEvent::Notification(Arc::new(notification)));
        }
        Err(err) => {
            let _ = events_tx.send(BridgeEvent::ProtocolError(Arc::from(err.to_string().as_str())));
        }
    }
}

async fn fail_all_pending(pending: &PendingTable, err: RpcError) {
    let mut table = pending.lock().await;
    for (_, tx) in table.drain() {
        let _ = tx.send(Err(JsonRpcErrorObject::server_error(err.to_string())));
    }
}

#[cfg(test)]
#[path = "bridge_tests.rs"]
mod tests;
