// SPDX-License-Identifier: MIT

//! Wire shapes for the upstream agent's newline-delimited JSON-RPC 2.0
//! dialect, and the shape-classification algorithm the read loop applies
//! to every stdout line.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RpcError;

pub const JSONRPC_VERSION: &str = "2.0";

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcErrorObject {
    /// Standard JSON-RPC 2.0 "method not found" error.
    pub fn method_not_found(method: &str) -> Self {
        Self { code: -32601, message: format!("method not found: {method}"), data: None }
    }

    /// Server error used when a server request cannot be correlated to a
    /// job.
    pub fn server_error(message: impl Into<String>) -> Self {
        Self { code: -32000, message: message.into(), data: None }
    }
}

/// A response to a request the Worker sent upstream: `(id, no method)`.
#[derive(Debug, Clone)]
pub struct ResponseMessage {
    pub id: Value,
    pub result: Option<Value>,
    pub error: Option<JsonRpcErrorObject>,
}

/// A request the upstream agent initiated: `(id, method)`.
#[derive(Debug, Clone)]
pub struct ServerRequestMessage {
    pub id: Value,
    pub method: String,
    pub params: Option<Value>,
}

/// A one-way message from the upstream agent: `(no id, method)`.
#[derive(Debug, Clone)]
pub struct NotificationMessage {
    pub method: String,
    pub params: Option<Value>,
}

/// The outcome of classifying one line of the agent's stdout stream.
#[derive(Debug, Clone)]
pub enum IncomingMessage {
    Response(ResponseMessage),
    ServerRequest(ServerRequestMessage),
    Notification(NotificationMessage),
}

/// A message the Worker writes to the agent's stdin.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum OutgoingMessage {
    Request { jsonrpc: &'static str, id: Value, method: String, #[serde(skip_serializing_if = "Option::is_none")] params: Option<Value> },
    Notification { jsonrpc: &'static str, method: String, #[serde(skip_serializing_if = "Option::is_none")] params: Option<Value> },
    Response { jsonrpc: &'static str, id: Value, #[serde(skip_serializing_if = "Option::is_none")] result: Option<Value>, #[serde(skip_serializing_if = "Option::is_none")] error: Option<JsonRpcErrorObject> },
}

impl OutgoingMessage {
    pub fn request(id: Value, method: impl Into<String>, params: Option<Value>) -> Self {
        Self::Request { jsonrpc: JSONRPC_VERSION, id, method: method.into(), params }
    }

    pub fn notification(method: impl Into<String>, params: Option<Value>) -> Self {
        Self::Notification { jsonrpc: JSONRPC_VERSION, method: method.into(), params }
    }

    pub fn response(id: Value, result: Value) -> Self {
        Self::Response { jsonrpc: JSONRPC_VERSION, id, result: Some(result), error: None }
    }

    pub fn error_response(id: Value, error: JsonRpcErrorObject) -> Self {
        Self::Response { jsonrpc: JSONRPC_VERSION, id, result: None, error: Some(error) }
    }

    /// Serialize to a single newline-free wire line (stdin framing appends
    /// the newline itself; see `cw_rpc::process`).
    pub fn to_line(&self) -> Result<String, RpcError> {
        serde_json::to_string(self).map_err(RpcError::from)
    }
}

/// Classify one stdout line by JSON-RPC 2.0 shape:
/// `(id, no method) -> response`, `(id, method) -> server request`,
/// `(no id, method) -> notification`, else a protocol error.
pub fn classify_line(line: &str) -> Result<IncomingMessage, RpcError> {
    let value: Value = serde_json::from_str(line).map_err(|e| RpcError::Malformed(e.to_string()))?;
    let obj = value.as_object().ok_or_else(|| RpcError::Malformed("top-level JSON value is not an object".into()))?;

    let id = obj.get("id").cloned();
    let method = obj.get("method").and_then(Value::as_str).map(str::to_owned);

    match (id, method) {
        (Some(id), None) => {
            let result = obj.get("result").cloned();
            let error = obj
                .get("error")
                .map(|e| serde_json::from_value(e.clone()))
                .transpose()
                .map_err(|e: serde_json::Error| RpcError::Malformed(e.to_string()))?;
            if result.is_none() && error.is_none() {
                return Err(RpcError::Malformed("response has neither result nor error".into()));
            }
            Ok(IncomingMessage::Response(ResponseMessage { id, result, error }))
        }
        (Some(id), Some(method)) => {
            let params = obj.get("params").cloned();
            Ok(IncomingMessage::ServerRequest(ServerRequestMessage { id, method, params }))
        }
        (None, Some(method)) => {
            let params = obj.get("params").cloned();
            Ok(IncomingMessage::Notification(NotificationMessage { method, params }))
        }
        (None, None) => Err(RpcError::Malformed("message has neither id nor method".into())),
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
