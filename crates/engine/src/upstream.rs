// SPDX-License-Identifier: MIT

//! Thin, typed-by-method wrapper over `cw_rpc::RpcBridge` for the
//! upstream agent's JSON-RPC dialect. Payload shapes are left as
//! `serde_json::Value` — the agent's schema is not part of this crate's
//! contract.

use cw_rpc::RpcBridge;
use serde_json::Value;

use crate::error::EngineError;

/// Methods the Worker invokes on the agent, and the one notification it
/// sends during the handshake.
#[derive(Clone)]
pub struct UpstreamClient {
    bridge: RpcBridge,
}

impl UpstreamClient {
    pub fn new(bridge: RpcBridge) -> Self {
        Self { bridge }
    }

    pub fn bridge(&self) -> &RpcBridge {
        &self.bridge
    }

    pub async fn initialize(&self, params: Value) -> Result<Value, EngineError> {
        Ok(self.bridge.request("initialize", Some(params)).await?)
    }

    pub async fn initialized(&self, params: Value) -> Result<(), EngineError> {
        self.bridge.notify("initialized", Some(params)).await?;
        Ok(())
    }

    pub async fn thread_start(&self, params: Value) -> Result<Value, EngineError> {
        Ok(self.bridge.request("thread/start", Some(params)).await?)
    }

    pub async fn thread_list(&self, params: Value) -> Result<Value, EngineError> {
        Ok(self.bridge.request("thread/list", Some(params)).await?)
    }

    pub async fn thread_resume(&self, params: Value) -> Result<Value, EngineError> {
        Ok(self.bridge.request("thread/resume", Some(params)).await?)
    }

    pub async fn thread_name_set(&self, params: Value) -> Result<Value, EngineError> {
        Ok(self.bridge.request("thread/name/set", Some(params)).await?)
    }

    pub async fn thread_read(&self, params: Value) -> Result<Value, EngineError> {
        Ok(self.bridge.request("thread/read", Some(params)).await?)
    }

    pub async fn turn_start(&self, params: Value) -> Result<Value, EngineError> {
        Ok(self.bridge.request("turn/start", Some(params)).await?)
    }

    pub async fn turn_interrupt(&self, params: Value) -> Result<Value, EngineError> {
        Ok(self.bridge.request("turn/interrupt", Some(params)).await?)
    }
}
