// SPDX-License-Identifier: MIT

//! The RPC Bridge: spawns and supervises the upstream agent subprocess,
//! frames its newline-delimited JSON-RPC 2.0 stdio, and routes responses,
//! server-originated requests, and notifications.

pub mod bridge;
pub mod error;
pub mod message;
pub mod process;

pub use bridge::{BridgeEvent, RpcBridge, UPSTREAM_TIMEOUT};
pub use error::RpcError;
pub use message::{classify_line, IncomingMessage, JsonRpcErrorObject, NotificationMessage, OutgoingMessage, ResponseMessage, ServerRequestMessage};
pub use process::SpawnSpec;
