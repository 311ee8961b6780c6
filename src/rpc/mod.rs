//! JSON-RPC 2.0 wire layer.
//!
//! Envelopes are decoded once at the transport boundary into typed
//! [`RpcCall`]s; every failure is an [`RpcError`] that knows its JSON-RPC code
//! and the HTTP status it travels with.

mod call;
mod error;
mod handler;
mod request;
mod response;

#[cfg(test)]
mod handler_test;

pub use call::{CallToolParams, ReadResourceParams, RpcCall};
pub use error::{ErrorCode, RpcError};
pub use handler::{PROTOCOL_VERSION, RpcHandler, RpcReply, ServerInfo, dispatch, respond};
#[cfg(test)]
pub use handler::MockRpcHandler;
pub use request::{Envelope, JsonRpcRequest, RpcId};
pub use response::{
    JsonRpcError, JsonRpcResponse, ResourceContent, ResourceContents, ToolResult,
    ToolResultContent,
};
