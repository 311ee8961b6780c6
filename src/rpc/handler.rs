use async_trait::async_trait;
use axum::http::StatusCode;
use serde_json::{Value, json};

use super::call::{CallToolParams, RpcCall};
use super::error::RpcError;
use super::request::{Envelope, JsonRpcRequest};
use super::response::JsonRpcResponse;

/// MCP protocol revision announced by `initialize`.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Name and version reported by `initialize`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

/// Business logic behind a JSON-RPC endpoint.
///
/// The gate never calls this; it only runs once a request has been
/// authenticated, authorized and admitted.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RpcHandler: Send + Sync + 'static {
    fn server_info(&self) -> ServerInfo;

    async fn list_resources(&self) -> Result<Value, RpcError>;

    async fn read_resource(&self, uri: &str) -> Result<Value, RpcError>;

    async fn list_tools(&self) -> Result<Value, RpcError>;

    async fn call_tool(&self, params: CallToolParams) -> Result<Value, RpcError>;
}

/// Route a decoded call to the handler.
pub async fn dispatch<H: RpcHandler + ?Sized>(handler: &H, call: RpcCall) -> Result<Value, RpcError> {
    match call {
        RpcCall::Initialize => {
            let info = handler.server_info();
            Ok(json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": { "resources": {}, "tools": {} },
                "serverInfo": { "name": info.name, "version": info.version },
            }))
        }
        RpcCall::ListResources => handler.list_resources().await,
        RpcCall::ReadResource(params) => handler.read_resource(&params.uri).await,
        RpcCall::ListTools => handler.list_tools().await,
        RpcCall::CallTool(params) => handler.call_tool(params).await,
    }
}

/// A JSON-RPC response paired with the HTTP status it is sent with.
#[derive(Debug, Clone)]
pub struct RpcReply {
    pub status: StatusCode,
    pub body: JsonRpcResponse,
}

impl RpcReply {
    pub fn failure(envelope: &Envelope, error: &RpcError) -> Self {
        Self {
            status: error.http_status(envelope.id.is_some()),
            body: JsonRpcResponse::error(envelope.id.clone(), error.to_json_rpc()),
        }
    }
}

/// Decode a raw request body, run it against the handler and build the reply.
pub async fn respond<H: RpcHandler + ?Sized>(handler: &H, body: &[u8]) -> RpcReply {
    let envelope = Envelope::peek(body);

    let request: JsonRpcRequest = match serde_json::from_slice(body) {
        Ok(request) => request,
        Err(e) if e.is_syntax() || e.is_eof() => {
            return RpcReply::failure(&envelope, &RpcError::Parse);
        }
        Err(e) => {
            return RpcReply::failure(&envelope, &RpcError::InvalidRequest(e.to_string()));
        }
    };

    if request.jsonrpc != "2.0" {
        return RpcReply::failure(
            &envelope,
            &RpcError::InvalidRequest("jsonrpc must be \"2.0\"".into()),
        );
    }

    let outcome = match RpcCall::decode(&request.method, request.params) {
        Ok(call) => dispatch(handler, call).await,
        Err(e) => Err(e),
    };

    match outcome {
        Ok(result) => RpcReply {
            status: StatusCode::OK,
            body: JsonRpcResponse::success(request.id, result),
        },
        Err(e) => RpcReply::failure(&envelope, &e),
    }
}
