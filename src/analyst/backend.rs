use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use miette::Diagnostic;
use reqwest::Client;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::debug;

use crate::rpc::{JsonRpcRequest, JsonRpcResponse, ResourceContents, RpcId};

#[derive(Error, Diagnostic, Debug)]
pub enum BackendError {
    #[error("backend {backend} did not answer within {secs}s")]
    #[diagnostic(code(mcp_workshop::backend::timeout))]
    Timeout { backend: String, secs: u64 },

    #[error("backend {backend} unreachable: {message}")]
    #[diagnostic(
        code(mcp_workshop::backend::transport),
        help("Check that the backend server is running and the MCPW_*_URL variables point at it.")
    )]
    Transport { backend: String, message: String },

    #[error("backend {backend} returned HTTP {status}")]
    #[diagnostic(code(mcp_workshop::backend::status))]
    Status { backend: String, status: u16 },

    #[error("backend {backend} error {code}: {message}")]
    #[diagnostic(code(mcp_workshop::backend::rpc))]
    Rpc {
        backend: String,
        code: i32,
        message: String,
    },

    #[error("backend {backend} sent an invalid response: {reason}")]
    #[diagnostic(code(mcp_workshop::backend::invalid_response))]
    InvalidResponse { backend: String, reason: String },

    #[error("failed to build HTTP client: {0}")]
    #[diagnostic(code(mcp_workshop::backend::client))]
    Client(String),
}

/// One backend MCP server as seen by the orchestrator.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Backend: Send + Sync {
    /// `tools/call`; yields the raw `result` object.
    async fn call_tool(&self, name: &str, arguments: Value) -> Result<Value, BackendError>;

    /// `resources/read`; yields the first content item's text decoded as JSON.
    async fn read_resource(&self, uri: &str) -> Result<Value, BackendError>;
}

/// JSON-RPC over HTTP client for a backend's `POST /mcp` endpoint.
pub struct BackendClient {
    name: String,
    endpoint: String,
    timeout: Duration,
    client: Client,
    next_id: AtomicI64,
}

impl BackendClient {
    pub fn new(
        name: impl Into<String>,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Client(e.to_string()))?;

        Ok(Self {
            name: name.into(),
            endpoint: format!("{}/mcp", base_url.trim_end_matches('/')),
            timeout,
            client,
            next_id: AtomicI64::new(1),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn send(&self, method: &str, params: Value) -> Result<Value, BackendError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = JsonRpcRequest::new(method, Some(params), RpcId::Number(id));
        debug!(backend = %self.name, method, id, "calling backend");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(e))?;

        // error responses may still carry a JSON-RPC error object
        let parsed: Result<JsonRpcResponse, _> = serde_json::from_slice(&body);
        match parsed {
            Ok(JsonRpcResponse {
                error: Some(error), ..
            }) => Err(BackendError::Rpc {
                backend: self.name.clone(),
                code: error.code,
                message: error.message,
            }),
            _ if !status.is_success() => Err(BackendError::Status {
                backend: self.name.clone(),
                status: status.as_u16(),
            }),
            Ok(JsonRpcResponse {
                result: Some(result),
                ..
            }) => Ok(result),
            Ok(_) => Err(self.invalid("response has neither result nor error")),
            Err(e) => Err(self.invalid(e.to_string())),
        }
    }

    fn transport_error(&self, e: reqwest::Error) -> BackendError {
        if e.is_timeout() {
            BackendError::Timeout {
                backend: self.name.clone(),
                secs: self.timeout.as_secs(),
            }
        } else {
            BackendError::Transport {
                backend: self.name.clone(),
                message: e.to_string(),
            }
        }
    }

    fn invalid(&self, reason: impl Into<String>) -> BackendError {
        BackendError::InvalidResponse {
            backend: self.name.clone(),
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl Backend for BackendClient {
    async fn call_tool(&self, name: &str, arguments: Value) -> Result<Value, BackendError> {
        self.send("tools/call", json!({ "name": name, "arguments": arguments }))
            .await
    }

    async fn read_resource(&self, uri: &str) -> Result<Value, BackendError> {
        let result = self.send("resources/read", json!({ "uri": uri })).await?;

        let contents: ResourceContents =
            serde_json::from_value(result).map_err(|e| self.invalid(e.to_string()))?;
        let text = contents
            .contents
            .first()
            .and_then(|c| c.text.as_deref())
            .ok_or_else(|| self.invalid("resource has no contents"))?;

        serde_json::from_str(text).map_err(|e| self.invalid(format!("resource text: {e}")))
    }
}
