use axum::http::StatusCode;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::json;
use thiserror::Error;

use super::response::JsonRpcError;

/// JSON-RPC error codes used on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ErrorCode {
    ParseError = -32700,
    InvalidRequest = -32600,
    MethodNotFound = -32601,
    InvalidParams = -32602,
    InternalError = -32603,
    Unauthorized = -32001,
    Forbidden = -32002,
    RateLimitExceeded = -32003,
}

impl ErrorCode {
    pub fn code(self) -> i32 {
        self as i32
    }
}

/// Every way a JSON-RPC call can fail, from the gate to the handler.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RpcError {
    #[error("Parse error")]
    Parse,

    #[error("Invalid Request: {0}")]
    InvalidRequest(String),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Invalid params: {message}")]
    InvalidParams {
        message: String,
        detail: Option<String>,
    },

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Unauthorized: Missing or invalid token")]
    Unauthorized,

    #[error("Forbidden: Insufficient permissions. Required scope: {required_scope}")]
    Forbidden { required_scope: String },

    #[error("Rate limit exceeded. Try again in {retry_after} seconds")]
    RateLimited {
        retry_after: u64,
        reset_at: DateTime<Utc>,
    },
}

impl RpcError {
    /// A required parameter is absent.
    pub fn missing_param(name: &str) -> Self {
        Self::InvalidParams {
            message: format!("Missing required parameter: {name}"),
            detail: Some(format!("Missing required parameter: {name}")),
        }
    }

    /// A parameter is present but unusable.
    pub fn invalid_param(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::InvalidParams {
            detail: Some(message.clone()),
            message,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Parse => ErrorCode::ParseError,
            Self::InvalidRequest(_) => ErrorCode::InvalidRequest,
            Self::MethodNotFound(_) => ErrorCode::MethodNotFound,
            Self::InvalidParams { .. } => ErrorCode::InvalidParams,
            Self::Internal(_) => ErrorCode::InternalError,
            Self::Unauthorized => ErrorCode::Unauthorized,
            Self::Forbidden { .. } => ErrorCode::Forbidden,
            Self::RateLimited { .. } => ErrorCode::RateLimitExceeded,
        }
    }

    /// HTTP status for the response carrying this error.
    ///
    /// Method and internal failures ride on `200 OK` when the caller's id is
    /// known, since the JSON-RPC envelope already describes them. Without an
    /// id they surface as `500`.
    pub fn http_status(&self, id_known: bool) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Parse | Self::InvalidRequest(_) | Self::InvalidParams { .. } => {
                StatusCode::BAD_REQUEST
            }
            Self::MethodNotFound(_) | Self::Internal(_) if id_known => StatusCode::OK,
            Self::MethodNotFound(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Wire representation.
    pub fn to_json_rpc(&self) -> JsonRpcError {
        let (message, data) = match self {
            Self::Parse => ("Parse error".to_string(), None),
            Self::InvalidParams { message, detail } => (
                "Invalid params".to_string(),
                Some(json!(detail.clone().unwrap_or_else(|| message.clone()))),
            ),
            Self::Internal(detail) => ("Internal error".to_string(), Some(json!(detail))),
            Self::Forbidden { required_scope } => (
                self.to_string(),
                Some(json!({ "requiredScope": required_scope })),
            ),
            Self::RateLimited { reset_at, .. } => (
                self.to_string(),
                Some(json!({
                    "resetTime": reset_at.to_rfc3339_opts(SecondsFormat::Secs, true)
                })),
            ),
            _ => (self.to_string(), None),
        };

        JsonRpcError {
            code: self.code().code(),
            message,
            data,
        }
    }
}

impl From<serde_json::Error> for RpcError {
    fn from(e: serde_json::Error) -> Self {
        Self::Internal(e.to_string())
    }
}
