//! Secure JSON-RPC endpoint.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use tracing::instrument;

use crate::api::AppState;
use crate::rpc::{self, RpcHandler};

/// MCP JSON-RPC endpoint
///
/// Accepts `initialize`, `resources/list`, `resources/read`, `tools/list`
/// and `tools/call`. Requires a bearer token; `resources/read` needs scope
/// `read` and `tools/call` needs scope `write`.
#[utoipa::path(
    post,
    path = "/mcp",
    tag = "mcp",
    request_body(content = String, description = "JSON-RPC 2.0 request", content_type = "application/json"),
    responses(
        (status = 200, description = "JSON-RPC response"),
        (status = 400, description = "Parse error, invalid request or invalid params"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Insufficient scope"),
        (status = 429, description = "Rate limit exceeded")
    )
)]
#[instrument(skip(state, body))]
pub async fn mcp<H: RpcHandler>(State(state): State<AppState<H>>, body: Bytes) -> Response {
    let reply = rpc::respond(state.handler(), &body).await;
    (reply.status, Json(reply.body)).into_response()
}
