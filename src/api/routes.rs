//! API route configuration.

use axum::Router;
use axum::middleware;
use axum::routing::{get, post};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use super::gate;
use super::handlers::{
    self, ErrorResponse, HealthResponse, QueryRequest, QueryResponse, TokenRequest, TokenResponse,
};
use super::state::{AnalystState, AppState};
use crate::analyst::{BackendName, Intent};
use crate::rpc::RpcHandler;

/// OpenAPI documentation of the secure server
#[derive(OpenApi)]
#[openapi(
    info(
        title = "MCP Workshop Secure Server",
        description = "Gated JSON-RPC endpoint with bearer-token issuance",
        license(name = "GPL-2.0")
    ),
    paths(handlers::health, handlers::issue_token, handlers::mcp),
    components(schemas(HealthResponse, TokenRequest, TokenResponse, ErrorResponse)),
    tags(
        (name = "system", description = "System health and status endpoints"),
        (name = "auth", description = "Bearer token issuance"),
        (name = "mcp", description = "JSON-RPC 2.0 tool and resource calls")
    )
)]
pub struct ApiDoc;

/// OpenAPI documentation of the analyst server
#[derive(OpenApi)]
#[openapi(
    info(
        title = "MCP Workshop Virtual Analyst",
        description = "Natural-language queries answered from the backend MCP servers",
        license(name = "GPL-2.0")
    ),
    paths(handlers::health, handlers::query),
    components(schemas(
        HealthResponse,
        QueryRequest,
        QueryResponse,
        Intent,
        BackendName,
        ErrorResponse
    )),
    tags(
        (name = "system", description = "System health and status endpoints"),
        (name = "analyst", description = "Query orchestration")
    )
)]
pub struct AnalystApiDoc;

/// Router of the secure server, every route behind the request gate.
pub fn create_router<H: RpcHandler>(state: AppState<H>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/auth/token", post(handlers::issue_token::<H>))
        .route("/mcp", post(handlers::mcp::<H>))
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .layer(middleware::from_fn_with_state(state.clone(), gate::gate::<H>))
        .with_state(state)
}

/// Router of the analyst server.
pub fn create_analyst_router(state: AnalystState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/query", post(handlers::query))
        .merge(Scalar::with_url("/docs", AnalystApiDoc::openapi()))
        .with_state(state)
}
