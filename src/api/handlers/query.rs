//! Natural-language query endpoint of the analyst server.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;

use super::{ErrorResponse, error_response};
use crate::analyst::{BackendName, Intent};
use crate::api::AnalystState;

/// Query request DTO
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct QueryRequest {
    /// Free-text question, Spanish or English
    #[schema(example = "¿Cuántos clientes nuevos hay en Madrid?")]
    pub query: String,
}

/// Query response DTO
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    pub query: String,
    pub intent: Intent,
    /// Assembled answer; identical for fresh and cached answers
    pub result: String,
    /// Backends called for this answer, empty when served from cache
    pub servers_used: Vec<BackendName>,
    pub from_cache: bool,
    pub duration_ms: u64,
}

/// Answer a free-text question
#[utoipa::path(
    post,
    path = "/query",
    tag = "analyst",
    request_body = QueryRequest,
    responses(
        (status = 200, description = "Answer assembled", body = QueryResponse),
        (status = 400, description = "Empty query", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn query(
    State(state): State<AnalystState>,
    Json(req): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, (StatusCode, Json<ErrorResponse>)> {
    let text = req.query.trim();
    if text.is_empty() {
        return Err(error_response(StatusCode::BAD_REQUEST, "query is required"));
    }

    let parsed = state.classifier().parse(text);
    info!(intent = %parsed.intent, parameters = ?parsed.parameters, "query classified");

    let answer = state.orchestrator().process(&parsed).await;

    Ok(Json(QueryResponse {
        query: req.query,
        intent: parsed.intent,
        result: answer.text,
        servers_used: answer.backends_used,
        from_cache: answer.from_cache,
        duration_ms: answer.elapsed.as_millis() as u64,
    }))
}
