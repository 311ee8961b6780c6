//! Token issuance.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;

use super::{ErrorResponse, error_response};
use crate::api::AppState;
use crate::auth::DEFAULT_TIER;
use crate::rpc::RpcHandler;

/// Token request DTO
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenRequest {
    /// Subject the token is issued to
    #[schema(example = "user-001")]
    pub user_id: Option<String>,
    /// Granted scopes: read, write, admin
    #[serde(default)]
    #[schema(example = json!(["read", "write"]))]
    pub scopes: Vec<String>,
    /// Rate tier, `basic` when omitted
    #[schema(example = "standard")]
    pub tier: Option<String>,
}

/// Token response DTO
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub token: String,
    /// Lifetime in seconds
    #[schema(example = 3600)]
    pub expires_in: i64,
}

/// Issue a bearer token
#[utoipa::path(
    post,
    path = "/auth/token",
    tag = "auth",
    request_body = TokenRequest,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 400, description = "userId missing", body = ErrorResponse),
        (status = 500, description = "Signing failed", body = ErrorResponse)
    )
)]
#[instrument(skip(state, req))]
pub async fn issue_token<H: RpcHandler>(
    State(state): State<AppState<H>>,
    Json(req): Json<TokenRequest>,
) -> Result<Json<TokenResponse>, (StatusCode, Json<ErrorResponse>)> {
    let user_id = req
        .user_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| error_response(StatusCode::BAD_REQUEST, "userId is required"))?;
    let tier = req.tier.unwrap_or_else(|| DEFAULT_TIER.to_string());

    let issued = state
        .issuer()
        .issue(&user_id, &req.scopes, &tier)
        .map_err(|e| error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    info!(subject = %user_id, scopes = ?req.scopes, tier = %tier, "token issued");

    Ok(Json(TokenResponse {
        token: issued.token,
        expires_in: issued.expires_in,
    }))
}
