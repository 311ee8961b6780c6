use serde::Serialize;

use super::OutputFormat;
use crate::api::TokenResponse;
use crate::cli::api_client::ApiClient;
use crate::cli::error::CliResult;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueTokenRequest<'a> {
    pub user_id: &'a str,
    pub scopes: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<&'a str>,
}

/// Request a token; text output is the bare token for use in scripts.
pub async fn issue_token(
    api_client: &ApiClient,
    request: &IssueTokenRequest<'_>,
    format: OutputFormat,
) -> CliResult<String> {
    let response = api_client.post("/auth/token").json(request).send().await?;
    let token: TokenResponse = ApiClient::handle_response(response).await?;

    match format {
        OutputFormat::Text => Ok(token.token),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&token)?),
    }
}
