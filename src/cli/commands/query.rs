use super::OutputFormat;
use crate::analyst::{BackendName, CACHE_MARKER};
use crate::api::{QueryRequest, QueryResponse};
use crate::cli::api_client::ApiClient;
use crate::cli::error::CliResult;

/// Send a question to the analyst and render the answer.
pub async fn ask(api_client: &ApiClient, query: &str, format: OutputFormat) -> CliResult<String> {
    let request = QueryRequest {
        query: query.to_string(),
    };
    let response = api_client.post("/query").json(&request).send().await?;
    let answer: QueryResponse = ApiClient::handle_response(response).await?;

    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&answer)?),
        OutputFormat::Text => Ok(render(&answer)),
    }
}

fn render(answer: &QueryResponse) -> String {
    let marker = if answer.from_cache { CACHE_MARKER } else { "" };
    let servers = if answer.servers_used.is_empty() {
        "-".to_string()
    } else {
        answer
            .servers_used
            .iter()
            .map(|b| BackendName::as_str(*b))
            .collect::<Vec<_>>()
            .join(", ")
    };

    format!(
        "{}{}\n\nintent: {} | servers: {} | {} ms",
        marker, answer.result, answer.intent, servers, answer.duration_ms
    )
}
