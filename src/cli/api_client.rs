use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::env;

use crate::cli::error::{CliError, CliResult};

/// Default location of the secure server
pub const DEFAULT_SECURE_URL: &str = "http://localhost:5003";
/// Default location of the analyst server
pub const DEFAULT_ANALYST_URL: &str = "http://localhost:5004";

/// HTTP client for a running secure or analyst server
pub struct ApiClient {
    base_url: String,
    client: Client,
}

impl ApiClient {
    /// Create a new API client
    ///
    /// Priority for base URL:
    /// 1. Explicit `api_url` parameter
    /// 2. The `env_var` environment variable
    /// 3. `default_url`
    pub fn new(api_url: Option<String>, env_var: &str, default_url: &str) -> Self {
        let base_url = api_url
            .or_else(|| env::var(env_var).ok())
            .unwrap_or_else(|| default_url.to_string());

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    /// Client for the secure server (`MCPW_SECURE_URL`)
    pub fn secure(api_url: Option<String>) -> Self {
        Self::new(api_url, "MCPW_SECURE_URL", DEFAULT_SECURE_URL)
    }

    /// Client for the analyst server (`MCPW_ANALYST_URL`)
    pub fn analyst(api_url: Option<String>) -> Self {
        Self::new(api_url, "MCPW_ANALYST_URL", DEFAULT_ANALYST_URL)
    }

    /// Get the base URL being used
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Create a POST request builder
    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.client.post(&url)
    }

    /// Handle API response with standardized error handling
    ///
    /// Returns the deserialized response body on success,
    /// or a CliError::ApiError on non-success status codes.
    pub async fn handle_response<T: DeserializeOwned>(response: Response) -> CliResult<T> {
        if response.status().is_success() {
            response
                .json()
                .await
                .map_err(|e| CliError::InvalidResponse {
                    message: e.to_string(),
                })
        } else {
            let status = response.status().as_u16();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            Err(CliError::ApiError {
                status,
                message: error_text,
            })
        }
    }
}
