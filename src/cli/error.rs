use miette::Diagnostic;
use thiserror::Error;

use crate::api::ApiError;
use crate::config::ConfigError;

#[derive(Error, Diagnostic, Debug)]
pub enum CliError {
    #[error("Failed to connect to server")]
    #[diagnostic(
        code(mcp_workshop::cli::connection_failed),
        help(
            "Is the server running? Try: mcpw serve (or mcpw analyst)\nOr pass --api-url to point to the correct server."
        )
    )]
    ConnectionFailed {
        #[source]
        source: reqwest::Error,
    },

    #[error("Invalid response from server: {message}")]
    #[diagnostic(
        code(mcp_workshop::cli::invalid_response),
        help(
            "The server returned data in an unexpected format. This might indicate a version mismatch."
        )
    )]
    InvalidResponse { message: String },

    #[error("Server error ({status}): {message}")]
    #[diagnostic(code(mcp_workshop::cli::api_error))]
    ApiError { status: u16, message: String },

    #[error("Unknown output format: {0}")]
    #[diagnostic(code(mcp_workshop::cli::format), help("Use --format text or --format json"))]
    UnknownFormat(String),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Server(#[from] ApiError),
}

impl From<reqwest::Error> for CliError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() || e.is_timeout() {
            CliError::ConnectionFailed { source: e }
        } else {
            CliError::InvalidResponse {
                message: e.to_string(),
            }
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::InvalidResponse {
            message: e.to_string(),
        }
    }
}

pub type CliResult<T> = Result<T, CliError>;
