mod mcp;
mod query;
mod system;
mod token;


use axum::Json;
use axum::http::StatusCode;
use serde::Serialize;
use utoipa::ToSchema;

pub use mcp::*;
pub use query::*;
pub use system::*;
pub use token::*;

/// Error response DTO for the plain HTTP endpoints
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    #[schema(example = "userId is required")]
    pub error: String,
}

pub(crate) fn error_response(
    status: StatusCode,
    message: impl Into<String>,
) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}
