pub mod analyst;
pub mod query;
pub mod serve;
pub mod token;

/// Output format shared by the client commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = crate::cli::error::CliError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(crate::cli::error::CliError::UnknownFormat(other.to_string())),
        }
    }
}
