pub mod api_client;
mod commands;
pub mod error;


use std::net::IpAddr;

use clap::{Parser, Subcommand};
use miette::Result;

use crate::api::{DEFAULT_ANALYST_PORT, DEFAULT_SECURE_PORT};
use commands::OutputFormat;
use commands::analyst::BackendUrls;
use commands::token::IssueTokenRequest;

#[derive(Parser)]
#[command(name = "mcpw")]
#[command(author, version, about = "Secure MCP server and virtual analyst", long_about = None)]
pub struct Cli {
    /// Override the server URL for client commands
    /// (default: MCPW_SECURE_URL / MCPW_ANALYST_URL env or localhost)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the secure JSON-RPC server
    Serve {
        /// Host address to bind to
        #[arg(long, default_value = "0.0.0.0")]
        host: IpAddr,
        /// Port to listen on
        #[arg(short, long, default_value_t = DEFAULT_SECURE_PORT)]
        port: u16,
        /// Token signing secret (default: MCPW_JWT_SECRET env)
        #[arg(long)]
        jwt_secret: Option<String>,
        /// Token lifetime in minutes (default: MCPW_TOKEN_MINUTES env or 60)
        #[arg(long)]
        token_minutes: Option<i64>,
    },
    /// Start the virtual analyst server
    Analyst {
        /// Host address to bind to
        #[arg(long, default_value = "0.0.0.0")]
        host: IpAddr,
        /// Port to listen on
        #[arg(short, long, default_value_t = DEFAULT_ANALYST_PORT)]
        port: u16,
        /// SQL backend base URL (default: MCPW_SQL_URL env)
        #[arg(long)]
        sql_url: Option<String>,
        /// Analytics backend base URL (default: MCPW_ANALYTICS_URL env)
        #[arg(long)]
        analytics_url: Option<String>,
        /// REST backend base URL (default: MCPW_REST_URL env)
        #[arg(long)]
        rest_url: Option<String>,
        /// Result cache time-to-live in minutes
        #[arg(long)]
        cache_ttl_minutes: Option<i64>,
    },
    /// Request a bearer token from a running secure server
    Token {
        /// Subject the token is issued to
        user_id: String,
        /// Comma-separated scopes (read, write, admin)
        #[arg(long, value_delimiter = ',', default_value = "read")]
        scopes: Vec<String>,
        /// Rate tier (default: basic)
        #[arg(long)]
        tier: Option<String>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Ask a running analyst server a question
    Query {
        /// Free-text question, Spanish or English
        text: String,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve {
            host,
            port,
            jwt_secret,
            token_minutes,
        }) => commands::serve::run(host, port, jwt_secret, token_minutes).await,
        Some(Commands::Analyst {
            host,
            port,
            sql_url,
            analytics_url,
            rest_url,
            cache_ttl_minutes,
        }) => {
            let urls = BackendUrls {
                sql: sql_url,
                analytics: analytics_url,
                rest: rest_url,
            };
            commands::analyst::run(host, port, urls, cache_ttl_minutes).await
        }
        Some(Commands::Token {
            user_id,
            scopes,
            tier,
            format,
        }) => {
            let format: OutputFormat = format.parse()?;
            let api_client = api_client::ApiClient::secure(cli.api_url);
            let request = IssueTokenRequest {
                user_id: &user_id,
                scopes: &scopes,
                tier: tier.as_deref(),
            };
            let output = commands::token::issue_token(&api_client, &request, format).await?;
            println!("{}", output);
            Ok(())
        }
        Some(Commands::Query { text, format }) => {
            let format: OutputFormat = format.parse()?;
            let api_client = api_client::ApiClient::analyst(cli.api_url);
            let output = commands::query::ask(&api_client, &text, format).await?;
            println!("{}", output);
            Ok(())
        }
        None => {
            // Show help when no command provided
            let _ = Cli::parse_from(["mcpw", "--help"]);
            Ok(())
        }
    }
}
