//! Secure server command - gated JSON-RPC endpoint + token issuance

use std::net::IpAddr;

use miette::Result;

use crate::api::{self, Config};
use crate::config::{self, AuthSettings, RateLimitSettings};

/// Token settings from the environment with command line overrides applied
pub fn auth_settings(jwt_secret: Option<String>, token_minutes: Option<i64>) -> Result<AuthSettings> {
    let mut auth = AuthSettings::from_env_with_secret(jwt_secret)?;
    if let Some(minutes) = token_minutes {
        auth.token_lifetime_minutes = config::minutes("--token-minutes", minutes)?;
    }
    Ok(auth)
}

/// Run the secure server
pub async fn run(
    host: IpAddr,
    port: u16,
    jwt_secret: Option<String>,
    token_minutes: Option<i64>,
) -> Result<()> {
    let auth = auth_settings(jwt_secret, token_minutes)?;
    let limits = RateLimitSettings::from_env()?;

    // Print startup banner BEFORE starting server (before logging is initialized)
    println!();
    println!("🔐 mcpw secure server starting...");
    println!("   MCP:    http://{}:{}/mcp", host, port);
    println!("   Tokens: http://{}:{}/auth/token", host, port);
    println!("   Docs:   http://{}:{}/docs", host, port);
    println!();
    println!(
        "   Limits: {} resources / {} tools / {} anonymous per {} min",
        limits.resources_limit, limits.tools_limit, limits.unauthenticated_limit, limits.window_minutes
    );
    println!();

    api::run_secure(Config { host, port }, auth, limits).await?;
    Ok(())
}
