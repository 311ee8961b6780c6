//! Analyst server command - natural-language queries over the backend servers

use std::net::IpAddr;

use miette::Result;

use crate::api::{self, Config};
use crate::config::{self, AnalystSettings};

/// Backend URL overrides from the command line
#[derive(Debug, Default)]
pub struct BackendUrls {
    pub sql: Option<String>,
    pub analytics: Option<String>,
    pub rest: Option<String>,
}

/// Environment settings with command line overrides applied
pub fn settings(urls: BackendUrls, cache_ttl_minutes: Option<i64>) -> Result<AnalystSettings> {
    let mut settings = AnalystSettings::from_env()?;
    if let Some(url) = urls.sql {
        settings.sql_url = url;
    }
    if let Some(url) = urls.analytics {
        settings.analytics_url = url;
    }
    if let Some(url) = urls.rest {
        settings.rest_url = url;
    }
    if let Some(minutes) = cache_ttl_minutes {
        settings.cache_ttl_minutes = config::minutes("--cache-ttl-minutes", minutes)?;
    }
    Ok(settings)
}

/// Run the analyst server
pub async fn run(
    host: IpAddr,
    port: u16,
    urls: BackendUrls,
    cache_ttl_minutes: Option<i64>,
) -> Result<()> {
    let settings = settings(urls, cache_ttl_minutes)?;

    println!();
    println!("🧠 mcpw virtual analyst starting...");
    println!("   Query:     http://{}:{}/query", host, port);
    println!("   Docs:      http://{}:{}/docs", host, port);
    println!();
    println!("   sql:       {}", settings.sql_url);
    println!("   analytics: {}", settings.analytics_url);
    println!("   rest:      {}", settings.rest_url);
    println!();

    api::run_analyst(Config { host, port }, settings).await?;
    Ok(())
}
