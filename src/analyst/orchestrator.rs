use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration as StdDuration, Instant};

use chrono::Duration;
use futures_util::future::try_join;
use miette::Diagnostic;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::backend::{Backend, BackendClient, BackendError};
use super::cache::{ResultCache, cache_key};
use super::intent::{BackendName, Intent, ParsedIntent};
use crate::clock::SharedClock;
use crate::config::AnalystSettings;
use crate::rpc::ToolResult;

const DEFAULT_COUNTRY: &str = "España";
const DEFAULT_HOURS: i64 = 24;
const DEFAULT_PERIOD: &str = "week";
const SUMMARY_TOP_LIMIT: u32 = 5;
const TOP_PRODUCTS_LIMIT: u32 = 10;
/// Prefix marking an answer served from the cache.
pub const CACHE_MARKER: &str = "[CACHED] ";

#[derive(Error, Diagnostic, Debug)]
pub enum OrchestrationError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Backend(#[from] BackendError),

    #[error("no backend configured for {0}")]
    #[diagnostic(code(mcp_workshop::analyst::unknown_backend))]
    UnknownBackend(BackendName),

    #[error("invalid value for {name}: {value}")]
    #[diagnostic(code(mcp_workshop::analyst::invalid_parameter))]
    InvalidParameter { name: String, value: String },
}

/// Outcome of one processed query.
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    /// Identical for a fresh answer and every cached copy of it.
    pub text: String,
    /// Backends actually called, in call order. Empty on a cache hit.
    pub backends_used: Vec<BackendName>,
    pub from_cache: bool,
    pub elapsed: StdDuration,
}

impl Answer {
    /// Text for display, with the cache marker on cached answers.
    pub fn display(&self) -> String {
        if self.from_cache {
            format!("{CACHE_MARKER}{}", self.text)
        } else {
            self.text.clone()
        }
    }
}

/// Routes classified queries to backends and caches the formatted answers.
pub struct Orchestrator {
    backends: HashMap<BackendName, Arc<dyn Backend>>,
    cache: ResultCache,
}

impl Orchestrator {
    pub fn new(cache: ResultCache) -> Self {
        Self {
            backends: HashMap::new(),
            cache,
        }
    }

    pub fn with_backend(mut self, name: BackendName, backend: Arc<dyn Backend>) -> Self {
        self.backends.insert(name, backend);
        self
    }

    /// Orchestrator wired to the three HTTP backends named in `settings`.
    pub fn from_settings(settings: &AnalystSettings, clock: SharedClock) -> Result<Self, BackendError> {
        let timeout = StdDuration::from_secs(settings.backend_timeout_secs);
        let cache = ResultCache::new(Duration::minutes(settings.cache_ttl_minutes), clock);

        let mut orchestrator = Self::new(cache);
        for (name, url) in [
            (BackendName::Sql, &settings.sql_url),
            (BackendName::Analytics, &settings.analytics_url),
            (BackendName::Rest, &settings.rest_url),
        ] {
            let client = BackendClient::new(name.as_str(), url, timeout)?;
            orchestrator = orchestrator.with_backend(name, Arc::new(client));
        }
        Ok(orchestrator)
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    pub async fn process(&self, parsed: &ParsedIntent) -> Answer {
        let started = Instant::now();
        let key = cache_key(parsed.intent, &parsed.parameters);

        if let Some(text) = self.cache.get(&key) {
            debug!(intent = %parsed.intent, key = %key, "cache hit");
            return Answer {
                text,
                backends_used: Vec::new(),
                from_cache: true,
                elapsed: started.elapsed(),
            };
        }

        let mut used = Vec::new();
        let text = match self.dispatch(parsed, &mut used).await {
            Ok(text) => {
                self.cache.insert(key, text.clone());
                text
            }
            Err(e) => {
                warn!(intent = %parsed.intent, error = %e, "query failed");
                format!("Error processing query: {e}")
            }
        };

        let elapsed = started.elapsed();
        info!(
            intent = %parsed.intent,
            backends = ?used,
            duration_ms = elapsed.as_millis() as u64,
            "query processed"
        );

        Answer {
            text,
            backends_used: used,
            from_cache: false,
            elapsed,
        }
    }

    async fn dispatch(
        &self,
        parsed: &ParsedIntent,
        used: &mut Vec<BackendName>,
    ) -> Result<String, OrchestrationError> {
        match parsed.intent {
            Intent::NewCustomers => {
                let mut args = json!({
                    "country": parsed.param("country").unwrap_or(DEFAULT_COUNTRY),
                });
                if let Some(city) = parsed.param("city") {
                    args["city"] = json!(city);
                }
                let result = self
                    .call(BackendName::Sql, "query_customers_by_country", args, used)
                    .await?;
                Ok(tool_text(&result))
            }
            Intent::AbandonedCarts => {
                let hours = match parsed.param("hours") {
                    Some(raw) => parse_number("hours", raw)?,
                    None => DEFAULT_HOURS,
                };
                let result = self
                    .call(
                        BackendName::Analytics,
                        "get_abandoned_carts",
                        json!({ "hours": hours }),
                        used,
                    )
                    .await?;
                Ok(tool_text(&result))
            }
            Intent::OrderStatus => {
                let Some(raw) = parsed.param("orderId") else {
                    return Ok(
                        "An order id is required. Example: \"What is the status of order 1001?\""
                            .to_string(),
                    );
                };
                let order_id = parse_number("orderId", raw)?;

                match self
                    .call(
                        BackendName::Rest,
                        "get_shipping_status",
                        json!({ "orderId": order_id }),
                        used,
                    )
                    .await
                {
                    Ok(result) => Ok(format!("ORDER #{order_id} STATUS\n\n{}", tool_text(&result))),
                    Err(e) => {
                        warn!(order_id, error = %e, "shipping status lookup failed");
                        Ok(format!("No information found for order #{order_id}"))
                    }
                }
            }
            Intent::SalesSummary => {
                let period = parsed.param("period");
                let sales_args = match period {
                    Some(period) => json!({ "period": period }),
                    None => json!({}),
                };
                let top_args = json!({
                    "limit": SUMMARY_TOP_LIMIT,
                    "period": period.unwrap_or(DEFAULT_PERIOD),
                });
                let sql = self.backend(BackendName::Sql)?;
                let rest = self.backend(BackendName::Rest)?;
                used.extend([BackendName::Sql, BackendName::Rest]);

                let (sales, top) = try_join(
                    sql.call_tool("get_sales_summary", sales_args),
                    rest.call_tool("get_top_products", top_args),
                )
                .await?;

                Ok(format!("{}\n\n{}", tool_text(&sales), tool_text(&top)))
            }
            Intent::TopProducts => {
                let period = parsed.param("period").unwrap_or(DEFAULT_PERIOD);
                let result = self
                    .call(
                        BackendName::Rest,
                        "get_top_products",
                        json!({ "limit": TOP_PRODUCTS_LIMIT, "period": period }),
                        used,
                    )
                    .await?;
                Ok(tool_text(&result))
            }
            Intent::Unknown => Ok(format!(
                "Could not process the query. Detected intent: {}",
                parsed.intent
            )),
        }
    }

    async fn call(
        &self,
        name: BackendName,
        tool: &str,
        arguments: Value,
        used: &mut Vec<BackendName>,
    ) -> Result<Value, OrchestrationError> {
        let backend = self.backend(name)?;
        used.push(name);
        Ok(backend.call_tool(tool, arguments).await?)
    }

    fn backend(&self, name: BackendName) -> Result<&Arc<dyn Backend>, OrchestrationError> {
        self.backends
            .get(&name)
            .ok_or(OrchestrationError::UnknownBackend(name))
    }
}

fn parse_number(name: &str, raw: &str) -> Result<i64, OrchestrationError> {
    raw.parse().map_err(|_| OrchestrationError::InvalidParameter {
        name: name.to_string(),
        value: raw.to_string(),
    })
}

/// Text of the first content block of a tool result.
fn tool_text(result: &Value) -> String {
    serde_json::from_value::<ToolResult>(result.clone())
        .ok()
        .and_then(|r| r.first_text().map(str::to_string))
        .unwrap_or_else(|| "No results".to_string())
}
