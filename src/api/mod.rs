mod gate;
mod handlers;
mod routes;
mod state;

use std::net::{IpAddr, Ipv4Addr};

use axum::Router;
use miette::Diagnostic;
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use gate::{
    AuditRecord, Authenticate, Authorize, GateContext, Interceptor, OVERHEAD_BUDGET, Pipeline,
    REDACTED, RateLimit, X_RATELIMIT_LIMIT, X_RATELIMIT_REMAINING, X_RATELIMIT_RESET,
    X_REQUEST_ID, bearer_token, is_bypassed, redact_body,
};
pub use handlers::{
    ErrorResponse, HealthResponse, QueryRequest, QueryResponse, TokenRequest, TokenResponse,
};
pub use routes::{AnalystApiDoc, ApiDoc, create_analyst_router, create_router};
pub use state::{AnalystState, AppState};

use crate::analyst::{BackendError, Orchestrator};
use crate::auth::{RateLimiter, TokenIssuer};
use crate::catalog::StoreCatalog;
use crate::clock::system_clock;
use crate::config::{AnalystSettings, AuthSettings, RateLimitSettings};

pub const DEFAULT_SECURE_PORT: u16 = 5003;
pub const DEFAULT_ANALYST_PORT: u16 = 5004;

#[derive(Error, Diagnostic, Debug)]
pub enum ApiError {
    #[error("Failed to bind {addr}")]
    #[diagnostic(
        code(mcp_workshop::api::bind),
        help("Is another server already listening on that port? Try --port.")
    )]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    #[diagnostic(code(mcp_workshop::api::serve))]
    Serve(#[source] std::io::Error),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Backend(#[from] BackendError),
}

/// Server bind configuration
#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// Host address to bind to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_SECURE_PORT,
        }
    }
}

/// Initialize tracing subscriber with env filter
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mcp_workshop=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Run the secure server: gated `/mcp` over the in-memory catalog.
pub async fn run_secure(
    config: Config,
    auth: AuthSettings,
    limits: RateLimitSettings,
) -> Result<(), ApiError> {
    init_tracing();

    let clock = system_clock();
    let state = AppState::new(
        StoreCatalog::sample(),
        TokenIssuer::new(&auth, clock.clone()),
        RateLimiter::new(limits, clock),
    );

    serve(create_router(state), config, "secure server").await
}

/// Run the analyst server: `/query` over the configured backends.
pub async fn run_analyst(config: Config, settings: AnalystSettings) -> Result<(), ApiError> {
    init_tracing();

    let orchestrator = Orchestrator::from_settings(&settings, system_clock())?;
    info!(
        sql = %settings.sql_url,
        analytics = %settings.analytics_url,
        rest = %settings.rest_url,
        "backends configured"
    );

    serve(create_analyst_router(AnalystState::new(orchestrator)), config, "analyst").await
}

async fn serve(router: Router, config: Config, name: &str) -> Result<(), ApiError> {
    let app = router.layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|source| ApiError::Bind {
            addr: addr.clone(),
            source,
        })?;
    info!("{} listening on http://{}", name, addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(ApiError::Serve)?;

    info!("{} stopped", name);
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(e) => {
            warn!("failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
