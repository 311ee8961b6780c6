//! Environment-driven settings.
//!
//! Every value has a default except the signing secret. CLI flags are applied
//! on top by the binary, so the precedence is CLI flag > env var > default.

use std::env;
use std::str::FromStr;

use miette::Diagnostic;
use thiserror::Error;

/// Shortest accepted HMAC secret, in bytes.
pub const MIN_SECRET_BYTES: usize = 32;

#[derive(Error, Diagnostic, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Environment variable {var} is not set")]
    #[diagnostic(
        code(mcp_workshop::config::missing),
        help("Export the variable or pass the matching command line flag")
    )]
    Missing { var: &'static str },

    #[error("Invalid value '{value}' for {var}: {reason}")]
    #[diagnostic(code(mcp_workshop::config::invalid))]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("Signing secret must be at least 32 bytes")]
    #[diagnostic(code(mcp_workshop::config::weak_secret))]
    WeakSecret,
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Read `var`, falling back to `default` when unset.
fn env_or<T>(var: &'static str, default: T) -> ConfigResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(raw) => raw.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
            var,
            value: raw,
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

/// Longest accepted window, lifetime or TTL: one year.
pub const MAX_MINUTES: i64 = 60 * 24 * 365;

/// Check a minute count used for a token lifetime, rate window or cache TTL.
/// `var` names the env var or flag the value came from.
pub fn minutes(var: &'static str, value: i64) -> ConfigResult<i64> {
    if (1..=MAX_MINUTES).contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::Invalid {
            var,
            value: value.to_string(),
            reason: format!("must be between 1 and {MAX_MINUTES} minutes"),
        })
    }
}

// =============================================================================
// Token signing
// =============================================================================

/// Signing and validation parameters for bearer tokens.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthSettings {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub token_lifetime_minutes: i64,
}

impl AuthSettings {
    pub const DEFAULT_ISSUER: &'static str = "mcp-workshop-secure";
    pub const DEFAULT_AUDIENCE: &'static str = "mcp-workshop-clients";
    pub const DEFAULT_LIFETIME_MINUTES: i64 = 60;

    /// Settings with the given secret and default issuer, audience and lifetime.
    pub fn new(secret: impl Into<String>) -> ConfigResult<Self> {
        let secret = secret.into();
        if secret.len() < MIN_SECRET_BYTES {
            return Err(ConfigError::WeakSecret);
        }
        Ok(Self {
            secret,
            issuer: Self::DEFAULT_ISSUER.to_string(),
            audience: Self::DEFAULT_AUDIENCE.to_string(),
            token_lifetime_minutes: Self::DEFAULT_LIFETIME_MINUTES,
        })
    }

    /// - `MCPW_JWT_SECRET` (required)
    /// - `MCPW_JWT_ISSUER`, `MCPW_JWT_AUDIENCE`, `MCPW_TOKEN_MINUTES` (optional)
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_env_with_secret(None)
    }

    /// Like [`AuthSettings::from_env`], with an explicit secret taking
    /// precedence over `MCPW_JWT_SECRET`.
    pub fn from_env_with_secret(secret: Option<String>) -> ConfigResult<Self> {
        let secret = match secret {
            Some(secret) => secret,
            None => env::var("MCPW_JWT_SECRET").map_err(|_| ConfigError::Missing {
                var: "MCPW_JWT_SECRET",
            })?,
        };
        let mut settings = Self::new(secret)?;
        settings.issuer = env_or("MCPW_JWT_ISSUER", settings.issuer)?;
        settings.audience = env_or("MCPW_JWT_AUDIENCE", settings.audience)?;
        settings.token_lifetime_minutes = minutes(
            "MCPW_TOKEN_MINUTES",
            env_or("MCPW_TOKEN_MINUTES", Self::DEFAULT_LIFETIME_MINUTES)?,
        )?;
        Ok(settings)
    }
}

// =============================================================================
// Rate limiting
// =============================================================================

/// Fixed-window sizes and per-class request limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitSettings {
    pub window_minutes: i64,
    pub resources_limit: u32,
    pub tools_limit: u32,
    pub unauthenticated_limit: u32,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            window_minutes: 1,
            resources_limit: 1000,
            tools_limit: 500,
            unauthenticated_limit: 100,
        }
    }
}

impl RateLimitSettings {
    pub fn from_env() -> ConfigResult<Self> {
        let defaults = Self::default();
        Ok(Self {
            window_minutes: minutes(
                "MCPW_RATE_WINDOW_MINUTES",
                env_or("MCPW_RATE_WINDOW_MINUTES", defaults.window_minutes)?,
            )?,
            resources_limit: env_or("MCPW_RATE_RESOURCES", defaults.resources_limit)?,
            tools_limit: env_or("MCPW_RATE_TOOLS", defaults.tools_limit)?,
            unauthenticated_limit: env_or(
                "MCPW_RATE_UNAUTHENTICATED",
                defaults.unauthenticated_limit,
            )?,
        })
    }
}

// =============================================================================
// Orchestrator
// =============================================================================

/// Backend locations, per-call timeout and result cache TTL.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalystSettings {
    pub cache_ttl_minutes: i64,
    pub backend_timeout_secs: u64,
    pub sql_url: String,
    pub analytics_url: String,
    pub rest_url: String,
}

impl Default for AnalystSettings {
    fn default() -> Self {
        Self {
            cache_ttl_minutes: 5,
            backend_timeout_secs: 5,
            sql_url: "http://localhost:5010".into(),
            analytics_url: "http://localhost:5011".into(),
            rest_url: "http://localhost:5012".into(),
        }
    }
}

impl AnalystSettings {
    pub fn from_env() -> ConfigResult<Self> {
        let defaults = Self::default();
        Ok(Self {
            cache_ttl_minutes: minutes(
                "MCPW_CACHE_TTL_MINUTES",
                env_or("MCPW_CACHE_TTL_MINUTES", defaults.cache_ttl_minutes)?,
            )?,
            backend_timeout_secs: env_or("MCPW_BACKEND_TIMEOUT_SECS", defaults.backend_timeout_secs)?,
            sql_url: env_or("MCPW_SQL_URL", defaults.sql_url)?,
            analytics_url: env_or("MCPW_ANALYTICS_URL", defaults.analytics_url)?,
            rest_url: env_or("MCPW_REST_URL", defaults.rest_url)?,
        })
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
