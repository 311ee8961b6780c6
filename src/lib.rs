//! Secure MCP server and virtual analyst.
//!
//! Two HTTP services share this crate: a JSON-RPC endpoint behind a request
//! gate (bearer tokens, scopes, fixed-window rate limits, audit logging) and
//! an orchestrator that answers free-text questions by calling backend MCP
//! servers.

pub mod analyst;
pub mod api;
pub mod auth;
pub mod catalog;
pub mod cli;
pub mod clock;
pub mod config;
pub mod rpc;

/// Install the ring TLS provider used by reqwest. Safe to call repeatedly.
pub fn install_crypto_provider() {
    // Err only means a provider is already installed.
    let _ = rustls::crypto::ring::default_provider().install_default();
}
