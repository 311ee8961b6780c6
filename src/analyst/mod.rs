//! Natural-language query orchestration.
//!
//! A free-text question is classified into an [`Intent`] with extracted
//! parameters, then the [`Orchestrator`] calls the backend MCP servers that
//! intent needs and assembles a textual answer, caching it for a while.
//!
//! - **intent**: keyword classifier and parameter extraction
//! - **backend**: JSON-RPC client for one backend server
//! - **cache**: TTL cache of formatted answers
//! - **orchestrator**: per-intent dispatch, sequential or concurrent

mod backend;
mod cache;
mod intent;
mod orchestrator;

#[cfg(test)]
mod intent_test;

pub use backend::{Backend, BackendClient, BackendError};
pub use cache::{CacheEntry, ResultCache, cache_key};
pub use intent::{BackendName, Intent, IntentClassifier, ParsedIntent};
pub use orchestrator::{Answer, CACHE_MARKER, OrchestrationError, Orchestrator};

#[cfg(test)]
pub use backend::MockBackend;
