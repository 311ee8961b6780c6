//! Application state for the two servers.

use std::sync::Arc;

use super::gate::Pipeline;
use crate::analyst::{IntentClassifier, Orchestrator};
use crate::auth::{RateLimiter, TokenIssuer};
use crate::rpc::RpcHandler;

/// Shared state of the secure server.
///
/// Generic over `H: RpcHandler` so tests can put a mock behind the gate.
/// The issuer and limiter are shared with the gate pipeline, so the rate
/// windows seen by the gate are the ones this state exposes.
pub struct AppState<H: RpcHandler> {
    handler: Arc<H>,
    issuer: Arc<TokenIssuer>,
    limiter: Arc<RateLimiter>,
    pipeline: Arc<Pipeline>,
}

// Manual Clone impl - only the Arcs are cloned, H need not be Clone
impl<H: RpcHandler> Clone for AppState<H> {
    fn clone(&self) -> Self {
        Self {
            handler: Arc::clone(&self.handler),
            issuer: Arc::clone(&self.issuer),
            limiter: Arc::clone(&self.limiter),
            pipeline: Arc::clone(&self.pipeline),
        }
    }
}

impl<H: RpcHandler> AppState<H> {
    pub fn new(handler: H, issuer: TokenIssuer, limiter: RateLimiter) -> Self {
        let issuer = Arc::new(issuer);
        let limiter = Arc::new(limiter);
        let pipeline = Pipeline::standard(Arc::clone(&issuer), Arc::clone(&limiter));

        Self {
            handler: Arc::new(handler),
            issuer,
            limiter,
            pipeline: Arc::new(pipeline),
        }
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }
}

/// Shared state of the analyst server.
#[derive(Clone)]
pub struct AnalystState {
    classifier: IntentClassifier,
    orchestrator: Arc<Orchestrator>,
}

impl AnalystState {
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self {
            classifier: IntentClassifier::new(),
            orchestrator: Arc::new(orchestrator),
        }
    }

    pub fn classifier(&self) -> &IntentClassifier {
        &self.classifier
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }
}
