//! Request gate for the secure JSON-RPC surface.
//!
//! Every request passes through the same ordered stages before a handler
//! sees it: bypass check, authenticate, authorize, rate-limit, then the audit
//! log wrapped around the handler itself. The first stage that rejects ends
//! the request with its JSON-RPC error.

mod audit;
mod stages;

#[cfg(test)]
mod gate_test;

use std::time::Instant;

use axum::Json;
use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::header::RETRY_AFTER;
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::warn;
use uuid::Uuid;

pub use audit::{AuditRecord, OVERHEAD_BUDGET, REDACTED, redact_body};
pub use stages::{
    Authenticate, Authorize, GateContext, Interceptor, Pipeline, RateLimit, bearer_token,
};

use super::state::AppState;
use crate::auth::RateDecision;
use crate::rpc::{Envelope, RpcError, RpcHandler, RpcReply};

/// Paths that skip the gate entirely.
const BYPASS_PATHS: &[&str] = &["/auth/token", "/health"];
const BYPASS_PREFIXES: &[&str] = &["/docs"];

const MAX_BODY_BYTES: usize = 1024 * 1024;
const ANONYMOUS: &str = "anonymous";

pub const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub const X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

pub fn is_bypassed(path: &str) -> bool {
    BYPASS_PATHS.contains(&path) || BYPASS_PREFIXES.iter().any(|p| path.starts_with(p))
}

/// axum middleware running the gate in front of the secure routes.
pub async fn gate<H: RpcHandler>(
    State(state): State<AppState<H>>,
    request: Request,
    next: Next,
) -> Response {
    if is_bypassed(request.uri().path()) {
        return next.run(request).await;
    }

    let started = Instant::now();
    let request_id = Uuid::new_v4().to_string();
    let (parts, body) = request.into_parts();

    // Buffered so both the gate and the handler can read it.
    let bytes = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            let error = RpcError::InvalidRequest(format!("unreadable body: {e}"));
            return reject(&Envelope::default(), "read_body", &error, None);
        }
    };

    let envelope = Envelope::peek(&bytes);
    let method = envelope.method_or_empty();

    let mut ctx = GateContext::new(&parts.headers, method);
    if let Err((stage, error)) = state.pipeline().run(&mut ctx) {
        return reject(&envelope, stage, &error, ctx.rate.as_ref());
    }
    let GateContext {
        principal, rate, ..
    } = ctx;

    let audit_started = Instant::now();
    let body_for_log = redact_body(&bytes);
    let subject = principal
        .as_ref()
        .map(|p| p.subject_id.clone())
        .unwrap_or_else(|| ANONYMOUS.to_string());
    let mut overhead = audit_started.elapsed();

    let mut request = Request::from_parts(parts, Body::from(bytes));
    if let Some(principal) = principal {
        request.extensions_mut().insert(principal);
    }

    let mut response = next.run(request).await;

    let audit_started = Instant::now();
    if let Some(decision) = &rate {
        set_rate_headers(response.headers_mut(), decision);
    }
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(X_REQUEST_ID, value);
    }
    let record = AuditRecord {
        method,
        subject: &subject,
        request_id: &request_id,
        duration: started.elapsed(),
        status: response.status().as_u16(),
        body: &body_for_log,
    };
    overhead += audit_started.elapsed();
    record.emit(overhead);

    response
}

fn reject(
    envelope: &Envelope,
    stage: &'static str,
    error: &RpcError,
    rate: Option<&RateDecision>,
) -> Response {
    warn!(
        stage,
        method = envelope.method_or_empty(),
        code = error.code().code(),
        "request rejected: {error}"
    );

    let reply = RpcReply::failure(envelope, error);
    let mut response = (reply.status, Json(reply.body)).into_response();

    if let Some(decision) = rate {
        set_rate_headers(response.headers_mut(), decision);
    }
    if let RpcError::RateLimited { retry_after, .. } = error {
        response
            .headers_mut()
            .insert(RETRY_AFTER, HeaderValue::from(*retry_after));
    }
    response
}

fn set_rate_headers(headers: &mut HeaderMap, decision: &RateDecision) {
    headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(decision.limit));
    headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(decision.remaining));
    headers.insert(X_RATELIMIT_RESET, HeaderValue::from(decision.reset_at.timestamp()));
}
