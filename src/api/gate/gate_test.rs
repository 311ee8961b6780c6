//! Router-level tests of the request gate.

use std::io;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Body;
use axum::http::header::{AUTHORIZATION, RETRY_AFTER};
use axum::http::{Request, StatusCode};
use axum::response::Response;
use chrono::Duration;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;
use tracing_subscriber::fmt::MakeWriter;

use super::{X_RATELIMIT_LIMIT, X_RATELIMIT_REMAINING, X_RATELIMIT_RESET, X_REQUEST_ID};
use crate::api::{AppState, create_router};
use crate::auth::{RateLimiter, TokenIssuer};
use crate::catalog::StoreCatalog;
use crate::clock::{Clock, ManualClock, SharedClock};
use crate::config::{AuthSettings, RateLimitSettings};
use crate::rpc::{MockRpcHandler, RpcHandler};

const SECRET: &str = "gate-test-secret-0123456789abcdef";

struct Harness {
    router: Router,
    issuer: TokenIssuer,
    clock: ManualClock,
}

impl Harness {
    fn new<H: RpcHandler>(handler: H, limits: RateLimitSettings) -> Self {
        let clock = ManualClock::default();
        let shared: SharedClock = Arc::new(clock.clone());
        let auth = AuthSettings::new(SECRET).unwrap();
        let state = AppState::new(
            handler,
            TokenIssuer::new(&auth, shared.clone()),
            RateLimiter::new(limits, shared.clone()),
        );

        Self {
            router: create_router(state),
            issuer: TokenIssuer::new(&auth, shared),
            clock,
        }
    }

    fn catalog() -> Self {
        Self::new(StoreCatalog::sample(), RateLimitSettings::default())
    }

    fn token(&self, scopes: &[&str]) -> String {
        let scopes: Vec<String> = scopes.iter().map(|s| s.to_string()).collect();
        self.issuer.issue("user-001", &scopes, "standard").unwrap().token
    }

    async fn call(&self, token: Option<&str>, body: Value) -> Response {
        self.send(token, Body::from(serde_json::to_vec(&body).unwrap()))
            .await
    }

    async fn send(&self, token: Option<&str>, body: Body) -> Response {
        let mut request = Request::builder()
            .method("POST")
            .uri("/mcp")
            .header("content-type", "application/json");
        if let Some(token) = token {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        self.router
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap()
    }
}

fn rpc(method: &str, params: Value) -> Value {
    json!({ "jsonrpc": "2.0", "id": 7, "method": method, "params": params })
}

fn create_order() -> Value {
    rpc(
        "tools/call",
        json!({
            "name": "create_order",
            "arguments": { "customerId": 1, "productId": 2, "quantity": 1 }
        }),
    )
}

/// Helper to parse JSON response body
async fn json_body(response: Response) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

fn header<'a>(response: &'a Response, name: &str) -> Option<&'a str> {
    response.headers().get(name).and_then(|v| v.to_str().ok())
}

// =============================================================================
// Authentication
// =============================================================================

#[tokio::test]
async fn missing_token_is_unauthorized_and_never_reaches_handler() {
    let mut handler = MockRpcHandler::new();
    handler.expect_call_tool().never();
    handler.expect_read_resource().never();
    let harness = Harness::new(handler, RateLimitSettings::default());

    let response = harness.call(None, create_order()).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], -32001);
    assert_eq!(body["id"], 7);
    assert!(body.get("result").is_none());
}

#[tokio::test]
async fn invalid_token_is_unauthorized() {
    let harness = Harness::catalog();

    let response = harness
        .call(Some("not.a.token"), rpc("tools/list", json!({})))
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["error"]["code"], -32001);
}

#[tokio::test]
async fn expired_token_is_unauthorized() {
    let harness = Harness::catalog();
    let token = harness.token(&["admin"]);

    harness.clock.advance(Duration::minutes(61));
    let response = harness.call(Some(&token), rpc("tools/list", json!({}))).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Authorization
// =============================================================================

#[tokio::test]
async fn read_scope_cannot_call_tools() {
    let mut handler = MockRpcHandler::new();
    handler.expect_call_tool().never();
    let harness = Harness::new(handler, RateLimitSettings::default());
    let token = harness.token(&["read"]);

    let response = harness.call(Some(&token), create_order()).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], -32002);
    assert_eq!(body["error"]["data"]["requiredScope"], "write");
    assert!(body["error"]["message"].as_str().unwrap().contains("write"));
}

#[tokio::test]
async fn write_scope_satisfies_read() {
    let harness = Harness::catalog();
    let token = harness.token(&["write"]);

    let response = harness
        .call(
            Some(&token),
            rpc("resources/read", json!({ "uri": "secure://data/products" })),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["result"]["contents"][0]["uri"], "secure://data/products");
}

#[tokio::test]
async fn admin_scope_satisfies_everything() {
    let harness = Harness::catalog();
    let token = harness.token(&["admin"]);

    let response = harness.call(Some(&token), create_order()).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let text = body["result"]["content"][0]["text"].as_str().unwrap();
    assert!(text.contains("Order created successfully"));
}

#[tokio::test]
async fn listing_needs_no_scope() {
    let harness = Harness::catalog();
    let token = harness.token(&[]);

    let response = harness.call(Some(&token), rpc("tools/list", json!({}))).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["result"]["tools"][0]["name"], "create_order");
}

// =============================================================================
// Rate limiting
// =============================================================================

fn tight_limits() -> RateLimitSettings {
    RateLimitSettings {
        tools_limit: 3,
        ..RateLimitSettings::default()
    }
}

#[tokio::test]
async fn request_over_the_limit_is_throttled() {
    let harness = Harness::new(StoreCatalog::sample(), tight_limits());
    let token = harness.token(&["read"]);

    let first = harness.call(Some(&token), rpc("tools/list", json!({}))).await;
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(header(&first, X_RATELIMIT_LIMIT.as_str()), Some("3"));
    assert_eq!(header(&first, X_RATELIMIT_REMAINING.as_str()), Some("2"));
    assert!(header(&first, X_RATELIMIT_RESET.as_str()).is_some());

    for _ in 0..2 {
        let response = harness.call(Some(&token), rpc("tools/list", json!({}))).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let denied = harness.call(Some(&token), rpc("tools/list", json!({}))).await;

    assert_eq!(denied.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(header(&denied, X_RATELIMIT_REMAINING.as_str()), Some("0"));
    let retry_after: u64 = header(&denied, RETRY_AFTER.as_str())
        .unwrap()
        .parse()
        .unwrap();
    assert!(retry_after > 0);

    let body = json_body(denied).await;
    assert_eq!(body["error"]["code"], -32003);
    assert!(body["error"]["data"]["resetTime"].is_string());
}

#[tokio::test]
async fn resources_are_counted_separately_from_tools() {
    let harness = Harness::new(StoreCatalog::sample(), tight_limits());
    let token = harness.token(&["read"]);

    for _ in 0..3 {
        harness.call(Some(&token), rpc("tools/list", json!({}))).await;
    }
    let response = harness
        .call(Some(&token), rpc("resources/list", json!({})))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header(&response, X_RATELIMIT_LIMIT.as_str()), Some("1000"));
}

#[tokio::test]
async fn throttled_subject_is_admitted_after_window() {
    let harness = Harness::new(StoreCatalog::sample(), tight_limits());
    let token = harness.token(&["read"]);

    for _ in 0..4 {
        harness.call(Some(&token), rpc("tools/list", json!({}))).await;
    }
    harness.clock.advance(Duration::minutes(1));

    let response = harness.call(Some(&token), rpc("tools/list", json!({}))).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header(&response, X_RATELIMIT_REMAINING.as_str()), Some("2"));
    let reset: i64 = header(&response, X_RATELIMIT_RESET.as_str())
        .unwrap()
        .parse()
        .unwrap();
    assert_eq!(reset, (harness.clock.now() + Duration::minutes(1)).timestamp());
}

// =============================================================================
// Bypass and pass-through
// =============================================================================

#[tokio::test]
async fn token_endpoint_bypasses_the_gate() {
    let harness = Harness::catalog();

    let response = harness
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/token")
                .header("content-type", "application/json")
                .body(Body::from(
                    serde_json::to_vec(&json!({ "userId": "user-002", "scopes": ["read"] }))
                        .unwrap(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(header(&response, X_RATELIMIT_LIMIT.as_str()).is_none());
    let body = json_body(response).await;
    let token = body["token"].as_str().unwrap().to_string();

    let response = harness
        .call(
            Some(&token),
            rpc("resources/read", json!({ "uri": "secure://data/customers" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn health_needs_no_token() {
    let harness = Harness::catalog();

    let response = harness
        .router
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "ok");
}

#[tokio::test]
async fn admitted_request_keeps_body_for_handler() {
    let harness = Harness::catalog();
    let token = harness.token(&["read"]);

    let response = harness.call(Some(&token), rpc("initialize", json!({}))).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(header(&response, X_REQUEST_ID.as_str()).is_some());
    let body = json_body(response).await;
    assert_eq!(body["id"], 7);
    assert_eq!(body["result"]["protocolVersion"], "2024-11-05");
}

#[tokio::test]
async fn unparseable_body_reaches_handler_as_parse_error() {
    let harness = Harness::catalog();
    let token = harness.token(&["read"]);

    let response = harness.send(Some(&token), Body::from("{not json")).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], -32700);
    assert!(body["id"].is_null());
}

#[tokio::test]
async fn missing_argument_is_invalid_params_naming_it() {
    let harness = Harness::catalog();
    let token = harness.token(&["write"]);

    let response = harness
        .call(
            Some(&token),
            rpc(
                "tools/call",
                json!({ "name": "create_order", "arguments": { "customerId": 1, "productId": 2 } }),
            ),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], -32602);
    assert!(body["error"]["data"].as_str().unwrap().contains("quantity"));
}

// =============================================================================
// Audit log
// =============================================================================

#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[tokio::test]
async fn audit_line_redacts_credentials() {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let harness = Harness::catalog();
    let token = harness.token(&["write"]);
    let body = rpc(
        "tools/call",
        json!({
            "name": "create_order",
            "arguments": { "customerId": 1, "productId": 2, "quantity": 1, "password": "hunter2" }
        }),
    );

    let response = harness.call(Some(&token), body).await;
    assert_eq!(response.status(), StatusCode::OK);

    let output = logs.contents();
    assert!(output.contains("request completed"), "no audit line in: {output}");
    assert!(output.contains("user-001"));
    assert!(output.contains("tools/call"));
    assert!(output.contains("[REDACTED]"));
    assert!(!output.contains("hunter2"));
}

#[tokio::test]
async fn rejections_are_logged_without_audit_line() {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let harness = Harness::catalog();
    harness.call(None, rpc("tools/list", json!({}))).await;

    let output = logs.contents();
    assert!(output.contains("request rejected"));
    assert!(output.contains("authenticate"));
    assert!(!output.contains("request completed"));
}
