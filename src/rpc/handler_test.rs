//! Tests for envelope handling in front of an [`RpcHandler`].

use axum::http::StatusCode;
use serde_json::{Value, json};

use super::handler::MockRpcHandler;
use super::{RpcError, RpcId, ServerInfo, respond};

fn handler_with_info() -> MockRpcHandler {
    let mut handler = MockRpcHandler::new();
    handler.expect_server_info().returning(|| ServerInfo {
        name: "test-server".into(),
        version: "9.9.9".into(),
    });
    handler
}

#[tokio::test]
async fn initialize_reports_protocol_and_server_info() {
    let handler = handler_with_info();

    let reply = respond(
        &handler,
        br#"{"jsonrpc":"2.0","method":"initialize","params":{},"id":1}"#,
    )
    .await;

    assert_eq!(reply.status, StatusCode::OK);
    let result = reply.body.result.unwrap();
    assert_eq!(result["protocolVersion"], "2024-11-05");
    assert_eq!(result["serverInfo"]["name"], "test-server");
    assert_eq!(reply.body.id, Some(RpcId::Number(1)));
}

#[tokio::test]
async fn unparseable_body_yields_parse_error_with_null_id() {
    let handler = MockRpcHandler::new();

    let reply = respond(&handler, b"{not json").await;

    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body.error.as_ref().unwrap().code, -32700);
    assert!(reply.body.id.is_none());
    let wire = serde_json::to_value(&reply.body).unwrap();
    assert_eq!(wire["id"], Value::Null);
}

#[tokio::test]
async fn wrong_version_is_invalid_request() {
    let handler = MockRpcHandler::new();

    let reply = respond(&handler, br#"{"jsonrpc":"1.0","method":"tools/list","id":"a"}"#).await;

    assert_eq!(reply.body.error.as_ref().unwrap().code, -32600);
    assert_eq!(reply.body.id, Some(RpcId::Str("a".into())));
}

#[tokio::test]
async fn handler_errors_keep_the_request_id() {
    let mut handler = MockRpcHandler::new();
    handler
        .expect_call_tool()
        .returning(|_| Err(RpcError::missing_param("quantity")));

    let reply = respond(
        &handler,
        br#"{"jsonrpc":"2.0","method":"tools/call","params":{"name":"create_order"},"id":5}"#,
    )
    .await;

    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body.id, Some(RpcId::Number(5)));
    let error = reply.body.error.unwrap();
    assert_eq!(error.code, -32602);
    assert!(error.data.unwrap().as_str().unwrap().contains("quantity"));
}

#[tokio::test]
async fn unknown_method_with_id_is_reported_in_band() {
    let handler = MockRpcHandler::new();

    let reply = respond(&handler, br#"{"jsonrpc":"2.0","method":"prompts/get","id":3}"#).await;

    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body.error.as_ref().unwrap().code, -32601);
}

#[tokio::test]
async fn read_resource_passes_uri_through() {
    let mut handler = MockRpcHandler::new();
    handler
        .expect_read_resource()
        .withf(|uri| uri.to_string() == "secure://data/products")
        .times(1)
        .returning(|_| Ok(json!({"contents": []})));

    let reply = respond(
        &handler,
        br#"{"jsonrpc":"2.0","method":"resources/read","params":{"uri":"secure://data/products"},"id":2}"#,
    )
    .await;

    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body.result.unwrap(), json!({"contents": []}));
}
