// Error envelope mapping: validation, upstream failures, session limits

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use crate::common::{test_state, FailingModel, RecordingModel};
use medical_rag_node::api::build_router;

async fn post_chat(router: axum::Router, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/v1/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

#[tokio::test]
async fn test_empty_message_rejected() {
    let state = test_state(Arc::new(RecordingModel::new("unused")), 60);
    let router = build_router(state);

    let (status, body) = post_chat(router, json!({ "message": "   " })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_type"], "validation_error");
    assert_eq!(body["details"]["field"], "message");
}

#[tokio::test]
async fn test_oversized_message_rejected() {
    let state = test_state(Arc::new(RecordingModel::new("unused")), 60);
    let router = build_router(state);

    let oversized = "a".repeat(9 * 1024);
    let (status, body) = post_chat(router, json!({ "message": oversized })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_type"], "validation_error");
    assert!(body["message"].as_str().unwrap().contains("8192"));
}

#[tokio::test]
async fn test_upstream_failure_maps_to_502() {
    let state = test_state(Arc::new(FailingModel), 60);
    let router = build_router(state.clone());

    let (status, body) = post_chat(router, json!({ "message": "hello" })).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error_type"], "upstream_error");
    assert_eq!(body["details"]["service"], "chat-model");

    // The user turn written before the failure stays in memory
    let metrics = state.memory.metrics().await;
    assert_eq!(metrics.total_entries, 1);
}

#[tokio::test]
async fn test_malformed_body_rejected() {
    let state = test_state(Arc::new(RecordingModel::new("unused")), 60);
    let router = build_router(state);

    let request = Request::builder()
        .method("POST")
        .uri("/v1/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
