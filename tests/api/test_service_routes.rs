// Service routes: /, /health, /metrics

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use crate::common::{test_state, RecordingModel};
use medical_rag_node::api::build_router;

async fn get(router: axum::Router, uri: &str, cookie: Option<&str>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let response = router.oneshot(builder.body(Body::empty()).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn test_root_returns_service_info() {
    let state = test_state(Arc::new(RecordingModel::new("unused")), 60);
    let router = build_router(state);

    let (status, body) = get(router, "/", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["service"], "medical-rag-node");
    assert!(body["endpoints"]
        .as_array()
        .unwrap()
        .iter()
        .any(|e| e == "POST /v1/chat"));
}

#[tokio::test]
async fn test_root_destroys_cookie_session() {
    let state = test_state(Arc::new(RecordingModel::new("Answer.")), 60);
    let router = build_router(state.clone());

    // Start a conversation to get a live session
    let request = Request::builder()
        .method("POST")
        .uri("/v1/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "message": "hello" }).to_string()))
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    let cookie = set_cookie.split(';').next().unwrap().to_string();
    let session_id = cookie.trim_start_matches("session_id=").to_string();

    assert!(state.memory.session_exists(&session_id).await);

    // Page load resets the conversation
    let (status, _) = get(router, "/", Some(&cookie)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!state.memory.session_exists(&session_id).await);
}

#[tokio::test]
async fn test_health_reports_sessions_and_model() {
    let state = test_state(Arc::new(RecordingModel::new("unused")), 60);
    let router = build_router(state);

    let (status, body) = get(router, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["embedding_model"], "all-MiniLM-L6-v2");
    assert_eq!(body["sessions"]["total_sessions"], 0);
}

#[tokio::test]
async fn test_metrics_exposes_request_counters() {
    let state = test_state(Arc::new(RecordingModel::new("Answer.")), 60);
    let router = build_router(state);

    // One chat request so the counters move
    let request = Request::builder()
        .method("POST")
        .uri("/v1/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "message": "hello" }).to_string()))
        .unwrap();
    router.clone().oneshot(request).await.unwrap();

    let response = router
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
    assert!(content_type.starts_with("text/plain"));

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = String::from_utf8(bytes.to_vec()).unwrap();

    assert!(body.contains("chat_requests_total 1"));
    assert!(body.contains("chat_request_errors_total 0"));
    assert!(body.contains("chat_sessions_active 1"));
}
