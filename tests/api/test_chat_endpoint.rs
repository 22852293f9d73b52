// Chat endpoint flow: session assignment, memory concatenation, cookies

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use crate::common::{test_state, RecordingModel};
use medical_rag_node::api::build_router;

async fn send(
    router: axum::Router,
    request: Request<Body>,
) -> (StatusCode, axum::http::HeaderMap, Value) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, headers, body)
}

fn chat_request(message: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/v1/chat")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder
        .body(Body::from(json!({ "message": message }).to_string()))
        .unwrap()
}

fn session_cookie(headers: &axum::http::HeaderMap) -> String {
    let set_cookie = headers
        .get(header::SET_COOKIE)
        .expect("set-cookie header missing")
        .to_str()
        .unwrap();
    set_cookie
        .split(';')
        .next()
        .unwrap()
        .trim()
        .to_string()
}

#[tokio::test]
async fn test_chat_assigns_session_and_answers() {
    let model = Arc::new(RecordingModel::new("Clogged pores."));
    let state = test_state(model, 60);
    let router = build_router(state);

    let (status, headers, body) = send(router, chat_request("What causes acne?", None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["answer"], "Clogged pores.");
    assert!(!body["session_id"].as_str().unwrap().is_empty());

    let cookie = session_cookie(&headers);
    assert!(cookie.starts_with("session_id="));
    assert_eq!(
        cookie.trim_start_matches("session_id="),
        body["session_id"].as_str().unwrap()
    );
}

#[tokio::test]
async fn test_chat_concatenates_memory_into_chain_input() {
    let model = Arc::new(RecordingModel::new("Clogged pores."));
    let state = test_state(model.clone(), 60);
    let router = build_router(state);

    let (status, headers, _) =
        send(router.clone(), chat_request("What causes acne?", None)).await;
    assert_eq!(status, StatusCode::OK);
    let cookie = session_cookie(&headers);

    let (status, _, _) = send(
        router,
        chat_request("How is it treated?", Some(&cookie)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let seen = model.seen.lock().unwrap();
    assert_eq!(seen.len(), 2);

    // First turn has no prior context
    assert_eq!(seen[0][1].content, "What causes acne?");

    // Second turn carries the prior user and assistant turns, space-joined
    assert_eq!(
        seen[1][1].content,
        "What causes acne? Clogged pores. How is it treated?"
    );
}

#[tokio::test]
async fn test_chat_sessions_do_not_share_memory() {
    let model = Arc::new(RecordingModel::new("Answer."));
    let state = test_state(model.clone(), 60);
    let router = build_router(state);

    let (_, headers_a, _) = send(router.clone(), chat_request("first in a", None)).await;
    let cookie_a = session_cookie(&headers_a);

    // A different browser without the cookie gets its own session
    let (_, headers_b, body_b) = send(router.clone(), chat_request("first in b", None)).await;
    let cookie_b = session_cookie(&headers_b);
    assert_ne!(cookie_a, cookie_b);

    let (_, _, body_a2) = send(
        router,
        chat_request("second in a", Some(&cookie_a)),
    )
    .await;
    assert_ne!(body_a2["session_id"], body_b["session_id"]);

    let seen = model.seen.lock().unwrap();
    // Session b's turn never leaks into session a's input
    assert_eq!(seen[2][1].content, "first in a Answer. second in a");
}

#[tokio::test]
async fn test_chat_with_stale_cookie_starts_fresh_session() {
    let model = Arc::new(RecordingModel::new("Answer."));
    let state = test_state(model, 60);
    let router = build_router(state);

    let stale = "session_id=3f2b9a44-0000-0000-0000-000000000000";
    let (status, _, body) = send(router, chat_request("hello", Some(stale))).await;

    assert_eq!(status, StatusCode::OK);
    assert_ne!(
        body["session_id"].as_str().unwrap(),
        "3f2b9a44-0000-0000-0000-000000000000"
    );
}

#[tokio::test]
async fn test_chat_message_is_trimmed() {
    let model = Arc::new(RecordingModel::new("Answer."));
    let state = test_state(model.clone(), 60);
    let router = build_router(state);

    let (status, _, _) = send(router, chat_request("  padded question  ", None)).await;
    assert_eq!(status, StatusCode::OK);

    let seen = model.seen.lock().unwrap();
    assert_eq!(seen[0][1].content, "padded question");
}

#[tokio::test]
async fn test_rate_limit_returns_429() {
    let model = Arc::new(RecordingModel::new("Answer."));
    let state = test_state(model, 2);
    let router = build_router(state);

    let (_, headers, _) = send(router.clone(), chat_request("one", None)).await;
    let cookie = session_cookie(&headers);

    let (status, _, _) = send(router.clone(), chat_request("two", Some(&cookie))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, body) = send(router, chat_request("three", Some(&cookie))).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error_type"], "rate_limit_exceeded");
    assert_eq!(body["details"]["retry_after"], 60);
}
