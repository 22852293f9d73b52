// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    extract::{ConnectInfo, Json, State},
    http::header,
    response::IntoResponse,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Instant;
use tracing::{info, warn};

use super::http_server::{ApiErrorResponse, AppState};
use super::{ApiError, ChatRequest, ChatResponse, MAX_MESSAGE_BYTES, SESSION_COOKIE};
use crate::memory::{Role, StoreMetrics};
use crate::utils::context::build_input_with_context;
use crate::version;

/// Response of GET /health
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub embedding_model: String,
    pub sessions: StoreMetrics,
}

/// Response of GET /
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub service: String,
    pub version: String,
    pub endpoints: Vec<String>,
}

/// GET / - start a new chat
///
/// Mirrors the original page load: any session named by the cookie is
/// destroyed and the cookie is cleared. A fresh session id is assigned
/// lazily by the next POST /v1/chat.
pub async fn index_handler(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<ServiceInfo>) {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        let destroyed = state.memory.destroy_session(cookie.value()).await;
        if destroyed {
            info!(session_id = %cookie.value(), "session reset on page load");
        }
    }

    let jar = jar.remove(Cookie::build((SESSION_COOKIE, "")).path("/").build());

    let info = ServiceInfo {
        service: "medical-rag-node".to_string(),
        version: version::VERSION_NUMBER.to_string(),
        endpoints: vec![
            "GET /".to_string(),
            "POST /v1/chat".to_string(),
            "GET /health".to_string(),
            "GET /metrics".to_string(),
        ],
    };

    (jar, Json(info))
}

/// POST /v1/chat - the core request handler
///
/// Assigns a session id when the cookie is absent or stale, stores the user
/// turn, concatenates recent memory with the message, invokes the retrieval
/// chain, stores the assistant turn, and returns the answer text.
pub async fn chat_handler(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    jar: CookieJar,
    Json(request): Json<ChatRequest>,
) -> Result<(CookieJar, Json<ChatResponse>), ApiErrorResponse> {
    let started = Instant::now();

    let message = request.message.trim().to_string();
    if message.is_empty() {
        return Err(ApiError::ValidationError {
            field: "message".to_string(),
            message: "message must not be empty".to_string(),
        }
        .into());
    }
    if message.len() > MAX_MESSAGE_BYTES {
        return Err(ApiError::ValidationError {
            field: "message".to_string(),
            message: format!("message exceeds {} bytes", MAX_MESSAGE_BYTES),
        }
        .into());
    }

    // Reuse the cookie's session when it is still alive; otherwise assign a
    // fresh one. A stale cookie is not an error - the chat starts over.
    let mut session_id = None;
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if state.memory.session_exists(cookie.value()).await {
            session_id = Some(cookie.value().to_string());
        }
    }
    let session_id = match session_id {
        Some(id) => id,
        None => state.memory.create_session().await.map_err(|e| {
            warn!(error = %e, "session creation failed");
            ApiError::SessionLimitReached
        })?,
    };

    let rate_key = connect_info
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| session_id.clone());
    state.rate_limiter.check_rate_limit(&rate_key).await?;

    // Context window is read before the new turn is stored, so it holds
    // strictly prior turns and the message appears in the input exactly once.
    let context = state.memory.recent(&session_id, state.context_limit).await;
    let input = build_input_with_context(&context, &message);

    state
        .memory
        .put(&session_id, Role::User, message.clone())
        .await
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    let result = state.chain.invoke(&input).await;

    let mut metrics = state.metrics.write().await;
    metrics.record(started.elapsed(), result.is_err());
    drop(metrics);

    match result {
        Ok(answer) => {
            state
                .memory
                .put(&session_id, Role::Assistant, answer.answer.clone())
                .await
                .map_err(|e| ApiError::InternalError(e.to_string()))?;

            info!(
                session_id = %session_id,
                context_turns = context.len(),
                documents = answer.documents.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "chat request complete"
            );

            let cookie = Cookie::build((SESSION_COOKIE, session_id.clone()))
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax)
                .build();

            Ok((
                jar.add(cookie),
                Json(ChatResponse {
                    answer: answer.answer,
                    session_id,
                }),
            ))
        }
        Err(e) => {
            warn!(session_id = %session_id, error = %e, "chain invocation failed");
            Err(ApiError::from(e).into())
        }
    }
}

/// GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let sessions = state.memory.metrics().await;

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: version::VERSION_NUMBER.to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        embedding_model: state.model_name.clone(),
        sessions,
    })
}

/// GET /metrics - Prometheus-style plaintext counters
pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    let metrics = state.metrics.read().await;
    let sessions = state.memory.metrics().await;

    let avg_duration_seconds = if metrics.total_requests > 0 {
        metrics.total_duration.as_secs_f64() / metrics.total_requests as f64
    } else {
        0.0
    };

    let body = format!(
        "# HELP chat_requests_total Total number of chat requests\n\
         # TYPE chat_requests_total counter\n\
         chat_requests_total {}\n\
         # HELP chat_request_errors_total Total number of failed chat requests\n\
         # TYPE chat_request_errors_total counter\n\
         chat_request_errors_total {}\n\
         # HELP chat_request_duration_seconds_avg Mean chat request latency\n\
         # TYPE chat_request_duration_seconds_avg gauge\n\
         chat_request_duration_seconds_avg {:.6}\n\
         # HELP chat_sessions_active Sessions currently held in memory\n\
         # TYPE chat_sessions_active gauge\n\
         chat_sessions_active {}\n\
         # HELP chat_memory_entries_total Turns currently held in memory\n\
         # TYPE chat_memory_entries_total gauge\n\
         chat_memory_entries_total {}\n",
        metrics.total_requests,
        metrics.total_errors,
        avg_duration_seconds,
        sessions.active_sessions,
        sessions.total_entries,
    );

    ([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body)
}
