// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers;
use super::ApiError;
use crate::memory::MemoryStore;
use crate::rag::RagChain;

/// Shared state behind every route
#[derive(Clone)]
pub struct AppState {
    pub memory: Arc<MemoryStore>,
    pub chain: Arc<RagChain>,
    pub rate_limiter: Arc<RateLimiter>,
    pub metrics: Arc<RwLock<Metrics>>,
    /// Prior turns concatenated into each chain input
    pub context_limit: usize,
    /// Embedding model name surfaced by /health
    pub model_name: String,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        memory: Arc<MemoryStore>,
        chain: Arc<RagChain>,
        context_limit: usize,
        model_name: String,
        rate_limit_per_minute: usize,
    ) -> Self {
        Self {
            memory,
            chain,
            rate_limiter: Arc::new(RateLimiter::new(rate_limit_per_minute)),
            metrics: Arc::new(RwLock::new(Metrics::default())),
            context_limit,
            model_name,
            started_at: Instant::now(),
        }
    }
}

/// Request counters surfaced by /metrics
#[derive(Default)]
pub struct Metrics {
    pub total_requests: u64,
    pub total_errors: u64,
    pub total_duration: Duration,
}

impl Metrics {
    pub fn record(&mut self, duration: Duration, is_error: bool) {
        self.total_requests += 1;
        if is_error {
            self.total_errors += 1;
        }
        self.total_duration += duration;
    }
}

/// Sliding-window rate limiter keyed by client
pub struct RateLimiter {
    requests: RwLock<HashMap<String, Vec<Instant>>>,
    limit: usize,
}

impl RateLimiter {
    pub fn new(limit: usize) -> Self {
        Self {
            requests: RwLock::new(HashMap::new()),
            limit,
        }
    }

    pub async fn check_rate_limit(&self, key: &str) -> Result<(), ApiError> {
        let now = Instant::now();
        let one_minute_ago = now - Duration::from_secs(60);

        let mut requests = self.requests.write().await;
        let entry = requests.entry(key.to_string()).or_default();

        // Remove old requests
        entry.retain(|&t| t > one_minute_ago);

        if entry.len() >= self.limit {
            return Err(ApiError::RateLimitExceeded { retry_after: 60 });
        }

        entry.push(now);
        Ok(())
    }
}

/// Build the application router
///
/// Separate from [`start_server`] so tests can drive routes without binding
/// a socket.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index_handler))
        .route("/v1/chat", post(handlers::chat_handler))
        .route("/health", get(handlers::health_handler))
        .route("/metrics", get(handlers::metrics_handler))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Bind and serve until ctrl-c
pub async fn start_server(listen_addr: &str, state: AppState) -> anyhow::Result<()> {
    let addr = listen_addr.parse::<SocketAddr>()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("API server listening on {}", addr);

    let app = build_router(state);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("shutdown signal received");
    })
    .await?;

    Ok(())
}

// Error response wrapper
pub struct ApiErrorResponse(pub ApiError);

impl From<ApiError> for ApiErrorResponse {
    fn from(err: ApiError) -> Self {
        ApiErrorResponse(err)
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let error_response = self.0.to_response(None);

        (status, axum::response::Json(error_response)).into_response()
    }
}
