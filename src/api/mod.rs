// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// API module
// HTTP layer: routes, request/response types, error envelope

pub mod errors;
pub mod handlers;
pub mod http_server;

pub use errors::{ApiError, ErrorResponse};
pub use handlers::{HealthResponse, ServiceInfo};
pub use http_server::{build_router, start_server, AppState};

use serde::{Deserialize, Serialize};

/// Name of the per-browser session cookie
pub const SESSION_COOKIE: &str = "session_id";

/// Maximum accepted chat message size in bytes
pub const MAX_MESSAGE_BYTES: usize = 8 * 1024;

/// Body of POST /v1/chat
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

/// Response of POST /v1/chat
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
    pub session_id: String,
}
