// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error_type: String,
    pub message: String,
    pub request_id: Option<String>,
    pub details: Option<HashMap<String, serde_json::Value>>,
}

#[derive(Debug, Clone)]
pub enum ApiError {
    NotFound(String),
    InvalidRequest(String),
    ValidationError {
        field: String,
        message: String,
    },
    RateLimitExceeded {
        retry_after: u64,
    },
    /// The in-process session store is at capacity
    SessionLimitReached,
    /// A hosted dependency (index or model API) failed
    UpstreamError {
        service: String,
        message: String,
    },
    InternalError(String),
    Timeout,
}

impl ApiError {
    pub fn to_response(&self, request_id: Option<String>) -> ErrorResponse {
        let (error_type, message, details) = match self {
            ApiError::NotFound(msg) => ("not_found", msg.clone(), None),
            ApiError::InvalidRequest(msg) => ("invalid_request", msg.clone(), None),
            ApiError::ValidationError { field, message } => {
                let mut details = HashMap::new();
                details.insert(
                    "field".to_string(),
                    serde_json::Value::String(field.clone()),
                );
                ("validation_error", message.clone(), Some(details))
            }
            ApiError::RateLimitExceeded { retry_after } => {
                let mut details = HashMap::new();
                details.insert(
                    "retry_after".to_string(),
                    serde_json::Value::Number((*retry_after).into()),
                );
                (
                    "rate_limit_exceeded",
                    "Rate limit exceeded".to_string(),
                    Some(details),
                )
            }
            ApiError::SessionLimitReached => (
                "session_limit_reached",
                "Maximum number of sessions reached".to_string(),
                None,
            ),
            ApiError::UpstreamError { service, message } => {
                let mut details = HashMap::new();
                details.insert(
                    "service".to_string(),
                    serde_json::Value::String(service.clone()),
                );
                ("upstream_error", message.clone(), Some(details))
            }
            ApiError::InternalError(msg) => ("internal_error", msg.clone(), None),
            ApiError::Timeout => ("timeout", "Request timed out".to_string(), None),
        };

        ErrorResponse {
            error_type: error_type.to_string(),
            message,
            request_id,
            details,
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::NotFound(_) => 404,
            ApiError::InvalidRequest(_) | ApiError::ValidationError { .. } => 400,
            ApiError::RateLimitExceeded { .. } => 429,
            ApiError::SessionLimitReached => 503,
            ApiError::UpstreamError { .. } => 502,
            ApiError::InternalError(_) => 500,
            ApiError::Timeout => 504,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            ApiError::ValidationError { field, message } => {
                write!(f, "Validation error for {}: {}", field, message)
            }
            ApiError::RateLimitExceeded { retry_after } => write!(
                f,
                "Rate limit exceeded, retry after {} seconds",
                retry_after
            ),
            ApiError::SessionLimitReached => write!(f, "Maximum number of sessions reached"),
            ApiError::UpstreamError { service, message } => {
                write!(f, "Upstream error from {}: {}", service, message)
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            ApiError::Timeout => write!(f, "Request timed out"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<crate::rag::ChainError> for ApiError {
    fn from(err: crate::rag::ChainError) -> Self {
        use crate::rag::ChainError;
        match err {
            // Embedding runs in-process; failures there are ours
            ChainError::Embedding(e) => ApiError::InternalError(e.to_string()),
            ChainError::Retrieval(e) => ApiError::UpstreamError {
                service: "vector-index".to_string(),
                message: e.to_string(),
            },
            ChainError::Generation(e) => ApiError::UpstreamError {
                service: "chat-model".to_string(),
                message: e.to_string(),
            },
        }
    }
}
