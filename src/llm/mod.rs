// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// LLM module
// Hosted chat completion client for answer generation

pub mod groq;

pub use groq::{GroqClient, GroqConfig};

use thiserror::Error;

/// A single chat message sent to the completion endpoint
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Errors from the hosted chat completion API
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("API returned HTTP {status}: {message}")]
    Api { status: u16, message: String },

    #[error("empty or missing content in response")]
    EmptyResponse,
}
