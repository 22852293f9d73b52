// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Groq chat completion client (`/openai/v1/chat/completions`)
//!
//! Groq exposes the OpenAI-compatible wire format, so the request/response
//! types here follow that schema. They are private to this module - callers
//! only see [`ChatMessage`] in and answer text out. One round-trip per call;
//! conversation history management lives in the memory module.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

use super::{ChatMessage, LlmError};

/// Configuration for the Groq client
#[derive(Debug, Clone)]
pub struct GroqConfig {
    pub api_url: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub request_timeout: Duration,
}

impl Default for GroqConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.groq.com/openai/v1/chat/completions".to_string(),
            api_key: String::new(),
            model: "llama-3.3-70b-versatile".to_string(),
            temperature: 0.4,
            max_tokens: None,
            request_timeout: Duration::from_secs(60),
        }
    }
}

/// Client for the Groq chat completions API
///
/// `reqwest::Client` is an Arc internally, so this is cheap to clone.
#[derive(Debug, Clone)]
pub struct GroqClient {
    client: Client,
    config: GroqConfig,
}

impl GroqClient {
    pub fn new(config: GroqConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| LlmError::Request(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Model name this client sends completions to
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Send one chat completion round-trip and return the answer text
    pub async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, LlmError> {
        let payload = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages,
            temperature: Some(self.config.temperature),
            max_tokens: self.config.max_tokens,
        };

        debug!(
            model = %payload.model,
            messages = payload.messages.len(),
            "sending chat completion request"
        );

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                error!(url = %self.config.api_url, error = %e, "chat completion transport failure");
                LlmError::Request(e.to_string())
            })?;

        let response = check_status(response).await?;

        let parsed = response
            .json::<ChatCompletionResponse>()
            .await
            .map_err(|e| LlmError::Request(format!("failed to parse response body: {}", e)))?;

        if let Some(usage) = &parsed.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "chat completion usage"
            );
        }

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or(LlmError::EmptyResponse)
    }
}

// Private wire types

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<UsageData>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsageData {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

// Error envelope used by OpenAI-compatible APIs
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Consume the response and return it if successful, or a structured error
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, LlmError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<failed to read error body>".to_string());

    let message = match serde_json::from_str::<ErrorEnvelope>(&body) {
        Ok(envelope) => envelope.error.message,
        Err(_) => body,
    };

    error!(status = status.as_u16(), %message, "chat completion returned HTTP error");
    Err(LlmError::Api {
        status: status.as_u16(),
        message,
    })
}
