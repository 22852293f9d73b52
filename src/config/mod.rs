// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Runtime configuration loaded from environment variables

use anyhow::{anyhow, Context, Result};
use std::env;
use std::time::Duration;
use url::Url;

/// Default Groq endpoint (OpenAI-compatible chat completions)
const DEFAULT_GROQ_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

/// Default generation model, matching the hosted index's chat deployment
const DEFAULT_GROQ_MODEL: &str = "llama-3.3-70b-versatile";

/// Full runtime configuration for the node
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Address the HTTP server binds to
    pub listen_addr: String,
    /// Pinecone API key (required)
    pub pinecone_api_key: String,
    /// Pinecone index host URL, e.g. https://medical-chatbot-xxxx.svc.aped-4627-b74a.pinecone.io
    pub pinecone_index_host: String,
    /// Pinecone namespace ("" = default namespace)
    pub pinecone_namespace: String,
    /// Groq API key (required)
    pub groq_api_key: String,
    /// Groq chat completions endpoint
    pub groq_api_url: String,
    /// Groq model name
    pub groq_model: String,
    /// Sampling temperature passed to the chat model
    pub llm_temperature: f32,
    /// Completion token cap, None = provider default
    pub llm_max_tokens: Option<u32>,
    /// Number of document chunks retrieved per query
    pub retrieval_top_k: usize,
    /// Number of prior memory turns concatenated into the chain input
    pub memory_context_limit: usize,
    /// Idle time after which a session expires
    pub session_ttl: Duration,
    /// Maximum number of concurrent sessions held in memory
    pub max_sessions: usize,
    /// Directory holding model.onnx + tokenizer.json for the embedder
    pub embedding_model_dir: String,
    /// Per-IP request budget per minute
    pub rate_limit_per_minute: usize,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// Secrets are required and fail fast; everything else has a default.
    /// Call after dotenv loading so `.env` values are visible.
    pub fn from_env() -> Result<Self> {
        let pinecone_api_key =
            env::var("PINECONE_API_KEY").context("PINECONE_API_KEY must be set")?;
        let groq_api_key = env::var("GROQ_API_KEY").context("GROQ_API_KEY must be set")?;

        let pinecone_index_host =
            env::var("PINECONE_INDEX_HOST").context("PINECONE_INDEX_HOST must be set")?;
        Url::parse(&pinecone_index_host)
            .map_err(|e| anyhow!("Invalid PINECONE_INDEX_HOST: {}", e))?;

        let groq_api_url =
            env::var("GROQ_API_URL").unwrap_or_else(|_| DEFAULT_GROQ_API_URL.to_string());
        Url::parse(&groq_api_url).map_err(|e| anyhow!("Invalid GROQ_API_URL: {}", e))?;

        let api_port = env::var("API_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()
            .map_err(|e| anyhow!("Invalid API_PORT: {}", e))?;

        let retrieval_top_k = env::var("RETRIEVAL_TOP_K")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3);
        if retrieval_top_k == 0 {
            return Err(anyhow!("RETRIEVAL_TOP_K must be at least 1"));
        }

        let memory_context_limit = env::var("MEMORY_CONTEXT_LIMIT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(5);
        if memory_context_limit == 0 {
            return Err(anyhow!("MEMORY_CONTEXT_LIMIT must be at least 1"));
        }

        let session_ttl_seconds = env::var("SESSION_TTL_SECONDS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(1800);

        let max_sessions = env::var("MAX_SESSIONS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(1000);
        if max_sessions == 0 {
            return Err(anyhow!("MAX_SESSIONS must be at least 1"));
        }

        Ok(Self {
            listen_addr: format!("0.0.0.0:{}", api_port),
            pinecone_api_key,
            pinecone_index_host,
            pinecone_namespace: env::var("PINECONE_NAMESPACE").unwrap_or_default(),
            groq_api_key,
            groq_api_url,
            groq_model: env::var("GROQ_MODEL").unwrap_or_else(|_| DEFAULT_GROQ_MODEL.to_string()),
            llm_temperature: env::var("LLM_TEMPERATURE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0.4),
            llm_max_tokens: env::var("LLM_MAX_TOKENS").ok().and_then(|v| v.parse().ok()),
            retrieval_top_k,
            memory_context_limit,
            session_ttl: Duration::from_secs(session_ttl_seconds),
            max_sessions,
            embedding_model_dir: env::var("EMBEDDING_MODEL_DIR")
                .unwrap_or_else(|_| "./models/all-MiniLM-L6-v2-onnx".to_string()),
            rate_limit_per_minute: env::var("RATE_LIMIT_PER_MINUTE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
        })
    }
}
