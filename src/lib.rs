// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod config;
pub mod embeddings;
pub mod llm;
pub mod memory;
pub mod prompt;
pub mod rag;
pub mod utils;
pub mod vector;
pub mod version;

// Re-export main types
pub use api::{ApiError, AppState, ChatRequest, ChatResponse, ErrorResponse};
pub use config::AppConfig;
pub use embeddings::{EmbeddingModelConfig, EmbeddingModelManager, OnnxEmbeddingModel};
pub use llm::{ChatMessage, GroqClient, GroqConfig, LlmError};
pub use memory::{MemoryEntry, MemoryStore, MemoryStoreConfig, Role, SessionMemory};
pub use rag::{ChainError, RagAnswer, RagChain, RetrievedDocument, Retriever};
pub use vector::{PineconeClient, QueryMatch};
