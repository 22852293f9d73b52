// RAG (Retrieval-Augmented Generation) module
// The retrieval chain: embed the input, fetch similar document chunks from
// the hosted index, stuff them into the system prompt, generate an answer

pub mod chain;
pub mod errors;
pub mod retriever;

pub use chain::{RagAnswer, RagChain};
pub use errors::ChainError;
pub use retriever::{DocumentRetriever, Retriever, RetrievedDocument};

use anyhow::Result;
use async_trait::async_trait;

use crate::embeddings::EmbeddingModelManager;
use crate::llm::{ChatMessage, GroqClient, LlmError};

/// Anything that can turn text into a query vector
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

#[async_trait]
impl Embedder for EmbeddingModelManager {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        EmbeddingModelManager::embed(self, text).await
    }
}

/// Anything that can answer a prepared message list
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, LlmError>;
}

#[async_trait]
impl ChatModel for GroqClient {
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, LlmError> {
        GroqClient::complete(self, messages).await
    }
}
