#![allow(dead_code)]

// Shared fixtures for integration tests: canned chain components and an
// app state wired with them, so no test touches the network.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use medical_rag_node::api::AppState;
use medical_rag_node::llm::{ChatMessage, LlmError};
use medical_rag_node::memory::{MemoryStore, MemoryStoreConfig};
use medical_rag_node::rag::{
    ChainError, ChatModel, DocumentRetriever, RagChain, RetrievedDocument,
};

/// Retriever returning a fixed document list
pub struct CannedRetriever {
    pub documents: Vec<RetrievedDocument>,
}

#[async_trait]
impl DocumentRetriever for CannedRetriever {
    async fn retrieve(&self, _query: &str) -> Result<Vec<RetrievedDocument>, ChainError> {
        Ok(self.documents.clone())
    }
}

/// Chat model that records every message list it sees
pub struct RecordingModel {
    pub seen: Mutex<Vec<Vec<ChatMessage>>>,
    pub answer: String,
}

impl RecordingModel {
    pub fn new(answer: &str) -> Self {
        Self {
            seen: Mutex::new(Vec::new()),
            answer: answer.to_string(),
        }
    }
}

#[async_trait]
impl ChatModel for RecordingModel {
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, LlmError> {
        self.seen.lock().unwrap().push(messages);
        Ok(self.answer.clone())
    }
}

/// Chat model that always fails like an upstream outage
pub struct FailingModel;

#[async_trait]
impl ChatModel for FailingModel {
    async fn complete(&self, _messages: Vec<ChatMessage>) -> Result<String, LlmError> {
        Err(LlmError::Api {
            status: 503,
            message: "over capacity".to_string(),
        })
    }
}

pub fn doc(text: &str) -> RetrievedDocument {
    RetrievedDocument {
        id: "chunk".to_string(),
        score: 0.9,
        text: text.to_string(),
    }
}

/// App state over canned components
pub fn test_state(model: Arc<dyn ChatModel>, rate_limit_per_minute: usize) -> AppState {
    let retriever = Arc::new(CannedRetriever {
        documents: vec![doc("Acne is a common skin condition.")],
    });
    let chain = Arc::new(RagChain::new(retriever, model));
    let memory = Arc::new(MemoryStore::new(MemoryStoreConfig::default()));

    AppState::new(
        memory,
        chain,
        5,
        "all-MiniLM-L6-v2".to_string(),
        rate_limit_per_minute,
    )
}
