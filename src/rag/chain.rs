// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use std::sync::Arc;
use tracing::{debug, info};

use super::errors::ChainError;
use super::retriever::{DocumentRetriever, RetrievedDocument};
use super::ChatModel;
use crate::llm::ChatMessage;
use crate::prompt::build_system_prompt;

/// Result of one chain invocation
#[derive(Debug, Clone)]
pub struct RagAnswer {
    pub answer: String,
    pub documents: Vec<RetrievedDocument>,
}

/// The retrieval + generation chain
///
/// Rust rendition of a retrieval chain over a stuff-documents combiner:
/// retrieve context for the input, stuff it into the system prompt, run one
/// completion round-trip. Zero retrieved documents is not an error - the
/// prompt then tells the model no context was found.
pub struct RagChain {
    retriever: Arc<dyn DocumentRetriever>,
    model: Arc<dyn ChatModel>,
}

impl RagChain {
    pub fn new(retriever: Arc<dyn DocumentRetriever>, model: Arc<dyn ChatModel>) -> Self {
        Self { retriever, model }
    }

    /// Run the chain over a memory-augmented input and return the answer
    pub async fn invoke(&self, input: &str) -> Result<RagAnswer, ChainError> {
        let documents = self.retriever.retrieve(input).await?;
        debug!(documents = documents.len(), "context retrieved");

        let system_prompt = build_system_prompt(&documents);
        let messages = vec![
            ChatMessage::system(system_prompt),
            ChatMessage::user(input),
        ];

        let answer = self.model.complete(messages).await?;
        info!(
            answer_len = answer.len(),
            documents = documents.len(),
            "chain invocation complete"
        );

        Ok(RagAnswer { answer, documents })
    }
}
