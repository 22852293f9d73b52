// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

use super::errors::ChainError;
use super::Embedder;
use crate::vector::VectorIndex;

/// A document chunk pulled from the index for one query
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedDocument {
    pub id: String,
    pub score: f32,
    pub text: String,
}

/// Anything that can fetch context documents for a query
#[async_trait]
pub trait DocumentRetriever: Send + Sync {
    async fn retrieve(&self, query: &str) -> Result<Vec<RetrievedDocument>, ChainError>;
}

/// Similarity-search retriever over the hosted index
///
/// Embeds the query locally and asks the index for the `top_k` closest
/// chunks. Matches without text metadata are dropped - they carry nothing
/// the prompt could use.
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    top_k: usize,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>, top_k: usize) -> Self {
        Self {
            embedder,
            index,
            top_k,
        }
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }
}

#[async_trait]
impl DocumentRetriever for Retriever {
    async fn retrieve(&self, query: &str) -> Result<Vec<RetrievedDocument>, ChainError> {
        let vector = self
            .embedder
            .embed(query)
            .await
            .map_err(ChainError::Embedding)?;

        let matches = self
            .index
            .query(&vector, self.top_k)
            .await
            .map_err(ChainError::Retrieval)?;

        let mut documents = Vec::with_capacity(matches.len());
        for m in matches {
            let text = m
                .metadata
                .as_ref()
                .and_then(|metadata| metadata.get("text"))
                .and_then(|text| text.as_str());

            match text {
                Some(text) if !text.trim().is_empty() => documents.push(RetrievedDocument {
                    id: m.id,
                    score: m.score,
                    text: text.to_string(),
                }),
                _ => warn!(id = %m.id, "dropping match without text metadata"),
            }
        }

        debug!(query_len = query.len(), documents = documents.len(), "retrieval complete");
        Ok(documents)
    }
}
