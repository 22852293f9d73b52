// Vector module
// Client for the hosted Pinecone index that backs document retrieval

pub mod pinecone;

pub use pinecone::{IndexStats, PineconeClient, QueryMatch, UpsertVector};

/// Embedding dimension of the hosted index (all-MiniLM-L6-v2)
pub const EMBEDDING_DIMENSIONS: usize = 384;

use anyhow::Result;
use async_trait::async_trait;

/// Query interface over a hosted vector index
///
/// The chain depends on this trait rather than the concrete client so tests
/// can swap in an in-memory index.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<QueryMatch>>;
}

#[async_trait]
impl VectorIndex for PineconeClient {
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<QueryMatch>> {
        PineconeClient::query(self, vector, top_k).await
    }
}
