// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use uuid::Uuid;

use super::EMBEDDING_DIMENSIONS;

/// A single match returned by an index query
#[derive(Debug, Clone, Deserialize)]
pub struct QueryMatch {
    pub id: String,
    pub score: f32,
    #[serde(default)]
    pub metadata: Option<Value>,
}

/// A vector being written to the index
#[derive(Debug, Clone, Serialize)]
pub struct UpsertVector {
    pub id: String,
    pub values: Vec<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

/// Index statistics, used by the health check
#[derive(Debug, Clone, Deserialize)]
pub struct IndexStats {
    #[serde(default)]
    pub dimension: usize,
    #[serde(rename = "totalVectorCount", default)]
    pub total_vector_count: u64,
    #[serde(default)]
    pub namespaces: HashMap<String, Value>,
}

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    vector: &'a [f32],
    #[serde(rename = "topK")]
    top_k: usize,
    #[serde(rename = "includeMetadata")]
    include_metadata: bool,
    #[serde(skip_serializing_if = "str::is_empty")]
    namespace: &'a str,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Debug, Serialize)]
struct UpsertRequest<'a> {
    vectors: &'a [UpsertVector],
    #[serde(skip_serializing_if = "str::is_empty")]
    namespace: &'a str,
}

#[derive(Debug, Deserialize)]
struct UpsertResponse {
    #[serde(rename = "upsertedCount", default)]
    upserted_count: u64,
}

/// HTTP client for one Pinecone index
///
/// All calls go to the index host (not the control plane), authenticated with
/// the `Api-Key` header.
pub struct PineconeClient {
    client: Client,
    index_host: String,
    api_key: String,
    namespace: String,
}

impl PineconeClient {
    pub fn new(index_host: &str, api_key: &str, namespace: &str) -> Result<Self> {
        let _parsed_url =
            reqwest::Url::parse(index_host).map_err(|e| anyhow!("Invalid index host: {}", e))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            index_host: index_host.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            namespace: namespace.to_string(),
        })
    }

    /// Similarity search over the index
    ///
    /// Validates the query vector client-side so a malformed embedding fails
    /// before it reaches the wire.
    pub async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<QueryMatch>> {
        validate_vector(vector)?;

        let url = format!("{}/query", self.index_host);
        let request = QueryRequest {
            vector,
            top_k,
            include_metadata: true,
            namespace: &self.namespace,
        };

        let response = self
            .client
            .post(&url)
            .header("Api-Key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(anyhow!("Query failed ({}): {}", status, error_text));
        }

        let result = response.json::<QueryResponse>().await?;
        Ok(result.matches)
    }

    /// Write vectors into the index, assigning ids where missing
    pub async fn upsert(&self, mut vectors: Vec<UpsertVector>) -> Result<u64> {
        for vector in &mut vectors {
            validate_vector(&vector.values)?;
            if vector.id.is_empty() {
                vector.id = Uuid::new_v4().to_string();
            }
        }

        let url = format!("{}/vectors/upsert", self.index_host);
        let request = UpsertRequest {
            vectors: &vectors,
            namespace: &self.namespace,
        };

        let response = self
            .client
            .post(&url)
            .header("Api-Key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(anyhow!("Upsert failed ({}): {}", status, error_text));
        }

        let result = response.json::<UpsertResponse>().await?;
        Ok(result.upserted_count)
    }

    /// Fetch index statistics, used as the retrieval-side health check
    pub async fn describe_index_stats(&self) -> Result<IndexStats> {
        let url = format!("{}/describe_index_stats", self.index_host);
        let response = self
            .client
            .post(&url)
            .header("Api-Key", &self.api_key)
            .json(&serde_json::json!({}))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "Index stats failed with status: {}",
                response.status()
            ));
        }

        let result = response.json::<IndexStats>().await?;
        Ok(result)
    }
}

fn validate_vector(vector: &[f32]) -> Result<()> {
    if vector.len() != EMBEDDING_DIMENSIONS {
        return Err(anyhow!(
            "Invalid vector dimensions: expected {}, got {}",
            EMBEDDING_DIMENSIONS,
            vector.len()
        ));
    }

    if vector.iter().any(|v| v.is_nan() || v.is_infinite()) {
        return Err(anyhow!(
            "Invalid vector values: contains NaN or Infinity (all values must be finite numbers)"
        ));
    }

    Ok(())
}
