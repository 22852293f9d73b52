// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Embedding Model Manager
//!
//! Resolves the all-MiniLM-L6-v2 model files (local directory first, Hugging
//! Face Hub download otherwise), loads the ONNX model, and serves embed
//! requests through an LRU cache so repeated queries skip inference.

use crate::embeddings::OnnxEmbeddingModel;
use anyhow::{Context, Result};
use lru::LruCache;
use sha2::{Digest, Sha256};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Hub repository the index embeddings were built from
const DEFAULT_HF_REPO: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Configuration for loading the embedding model
#[derive(Debug, Clone)]
pub struct EmbeddingModelConfig {
    /// Model name (e.g., "all-MiniLM-L6-v2")
    pub name: String,
    /// Local directory expected to hold model.onnx + tokenizer.json
    pub model_dir: String,
    /// Hugging Face repo to download from when the local files are missing
    pub hf_repo: String,
    /// Number of embeddings kept in the LRU cache
    pub cache_size: usize,
}

impl Default for EmbeddingModelConfig {
    fn default() -> Self {
        Self {
            name: "all-MiniLM-L6-v2".to_string(),
            model_dir: "./models/all-MiniLM-L6-v2-onnx".to_string(),
            hf_repo: DEFAULT_HF_REPO.to_string(),
            cache_size: 1024,
        }
    }
}

/// Manager for the ONNX embedding model
///
/// Thread-safe and cheap to clone; the cache is shared across clones.
#[derive(Debug, Clone)]
pub struct EmbeddingModelManager {
    model: Arc<OnnxEmbeddingModel>,
    cache: Arc<Mutex<LruCache<[u8; 32], Vec<f32>>>>,
}

impl EmbeddingModelManager {
    /// Loads the embedding model, downloading files from the Hub if needed
    ///
    /// Mirrors the original deployment's startup behavior: the model is
    /// fetched once and reused for every request afterwards.
    pub async fn new(config: EmbeddingModelConfig) -> Result<Self> {
        let (model_path, tokenizer_path) = resolve_model_files(&config).await?;

        let model =
            OnnxEmbeddingModel::new(config.name.clone(), &model_path, &tokenizer_path).await?;

        info!(
            "Embedding model manager initialized: {} ({} dimensions, cache {})",
            model.model_name(),
            model.dimension(),
            config.cache_size
        );

        let cache_size = NonZeroUsize::new(config.cache_size.max(1)).unwrap();

        Ok(Self {
            model: Arc::new(model),
            cache: Arc::new(Mutex::new(LruCache::new(cache_size))),
        })
    }

    /// Embed a text, serving repeated inputs from the cache
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let key: [u8; 32] = Sha256::digest(text.as_bytes()).into();

        if let Some(cached) = self.cache.lock().unwrap().get(&key) {
            debug!("embedding cache hit");
            return Ok(cached.clone());
        }

        let embedding = self.model.embed(text).await?;
        self.cache.lock().unwrap().put(key, embedding.clone());

        Ok(embedding)
    }

    /// Output dimension of the managed model
    pub fn dimension(&self) -> usize {
        self.model.dimension()
    }

    /// Name of the managed model
    pub fn model_name(&self) -> &str {
        self.model.model_name()
    }

    /// Number of embeddings currently cached
    pub fn cache_len(&self) -> usize {
        self.cache.lock().unwrap().len()
    }
}

/// Find model.onnx + tokenizer.json locally, or pull them from the Hub
async fn resolve_model_files(config: &EmbeddingModelConfig) -> Result<(PathBuf, PathBuf)> {
    let dir = Path::new(&config.model_dir);
    let local_model = dir.join("model.onnx");
    let local_tokenizer = dir.join("tokenizer.json");

    if local_model.exists() && local_tokenizer.exists() {
        info!("Using local embedding model files from {}", dir.display());
        return Ok((local_model, local_tokenizer));
    }

    info!(
        "Embedding model files not found in {}, downloading from {}",
        dir.display(),
        config.hf_repo
    );

    let api = hf_hub::api::tokio::Api::new().context("Failed to create Hugging Face Hub API")?;
    let repo = api.model(config.hf_repo.clone());

    let model_path = repo
        .get("onnx/model.onnx")
        .await
        .with_context(|| format!("Failed to download onnx/model.onnx from {}", config.hf_repo))?;
    let tokenizer_path = repo
        .get("tokenizer.json")
        .await
        .with_context(|| format!("Failed to download tokenizer.json from {}", config.hf_repo))?;

    info!("✅ Embedding model downloaded");
    Ok((model_path, tokenizer_path))
}
