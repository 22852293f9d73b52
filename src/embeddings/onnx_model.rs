// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! ONNX Embedding Model Wrapper
//!
//! Wraps ONNX Runtime for running the all-MiniLM-L6-v2 sentence transformer:
//! BERT tokenization, CPU inference, attention-mask mean pooling and L2
//! normalization into 384-dimensional vectors. The same model built the
//! hosted index, so query vectors are directly comparable.

use anyhow::{Context, Result};
use ndarray::{Array2, Axis, Ix2};
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokenizers::{Tokenizer, TruncationParams};
use tracing::info;

use crate::vector::EMBEDDING_DIMENSIONS;

/// Maximum input length of all-MiniLM-L6-v2
const MAX_SEQUENCE_LENGTH: usize = 256;

/// ONNX-based embedding model (all-MiniLM-L6-v2)
///
/// All fields are wrapped in Arc for cheap cloning and thread-safe sharing.
#[derive(Clone)]
pub struct OnnxEmbeddingModel {
    /// ONNX Runtime session (Mutex because Session::run takes &mut self)
    session: Arc<Mutex<Session>>,

    /// BERT tokenizer
    tokenizer: Arc<Tokenizer>,

    /// Model name (e.g., "all-MiniLM-L6-v2")
    model_name: String,

    /// Output dimension (384 for all-MiniLM-L6-v2)
    dimension: usize,
}

impl std::fmt::Debug for OnnxEmbeddingModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxEmbeddingModel")
            .field("model_name", &self.model_name)
            .field("dimension", &self.dimension)
            .finish_non_exhaustive()
    }
}

impl OnnxEmbeddingModel {
    /// Creates a new ONNX embedding model from disk paths
    ///
    /// Runs a probe inference at load time so a wrong model file fails here
    /// instead of on the first chat request.
    pub async fn new<P: AsRef<Path>>(
        model_name: impl Into<String>,
        model_path: P,
        tokenizer_path: P,
    ) -> Result<Self> {
        let model_name = model_name.into();
        let model_path = model_path.as_ref();
        let tokenizer_path = tokenizer_path.as_ref();

        if !model_path.exists() {
            anyhow::bail!("ONNX model file not found: {}", model_path.display());
        }
        if !tokenizer_path.exists() {
            anyhow::bail!("Tokenizer file not found: {}", tokenizer_path.display());
        }

        let mut session = Session::builder()
            .context("Failed to create session builder")?
            .with_execution_providers([CPUExecutionProvider::default().build()])
            .context("Failed to set CPU execution provider")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .context("Failed to set optimization level")?
            .with_intra_threads(4)
            .context("Failed to set intra threads")?
            .commit_from_file(model_path)
            .context(format!(
                "Failed to load ONNX model from {}",
                model_path.display()
            ))?;

        info!("✅ ONNX embedding model loaded: {}", model_name);

        let mut tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {}", e))?;

        // Bound inputs to the model's maximum sequence length
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MAX_SEQUENCE_LENGTH,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("Failed to configure truncation: {}", e))?;

        // Probe inference: the model must output [batch, seq_len, 384]
        {
            let encoding = tokenizer
                .encode("validation test", true)
                .map_err(|e| anyhow::anyhow!("Tokenizer validation failed: {}", e))?;

            let (ids, mask, token_types) = build_inputs(
                &[encoding.get_ids().to_vec()],
                &[encoding.get_attention_mask().to_vec()],
            )?;
            let outputs = session.run(ort::inputs![
                "input_ids" => Value::from_array(ids)?,
                "attention_mask" => Value::from_array(mask)?,
                "token_type_ids" => Value::from_array(token_types)?
            ])?;

            let output_tensor = outputs[0]
                .try_extract_array::<f32>()
                .context("Failed to extract output tensor")?;
            let output_shape = output_tensor.shape();

            if output_shape.len() != 3 || output_shape[2] != EMBEDDING_DIMENSIONS {
                anyhow::bail!(
                    "Model outputs unexpected dimensions: {:?} (expected [batch, seq_len, {}])",
                    output_shape,
                    EMBEDDING_DIMENSIONS
                );
            }
        } // outputs dropped here

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
            model_name,
            dimension: EMBEDDING_DIMENSIONS,
        })
    }

    /// Generates an embedding for a single text
    ///
    /// Tokenize, run the session, mean-pool token embeddings weighted by the
    /// attention mask, then L2-normalize so cosine scores are well-behaved.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))?;

        let input_ids = encoding.get_ids().to_vec();
        let attention_mask = encoding.get_attention_mask().to_vec();

        let (ids, mask, token_types) =
            build_inputs(&[input_ids], std::slice::from_ref(&attention_mask))?;

        let mut session_guard = self.session.lock().unwrap();
        let outputs = session_guard.run(ort::inputs![
            "input_ids" => Value::from_array(ids)?,
            "attention_mask" => Value::from_array(mask)?,
            "token_type_ids" => Value::from_array(token_types)?
        ])?;

        let output_array = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract output tensor")?;

        // [batch, seq_len, hidden_dim] -> [seq_len, hidden_dim]
        let token_embeddings = output_array
            .index_axis(Axis(0), 0)
            .to_owned()
            .into_dimensionality::<Ix2>()
            .context("Unexpected output tensor rank")?;
        let mut embedding = mean_pool(&token_embeddings, &attention_mask);
        l2_normalize(&mut embedding);

        if embedding.len() != self.dimension {
            anyhow::bail!(
                "Unexpected embedding dimension: {} (expected {})",
                embedding.len(),
                self.dimension
            );
        }

        Ok(embedding)
    }

    /// Counts tokens in a text string (non-padding only)
    pub async fn count_tokens(&self, text: &str) -> Result<usize> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))?;

        Ok(encoding
            .get_attention_mask()
            .iter()
            .map(|&m| m as usize)
            .sum())
    }

    /// Returns the output dimension of this model
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Returns the model name
    pub fn model_name(&self) -> &str {
        &self.model_name
    }
}

/// Build the BERT-style three-input tensors from already-tokenized sequences
#[allow(clippy::type_complexity)]
fn build_inputs(
    input_ids: &[Vec<u32>],
    attention_masks: &[Vec<u32>],
) -> Result<(Array2<i64>, Array2<i64>, Array2<i64>)> {
    let batch = input_ids.len();
    let seq_len = input_ids.first().map(|ids| ids.len()).unwrap_or(0);

    let ids: Vec<i64> = input_ids
        .iter()
        .flat_map(|row| row.iter().map(|&id| id as i64))
        .collect();
    let mask: Vec<i64> = attention_masks
        .iter()
        .flat_map(|row| row.iter().map(|&m| m as i64))
        .collect();
    let token_type_ids = vec![0i64; batch * seq_len];

    let input_ids_array = Array2::from_shape_vec((batch, seq_len), ids)
        .context("Failed to create input_ids array")?;
    let attention_mask_array = Array2::from_shape_vec((batch, seq_len), mask)
        .context("Failed to create attention_mask array")?;
    let token_type_ids_array = Array2::from_shape_vec((batch, seq_len), token_type_ids)
        .context("Failed to create token_type_ids array")?;

    Ok((input_ids_array, attention_mask_array, token_type_ids_array))
}

/// Mean pooling over the sequence dimension, weighted by the attention mask
/// so padding tokens don't dilute the sentence vector
fn mean_pool(token_embeddings: &Array2<f32>, attention_mask: &[u32]) -> Vec<f32> {
    let seq_len = token_embeddings.shape()[0];
    let hidden_dim = token_embeddings.shape()[1];

    let mut pooled = vec![0.0f32; hidden_dim];
    let mut sum_mask = 0.0f32;

    for i in 0..seq_len {
        let mask_value = attention_mask.get(i).copied().unwrap_or(0) as f32;
        sum_mask += mask_value;
        for j in 0..hidden_dim {
            pooled[j] += token_embeddings[[i, j]] * mask_value;
        }
    }

    for value in &mut pooled {
        *value /= sum_mask.max(1e-9);
    }

    pooled
}

/// L2-normalize in place; zero vectors are left untouched
fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in vector.iter_mut() {
            *value /= norm;
        }
    }
}
