// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use thiserror::Error;

use crate::llm::LlmError;

/// Failures along the retrieval chain, split by stage so the API layer can
/// map local inference problems and upstream outages to different statuses
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("embedding failed: {0}")]
    Embedding(#[source] anyhow::Error),

    #[error("retrieval failed: {0}")]
    Retrieval(#[source] anyhow::Error),

    #[error("generation failed: {0}")]
    Generation(#[from] LlmError),
}
