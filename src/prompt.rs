// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! System prompt assembly for the retrieval chain
//!
//! Retrieved document chunks are stuffed directly into the system prompt
//! ("stuff documents" strategy). The model is instructed to answer only from
//! that context and to say so when the context does not cover the question.

use crate::rag::RetrievedDocument;

/// Base system prompt for the medical assistant
pub const SYSTEM_PROMPT: &str = "You are a medical assistant for question-answering tasks. \
Use the following pieces of retrieved context to answer the question. \
If you don't know the answer, say that you don't know. \
Use three sentences maximum and keep the answer concise.";

/// Build the full system prompt with retrieved context stuffed in
///
/// Documents are separated by blank lines. When nothing was retrieved the
/// prompt states that explicitly rather than leaving the context section
/// empty, so the model doesn't hallucinate sources.
pub fn build_system_prompt(documents: &[RetrievedDocument]) -> String {
    let mut prompt = String::from(SYSTEM_PROMPT);
    prompt.push_str("\n\nContext:\n");

    if documents.is_empty() {
        prompt.push_str("(no relevant context was found)");
        return prompt;
    }

    for (i, doc) in documents.iter().enumerate() {
        if i > 0 {
            prompt.push_str("\n\n");
        }
        prompt.push_str(doc.text.trim());
    }

    prompt
}
