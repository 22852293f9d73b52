// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use crate::memory::MemoryEntry;

/// Build the chain input by concatenating session memory with the new message
///
/// Prior turns are joined with single spaces and the new message is appended,
/// so the retrieval query carries the short-term conversational context.
/// With no prior turns the message is passed through unchanged.
pub fn build_input_with_context(context: &[MemoryEntry], message: &str) -> String {
    let context_text = context
        .iter()
        .map(|entry| entry.content.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    if context_text.is_empty() {
        message.to_string()
    } else {
        format!("{} {}", context_text, message)
    }
}

/// Estimate token count for a memory window
///
/// Rough 4-chars-per-token heuristic, used only for logging and limits.
pub fn count_context_tokens(context: &[MemoryEntry]) -> usize {
    context
        .iter()
        .map(|entry| (entry.content.len() + entry.role.as_str().len()) / 4)
        .sum()
}

/// Check if a memory window is within a token budget
pub fn is_context_within_limits(context: &[MemoryEntry], max_tokens: usize) -> bool {
    count_context_tokens(context) <= max_tokens
}
