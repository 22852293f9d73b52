// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use uuid::Uuid;

/// Who produced a conversational turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One stored conversational turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl MemoryEntry {
    pub fn new(role: Role, content: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content,
            created_at: Utc::now(),
        }
    }
}

/// Per-session memory limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Turns kept per session; the oldest is dropped when full
    pub max_entries: usize,
    /// Idle seconds after which the session expires
    pub timeout_seconds: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_entries: 100,
            timeout_seconds: 1800, // 30 minutes
        }
    }
}

/// Counters reported per session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionMetrics {
    pub total_entries: usize,
    pub user_entries: usize,
    pub assistant_entries: usize,
    pub memory_bytes: usize,
}

/// Conversational memory for a single browser session
///
/// Entries are ordered oldest to newest. Memory is volatile: nothing
/// survives the process, and expiry drops the whole session.
#[derive(Debug, Clone)]
pub struct SessionMemory {
    id: String,
    config: SessionConfig,
    entries: Vec<MemoryEntry>,
    created_at: Instant,
    last_activity: Instant,
    total_memory_used: usize,
}

impl SessionMemory {
    pub fn new(id: String, config: SessionConfig) -> Self {
        Self {
            id,
            config,
            entries: Vec::new(),
            created_at: Instant::now(),
            last_activity: Instant::now(),
            total_memory_used: 0,
        }
    }

    pub fn generate_id() -> String {
        Uuid::new_v4().to_string()
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// Store a turn, evicting the oldest when the session is full
    pub fn put(&mut self, role: Role, content: String) -> Uuid {
        if self.entries.len() >= self.config.max_entries {
            let evicted = self.entries.remove(0);
            self.total_memory_used = self
                .total_memory_used
                .saturating_sub(Self::entry_size(&evicted));
        }

        let entry = MemoryEntry::new(role, content);
        let entry_id = entry.id;
        self.total_memory_used += Self::entry_size(&entry);
        self.entries.push(entry);
        self.last_activity = Instant::now();

        entry_id
    }

    /// The most recent `limit` turns, oldest first
    pub fn recent(&self, limit: usize) -> Vec<MemoryEntry> {
        let len = self.entries.len();
        if len <= limit {
            self.entries.clone()
        } else {
            self.entries[len - limit..].to_vec()
        }
    }

    /// Mark the session as active without storing anything
    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.total_memory_used = 0;
        self.last_activity = Instant::now();
    }

    pub fn is_expired(&self) -> bool {
        self.last_activity.elapsed().as_secs() > self.config.timeout_seconds
    }

    pub fn memory_used(&self) -> usize {
        self.total_memory_used
    }

    pub fn metrics(&self) -> SessionMetrics {
        let mut user_entries = 0;
        let mut assistant_entries = 0;

        for entry in &self.entries {
            match entry.role {
                Role::User => user_entries += 1,
                Role::Assistant => assistant_entries += 1,
            }
        }

        SessionMetrics {
            total_entries: self.entries.len(),
            user_entries,
            assistant_entries,
            memory_bytes: self.total_memory_used,
        }
    }

    fn entry_size(entry: &MemoryEntry) -> usize {
        std::mem::size_of::<MemoryEntry>() + entry.content.len()
    }
}
