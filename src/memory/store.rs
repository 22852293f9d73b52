// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use super::session::{MemoryEntry, Role, SessionConfig, SessionMemory};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryStoreConfig {
    pub max_sessions: usize,
    pub session: SessionConfig,
    pub cleanup_interval_seconds: u64,
}

impl Default for MemoryStoreConfig {
    fn default() -> Self {
        Self {
            max_sessions: 1000,
            session: SessionConfig::default(),
            cleanup_interval_seconds: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreMetrics {
    pub total_sessions: usize,
    pub active_sessions: usize,
    pub total_entries: usize,
    pub total_memory_bytes: usize,
}

/// In-process memory map keyed by session id
///
/// Sessions never observe each other's turns. Everything here is volatile;
/// a restart forgets all conversations.
pub struct MemoryStore {
    config: MemoryStoreConfig,
    sessions: Arc<RwLock<HashMap<String, SessionMemory>>>,
}

impl MemoryStore {
    pub fn new(config: MemoryStoreConfig) -> Self {
        Self {
            config,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn cleanup_interval_seconds(&self) -> u64 {
        self.config.cleanup_interval_seconds
    }

    /// Create a session with a fresh id
    ///
    /// When the store is full, expired sessions are evicted first; if it is
    /// still full after that, creation fails.
    pub async fn create_session(&self) -> Result<String> {
        let mut sessions = self.sessions.write().await;

        if sessions.len() >= self.config.max_sessions {
            sessions.retain(|_, session| !session.is_expired());
        }
        if sessions.len() >= self.config.max_sessions {
            return Err(anyhow!("Maximum number of sessions reached"));
        }

        let session_id = SessionMemory::generate_id();
        let session = SessionMemory::new(session_id.clone(), self.config.session.clone());
        sessions.insert(session_id.clone(), session);

        debug!(session_id = %session_id, "session created");
        Ok(session_id)
    }

    /// True when the id names a live (non-expired) session
    pub async fn session_exists(&self, session_id: &str) -> bool {
        let sessions = self.sessions.read().await;
        sessions
            .get(session_id)
            .map(|session| !session.is_expired())
            .unwrap_or(false)
    }

    /// Store a turn in a session
    pub async fn put(&self, session_id: &str, role: Role, content: String) -> Result<()> {
        let mut sessions = self.sessions.write().await;

        match sessions.get_mut(session_id) {
            Some(session) => {
                session.put(role, content);
                Ok(())
            }
            None => Err(anyhow!("Session not found: {}", session_id)),
        }
    }

    /// The most recent `limit` turns of a session, oldest first
    ///
    /// Unknown sessions return an empty window rather than an error; the
    /// caller treats them as brand new conversations.
    pub async fn recent(&self, session_id: &str, limit: usize) -> Vec<MemoryEntry> {
        let sessions = self.sessions.read().await;
        sessions
            .get(session_id)
            .map(|session| session.recent(limit))
            .unwrap_or_default()
    }

    /// Mark a session as active
    pub async fn touch(&self, session_id: &str) {
        let mut sessions = self.sessions.write().await;
        if let Some(session) = sessions.get_mut(session_id) {
            session.touch();
        }
    }

    /// Drop a session and all its turns
    pub async fn destroy_session(&self, session_id: &str) -> bool {
        let mut sessions = self.sessions.write().await;
        sessions.remove(session_id).is_some()
    }

    /// Evict expired sessions, returning how many were dropped
    pub async fn cleanup_expired(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let initial_count = sessions.len();

        sessions.retain(|_, session| !session.is_expired());

        let removed = initial_count - sessions.len();
        if removed > 0 {
            debug!(removed, "expired sessions cleaned up");
        }
        removed
    }

    pub async fn session_count(&self) -> usize {
        let sessions = self.sessions.read().await;
        sessions.len()
    }

    pub async fn metrics(&self) -> StoreMetrics {
        let sessions = self.sessions.read().await;

        let mut total_entries = 0;
        let mut total_memory_bytes = 0;
        let mut active_sessions = 0;

        for session in sessions.values() {
            total_entries += session.entry_count();
            total_memory_bytes += session.memory_used();
            if !session.is_expired() {
                active_sessions += 1;
            }
        }

        StoreMetrics {
            total_sessions: sessions.len(),
            active_sessions,
            total_entries,
            total_memory_bytes,
        }
    }
}
