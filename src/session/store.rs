//! Session store gateway
//!
//! The authentication core only ever reads a record by ID and writes back its
//! mutable fields. Whatever persists the records sits behind [`SessionStore`].

use crate::models::{SessionRecord, SessionUpdate};
use anyhow::Context;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The record disappeared between lookup and update
    #[error("session {0} no longer exists")]
    Missing(String),

    /// Transport or backend failure
    #[error("{0}")]
    Backend(String),
}

/// Lookup and update of session records by their public identifier
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Fetch a session record, `Ok(None)` when no record has this ID
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached or fails
    async fn get_session_by_id(&self, id: &str) -> Result<Option<SessionRecord>, StoreError>;

    /// Overwrite the mutable fields of an existing record
    ///
    /// # Errors
    ///
    /// Returns an error if the record does not exist or the backend fails
    async fn update_session_by_id(&self, id: &str, update: &SessionUpdate)
        -> Result<(), StoreError>;
}

/// In-memory session store
///
/// Concurrent updates to the same record are last-write-wins.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, SessionRecord>>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a record
    pub async fn insert(&self, record: SessionRecord) {
        self.sessions
            .write()
            .await
            .insert(record.id.clone(), record);
    }

    /// Current copy of a record
    pub async fn get(&self, id: &str) -> Option<SessionRecord> {
        self.sessions.read().await.get(id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Build a store seeded from a JSON array of session records
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or does not contain a JSON
    /// array of session records
    pub async fn load_json_file(path: &Path) -> anyhow::Result<Self> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read session seed file {}", path.display()))?;
        let records: Vec<SessionRecord> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse session seed file {}", path.display()))?;

        let store = Self::new();
        for record in records {
            store.insert(record).await;
        }
        log::info!(
            "✓ Loaded {} session(s) from {}",
            store.len().await,
            path.display()
        );
        Ok(store)
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get_session_by_id(&self, id: &str) -> Result<Option<SessionRecord>, StoreError> {
        Ok(self.get(id).await)
    }

    async fn update_session_by_id(
        &self,
        id: &str,
        update: &SessionUpdate,
    ) -> Result<(), StoreError> {
        let mut sessions = self.sessions.write().await;
        let record = sessions
            .get_mut(id)
            .ok_or_else(|| StoreError::Missing(id.to_string()))?;
        record.apply(update);
        Ok(())
    }
}
