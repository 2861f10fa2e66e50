//! In-memory backend
//!
//! Holds records in a map behind an async lock. Nothing survives the
//! process; useful for tests and ephemeral stores.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{PrefsError, PrefsResult};

use super::PreferenceBackend;

/// Map-backed [`PreferenceBackend`]
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl PreferenceBackend for MemoryBackend {
    async fn write(&self, key: &str, value: String) -> PrefsResult<()> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn read(&self, key: &str) -> PrefsResult<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn read_all(&self) -> PrefsResult<HashMap<String, String>> {
        Ok(self.entries.read().await.clone())
    }

    async fn remove(&self, key: &str) -> PrefsResult<bool> {
        Ok(self.entries.write().await.remove(key).is_some())
    }

    async fn replace_all(
        &self,
        expected: &HashMap<String, String>,
        entries: HashMap<String, String>,
    ) -> PrefsResult<()> {
        let mut current = self.entries.write().await;
        if *current != *expected {
            return Err(PrefsError::Conflict(
                "Stored entries changed since they were read".to_string(),
            ));
        }
        *current = entries;
        Ok(())
    }
}
