//! JSON file backend
//!
//! All records live in one JSON document:
//!
//! ```json
//! { "version": 1, "entries": { "session.token": "AQ3f...", "count": "AZk1..." } }
//! ```
//!
//! Each mutation rewrites the document through [`write_json_atomic`], so a
//! crash or a cancelled future leaves either the old or the new document.
//! Mutations hold the lock from [`lock_exclusive`] across the whole
//! read-modify-write, so backends in other processes do not lose updates.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::{PrefsError, PrefsResult};

use super::file_io::{lock_exclusive, read_json, write_json_atomic, FileLock};
use super::PreferenceBackend;

const TRACING_TARGET: &str = "sealed_prefs::storage";

/// Current on-disk document version
const DOCUMENT_VERSION: u32 = 1;

/// Serializable records document
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RecordsDocument {
    #[serde(default = "default_version")]
    version: u32,
    #[serde(default)]
    entries: BTreeMap<String, String>,
}

fn default_version() -> u32 {
    DOCUMENT_VERSION
}

impl Default for RecordsDocument {
    fn default() -> Self {
        Self {
            version: DOCUMENT_VERSION,
            entries: BTreeMap::new(),
        }
    }
}

/// [`PreferenceBackend`] persisting to a single JSON file
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process, so only one
    /// task at a time waits on the file lock
    write_lock: Mutex<()>,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Path of the records file
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn lock(&self) -> PrefsResult<FileLock> {
        lock_exclusive(&self.path).await
    }

    async fn load(&self) -> PrefsResult<RecordsDocument> {
        let document: RecordsDocument = read_json(&self.path).await?;
        if document.version != DOCUMENT_VERSION {
            return Err(PrefsError::storage(format!(
                "Unsupported records file version {} in {}",
                document.version,
                self.path.display()
            )));
        }
        Ok(document)
    }
}

#[async_trait]
impl PreferenceBackend for FileBackend {
    async fn write(&self, key: &str, value: String) -> PrefsResult<()> {
        let _guard = self.write_lock.lock().await;
        let _file_lock = self.lock().await?;

        let mut document = self.load().await?;
        document.entries.insert(key.to_string(), value);
        write_json_atomic(&self.path, &document).await?;

        tracing::trace!(
            target: TRACING_TARGET,
            key,
            entries = document.entries.len(),
            "Records file updated"
        );
        Ok(())
    }

    async fn read(&self, key: &str) -> PrefsResult<Option<String>> {
        let mut document = self.load().await?;
        Ok(document.entries.remove(key))
    }

    async fn read_all(&self) -> PrefsResult<HashMap<String, String>> {
        let document = self.load().await?;
        Ok(document.entries.into_iter().collect())
    }

    async fn remove(&self, key: &str) -> PrefsResult<bool> {
        let _guard = self.write_lock.lock().await;
        let _file_lock = self.lock().await?;

        let mut document = self.load().await?;
        if document.entries.remove(key).is_none() {
            return Ok(false);
        }
        write_json_atomic(&self.path, &document).await?;
        Ok(true)
    }

    async fn replace_all(
        &self,
        expected: &HashMap<String, String>,
        entries: HashMap<String, String>,
    ) -> PrefsResult<()> {
        let _guard = self.write_lock.lock().await;
        let _file_lock = self.lock().await?;

        let mut document = self.load().await?;
        let unchanged = document.entries.len() == expected.len()
            && document
                .entries
                .iter()
                .all(|(key, value)| expected.get(key) == Some(value));
        if !unchanged {
            return Err(PrefsError::Conflict(format!(
                "Records in {} changed since they were read",
                self.path.display()
            )));
        }

        document.entries = entries.into_iter().collect();
        write_json_atomic(&self.path, &document).await?;

        tracing::debug!(
            target: TRACING_TARGET,
            entries = document.entries.len(),
            "Records file replaced"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_reads_empty() {
        let temp_dir = TempDir::new().unwrap();
        let backend = FileBackend::new(temp_dir.path().join("prefs.json"));

        assert_eq!(backend.read("anything").await.unwrap(), None);
        assert!(backend.read_all().await.unwrap().is_empty());
        assert!(!backend.remove("anything").await.unwrap());
        assert!(!backend.path().exists());
    }

    #[tokio::test]
    async fn test_persists_across_instances() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("prefs.json");

        FileBackend::new(&path)
            .write("theme", "dark".into())
            .await
            .unwrap();

        let reopened = FileBackend::new(&path);
        assert_eq!(reopened.read("theme").await.unwrap().as_deref(), Some("dark"));
    }

    #[tokio::test]
    async fn test_concurrent_writes_to_different_keys() {
        let temp_dir = TempDir::new().unwrap();
        let backend = Arc::new(FileBackend::new(temp_dir.path().join("prefs.json")));

        let mut handles = Vec::new();
        for i in 0..16 {
            let backend = Arc::clone(&backend);
            handles.push(tokio::spawn(async move {
                backend
                    .write(&format!("key{}", i), format!("value{}", i))
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let all = backend.read_all().await.unwrap();
        assert_eq!(all.len(), 16);
        assert_eq!(all.get("key7").map(String::as_str), Some("value7"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_two_backends_on_one_file_keep_every_write() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("prefs.json");
        let first = Arc::new(FileBackend::new(&path));
        let second = Arc::new(FileBackend::new(&path));

        let mut handles = Vec::new();
        for i in 0..40 {
            let backend = if i % 2 == 0 {
                Arc::clone(&first)
            } else {
                Arc::clone(&second)
            };
            handles.push(tokio::spawn(async move {
                backend
                    .write(&format!("key{}", i), format!("value{}", i))
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let all = FileBackend::new(&path).read_all().await.unwrap();
        assert_eq!(all.len(), 40);
        assert_eq!(all.get("key33").map(String::as_str), Some("value33"));
    }

    #[tokio::test]
    async fn test_replace_all_swaps_whole_map() {
        let temp_dir = TempDir::new().unwrap();
        let backend = FileBackend::new(temp_dir.path().join("prefs.json"));
        backend.write("a", "old".into()).await.unwrap();
        backend.write("gone", "x".into()).await.unwrap();
        let snapshot = backend.read_all().await.unwrap();

        let replacement = HashMap::from([("a".to_string(), "new".to_string())]);
        backend.replace_all(&snapshot, replacement).await.unwrap();

        let all = backend.read_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all.get("a").map(String::as_str), Some("new"));
    }

    #[tokio::test]
    async fn test_replace_all_refuses_stale_snapshot() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("prefs.json");
        let backend = FileBackend::new(&path);
        backend.write("a", "old".into()).await.unwrap();
        backend.write("b", "old".into()).await.unwrap();
        let snapshot = backend.read_all().await.unwrap();

        // Another writer removes a key in between
        assert!(FileBackend::new(&path).remove("b").await.unwrap());

        let replacement = HashMap::from([
            ("a".to_string(), "new".to_string()),
            ("b".to_string(), "new".to_string()),
        ]);
        let err = backend.replace_all(&snapshot, replacement).await.unwrap_err();
        assert!(err.is_conflict());

        let all = backend.read_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all.get("a").map(String::as_str), Some("old"));
    }

    #[tokio::test]
    async fn test_unknown_version_is_storage_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("prefs.json");
        std::fs::write(&path, r#"{"version": 9, "entries": {}}"#).unwrap();

        let err = FileBackend::new(&path).read("a").await.unwrap_err();
        assert!(err.is_storage_unavailable());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_unreadable_path_is_storage_error() {
        let temp_dir = TempDir::new().unwrap();
        // A directory where the file should be
        let path = temp_dir.path().join("prefs.json");
        std::fs::create_dir(&path).unwrap();

        let err = FileBackend::new(&path).read("a").await.unwrap_err();
        assert!(err.is_storage_unavailable());
    }
}
