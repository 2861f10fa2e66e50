//! Backing key-value storage for stored records
//!
//! The preference store only needs an asynchronous map from keys to record
//! text. Ordering and atomicity are the backend's concern: a write must land
//! completely or not at all, and [`PreferenceBackend::replace_all`] must
//! compare and swap the whole map as one step.

pub mod file;
pub mod file_io;
pub mod memory;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::PrefsResult;

pub use file::FileBackend;
pub use file_io::{lock_exclusive, read_json, write_json_atomic, FileLock};
pub use memory::MemoryBackend;

/// Asynchronous key-value persistence for record text
///
/// Implementations report every I/O failure as
/// [`PrefsError::StorageUnavailable`](crate::error::PrefsError::StorageUnavailable).
#[async_trait]
pub trait PreferenceBackend: Send + Sync {
    /// Store `value` under `key`, replacing any previous value
    async fn write(&self, key: &str, value: String) -> PrefsResult<()>;

    /// Read the value stored under `key`
    async fn read(&self, key: &str) -> PrefsResult<Option<String>>;

    /// Read every entry
    async fn read_all(&self) -> PrefsResult<HashMap<String, String>>;

    /// Remove `key`, returning whether it was present
    async fn remove(&self, key: &str) -> PrefsResult<bool>;

    /// Replace the whole map with `entries`, provided it still equals `expected`
    ///
    /// The comparison and the replacement happen as one step. When the stored
    /// entries differ from `expected`, nothing is written and the call fails
    /// with [`PrefsError::Conflict`](crate::error::PrefsError::Conflict).
    async fn replace_all(
        &self,
        expected: &HashMap<String, String>,
        entries: HashMap<String, String>,
    ) -> PrefsResult<()>;
}

#[async_trait]
impl<B> PreferenceBackend for Arc<B>
where
    B: PreferenceBackend + ?Sized,
{
    async fn write(&self, key: &str, value: String) -> PrefsResult<()> {
        (**self).write(key, value).await
    }

    async fn read(&self, key: &str) -> PrefsResult<Option<String>> {
        (**self).read(key).await
    }

    async fn read_all(&self) -> PrefsResult<HashMap<String, String>> {
        (**self).read_all().await
    }

    async fn remove(&self, key: &str) -> PrefsResult<bool> {
        (**self).remove(key).await
    }

    async fn replace_all(
        &self,
        expected: &HashMap<String, String>,
        entries: HashMap<String, String>,
    ) -> PrefsResult<()> {
        (**self).replace_all(expected, entries).await
    }
}
