//! Encrypted preference store
//!
//! Persists typed values under string keys. Values pass through the codec,
//! the cipher and the text encoder before reaching the backend:
//!
//! ```text
//! save:     value -> Codec::encode -> Cipher::encrypt -> TextEncoder::to_text -> backend.write
//! retrieve: backend.read -> TextEncoder::from_text -> Cipher::decrypt -> Codec::decode -> value
//! ```
//!
//! The store holds no per-key state and adds no locking. Concurrent saves of
//! the same key are last-write-wins as decided by the backend.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use sealed_prefs::{Cipher, CryptoKey, EncryptedPreferenceStore, MemoryBackend};
//!
//! let cipher = Arc::new(Cipher::new(CryptoKey::generate()));
//! let store = EncryptedPreferenceStore::new(MemoryBackend::new(), cipher);
//!
//! store.save("session.token", "abc123").await?;
//! let token: Option<String> = store.retrieve("session.token").await?;
//! ```

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Instant;

use serde::{de::DeserializeOwned, Serialize};

use crate::codec::{Codec, JsonCodec};
use crate::crypto::Cipher;
use crate::encoding::TextEncoder;
use crate::error::{PrefsError, PrefsResult};
use crate::storage::PreferenceBackend;

const TRACING_TARGET: &str = "sealed_prefs::store";

/// Typed, encrypted key-value store over a [`PreferenceBackend`]
pub struct EncryptedPreferenceStore<B, C = JsonCodec> {
    backend: B,
    cipher: Arc<Cipher>,
    codec: C,
    encoder: TextEncoder,
}

impl<B> EncryptedPreferenceStore<B, JsonCodec>
where
    B: PreferenceBackend,
{
    /// Create a store using the JSON codec
    pub fn new(backend: B, cipher: Arc<Cipher>) -> Self {
        Self::with_codec(backend, cipher, JsonCodec)
    }
}

impl<B, C> EncryptedPreferenceStore<B, C>
where
    B: PreferenceBackend,
    C: Codec,
{
    /// Create a store with an explicit codec
    pub fn with_codec(backend: B, cipher: Arc<Cipher>, codec: C) -> Self {
        Self {
            backend,
            cipher,
            codec,
            encoder: TextEncoder,
        }
    }

    /// The backing store
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Turn a value into its stored record text
    fn seal<T>(&self, value: &T) -> PrefsResult<String>
    where
        T: Serialize + ?Sized,
    {
        let bytes = self.codec.encode(value)?;
        let record = self.cipher.encrypt(&bytes)?;
        Ok(self.encoder.to_text(&record))
    }

    /// Turn stored record text back into plaintext bytes
    fn open(&self, text: &str) -> PrefsResult<Vec<u8>> {
        let record = self.encoder.from_text(text)?;
        self.cipher.decrypt(&record)
    }

    /// Encrypt and persist `value` under `key`
    pub async fn save<T>(&self, key: &str, value: &T) -> PrefsResult<()>
    where
        T: Serialize + ?Sized,
    {
        let started_at = Instant::now();
        let text = self.seal(value)?;
        let record_len = text.len();

        self.backend.write(key, text).await.map_err(|e| {
            log_failure(key, "save", &e);
            e
        })?;

        tracing::debug!(
            target: TRACING_TARGET,
            key,
            record_len,
            elapsed_ms = started_at.elapsed().as_millis(),
            "Preference saved"
        );
        Ok(())
    }

    /// Read and decrypt the value under `key`
    ///
    /// Returns `Ok(None)` when the key was never saved. A record that exists
    /// but cannot be decoded is an error, never `None`.
    pub async fn retrieve<T>(&self, key: &str) -> PrefsResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        let Some(text) = self.backend.read(key).await.map_err(|e| {
            log_failure(key, "retrieve", &e);
            e
        })?
        else {
            tracing::trace!(target: TRACING_TARGET, key, "Preference absent");
            return Ok(None);
        };

        let value = self
            .open(&text)
            .and_then(|bytes| self.codec.decode(&bytes))
            .map_err(|e| {
                log_failure(key, "retrieve", &e);
                e
            })?;

        tracing::debug!(target: TRACING_TARGET, key, "Preference retrieved");
        Ok(Some(value))
    }

    /// Like [`retrieve`](Self::retrieve) but falls back to `default` when absent
    pub async fn retrieve_or<T>(&self, key: &str, default: T) -> PrefsResult<T>
    where
        T: DeserializeOwned,
    {
        Ok(self.retrieve(key).await?.unwrap_or(default))
    }

    /// Delete the record under `key`, returning whether one existed
    pub async fn remove(&self, key: &str) -> PrefsResult<bool> {
        let removed = self.backend.remove(key).await?;
        tracing::debug!(target: TRACING_TARGET, key, removed, "Preference removed");
        Ok(removed)
    }

    /// Whether a record exists under `key`
    pub async fn contains(&self, key: &str) -> PrefsResult<bool> {
        Ok(self.backend.read(key).await?.is_some())
    }

    /// All stored keys, sorted
    pub async fn keys(&self) -> PrefsResult<Vec<String>> {
        let mut keys: Vec<String> = self.backend.read_all().await?.into_keys().collect();
        keys.sort();
        Ok(keys)
    }

    /// Decrypt every record into a generic JSON value
    ///
    /// Fails on the first record that cannot be opened or decoded.
    pub async fn export_values(&self) -> PrefsResult<BTreeMap<String, serde_json::Value>> {
        let entries = self.backend.read_all().await?;

        let mut values = BTreeMap::new();
        for (key, text) in entries {
            let value: serde_json::Value = self
                .open(&text)
                .and_then(|bytes| self.codec.decode(&bytes))
                .map_err(|e| {
                    log_failure(&key, "export", &e);
                    e
                })?;
            values.insert(key, value);
        }
        Ok(values)
    }

    /// Re-encrypt every record under `new_cipher`
    ///
    /// All records are opened with the current key before anything is
    /// written, so a record that fails to authenticate aborts the whole
    /// operation with no record changed. The new records replace the old
    /// ones in a single [`PreferenceBackend::replace_all`]; if any record was
    /// saved or removed in the meantime this fails with
    /// [`PrefsError::Conflict`] and nothing is written. Returns the number of
    /// records rewritten.
    ///
    /// The store keeps its current cipher; build a new store with
    /// `new_cipher` afterwards.
    pub async fn rekey(&self, new_cipher: &Cipher) -> PrefsResult<usize> {
        let snapshot = self.backend.read_all().await?;

        let mut resealed = HashMap::with_capacity(snapshot.len());
        for (key, text) in &snapshot {
            let plaintext = self.open(text).map_err(|e| {
                log_failure(key, "rekey", &e);
                e
            })?;
            let record = new_cipher.encrypt(&plaintext)?;
            resealed.insert(key.clone(), self.encoder.to_text(&record));
        }

        let count = resealed.len();
        self.backend
            .replace_all(&snapshot, resealed)
            .await
            .map_err(|e| {
                tracing::warn!(target: TRACING_TARGET, kind = e.kind(), "Re-encryption not applied");
                e
            })?;

        tracing::info!(target: TRACING_TARGET, records = count, "Store re-encrypted");
        Ok(count)
    }
}

fn log_failure(key: &str, operation: &'static str, error: &PrefsError) {
    match error {
        PrefsError::Integrity(_) => tracing::warn!(
            target: TRACING_TARGET,
            key,
            operation,
            kind = error.kind(),
            "Record failed authentication"
        ),
        _ => tracing::debug!(
            target: TRACING_TARGET,
            key,
            operation,
            kind = error.kind(),
            error = %error,
            "Preference operation failed"
        ),
    }
}
