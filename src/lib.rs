//! sealed-prefs - Encrypted local preference store
//!
//! Persists arbitrary typed values under string keys. Values are serialized,
//! encrypted with AES-256-GCM and base64-encoded before they reach the
//! backing store, and go through the inverse on read. Callers only ever see
//! their own types.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `codec`: Typed value serialization (JSON)
//! - `crypto`: Record cipher, store key and key providers
//! - `encoding`: Binary-to-text transport encoding (base64)
//! - `storage`: Asynchronous backing stores (memory, JSON file)
//! - `store`: The encrypted preference store
//! - `config`: Path resolution and key provisioning settings
//! - `export`: Decrypted JSON/YAML snapshots
//! - `cli`: Command handlers for the `sealed-prefs` binary
//! - `error`: Custom error types
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use sealed_prefs::{Cipher, EncryptedPreferenceStore, FileBackend, KeyFileProvider, KeyProvider};
//!
//! let key = KeyFileProvider::new("/var/lib/app/master.key").provide()?;
//! let store = EncryptedPreferenceStore::new(
//!     FileBackend::new("/var/lib/app/prefs.json"),
//!     Arc::new(Cipher::new(key)),
//! );
//!
//! store.save("count", &42).await?;
//! assert_eq!(store.retrieve::<i32>("count").await?, Some(42));
//! ```

pub mod cli;
pub mod codec;
pub mod config;
pub mod crypto;
pub mod encoding;
pub mod error;
pub mod export;
pub mod storage;
pub mod store;

pub use codec::{Codec, JsonCodec};
pub use crypto::{
    Cipher, CryptoKey, KeyFileProvider, KeyProvider, PassphraseKeyProvider, StaticKeyProvider,
};
pub use encoding::TextEncoder;
pub use error::{PrefsError, PrefsResult};
pub use storage::{FileBackend, MemoryBackend, PreferenceBackend};
pub use store::EncryptedPreferenceStore;
