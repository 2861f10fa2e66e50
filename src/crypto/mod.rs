//! Cryptographic functions for sealed-prefs
//!
//! Provides AES-256-GCM record encryption, the zeroize-on-drop store key,
//! and the providers that load, generate or derive (Argon2id) that key.

pub mod cipher;
pub mod key;
pub mod key_derivation;
pub mod provider;
pub mod secure_memory;

pub use cipher::Cipher;
pub use key::CryptoKey;
pub use key_derivation::{derive_key, KeyDerivationParams};
pub use provider::{
    create_verification_token, KeyFileProvider, KeyProvider, PassphraseKeyProvider,
    StaticKeyProvider,
};
pub use secure_memory::SecureString;
