//! AES-256-GCM record cipher
//!
//! Every encryption draws a fresh 96-bit nonce from the OS RNG. The output is
//! self-contained:
//!
//! ```text
//! version (1) || nonce (12) || ciphertext + tag (n + 16)
//! ```
//!
//! The version byte is bound to the ciphertext as associated data, so no
//! byte of a record can change without failing authentication.

use std::fmt;

use aes_gcm::{
    aead::{rand_core::RngCore, Aead, KeyInit, OsRng, Payload},
    Aes256Gcm, Key, Nonce,
};

use crate::error::{PrefsError, PrefsResult};

use super::CryptoKey;

/// Size of the AES-GCM nonce in bytes (96 bits)
pub const NONCE_SIZE: usize = 12;

/// Size of the AES-GCM authentication tag in bytes
pub const TAG_SIZE: usize = 16;

/// Current record format version
pub const RECORD_VERSION: u8 = 1;

/// Smallest possible encrypted record (empty plaintext)
pub const MIN_RECORD_SIZE: usize = 1 + NONCE_SIZE + TAG_SIZE;

/// Authenticated symmetric cipher over the process-wide key
///
/// The AES key schedule is expanded once here and zeroized when the cipher
/// is dropped. The raw key is not kept.
pub struct Cipher {
    aead: Aes256Gcm,
}

impl Cipher {
    /// Create a cipher from `key`, consuming it
    pub fn new(key: CryptoKey) -> Self {
        let aead = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));
        Self { aead }
    }

    /// Encrypt plaintext into a self-contained record
    pub fn encrypt(&self, plaintext: &[u8]) -> PrefsResult<Vec<u8>> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let header = [RECORD_VERSION];
        let ciphertext = self
            .aead
            .encrypt(
                nonce,
                Payload {
                    msg: plaintext,
                    aad: &header,
                },
            )
            .map_err(|_| PrefsError::integrity("Encryption failed"))?;

        let mut record = Vec::with_capacity(1 + NONCE_SIZE + ciphertext.len());
        record.push(RECORD_VERSION);
        record.extend_from_slice(&nonce_bytes);
        record.extend_from_slice(&ciphertext);
        Ok(record)
    }

    /// Decrypt a record produced by [`Cipher::encrypt`]
    ///
    /// A record too short to hold a header and tag is [`PrefsError::MalformedData`].
    /// Anything else that fails to authenticate, including an unknown version
    /// byte, is [`PrefsError::Integrity`].
    pub fn decrypt(&self, record: &[u8]) -> PrefsResult<Vec<u8>> {
        if record.len() < MIN_RECORD_SIZE {
            return Err(PrefsError::malformed(format!(
                "Encrypted record too short: expected at least {} bytes, got {}",
                MIN_RECORD_SIZE,
                record.len()
            )));
        }

        let (header, rest) = record.split_at(1);
        if header[0] != RECORD_VERSION {
            return Err(PrefsError::integrity(format!(
                "Unsupported record version: {}",
                header[0]
            )));
        }

        let (nonce_bytes, ciphertext) = rest.split_at(NONCE_SIZE);
        let nonce = Nonce::from_slice(nonce_bytes);

        self.aead
            .decrypt(
                nonce,
                Payload {
                    msg: ciphertext,
                    aad: header,
                },
            )
            .map_err(|_| PrefsError::integrity("Decryption failed: invalid key or corrupted data"))
    }
}

impl fmt::Debug for Cipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cipher")
            .field("algorithm", &"AES-256-GCM")
            .finish_non_exhaustive()
    }
}
