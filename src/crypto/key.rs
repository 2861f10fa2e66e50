//! The symmetric key shared by every cipher operation

use std::fmt;

use aes_gcm::aead::{rand_core::RngCore, OsRng};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{PrefsError, PrefsResult};

/// Size of an AES-256 key in bytes
pub const KEY_SIZE: usize = 32;

/// A 256-bit key that is zeroed when dropped
///
/// The key bytes never appear in `Debug` output or error messages.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct CryptoKey {
    key: [u8; KEY_SIZE],
}

impl CryptoKey {
    /// Generate a fresh random key from the OS RNG
    pub fn generate() -> Self {
        let mut key = [0u8; KEY_SIZE];
        OsRng.fill_bytes(&mut key);
        Self { key }
    }

    /// Build a key from exactly [`KEY_SIZE`] bytes
    pub fn from_slice(bytes: &[u8]) -> PrefsResult<Self> {
        if bytes.len() != KEY_SIZE {
            return Err(PrefsError::KeyProvisioning(format!(
                "Invalid key length: expected {}, got {}",
                KEY_SIZE,
                bytes.len()
            )));
        }

        let mut key = [0u8; KEY_SIZE];
        key.copy_from_slice(bytes);
        Ok(Self { key })
    }

    pub(crate) fn from_array(key: [u8; KEY_SIZE]) -> Self {
        Self { key }
    }

    /// Get the key bytes
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.key
    }
}

impl fmt::Debug for CryptoKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CryptoKey([REDACTED])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_keys_differ() {
        let a = CryptoKey::generate();
        let b = CryptoKey::generate();
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn test_from_slice_length_check() {
        assert!(CryptoKey::from_slice(&[7u8; KEY_SIZE]).is_ok());

        let err = CryptoKey::from_slice(&[7u8; 16]).unwrap_err();
        assert!(matches!(err, PrefsError::KeyProvisioning(_)));
    }

    #[test]
    fn test_debug_redacts_key() {
        let key = CryptoKey::from_slice(&[0xAB; KEY_SIZE]).unwrap();
        let debug = format!("{:?}", key);
        assert!(debug.contains("REDACTED"));
        assert!(!debug.to_lowercase().contains("ab, "));
        assert!(!debug.contains("171"));
    }

    #[test]
    fn test_zeroize_clears_bytes() {
        let mut key = CryptoKey::from_slice(&[0x5A; KEY_SIZE]).unwrap();
        key.zeroize();
        assert_eq!(key.as_bytes(), &[0u8; KEY_SIZE]);
    }
}
