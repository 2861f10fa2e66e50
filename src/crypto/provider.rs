//! Key provisioning
//!
//! A [`KeyProvider`] supplies the single store key once at startup. The key
//! is never written next to the records it protects.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD, Engine};
use zeroize::Zeroizing;

use crate::encoding::TextEncoder;
use crate::error::{PrefsError, PrefsResult};

use super::cipher::Cipher;
use super::key::CryptoKey;
use super::key_derivation::{derive_key, KeyDerivationParams};
use super::secure_memory::SecureString;

const TRACING_TARGET: &str = "sealed_prefs::crypto";

/// Constant encrypted into the passphrase verification token
const VERIFY_PLAINTEXT: &[u8] = b"sealed_prefs_verify";

/// Source of the store key
pub trait KeyProvider {
    /// Load or create the key
    fn provide(&self) -> PrefsResult<CryptoKey>;
}

/// Holds an already available key
#[derive(Debug, Clone)]
pub struct StaticKeyProvider {
    key: CryptoKey,
}

impl StaticKeyProvider {
    pub fn new(key: CryptoKey) -> Self {
        Self { key }
    }
}

impl KeyProvider for StaticKeyProvider {
    fn provide(&self) -> PrefsResult<CryptoKey> {
        Ok(self.key.clone())
    }
}

/// Random key kept in its own file, generated on first use
#[derive(Debug, Clone)]
pub struct KeyFileProvider {
    path: PathBuf,
}

impl KeyFileProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the key file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> PrefsResult<CryptoKey> {
        let text = Zeroizing::new(fs::read_to_string(&self.path).map_err(|e| {
            PrefsError::KeyProvisioning(format!(
                "Failed to read key file {}: {}",
                self.path.display(),
                e
            ))
        })?);

        let bytes = Zeroizing::new(STANDARD.decode(text.trim()).map_err(|_| {
            PrefsError::KeyProvisioning(format!(
                "Key file {} is not valid base64",
                self.path.display()
            ))
        })?);

        CryptoKey::from_slice(&bytes)
    }

    fn create(&self) -> PrefsResult<CryptoKey> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                PrefsError::KeyProvisioning(format!(
                    "Failed to create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let key = CryptoKey::generate();
        let text = Zeroizing::new(STANDARD.encode(key.as_bytes()));

        let mut options = OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(&self.path).map_err(|e| {
            PrefsError::KeyProvisioning(format!(
                "Failed to create key file {}: {}",
                self.path.display(),
                e
            ))
        })?;
        file.write_all(text.as_bytes())
            .and_then(|_| file.sync_all())
            .map_err(|e| PrefsError::KeyProvisioning(format!("Failed to write key file: {}", e)))?;

        tracing::info!(
            target: TRACING_TARGET,
            path = %self.path.display(),
            "Generated new store key"
        );

        Ok(key)
    }
}

impl KeyProvider for KeyFileProvider {
    fn provide(&self) -> PrefsResult<CryptoKey> {
        if self.path.exists() {
            tracing::debug!(
                target: TRACING_TARGET,
                path = %self.path.display(),
                "Loading store key from key file"
            );
            self.load()
        } else {
            self.create()
        }
    }
}

/// Key derived from a passphrase with Argon2id
#[derive(Debug)]
pub struct PassphraseKeyProvider {
    passphrase: SecureString,
    params: KeyDerivationParams,
    verification: Option<String>,
}

impl PassphraseKeyProvider {
    pub fn new(passphrase: impl Into<SecureString>, params: KeyDerivationParams) -> Self {
        Self {
            passphrase: passphrase.into(),
            params,
            verification: None,
        }
    }

    /// Reject wrong passphrases against a token from [`create_verification_token`]
    pub fn with_verification(mut self, token: impl Into<String>) -> Self {
        self.verification = Some(token.into());
        self
    }
}

impl KeyProvider for PassphraseKeyProvider {
    fn provide(&self) -> PrefsResult<CryptoKey> {
        let key = derive_key(&self.passphrase, &self.params)?;

        if let Some(token) = &self.verification {
            let cipher = Cipher::new(key.clone());
            if !verify_token(&cipher, token)? {
                return Err(PrefsError::integrity("Incorrect passphrase"));
            }
        }

        Ok(key)
    }
}

/// Encrypt the verification constant under `cipher`, as base64 text
pub fn create_verification_token(cipher: &Cipher) -> PrefsResult<String> {
    let record = cipher.encrypt(VERIFY_PLAINTEXT)?;
    Ok(TextEncoder.to_text(&record))
}

fn verify_token(cipher: &Cipher, token: &str) -> PrefsResult<bool> {
    let record = TextEncoder.from_text(token)?;
    match cipher.decrypt(&record) {
        Ok(plaintext) => Ok(plaintext == VERIFY_PLAINTEXT),
        Err(e) if e.is_integrity() => Ok(false),
        Err(e) => Err(e),
    }
}
