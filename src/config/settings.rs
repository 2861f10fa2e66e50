//! User settings for sealed-prefs
//!
//! Records how the store key is provisioned. The key itself is never written
//! here; only the Argon2 parameters and the passphrase verification token.

use serde::{Deserialize, Serialize};

use super::paths::PrefsPaths;
use crate::crypto::key_derivation::KeyDerivationParams;
use crate::error::PrefsError;

/// Where the store key comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum KeySource {
    /// Random key kept in `master.key` (default)
    #[default]
    KeyFile,
    /// Key derived from a passphrase with Argon2id
    Passphrase,
}

/// Passphrase settings, present when `key_source` is `passphrase`
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PassphraseSettings {
    /// Key derivation parameters (salt, memory cost, etc.)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_params: Option<KeyDerivationParams>,

    /// Encrypted constant used to reject a wrong passphrase
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_token: Option<String>,
}

/// User settings for sealed-prefs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// How the store key is provisioned
    #[serde(default)]
    pub key_source: KeySource,

    /// Passphrase derivation settings
    #[serde(default)]
    pub passphrase: PassphraseSettings,
}

fn default_schema_version() -> u32 {
    1
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            key_source: KeySource::default(),
            passphrase: PassphraseSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or create default settings if file doesn't exist
    pub fn load_or_create(paths: &PrefsPaths) -> Result<Self, PrefsError> {
        let settings_path = paths.settings_file();

        if settings_path.exists() {
            let contents = std::fs::read_to_string(&settings_path)
                .map_err(|e| PrefsError::Io(format!("Failed to read settings file: {}", e)))?;

            let settings: Settings = serde_json::from_str(&contents).map_err(|e| {
                PrefsError::Config(format!("Failed to parse settings file: {}", e))
            })?;

            Ok(settings)
        } else {
            // Don't save yet - let caller decide when to persist
            Ok(Settings::default())
        }
    }

    /// Save settings to disk
    pub fn save(&self, paths: &PrefsPaths) -> Result<(), PrefsError> {
        paths.ensure_directories()?;

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| PrefsError::Config(format!("Failed to serialize settings: {}", e)))?;

        std::fs::write(paths.settings_file(), contents)
            .map_err(|e| PrefsError::Io(format!("Failed to write settings file: {}", e)))?;

        Ok(())
    }

    /// Check if the key is passphrase-derived
    pub fn uses_passphrase(&self) -> bool {
        self.key_source == KeySource::Passphrase
    }

    /// Key derivation parameters, required when a passphrase is used
    pub fn key_params(&self) -> Result<&KeyDerivationParams, PrefsError> {
        self.passphrase
            .key_params
            .as_ref()
            .ok_or_else(|| PrefsError::Config("No key derivation parameters found".to_string()))
    }
}
