//! Key management CLI commands
//!
//! Initializes the store key, opens the store for the other commands and
//! changes the passphrase.

use std::sync::Arc;

use crate::config::{KeySource, PrefsPaths, Settings};
use crate::crypto::{
    create_verification_token, derive_key, Cipher, KeyDerivationParams, KeyFileProvider,
    KeyProvider, PassphraseKeyProvider, SecureString,
};
use crate::error::{PrefsError, PrefsResult};
use crate::storage::{FileBackend, PreferenceBackend};
use crate::store::EncryptedPreferenceStore;

/// Passphrase used instead of prompting
pub const PASSPHRASE_ENV_VAR: &str = "SEALED_PREFS_PASSPHRASE";

/// New passphrase used by `change-passphrase` instead of prompting
pub const NEW_PASSPHRASE_ENV_VAR: &str = "SEALED_PREFS_NEW_PASSPHRASE";

const MIN_PASSPHRASE_LEN: usize = 8;

/// Store over the records file
pub type FileStore = EncryptedPreferenceStore<FileBackend>;

/// Set up the store key
pub fn handle_init(paths: &PrefsPaths, use_passphrase: bool) -> PrefsResult<()> {
    if paths.is_initialized() {
        println!("Store already initialized at: {}", paths.base_dir().display());
        return Ok(());
    }

    let mut settings = Settings::default();

    if use_passphrase {
        let passphrase = prompt_new_passphrase(PASSPHRASE_ENV_VAR)?;
        let key_params = KeyDerivationParams::new();

        println!("Deriving encryption key...");
        let key = derive_key(&passphrase, &key_params)?;
        let token = create_verification_token(&Cipher::new(key))?;

        settings.key_source = KeySource::Passphrase;
        settings.passphrase.key_params = Some(key_params);
        settings.passphrase.verification_token = Some(token);
    } else {
        paths.ensure_directories()?;
        KeyFileProvider::new(paths.key_file()).provide()?;
    }

    settings.save(paths)?;

    println!("Initialized store at: {}", paths.base_dir().display());
    match settings.key_source {
        KeySource::KeyFile => {
            println!("Key file: {}", paths.key_file().display());
            println!("Back up this file - without it your preferences cannot be read.");
        }
        KeySource::Passphrase => {
            println!("Remember your passphrase - there is no recovery mechanism!");
        }
    }

    Ok(())
}

/// Provision the cipher configured in `settings`
pub fn load_cipher(paths: &PrefsPaths, settings: &Settings) -> PrefsResult<Cipher> {
    let key = match settings.key_source {
        KeySource::KeyFile => {
            let key_file = paths.key_file();
            if !key_file.exists() {
                return Err(PrefsError::KeyProvisioning(format!(
                    "Key file {} is missing",
                    key_file.display()
                )));
            }
            KeyFileProvider::new(key_file).provide()?
        }
        KeySource::Passphrase => {
            let passphrase = read_passphrase(PASSPHRASE_ENV_VAR, "Enter passphrase: ")?;
            let mut provider = PassphraseKeyProvider::new(passphrase, settings.key_params()?.clone());
            if let Some(token) = &settings.passphrase.verification_token {
                provider = provider.with_verification(token.clone());
            }
            provider.provide()?
        }
    };

    Ok(Cipher::new(key))
}

/// Open the records file with the configured key
pub fn open_store(paths: &PrefsPaths, settings: &Settings) -> PrefsResult<FileStore> {
    if !paths.is_initialized() {
        return Err(PrefsError::Config(
            "Store is not initialized. Run 'sealed-prefs init' first.".to_string(),
        ));
    }

    let cipher = load_cipher(paths, settings)?;
    Ok(EncryptedPreferenceStore::new(
        FileBackend::new(paths.records_file()),
        Arc::new(cipher),
    ))
}

/// Re-encrypt every record under a new passphrase
pub async fn handle_change_passphrase(paths: &PrefsPaths, settings: &mut Settings) -> PrefsResult<()> {
    if !settings.uses_passphrase() {
        println!("This store uses a key file, not a passphrase.");
        return Ok(());
    }

    let store = open_store(paths, settings)?;
    println!("Current passphrase verified.");

    let new_passphrase = prompt_new_passphrase(NEW_PASSPHRASE_ENV_VAR)?;
    let new_params = KeyDerivationParams::new();

    println!("Deriving new encryption key...");
    let new_cipher = Cipher::new(derive_key(&new_passphrase, &new_params)?);
    let token = create_verification_token(&new_cipher)?;

    let count = store.rekey(&new_cipher).await?;

    settings.passphrase.key_params = Some(new_params);
    settings.passphrase.verification_token = Some(token);
    settings.save(paths)?;

    println!("Passphrase changed. Re-encrypted {} preference(s).", count);
    Ok(())
}

/// Show key and storage status
pub async fn handle_status(paths: &PrefsPaths, settings: &Settings) -> PrefsResult<()> {
    println!("sealed-prefs Status");
    println!("===================");
    println!("Base directory: {}", paths.base_dir().display());
    println!("Records file:   {}", paths.records_file().display());

    if !paths.is_initialized() {
        println!();
        println!("Status: NOT INITIALIZED");
        println!("Run 'sealed-prefs init' to create a key.");
        return Ok(());
    }

    println!();
    match settings.key_source {
        KeySource::KeyFile => {
            println!("Key source: key file ({})", paths.key_file().display());
        }
        KeySource::Passphrase => {
            println!("Key source: passphrase");
            let params = settings.key_params()?;
            println!("Key Derivation Parameters:");
            println!("  Algorithm: Argon2id");
            println!("  Memory Cost: {} KiB", params.memory_cost);
            println!("  Time Cost: {} iterations", params.time_cost);
            println!("  Parallelism: {} threads", params.parallelism);
        }
    }
    println!("Cipher: AES-256-GCM");

    // Counting keys needs no decryption
    let backend = FileBackend::new(paths.records_file());
    let count = backend.read_all().await?.len();
    println!("Stored preferences: {}", count);

    Ok(())
}

/// Prompt for a new passphrase with confirmation, or take it from `env_var`
fn prompt_new_passphrase(env_var: &str) -> PrefsResult<SecureString> {
    if let Ok(value) = std::env::var(env_var) {
        let passphrase = SecureString::new(value);
        check_passphrase_length(&passphrase)?;
        return Ok(passphrase);
    }

    loop {
        let first = read_passphrase_prompt("Enter new passphrase: ")?;

        if check_passphrase_length(&first).is_err() {
            println!(
                "Passphrase must be at least {} characters. Please try again.",
                MIN_PASSPHRASE_LEN
            );
            continue;
        }

        let second = read_passphrase_prompt("Confirm passphrase: ")?;
        if first != second {
            println!("Passphrases do not match. Please try again.");
            continue;
        }

        return Ok(first);
    }
}

fn check_passphrase_length(passphrase: &SecureString) -> PrefsResult<()> {
    if passphrase.chars().count() < MIN_PASSPHRASE_LEN {
        return Err(PrefsError::Config(format!(
            "Passphrase must be at least {} characters",
            MIN_PASSPHRASE_LEN
        )));
    }
    Ok(())
}

fn read_passphrase(env_var: &str, prompt: &str) -> PrefsResult<SecureString> {
    match std::env::var(env_var) {
        Ok(value) => Ok(SecureString::new(value)),
        Err(_) => read_passphrase_prompt(prompt),
    }
}

/// Prompt for a passphrase (hidden input)
fn read_passphrase_prompt(prompt: &str) -> PrefsResult<SecureString> {
    rpassword::prompt_password(prompt)
        .map(SecureString::new)
        .map_err(|e| PrefsError::KeyProvisioning(format!("Failed to read passphrase: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_with_key_file() {
        let temp_dir = TempDir::new().unwrap();
        let paths = PrefsPaths::with_base_dir(temp_dir.path().to_path_buf());

        handle_init(&paths, false).unwrap();

        assert!(paths.is_initialized());
        assert!(paths.key_file().exists());
        let settings = Settings::load_or_create(&paths).unwrap();
        assert_eq!(settings.key_source, KeySource::KeyFile);
    }

    #[tokio::test]
    async fn test_open_store_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let paths = PrefsPaths::with_base_dir(temp_dir.path().to_path_buf());
        handle_init(&paths, false).unwrap();
        let settings = Settings::load_or_create(&paths).unwrap();

        let store = open_store(&paths, &settings).unwrap();
        store.save("session.token", "abc123").await.unwrap();

        let reopened = open_store(&paths, &settings).unwrap();
        let token: Option<String> = reopened.retrieve("session.token").await.unwrap();
        assert_eq!(token.as_deref(), Some("abc123"));
    }

    #[test]
    fn test_open_uninitialized_store_fails() {
        let temp_dir = TempDir::new().unwrap();
        let paths = PrefsPaths::with_base_dir(temp_dir.path().to_path_buf());

        let err = open_store(&paths, &Settings::default()).err().unwrap();
        assert!(matches!(err, PrefsError::Config(_)));
    }

    #[test]
    fn test_missing_key_file_fails() {
        let temp_dir = TempDir::new().unwrap();
        let paths = PrefsPaths::with_base_dir(temp_dir.path().to_path_buf());
        handle_init(&paths, false).unwrap();
        std::fs::remove_file(paths.key_file()).unwrap();

        let err = load_cipher(&paths, &Settings::default()).unwrap_err();
        assert!(matches!(err, PrefsError::KeyProvisioning(_)));
    }

    #[test]
    fn test_short_passphrase_rejected() {
        assert!(check_passphrase_length(&SecureString::new("short")).is_err());
        assert!(check_passphrase_length(&SecureString::new("long enough")).is_ok());
    }
}
