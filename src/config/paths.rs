//! Path management for sealed-prefs
//!
//! Provides XDG-compliant path resolution for settings, records and the key file.
//!
//! ## Path Resolution Order
//!
//! 1. `SEALED_PREFS_DIR` environment variable (if set)
//! 2. Unix (Linux/macOS): `$XDG_CONFIG_HOME/sealed-prefs` or `~/.config/sealed-prefs`
//! 3. Windows: `%APPDATA%\sealed-prefs`

use std::path::PathBuf;

use crate::error::PrefsError;

/// Environment variable overriding the base directory
pub const DIR_ENV_VAR: &str = "SEALED_PREFS_DIR";

/// Manages all paths used by sealed-prefs
#[derive(Debug, Clone)]
pub struct PrefsPaths {
    /// Base directory for all sealed-prefs data
    base_dir: PathBuf,
}

impl PrefsPaths {
    /// Create a new PrefsPaths instance
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> Result<Self, PrefsError> {
        let base_dir = if let Ok(custom) = std::env::var(DIR_ENV_VAR) {
            PathBuf::from(custom)
        } else {
            resolve_default_path()?
        };

        Ok(Self { base_dir })
    }

    /// Create PrefsPaths with a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory (~/.config/sealed-prefs/ or equivalent)
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the path to the settings file
    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Get the path to the encrypted records file
    pub fn records_file(&self) -> PathBuf {
        self.base_dir.join("prefs.json")
    }

    /// Get the path to the generated key file
    pub fn key_file(&self) -> PathBuf {
        self.base_dir.join("master.key")
    }

    /// Ensure the base directory exists
    pub fn ensure_directories(&self) -> Result<(), PrefsError> {
        std::fs::create_dir_all(&self.base_dir)
            .map_err(|e| PrefsError::Io(format!("Failed to create base directory: {}", e)))
    }

    /// Check if the store has been initialized (settings file exists)
    pub fn is_initialized(&self) -> bool {
        self.settings_file().exists()
    }
}

/// Resolve the default base directory based on platform
#[cfg(not(windows))]
fn resolve_default_path() -> Result<PathBuf, PrefsError> {
    let config_base = match std::env::var("XDG_CONFIG_HOME") {
        Ok(xdg) => PathBuf::from(xdg),
        Err(_) => {
            let home = std::env::var("HOME")
                .map_err(|_| PrefsError::Config("HOME environment variable not set".into()))?;
            PathBuf::from(home).join(".config")
        }
    };
    Ok(config_base.join("sealed-prefs"))
}

/// Resolve the default base directory based on platform
#[cfg(windows)]
fn resolve_default_path() -> Result<PathBuf, PrefsError> {
    let appdata = std::env::var("APPDATA")
        .map_err(|_| PrefsError::Config("Could not determine APPDATA directory".into()))?;
    Ok(PathBuf::from(appdata).join("sealed-prefs"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use tempfile::TempDir;

    #[test]
    fn test_custom_base_dir() {
        let temp_dir = TempDir::new().unwrap();
        let paths = PrefsPaths::with_base_dir(temp_dir.path().to_path_buf());

        assert_eq!(paths.base_dir(), temp_dir.path());
        assert_eq!(paths.records_file(), temp_dir.path().join("prefs.json"));
        assert_eq!(paths.key_file(), temp_dir.path().join("master.key"));
        assert_eq!(paths.settings_file(), temp_dir.path().join("config.json"));
    }

    #[test]
    fn test_env_var_override() {
        let temp_dir = TempDir::new().unwrap();
        let custom_path = temp_dir.path().to_str().unwrap();

        env::set_var(DIR_ENV_VAR, custom_path);
        let paths = PrefsPaths::new().unwrap();
        env::remove_var(DIR_ENV_VAR);

        assert_eq!(paths.base_dir(), temp_dir.path());
    }

    #[test]
    fn test_ensure_directories() {
        let temp_dir = TempDir::new().unwrap();
        let paths = PrefsPaths::with_base_dir(temp_dir.path().join("nested"));

        assert!(!paths.is_initialized());
        paths.ensure_directories().unwrap();
        assert!(paths.base_dir().exists());
    }
}
