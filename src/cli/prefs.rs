//! Preference CLI commands
//!
//! Reads and writes individual preferences through the encrypted store.
//! Values are JSON on the command line.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use clap::{Subcommand, ValueEnum};

use crate::codec::Codec;
use crate::error::{PrefsError, PrefsResult};
use crate::export::{export_json, export_yaml, PreferencesExport};
use crate::storage::PreferenceBackend;
use crate::store::EncryptedPreferenceStore;

/// Export output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Json,
    Yaml,
}

/// Preference commands
#[derive(Subcommand)]
pub enum PrefCommands {
    /// Store a value under a key
    Set {
        /// Preference key
        key: String,
        /// Value as JSON (e.g. 42, true, '"text"', '{"a":1}')
        value: String,
        /// Store the value as a plain string instead of parsing JSON
        #[arg(long)]
        raw: bool,
    },

    /// Print the value stored under a key
    Get {
        /// Preference key
        key: String,
    },

    /// Delete a key
    #[command(alias = "rm")]
    Remove {
        /// Preference key
        key: String,
    },

    /// List stored keys
    #[command(alias = "ls")]
    List,

    /// Export all decrypted preferences
    Export {
        /// Output format
        #[arg(short, long, value_enum, default_value = "json")]
        format: ExportFormat,
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Handle preference commands
pub async fn handle_pref_command<B, C>(
    store: &EncryptedPreferenceStore<B, C>,
    cmd: PrefCommands,
) -> PrefsResult<()>
where
    B: PreferenceBackend,
    C: Codec,
{
    match cmd {
        PrefCommands::Set { key, value, raw } => {
            let value = parse_value(&value, raw)?;
            store.save(&key, &value).await?;
            println!("Saved '{}'", key);
        }
        PrefCommands::Get { key } => match store.retrieve::<serde_json::Value>(&key).await? {
            Some(value) => println!("{}", format_value(&value)),
            None => {
                return Err(PrefsError::not_found(format!("No value stored for '{}'", key)));
            }
        },
        PrefCommands::Remove { key } => {
            if store.remove(&key).await? {
                println!("Removed '{}'", key);
            } else {
                println!("No value stored for '{}'", key);
            }
        }
        PrefCommands::List => {
            let keys = store.keys().await?;
            if keys.is_empty() {
                println!("No preferences stored.");
            }
            for key in keys {
                println!("{}", key);
            }
        }
        PrefCommands::Export { format, output } => {
            let export = PreferencesExport::new(store.export_values().await?);
            match output {
                Some(path) => {
                    let file = File::create(&path).map_err(|e| {
                        PrefsError::Export(format!("Failed to create {}: {}", path.display(), e))
                    })?;
                    let mut writer = BufWriter::new(file);
                    write_export(&export, format, &mut writer)?;
                    writer
                        .flush()
                        .map_err(|e| PrefsError::Export(e.to_string()))?;
                    println!(
                        "Exported {} preference(s) to {}",
                        export.entry_count,
                        path.display()
                    );
                }
                None => {
                    let stdout = std::io::stdout();
                    let mut handle = stdout.lock();
                    write_export(&export, format, &mut handle)?;
                }
            }
        }
    }

    Ok(())
}

fn write_export<W: Write>(
    export: &PreferencesExport,
    format: ExportFormat,
    writer: &mut W,
) -> PrefsResult<()> {
    match format {
        ExportFormat::Json => export_json(export, writer, true),
        ExportFormat::Yaml => export_yaml(export, writer),
    }
}

/// Parse a command-line value
fn parse_value(input: &str, raw: bool) -> PrefsResult<serde_json::Value> {
    if raw {
        return Ok(serde_json::Value::String(input.to_string()));
    }

    serde_json::from_str(input).map_err(|e| {
        PrefsError::malformed(format!(
            "Value is not valid JSON ({}). Use --raw to store plain text.",
            e
        ))
    })
}

/// Strings print bare, everything else as JSON
fn format_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{Cipher, CryptoKey};
    use crate::storage::MemoryBackend;
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value("42", false).unwrap(), json!(42));
        assert_eq!(parse_value("true", false).unwrap(), json!(true));
        assert_eq!(parse_value("abc123", true).unwrap(), json!("abc123"));
        assert!(parse_value("abc123", false).unwrap_err().is_malformed());
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(&json!("abc123")), "abc123");
        assert_eq!(format_value(&json!(42)), "42");
        assert_eq!(format_value(&json!({"a": 1})), r#"{"a":1}"#);
    }

    #[tokio::test]
    async fn test_set_get_remove() {
        let store = EncryptedPreferenceStore::new(
            MemoryBackend::new(),
            Arc::new(Cipher::new(CryptoKey::generate())),
        );

        handle_pref_command(
            &store,
            PrefCommands::Set {
                key: "count".into(),
                value: "42".into(),
                raw: false,
            },
        )
        .await
        .unwrap();
        assert_eq!(store.retrieve::<i64>("count").await.unwrap(), Some(42));

        handle_pref_command(&store, PrefCommands::Get { key: "count".into() })
            .await
            .unwrap();

        handle_pref_command(&store, PrefCommands::Remove { key: "count".into() })
            .await
            .unwrap();
        let err = handle_pref_command(&store, PrefCommands::Get { key: "count".into() })
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_export_to_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let output = temp_dir.path().join("export.yaml");
        let store = EncryptedPreferenceStore::new(
            MemoryBackend::new(),
            Arc::new(Cipher::new(CryptoKey::generate())),
        );
        store.save("theme", "dark").await.unwrap();

        handle_pref_command(
            &store,
            PrefCommands::Export {
                format: ExportFormat::Yaml,
                output: Some(output.clone()),
            },
        )
        .await
        .unwrap();

        let text = std::fs::read_to_string(&output).unwrap();
        assert!(text.contains("theme: dark"));
    }
}
