//! JSON Export functionality
//!
//! Exports every decrypted preference to JSON with schema versioning.

use std::collections::BTreeMap;
use std::io::Write;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PrefsError, PrefsResult};

/// Current export schema version
pub const EXPORT_SCHEMA_VERSION: &str = "1.0.0";

/// Decrypted snapshot of the store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreferencesExport {
    /// Schema version for compatibility checking
    pub schema_version: String,

    /// Export timestamp
    pub exported_at: DateTime<Utc>,

    /// Application version that created the export
    pub app_version: String,

    /// Number of exported entries
    pub entry_count: usize,

    /// Decrypted values by key
    pub entries: BTreeMap<String, serde_json::Value>,
}

impl PreferencesExport {
    /// Wrap decrypted values for export
    pub fn new(entries: BTreeMap<String, serde_json::Value>) -> Self {
        Self {
            schema_version: EXPORT_SCHEMA_VERSION.to_string(),
            exported_at: Utc::now(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            entry_count: entries.len(),
            entries,
        }
    }
}

/// Write an export as JSON
pub fn export_json<W: Write>(
    export: &PreferencesExport,
    writer: &mut W,
    pretty: bool,
) -> PrefsResult<()> {
    if pretty {
        serde_json::to_writer_pretty(&mut *writer, export)
    } else {
        serde_json::to_writer(&mut *writer, export)
    }
    .map_err(|e| PrefsError::Export(e.to_string()))?;

    writeln!(writer).map_err(|e| PrefsError::Export(e.to_string()))?;
    Ok(())
}
