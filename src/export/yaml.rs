//! YAML Export functionality
//!
//! Exports every decrypted preference to YAML for human reading.

use std::io::Write;

use crate::error::{PrefsError, PrefsResult};
use crate::export::json::PreferencesExport;

/// Write an export as YAML with a header comment
pub fn export_yaml<W: Write>(export: &PreferencesExport, writer: &mut W) -> PrefsResult<()> {
    let header = format!(
        "# sealed-prefs export\n\
         # Generated: {}\n\
         # App Version: {}\n\
         #\n\
         # This file holds decrypted preferences. Keep it secure.\n\n",
        export.exported_at, export.app_version
    );
    writer
        .write_all(header.as_bytes())
        .map_err(|e| PrefsError::Export(e.to_string()))?;

    serde_yaml::to_writer(writer, export).map_err(|e| PrefsError::Export(e.to_string()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    #[test]
    fn test_yaml_export() {
        let mut entries = BTreeMap::new();
        entries.insert("theme".to_string(), json!({"dark": true}));
        let export = PreferencesExport::new(entries);

        let mut output = Vec::new();
        export_yaml(&export, &mut output).unwrap();
        let text = String::from_utf8(output).unwrap();

        assert!(text.starts_with("# sealed-prefs export"));
        assert!(text.contains("Keep it secure"));

        let parsed: PreferencesExport = serde_yaml::from_str(&text).unwrap();
        assert_eq!(parsed.entries["theme"], json!({"dark": true}));
    }
}
