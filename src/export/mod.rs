//! Export module for sealed-prefs
//!
//! Writes a decrypted snapshot of the store in two formats:
//! - JSON: machine-readable
//! - YAML: human-readable

pub mod json;
pub mod yaml;

pub use json::{export_json, PreferencesExport, EXPORT_SCHEMA_VERSION};
pub use yaml::export_yaml;
