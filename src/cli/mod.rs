//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the preference store.

pub mod key;
pub mod prefs;

pub use key::{
    handle_change_passphrase, handle_init, handle_status, load_cipher, open_store, FileStore,
};
pub use prefs::{handle_pref_command, ExportFormat, PrefCommands};
