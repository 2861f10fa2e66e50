//! Configuration module for sealed-prefs
//!
//! This module provides configuration management including:
//! - XDG-compliant path resolution
//! - Key provisioning settings persistence

pub mod paths;
pub mod settings;

pub use paths::PrefsPaths;
pub use settings::{KeySource, Settings};
