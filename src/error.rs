//! Custom error types for sealed-prefs
//!
//! This module defines the error hierarchy for the preference store using
//! thiserror for ergonomic error definitions.
//!
//! The three kinds callers of the store care about are kept apart:
//! [`PrefsError::MalformedData`], [`PrefsError::Integrity`] and
//! [`PrefsError::StorageUnavailable`]. The remaining variants belong to the
//! surrounding configuration, key provisioning and CLI layers.

use thiserror::Error;

/// The main error type for sealed-prefs operations
#[derive(Error, Debug)]
pub enum PrefsError {
    /// Bytes or text that do not match the expected encoding or shape
    #[error("Malformed data: {0}")]
    MalformedData(String),

    /// Authentication failed while decrypting (tampering or wrong key)
    #[error("Integrity check failed: {0}")]
    Integrity(String),

    /// The backing store could not be read or written
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Stored records changed underneath a whole-store operation
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A requested preference does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors outside the backing store
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization errors outside the record codec
    #[error("JSON error: {0}")]
    Json(String),

    /// The cryptographic key could not be loaded, generated or derived
    #[error("Key provisioning error: {0}")]
    KeyProvisioning(String),

    /// Export errors
    #[error("Export error: {0}")]
    Export(String),
}

impl PrefsError {
    /// Create a malformed-data error
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedData(reason.into())
    }

    /// Create an integrity error
    pub fn integrity(reason: impl Into<String>) -> Self {
        Self::Integrity(reason.into())
    }

    /// Create a storage-unavailable error
    pub fn storage(reason: impl Into<String>) -> Self {
        Self::StorageUnavailable(reason.into())
    }

    /// Create a not-found error
    pub fn not_found(reason: impl Into<String>) -> Self {
        Self::NotFound(reason.into())
    }

    /// Check if this is a malformed-data error
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedData(_))
    }

    /// Check if this is an integrity error
    pub fn is_integrity(&self) -> bool {
        matches!(self, Self::Integrity(_))
    }

    /// Check if this is a storage-unavailable error
    pub fn is_storage_unavailable(&self) -> bool {
        matches!(self, Self::StorageUnavailable(_))
    }

    /// Check if this is a conflict error
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    /// Check if this is a not-found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Short, stable label for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedData(_) => "malformed_data",
            Self::Integrity(_) => "integrity",
            Self::StorageUnavailable(_) => "storage_unavailable",
            Self::Conflict(_) => "conflict",
            Self::NotFound(_) => "not_found",
            Self::Config(_) => "config",
            Self::Io(_) => "io",
            Self::Json(_) => "json",
            Self::KeyProvisioning(_) => "key_provisioning",
            Self::Export(_) => "export",
        }
    }
}

impl From<std::io::Error> for PrefsError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for PrefsError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for sealed-prefs operations
pub type PrefsResult<T> = Result<T, PrefsError>;
