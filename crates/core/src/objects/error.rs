//! Error types for the object store module.

use thiserror::Error;

/// Errors that can occur while storing or locating objects.
#[derive(Debug, Error)]
pub enum ObjectStoreError {
    /// Key is empty, absolute, or escapes the store root.
    #[error("Invalid object key: {key}")]
    InvalidKey { key: String },

    /// No object stored under the key.
    #[error("Object not found: {key}")]
    NotFound { key: String },

    /// Filesystem failure while handling the object.
    #[error("I/O error for object {key}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// Metadata could not be encoded or decoded.
    #[error("Corrupt metadata for object {key}: {reason}")]
    Metadata { key: String, reason: String },

    /// Remote backend refused or failed the request.
    #[error("Object store unavailable: {0}")]
    Unavailable(String),
}

impl ObjectStoreError {
    pub fn io(key: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            key: key.into(),
            source,
        }
    }
}
