//! Error types for storage operations.

use std::io;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur while constructing or talking to a backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The key cannot be represented by this backend.
    #[error("invalid key {0:?}")]
    InvalidKey(String),

    /// No factory is registered under the requested backend kind.
    #[error("no backend is named {0:?}")]
    UnknownBackendKind(String),

    /// A required configuration entry is missing.
    #[error("backend {kind:?} requires config key {key:?}")]
    MissingConfig {
        /// The backend kind being constructed.
        kind: String,
        /// The missing configuration key.
        key: String,
    },

    /// The backend factory rejected its configuration.
    #[error("failed to construct backend {kind:?}: {message}")]
    Construction {
        /// The backend kind being constructed.
        kind: String,
        /// Backend-specific detail.
        message: String,
    },

    /// The store could not be reached.
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

impl StorageError {
    /// Creates a construction error for `kind`.
    pub fn construction(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Construction {
            kind: kind.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = StorageError::UnknownBackendKind("consul".into());
        assert_eq!(err.to_string(), "no backend is named \"consul\"");

        let err = StorageError::MissingConfig {
            kind: "file".into(),
            key: "path".into(),
        };
        assert!(err.to_string().contains("path"));
    }
}
