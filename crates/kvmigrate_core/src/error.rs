//! Error types for the migration engine.

use kvmigrate_storage::StorageError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for migration operations.
pub type MigrateResult<T> = Result<T, MigrateError>;

/// Which side of a migration a backend sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendRole {
    /// The store being read.
    Source,
    /// The store being written.
    Destination,
}

impl std::fmt::Display for BackendRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendRole::Source => f.write_str("source"),
            BackendRole::Destination => f.write_str("destination"),
        }
    }
}

/// Errors that can occur while configuring or running a migration.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// The configuration is incomplete or inconsistent.
    #[error("{0}")]
    Config(String),

    /// The configuration file could not be read.
    #[error("failed to read config file {path:?}: {source}")]
    ConfigRead {
        /// Path of the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON for this schema.
    #[error("malformed config: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// No backend factory is registered under this kind.
    #[error("no backend is named {0:?}")]
    UnknownBackendKind(String),

    /// The backend factory failed.
    #[error("failed to construct {role} backend: {source}")]
    BackendConstruction {
        /// Which backend failed.
        role: BackendRole,
        /// Factory error.
        #[source]
        source: StorageError,
    },

    /// Listing a namespace of the source failed.
    #[error("failed to list {prefix:?}: {source}")]
    List {
        /// Namespace being listed.
        prefix: String,
        /// Backend error.
        #[source]
        source: StorageError,
    },

    /// Reading a key from the source failed.
    #[error("failed to read {key:?}: {source}")]
    Get {
        /// Key being read.
        key: String,
        /// Backend error.
        #[source]
        source: StorageError,
    },

    /// Writing a key to the destination failed.
    #[error("failed to write {key:?}: {source}")]
    Put {
        /// Key being written.
        key: String,
        /// Backend error.
        #[source]
        source: StorageError,
    },

    /// The schedule expression cannot be parsed.
    #[error("invalid schedule {expression:?}: {message}")]
    Schedule {
        /// The rejected expression.
        expression: String,
        /// Parser detail.
        message: String,
    },

    /// Every consumer of the transfer queue went away while keys were
    /// still being enumerated.
    #[error("transfer queue closed before enumeration finished")]
    QueueClosed,

    /// A transfer worker terminated abnormally.
    #[error("transfer worker {worker} panicked")]
    WorkerPanicked {
        /// Index of the worker.
        worker: usize,
    },

    /// A run panicked and the fault was contained.
    #[error("recovered from fault: {0}")]
    RecoveredFault(String),

    /// The OS refused to start a thread.
    #[error("failed to spawn thread {name}: {source}")]
    ThreadSpawn {
        /// Name the thread would have had.
        name: String,
        /// OS error.
        source: std::io::Error,
    },
}

impl MigrateError {
    /// Maps a backend factory error onto the run-level taxonomy.
    pub fn construction(role: BackendRole, source: StorageError) -> Self {
        match source {
            StorageError::UnknownBackendKind(kind) => Self::UnknownBackendKind(kind),
            source => Self::BackendConstruction { role, source },
        }
    }

    /// Returns true if this error terminates the run that raised it.
    ///
    /// Per-key transfer errors are logged and skipped instead.
    pub fn is_fatal_to_run(&self) -> bool {
        !matches!(self, MigrateError::Get { .. } | MigrateError::Put { .. })
    }
}
