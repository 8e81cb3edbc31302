//! Configuration for migrations.

use crate::error::{MigrateError, MigrateResult};
use kvmigrate_storage::BackendConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default capacity of the transfer queue.
pub const DEFAULT_QUEUE_SIZE: usize = 10_000;

/// Default number of transfer workers.
pub const DEFAULT_WORKERS: usize = 1;

/// Default interval between idle heartbeats in recurring mode.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(60);

/// Names a backend kind and carries its configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendDescriptor {
    /// Backend kind, as registered in the backend registry.
    pub name: String,
    /// Backend-specific settings.
    #[serde(default)]
    pub config: BackendConfig,
}

impl BackendDescriptor {
    /// Creates a descriptor with an empty configuration.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config: BackendConfig::new(),
        }
    }

    /// Adds a configuration entry.
    pub fn with_config(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.insert(key.into(), value.into());
        self
    }
}

/// On-disk shape of the configuration file.
#[derive(Debug, Deserialize)]
struct ConfigFile {
    from: Option<BackendDescriptor>,
    to: Option<BackendDescriptor>,
    schedule: Option<String>,
    queuesize: Option<usize>,
    workers: Option<usize>,
}

/// Configuration of a migration job.
#[derive(Debug, Clone)]
pub struct MigrationConfig {
    /// Source backend.
    pub from: BackendDescriptor,
    /// Destination backend.
    pub to: BackendDescriptor,
    /// Cron-style schedule; `None` runs once.
    pub schedule: Option<String>,
    /// Capacity of the transfer queue.
    pub queue_size: usize,
    /// Number of concurrent transfer workers.
    pub workers: usize,
    /// Interval between idle heartbeats in recurring mode.
    pub heartbeat_interval: Duration,
}

impl MigrationConfig {
    /// Creates a one-shot configuration with default sizing.
    pub fn new(from: BackendDescriptor, to: BackendDescriptor) -> Self {
        Self {
            from,
            to,
            schedule: None,
            queue_size: DEFAULT_QUEUE_SIZE,
            workers: DEFAULT_WORKERS,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
        }
    }

    /// Parses and validates a JSON configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::ConfigParse`] for malformed JSON and
    /// [`MigrateError::Config`] when `from`/`to` are missing or sizing is zero.
    pub fn from_json(json: &str) -> MigrateResult<Self> {
        let file: ConfigFile = serde_json::from_str(json)?;

        let from = file
            .from
            .ok_or_else(|| MigrateError::Config("Please define a source (key: from)".into()))?;
        let to = file
            .to
            .ok_or_else(|| MigrateError::Config("Please define a destination (key: to)".into()))?;

        let config = Self {
            from,
            to,
            schedule: file.schedule,
            queue_size: file.queuesize.unwrap_or(DEFAULT_QUEUE_SIZE),
            workers: file.workers.unwrap_or(DEFAULT_WORKERS),
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::ConfigRead`] if the file cannot be read, or
    /// any error of [`MigrationConfig::from_json`].
    pub fn load(path: &Path) -> MigrateResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| MigrateError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }

    /// Checks the sizing invariants.
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::Config`] if the queue size or worker count is zero.
    pub fn validate(&self) -> MigrateResult<()> {
        if self.queue_size == 0 {
            return Err(MigrateError::Config("queuesize must be positive".into()));
        }
        if self.workers == 0 {
            return Err(MigrateError::Config("workers must be positive".into()));
        }
        Ok(())
    }

    /// Sets the recurring schedule.
    pub fn with_schedule(mut self, schedule: impl Into<String>) -> Self {
        self.schedule = Some(schedule.into());
        self
    }

    /// Sets the transfer queue capacity.
    pub fn with_queue_size(mut self, size: usize) -> Self {
        self.queue_size = size;
        self
    }

    /// Sets the number of transfer workers.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Sets the idle heartbeat interval.
    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }
}
