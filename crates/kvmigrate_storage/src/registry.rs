//! Backend construction by kind name.

use crate::backend::KvBackend;
use crate::error::{StorageError, StorageResult};
use crate::file::FileBackend;
use crate::memory::InMemoryBackend;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Free-form `key -> value` configuration handed to a backend factory.
pub type BackendConfig = BTreeMap<String, String>;

/// A function that builds a live backend from its configuration.
pub type BackendFactory =
    Arc<dyn Fn(&BackendConfig) -> StorageResult<Box<dyn KvBackend>> + Send + Sync>;

/// Maps backend kind names to their factories.
///
/// The registry is populated only through [`BackendRegistry::register`];
/// [`BackendRegistry::with_builtin`] registers the backends shipped in
/// this crate.
///
/// # Example
///
/// ```rust
/// use kvmigrate_storage::{BackendConfig, BackendRegistry};
///
/// let registry = BackendRegistry::with_builtin();
/// let backend = registry.construct("inmem", &BackendConfig::new()).unwrap();
/// assert!(backend.list("").unwrap().is_empty());
/// ```
#[derive(Clone, Default)]
pub struct BackendRegistry {
    factories: HashMap<String, BackendFactory>,
}

impl BackendRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the `inmem` and `file` backends.
    #[must_use]
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register("inmem", |_config| {
            Ok(Box::new(InMemoryBackend::new()) as Box<dyn KvBackend>)
        });
        registry.register("file", |config| {
            let path = config.get("path").ok_or_else(|| StorageError::MissingConfig {
                kind: "file".into(),
                key: "path".into(),
            })?;
            Ok(Box::new(FileBackend::open(Path::new(path))?) as Box<dyn KvBackend>)
        });
        registry
    }

    /// Registers `factory` under `kind`, replacing any previous factory.
    pub fn register<F>(&mut self, kind: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(&BackendConfig) -> StorageResult<Box<dyn KvBackend>> + Send + Sync + 'static,
    {
        self.factories.insert(kind.into(), Arc::new(factory));
        self
    }

    /// Returns true if a factory is registered under `kind`.
    #[must_use]
    pub fn contains(&self, kind: &str) -> bool {
        self.factories.contains_key(kind)
    }

    /// Returns the registered kind names in sorted order.
    #[must_use]
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }

    /// Builds a backend of the given kind.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::UnknownBackendKind`] if nothing is registered
    /// under `kind`, or whatever the factory itself reports.
    pub fn construct(&self, kind: &str, config: &BackendConfig) -> StorageResult<Box<dyn KvBackend>> {
        let factory = self
            .factories
            .get(kind)
            .ok_or_else(|| StorageError::UnknownBackendKind(kind.to_string()))?;
        factory(config)
    }
}

impl fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}
