//! Key-value backend trait definition.

use crate::error::StorageResult;
use std::sync::Arc;

/// Separator between the segments of a [`StorageKey`].
pub const SEPARATOR: char = '/';

/// A path into a hierarchical key namespace.
///
/// A trailing [`SEPARATOR`] marks a sub-namespace rather than a leaf.
/// The empty string is the root prefix.
pub type StorageKey = String;

/// Returns true if `key` names a sub-namespace.
#[must_use]
pub fn is_namespace(key: &str) -> bool {
    key.ends_with(SEPARATOR)
}

/// A leaf key paired with its stored value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Full path of the leaf.
    pub key: StorageKey,
    /// Opaque value bytes.
    pub value: Vec<u8>,
}

impl Entry {
    /// Creates a new entry.
    pub fn new(key: impl Into<StorageKey>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// The capability a store must provide to take part in a migration.
///
/// Backends are **opaque** to the migration engine: they list, read and
/// write entries, and nothing else.
///
/// # Invariants
///
/// - `list` returns the direct children of `prefix`, sub-namespaces suffixed
///   with [`SEPARATOR`]
/// - `get` returns `Ok(None)` for a missing key; absence is not an error
/// - calls are never silently retried by the contract itself
/// - backends must be `Send + Sync` so workers can share them
///
/// # Implementors
///
/// - [`super::InMemoryBackend`] - For testing and ephemeral stores
/// - [`super::FileBackend`] - Directory-tree store
pub trait KvBackend: Send + Sync {
    /// Lists the child names directly under `prefix`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be reached or read.
    fn list(&self, prefix: &str) -> StorageResult<Vec<String>>;

    /// Reads the entry stored at `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be reached or read.
    fn get(&self, key: &str) -> StorageResult<Option<Entry>>;

    /// Writes `entry`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be reached or written.
    fn put(&self, entry: &Entry) -> StorageResult<()>;
}

impl<B: KvBackend + ?Sized> KvBackend for Arc<B> {
    fn list(&self, prefix: &str) -> StorageResult<Vec<String>> {
        (**self).list(prefix)
    }

    fn get(&self, key: &str) -> StorageResult<Option<Entry>> {
        (**self).get(key)
    }

    fn put(&self, entry: &Entry) -> StorageResult<()> {
        (**self).put(entry)
    }
}

impl<B: KvBackend + ?Sized> KvBackend for Box<B> {
    fn list(&self, prefix: &str) -> StorageResult<Vec<String>> {
        (**self).list(prefix)
    }

    fn get(&self, key: &str) -> StorageResult<Option<Entry>> {
        (**self).get(key)
    }

    fn put(&self, entry: &Entry) -> StorageResult<()> {
        (**self).put(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespace_detection() {
        assert!(is_namespace("b/"));
        assert!(is_namespace("a/b/"));
        assert!(!is_namespace("a/b"));
        assert!(!is_namespace(""));
    }

    #[test]
    fn entry_new() {
        let entry = Entry::new("a/b", b"value".to_vec());
        assert_eq!(entry.key, "a/b");
        assert_eq!(entry.value, b"value");
    }
}
