//! In-memory key-value backend.

use crate::backend::{Entry, KvBackend, SEPARATOR};
use crate::error::StorageResult;
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// An in-memory key-value backend.
///
/// This backend stores all entries in a sorted map and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Throwaway destinations that don't need persistence
///
/// `list` returns children in byte order.
///
/// # Thread Safety
///
/// This backend is thread-safe and can be shared across threads.
///
/// # Example
///
/// ```rust
/// use kvmigrate_storage::{Entry, InMemoryBackend, KvBackend};
///
/// let backend = InMemoryBackend::new();
/// backend.put(&Entry::new("b/c", b"2".to_vec())).unwrap();
/// assert_eq!(backend.list("").unwrap(), vec!["b/".to_string()]);
/// assert_eq!(backend.list("b/").unwrap(), vec!["c".to_string()]);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    entries: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl InMemoryBackend {
    /// Creates a new empty in-memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend pre-populated with `(key, value)` pairs.
    pub fn with_entries<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<Vec<u8>>,
        I: IntoIterator<Item = (K, V)>,
    {
        let map = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            entries: RwLock::new(map),
        }
    }

    /// Returns a copy of every stored entry.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, Vec<u8>> {
        self.entries.read().clone()
    }

    /// Returns the number of stored leaves.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Removes a leaf, returning its value if it existed.
    pub fn remove(&self, key: &str) -> Option<Vec<u8>> {
        self.entries.write().remove(key)
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

impl KvBackend for InMemoryBackend {
    fn list(&self, prefix: &str) -> StorageResult<Vec<String>> {
        let entries = self.entries.read();
        let mut children: Vec<String> = Vec::new();

        // Keys sharing a prefix are contiguous in a BTreeMap, so a
        // sub-namespace only needs to be compared with the last child.
        for key in entries.range(prefix.to_string()..).map(|(k, _)| k) {
            let Some(rest) = key.strip_prefix(prefix) else {
                break;
            };
            let child = match rest.find(SEPARATOR) {
                Some(idx) => &rest[..=idx],
                None => rest,
            };
            if child.is_empty() {
                continue;
            }
            if children.last().map(String::as_str) != Some(child) {
                children.push(child.to_string());
            }
        }

        Ok(children)
    }

    fn get(&self, key: &str) -> StorageResult<Option<Entry>> {
        Ok(self
            .entries
            .read()
            .get(key)
            .map(|value| Entry::new(key, value.clone())))
    }

    fn put(&self, entry: &Entry) -> StorageResult<()> {
        self.entries
            .write()
            .insert(entry.key.clone(), entry.value.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> InMemoryBackend {
        InMemoryBackend::with_entries([("a", "1"), ("b/c", "2"), ("b/d", "3"), ("b/e/f", "4")])
    }

    #[test]
    fn memory_new_is_empty() {
        let backend = InMemoryBackend::new();
        assert!(backend.is_empty());
        assert!(backend.list("").unwrap().is_empty());
    }

    #[test]
    fn memory_list_root() {
        let backend = sample();
        assert_eq!(backend.list("").unwrap(), vec!["a", "b/"]);
    }

    #[test]
    fn memory_list_nested() {
        let backend = sample();
        assert_eq!(backend.list("b/").unwrap(), vec!["c", "d", "e/"]);
        assert_eq!(backend.list("b/e/").unwrap(), vec!["f"]);
    }

    #[test]
    fn memory_list_unknown_prefix_is_empty() {
        let backend = sample();
        assert!(backend.list("zzz/").unwrap().is_empty());
    }

    #[test]
    fn memory_list_leaf_and_namespace_with_same_name() {
        let backend = InMemoryBackend::with_entries([("b", "leaf"), ("b/c", "nested")]);
        assert_eq!(backend.list("").unwrap(), vec!["b", "b/"]);
    }

    #[test]
    fn memory_list_ignores_sibling_with_shared_prefix() {
        let backend = InMemoryBackend::with_entries([("b-x", "1"), ("b/c", "2"), ("bz", "3")]);
        assert_eq!(backend.list("b/").unwrap(), vec!["c"]);
    }

    #[test]
    fn memory_get_missing_is_none() {
        let backend = sample();
        assert!(backend.get("nope").unwrap().is_none());
        assert!(backend.get("b/").unwrap().is_none());
    }

    #[test]
    fn memory_put_then_get() {
        let backend = InMemoryBackend::new();
        backend.put(&Entry::new("x/y", b"z".to_vec())).unwrap();

        let entry = backend.get("x/y").unwrap().unwrap();
        assert_eq!(entry.value, b"z");
        assert_eq!(backend.len(), 1);
    }

    #[test]
    fn memory_put_overwrites() {
        let backend = sample();
        backend.put(&Entry::new("a", b"9".to_vec())).unwrap();
        assert_eq!(backend.get("a").unwrap().unwrap().value, b"9");
        assert_eq!(backend.len(), 4);
    }

    #[test]
    fn memory_remove_and_clear() {
        let backend = sample();
        assert_eq!(backend.remove("a"), Some(b"1".to_vec()));
        assert_eq!(backend.len(), 3);
        backend.clear();
        assert!(backend.is_empty());
    }
}
