//! Test fixtures and backend helpers.
//!
//! Provides convenience functions for setting up source/destination pairs
//! and common namespace shapes.

use kvmigrate_storage::{BackendRegistry, FileBackend, InMemoryBackend, KvBackend};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

/// Registers `backend` under `kind` so that every construction hands out
/// the same shared instance.
pub fn register_shared<B>(registry: &mut BackendRegistry, kind: &str, backend: &Arc<B>)
where
    B: KvBackend + 'static,
{
    let backend = Arc::clone(backend);
    registry.register(kind, move |_| {
        Ok(Box::new(Arc::clone(&backend)) as Box<dyn KvBackend>)
    });
}

/// A source and a destination that outlive the runs constructing them.
pub struct SharedPair {
    /// Store being migrated from, registered as `source`.
    pub source: Arc<InMemoryBackend>,
    /// Store being migrated to, registered as `destination`.
    pub destination: Arc<InMemoryBackend>,
}

impl SharedPair {
    /// Creates an empty destination and a source holding `entries`.
    pub fn new<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<Vec<u8>>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            source: Arc::new(InMemoryBackend::with_entries(entries)),
            destination: Arc::new(InMemoryBackend::new()),
        }
    }

    /// Returns a registry resolving `source` and `destination` to this pair.
    pub fn registry(&self) -> BackendRegistry {
        let mut registry = BackendRegistry::new();
        register_shared(&mut registry, "source", &self.source);
        register_shared(&mut registry, "destination", &self.destination);
        registry
    }

    /// Asserts that the destination holds exactly the source's entries.
    pub fn assert_mirrored(&self) {
        assert_eq!(
            self.destination.snapshot(),
            self.source.snapshot(),
            "destination does not mirror source"
        );
    }
}

/// Runs a test with a file backend rooted in a temporary directory.
pub fn with_file_backend<F, R>(f: F) -> R
where
    F: FnOnce(&FileBackend, &Path) -> R,
{
    let dir = TempDir::new().expect("Failed to create temp directory");
    let backend = FileBackend::open(dir.path()).expect("Failed to open file backend");
    f(&backend, dir.path())
}

/// Namespace shape helpers.
pub mod scenarios {
    /// `{"a": "1", "b/c": "2", "b/d": "3"}`.
    pub fn small_tree() -> Vec<(String, String)> {
        vec![
            ("a".into(), "1".into()),
            ("b/c".into(), "2".into()),
            ("b/d".into(), "3".into()),
        ]
    }

    /// `count` leaves spread over nested sub-namespaces.
    ///
    /// Leaf `i` lives at depth `i % 4`, under directory `d{i % fanout}`.
    pub fn nested_tree(count: usize, fanout: usize) -> Vec<(String, String)> {
        let fanout = fanout.max(1);
        (0..count)
            .map(|i| {
                let dir = format!("d{}/", i % fanout);
                let key = format!("{}leaf{i}", dir.repeat(i % 4));
                (key, format!("value-{i}"))
            })
            .collect()
    }

    /// `count` leaves, each in a sub-namespace of its own (`k{i}/v`).
    pub fn one_leaf_per_namespace(count: usize) -> Vec<(String, String)> {
        (0..count)
            .map(|i| (format!("k{i:05}/v"), format!("value-{i}")))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kvmigrate_storage::{BackendConfig, Entry};

    #[test]
    fn shared_pair_registry_hands_out_same_store() {
        let pair = SharedPair::new(scenarios::small_tree());
        let registry = pair.registry();

        let dst = registry.construct("destination", &BackendConfig::new()).unwrap();
        dst.put(&Entry::new("x", b"y".to_vec())).unwrap();
        assert_eq!(pair.destination.len(), 1);

        let src = registry.construct("source", &BackendConfig::new()).unwrap();
        assert_eq!(src.list("").unwrap(), vec!["a", "b/"]);
    }

    #[test]
    fn nested_tree_keys_are_unique() {
        let tree = scenarios::nested_tree(100, 3);
        let mut keys: Vec<_> = tree.iter().map(|(k, _)| k.clone()).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), 100);
        assert!(keys.iter().any(|k| k.matches('/').count() == 3));
    }

    #[test]
    fn file_backend_fixture() {
        with_file_backend(|backend, root| {
            backend.put(&Entry::new("a/b", b"1".to_vec())).unwrap();
            assert!(root.join("+a").join("_b").is_file());
        });
    }
}
