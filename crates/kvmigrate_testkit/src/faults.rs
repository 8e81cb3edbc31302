//! Backend wrappers that inject failures or stall on purpose.
//!
//! These wrap a real backend and are meant to be registered as source or
//! destination of a migration under test.

use kvmigrate_storage::{Entry, KvBackend, StorageError, StorageResult};
use parking_lot::{Condvar, Mutex};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

/// Wraps a backend and fails, hides or panics on selected keys.
///
/// # Example
///
/// ```rust
/// use kvmigrate_storage::{InMemoryBackend, KvBackend};
/// use kvmigrate_testkit::FaultyBackend;
///
/// let backend = FaultyBackend::new(InMemoryBackend::with_entries([("a", "1")]))
///     .fail_get("a");
/// assert!(backend.get("a").is_err());
/// ```
#[derive(Debug, Default)]
pub struct FaultyBackend<B> {
    inner: B,
    fail_list: HashSet<String>,
    fail_get: HashSet<String>,
    fail_put: HashSet<String>,
    absent: HashSet<String>,
    panic_get: HashSet<String>,
    list_calls: AtomicU64,
    get_calls: AtomicU64,
    put_calls: AtomicU64,
}

impl<B: KvBackend> FaultyBackend<B> {
    /// Wraps `inner` with no faults configured.
    pub fn new(inner: B) -> Self {
        Self {
            inner,
            fail_list: HashSet::new(),
            fail_get: HashSet::new(),
            fail_put: HashSet::new(),
            absent: HashSet::new(),
            panic_get: HashSet::new(),
            list_calls: AtomicU64::new(0),
            get_calls: AtomicU64::new(0),
            put_calls: AtomicU64::new(0),
        }
    }

    /// Makes `list(prefix)` fail.
    pub fn fail_list(mut self, prefix: impl Into<String>) -> Self {
        self.fail_list.insert(prefix.into());
        self
    }

    /// Makes `get(key)` fail.
    pub fn fail_get(mut self, key: impl Into<String>) -> Self {
        self.fail_get.insert(key.into());
        self
    }

    /// Makes `put` of `key` fail.
    pub fn fail_put(mut self, key: impl Into<String>) -> Self {
        self.fail_put.insert(key.into());
        self
    }

    /// Makes `get(key)` report absence even though `list` shows the key.
    pub fn absent(mut self, key: impl Into<String>) -> Self {
        self.absent.insert(key.into());
        self
    }

    /// Makes `get(key)` panic.
    pub fn panic_on_get(mut self, key: impl Into<String>) -> Self {
        self.panic_get.insert(key.into());
        self
    }

    /// Returns the wrapped backend.
    pub fn inner(&self) -> &B {
        &self.inner
    }

    /// Number of `list` calls seen.
    pub fn list_calls(&self) -> u64 {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Number of `get` calls seen.
    pub fn get_calls(&self) -> u64 {
        self.get_calls.load(Ordering::SeqCst)
    }

    /// Number of `put` calls seen.
    pub fn put_calls(&self) -> u64 {
        self.put_calls.load(Ordering::SeqCst)
    }
}

impl<B: KvBackend> KvBackend for FaultyBackend<B> {
    fn list(&self, prefix: &str) -> StorageResult<Vec<String>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_list.contains(prefix) {
            return Err(StorageError::Unavailable(format!("injected list failure at {prefix:?}")));
        }
        self.inner.list(prefix)
    }

    fn get(&self, key: &str) -> StorageResult<Option<Entry>> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        if self.panic_get.contains(key) {
            panic!("injected panic reading {key:?}");
        }
        if self.fail_get.contains(key) {
            return Err(StorageError::Unavailable(format!("injected get failure at {key:?}")));
        }
        if self.absent.contains(key) {
            return Ok(None);
        }
        self.inner.get(key)
    }

    fn put(&self, entry: &Entry) -> StorageResult<()> {
        self.put_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_put.contains(&entry.key) {
            return Err(StorageError::Unavailable(format!(
                "injected put failure at {:?}",
                entry.key
            )));
        }
        self.inner.put(entry)
    }
}

/// Wraps a backend whose `put` blocks until the gate is opened.
///
/// Used to hold transfer workers still while observing how far the
/// enumerator gets.
#[derive(Debug, Default)]
pub struct GatedBackend<B> {
    inner: B,
    open: Mutex<bool>,
    opened: Condvar,
    list_calls: AtomicU64,
}

impl<B: KvBackend> GatedBackend<B> {
    /// Wraps `inner` with the gate closed.
    pub fn new(inner: B) -> Self {
        Self {
            inner,
            open: Mutex::new(false),
            opened: Condvar::new(),
            list_calls: AtomicU64::new(0),
        }
    }

    /// Opens the gate, releasing blocked and future `put` calls.
    pub fn open(&self) {
        *self.open.lock() = true;
        self.opened.notify_all();
    }

    /// Number of `list` calls seen.
    pub fn list_calls(&self) -> u64 {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Returns the wrapped backend.
    pub fn inner(&self) -> &B {
        &self.inner
    }
}

impl<B: KvBackend> KvBackend for GatedBackend<B> {
    fn list(&self, prefix: &str) -> StorageResult<Vec<String>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.list(prefix)
    }

    fn get(&self, key: &str) -> StorageResult<Option<Entry>> {
        self.inner.get(key)
    }

    fn put(&self, entry: &Entry) -> StorageResult<()> {
        let mut open = self.open.lock();
        while !*open {
            self.opened.wait(&mut open);
        }
        drop(open);
        self.inner.put(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kvmigrate_storage::InMemoryBackend;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn faults_apply_per_key() {
        let backend = FaultyBackend::new(InMemoryBackend::with_entries([("a", "1"), ("b", "2")]))
            .fail_get("a")
            .absent("b")
            .fail_put("c")
            .fail_list("x/");

        assert!(backend.get("a").is_err());
        assert!(backend.get("b").unwrap().is_none());
        assert!(backend.put(&Entry::new("c", b"3".to_vec())).is_err());
        assert!(backend.put(&Entry::new("d", b"4".to_vec())).is_ok());
        assert!(backend.list("x/").is_err());
        assert_eq!(backend.list("").unwrap(), vec!["a", "b", "d"]);

        assert_eq!(backend.get_calls(), 2);
        assert_eq!(backend.put_calls(), 2);
        assert_eq!(backend.list_calls(), 2);
    }

    #[test]
    #[should_panic(expected = "injected panic")]
    fn panic_on_get() {
        let backend = FaultyBackend::new(InMemoryBackend::new()).panic_on_get("k");
        let _ = backend.get("k");
    }

    #[test]
    fn gate_blocks_puts_until_opened() {
        let backend = Arc::new(GatedBackend::new(InMemoryBackend::new()));
        let writer = {
            let backend = Arc::clone(&backend);
            thread::spawn(move || backend.put(&Entry::new("k", b"v".to_vec())))
        };

        thread::sleep(Duration::from_millis(50));
        assert!(!writer.is_finished());
        assert!(backend.inner().is_empty());

        backend.open();
        writer.join().unwrap().unwrap();
        assert_eq!(backend.inner().len(), 1);
    }
}
