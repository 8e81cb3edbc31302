//! Transfer workers.
//!
//! A worker drains the transfer queue, reading each key from the source and
//! writing it to the destination. Failures are scoped to the key that
//! caused them: they are logged, counted, and the worker moves on.

use crate::error::{MigrateError, MigrateResult};
use crate::queue::KeyConsumer;
use crate::stats::TransferStats;
use kvmigrate_storage::KvBackend;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, error, warn};

/// Copies a single key from `source` to `destination`.
///
/// Returns the number of value bytes written, or `None` if the source had
/// no value for `key`.
///
/// # Errors
///
/// Returns [`MigrateError::Get`] or [`MigrateError::Put`] if either side fails.
pub fn transfer_key(
    source: &dyn KvBackend,
    destination: &dyn KvBackend,
    key: &str,
) -> MigrateResult<Option<u64>> {
    let entry = source.get(key).map_err(|source| MigrateError::Get {
        key: key.to_string(),
        source,
    })?;
    let Some(entry) = entry else {
        return Ok(None);
    };
    destination.put(&entry).map_err(|source| MigrateError::Put {
        key: key.to_string(),
        source,
    })?;
    Ok(Some(entry.value.len() as u64))
}

/// Runs one worker until the queue is closed and drained.
///
/// Returns the number of keys this worker took off the queue.
pub fn run_worker(
    id: usize,
    consumer: &KeyConsumer,
    source: &dyn KvBackend,
    destination: &dyn KvBackend,
    stats: &TransferStats,
) -> u64 {
    let mut handled = 0u64;

    while let Some(key) = consumer.pop() {
        handled += 1;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            transfer_key(source, destination, &key)
        }));

        match outcome {
            Ok(Ok(Some(bytes))) => stats.record_copied(bytes),
            Ok(Ok(None)) => {
                debug!(worker = id, key = %key, "key vanished before read; skipping");
                stats.record_absent();
            }
            Ok(Err(e)) => {
                warn!(worker = id, key = %key, error = %e, "transfer failed");
                stats.record_failed();
            }
            Err(payload) => {
                error!(
                    worker = id,
                    key = %key,
                    panic = %panic_message(payload.as_ref()),
                    "backend panicked during transfer"
                );
                stats.record_failed();
            }
        }
    }

    debug!(worker = id, handled, "worker drained");
    handled
}

/// Extracts the message carried by a panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue;
    use kvmigrate_storage::{Entry, InMemoryBackend, StorageError, StorageResult};

    struct Exploding;

    impl KvBackend for Exploding {
        fn list(&self, _prefix: &str) -> StorageResult<Vec<String>> {
            Ok(Vec::new())
        }

        fn get(&self, key: &str) -> StorageResult<Option<Entry>> {
            match key {
                "boom" => panic!("driver bug"),
                "down" => Err(StorageError::Unavailable("connection refused".into())),
                _ => Ok(Some(Entry::new(key, key.as_bytes().to_vec()))),
            }
        }

        fn put(&self, _entry: &Entry) -> StorageResult<()> {
            Ok(())
        }
    }

    #[test]
    fn transfer_key_copies_value() {
        let source = InMemoryBackend::with_entries([("a", "1")]);
        let destination = InMemoryBackend::new();

        let bytes = transfer_key(&source, &destination, "a").unwrap();
        assert_eq!(bytes, Some(1));
        assert_eq!(destination.get("a").unwrap().unwrap().value, b"1");
    }

    #[test]
    fn transfer_key_skips_absent() {
        let source = InMemoryBackend::new();
        let destination = InMemoryBackend::new();

        assert_eq!(transfer_key(&source, &destination, "gone").unwrap(), None);
        assert!(destination.is_empty());
    }

    #[test]
    fn transfer_key_reports_get_failure() {
        let destination = InMemoryBackend::new();
        let err = transfer_key(&Exploding, &destination, "down").unwrap_err();
        assert!(matches!(err, MigrateError::Get { ref key, .. } if key == "down"));
    }

    #[test]
    fn worker_continues_past_failures() {
        let destination = InMemoryBackend::new();
        let stats = TransferStats::new();
        let (mut producer, consumer) = queue::bounded(8);
        for key in ["a", "down", "boom", "b"] {
            producer.push(key.to_string()).unwrap();
        }
        producer.close();

        let handled = run_worker(0, &consumer, &Exploding, &destination, &stats);

        assert_eq!(handled, 4);
        assert_eq!(stats.keys_copied(), 2);
        assert_eq!(stats.keys_failed(), 2);
        let keys: Vec<_> = destination.snapshot().into_keys().collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn worker_with_empty_closed_queue_returns() {
        let (producer, consumer) = queue::bounded(1);
        producer.close();

        let handled = run_worker(
            3,
            &consumer,
            &InMemoryBackend::new(),
            &InMemoryBackend::new(),
            &TransferStats::new(),
        );
        assert_eq!(handled, 0);
    }

    #[test]
    fn panic_message_variants() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("static");
        assert_eq!(panic_message(payload.as_ref()), "static");
        let payload: Box<dyn std::any::Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(payload.as_ref()), "owned");
        let payload: Box<dyn std::any::Any + Send> = Box::new(7u32);
        assert_eq!(panic_message(payload.as_ref()), "non-string panic payload");
    }
}
