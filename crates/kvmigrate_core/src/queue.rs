//! Bounded transfer queue between key discovery and key transfer.
//!
//! The queue has exactly one producer handle and any number of consumer
//! handles. Closing the producer is the only way to signal "no more keys";
//! consumers keep receiving buffered keys until the buffer is drained and
//! then observe closure.
//!
//! ```rust
//! use kvmigrate_core::queue;
//!
//! let (mut producer, consumer) = queue::bounded(2);
//! producer.push("a".to_string()).unwrap();
//! producer.close();
//!
//! assert_eq!(consumer.pop().as_deref(), Some("a"));
//! assert_eq!(consumer.pop(), None);
//! ```

use kvmigrate_storage::StorageKey;
use parking_lot::Mutex;
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::sync::Arc;

/// Returned by [`KeyProducer::push`] when every consumer has gone away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueClosed(pub StorageKey);

/// Creates a queue that buffers at most `capacity` keys.
///
/// # Panics
///
/// Panics if `capacity` is zero.
pub fn bounded(capacity: usize) -> (KeyProducer, KeyConsumer) {
    assert!(capacity > 0, "transfer queue capacity must be positive");
    let (sender, receiver) = mpsc::sync_channel(capacity);
    (
        KeyProducer {
            sender,
            capacity,
            sent: 0,
        },
        KeyConsumer {
            receiver: Arc::new(Mutex::new(receiver)),
        },
    )
}

/// The single feeding side of a transfer queue.
#[derive(Debug)]
pub struct KeyProducer {
    sender: SyncSender<StorageKey>,
    capacity: usize,
    sent: u64,
}

impl KeyProducer {
    /// Enqueues `key`, blocking while the queue is full.
    ///
    /// # Errors
    ///
    /// Returns the key back if no consumer is left to receive it.
    pub fn push(&mut self, key: StorageKey) -> Result<(), QueueClosed> {
        self.sender.send(key).map_err(|e| QueueClosed(e.0))?;
        self.sent += 1;
        Ok(())
    }

    /// Number of keys accepted so far.
    pub fn sent(&self) -> u64 {
        self.sent
    }

    /// Maximum number of buffered keys.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Closes the queue, returning the number of keys accepted.
    pub fn close(self) -> u64 {
        self.sent
    }
}

/// A draining side of a transfer queue. Clones share the same buffer.
#[derive(Debug, Clone)]
pub struct KeyConsumer {
    receiver: Arc<Mutex<Receiver<StorageKey>>>,
}

impl KeyConsumer {
    /// Takes the next key, blocking while the queue is empty but open.
    ///
    /// Returns `None` once the producer is closed and the buffer is drained.
    pub fn pop(&self) -> Option<StorageKey> {
        self.receiver.lock().recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn fifo_order() {
        let (mut producer, consumer) = bounded(4);
        assert_eq!(producer.capacity(), 4);
        for key in ["a", "b", "c"] {
            producer.push(key.to_string()).unwrap();
        }
        assert_eq!(producer.close(), 3);

        let drained: Vec<_> = std::iter::from_fn(|| consumer.pop()).collect();
        assert_eq!(drained, vec!["a", "b", "c"]);
    }

    #[test]
    fn producer_blocks_when_full() {
        let (mut producer, consumer) = bounded(2);

        let feeder = thread::spawn(move || {
            for i in 0..10 {
                producer.push(format!("k{i}")).unwrap();
            }
            producer.close()
        });

        // Nothing is draining, so the producer stalls at the capacity.
        thread::sleep(Duration::from_millis(100));
        assert!(!feeder.is_finished());

        let mut received = 0;
        while consumer.pop().is_some() {
            received += 1;
        }
        assert_eq!(received, 10);
        assert_eq!(feeder.join().unwrap(), 10);
    }

    #[test]
    fn close_wakes_every_consumer() {
        let (producer, consumer) = bounded(1);

        let waiters: Vec<_> = (0..4)
            .map(|_| {
                let consumer = consumer.clone();
                thread::spawn(move || consumer.pop())
            })
            .collect();

        thread::sleep(Duration::from_millis(20));
        producer.close();

        for waiter in waiters {
            assert_eq!(waiter.join().unwrap(), None);
        }
    }

    #[test]
    fn each_key_is_delivered_once() {
        let (mut producer, consumer) = bounded(3);

        let workers: Vec<_> = (0..4)
            .map(|_| {
                let consumer = consumer.clone();
                thread::spawn(move || std::iter::from_fn(|| consumer.pop()).collect::<Vec<_>>())
            })
            .collect();
        drop(consumer);

        for i in 0..100 {
            producer.push(format!("k{i:03}")).unwrap();
        }
        producer.close();

        let mut all: Vec<String> = workers
            .into_iter()
            .flat_map(|w| w.join().unwrap())
            .collect();
        all.sort();
        let expected: Vec<String> = (0..100).map(|i| format!("k{i:03}")).collect();
        assert_eq!(all, expected);
    }

    #[test]
    fn push_fails_without_consumers() {
        let (mut producer, consumer) = bounded(1);
        drop(consumer);

        let err = producer.push("orphan".into()).unwrap_err();
        assert_eq!(err, QueueClosed("orphan".into()));
        assert_eq!(producer.sent(), 0);
    }

    #[test]
    #[should_panic(expected = "capacity must be positive")]
    fn zero_capacity_panics() {
        let _ = bounded(0);
    }
}
