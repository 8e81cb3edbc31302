//! Per-run transfer counters.
//!
//! The enumerator and every worker of one run share a [`TransferStats`];
//! a successful run freezes it into a [`RunReport`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use uuid::Uuid;

/// Counters shared by the enumerator and the workers of one run.
///
/// All counters are atomic and can be read while the run is in progress.
#[derive(Debug, Default)]
pub struct TransferStats {
    /// Keys handed to the transfer queue.
    keys_enqueued: AtomicU64,
    /// Keys written to the destination.
    keys_copied: AtomicU64,
    /// Keys listed by the source but absent when read.
    keys_absent: AtomicU64,
    /// Keys whose read or write failed.
    keys_failed: AtomicU64,
    /// Value bytes written to the destination.
    bytes_copied: AtomicU64,
}

impl TransferStats {
    /// Creates zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_enqueued(&self) {
        self.keys_enqueued.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_copied(&self, bytes: u64) {
        self.keys_copied.fetch_add(1, Ordering::Relaxed);
        self.bytes_copied.fetch_add(bytes, Ordering::Relaxed);
    }

    pub(crate) fn record_absent(&self) {
        self.keys_absent.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failed(&self) {
        self.keys_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Keys handed to the transfer queue so far.
    pub fn keys_enqueued(&self) -> u64 {
        self.keys_enqueued.load(Ordering::Relaxed)
    }

    /// Keys written to the destination so far.
    pub fn keys_copied(&self) -> u64 {
        self.keys_copied.load(Ordering::Relaxed)
    }

    /// Keys skipped because the source had no value.
    pub fn keys_absent(&self) -> u64 {
        self.keys_absent.load(Ordering::Relaxed)
    }

    /// Keys whose transfer failed.
    pub fn keys_failed(&self) -> u64 {
        self.keys_failed.load(Ordering::Relaxed)
    }

    /// Value bytes written so far.
    pub fn bytes_copied(&self) -> u64 {
        self.bytes_copied.load(Ordering::Relaxed)
    }

    /// Freezes the counters into a report.
    pub fn report(&self, run_id: Uuid, duration: Duration) -> RunReport {
        RunReport {
            run_id,
            keys_enqueued: self.keys_enqueued(),
            keys_copied: self.keys_copied(),
            keys_absent: self.keys_absent(),
            keys_failed: self.keys_failed(),
            bytes_copied: self.bytes_copied(),
            duration,
        }
    }
}

/// Outcome of a completed migration run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Identifier of the run, also recorded on its tracing span.
    pub run_id: Uuid,
    /// Leaf keys discovered and enqueued.
    pub keys_enqueued: u64,
    /// Keys written to the destination.
    pub keys_copied: u64,
    /// Keys skipped because the source had no value.
    pub keys_absent: u64,
    /// Keys whose read or write failed.
    pub keys_failed: u64,
    /// Value bytes written.
    pub bytes_copied: u64,
    /// Wall time of the run.
    pub duration: Duration,
}

impl RunReport {
    /// Returns true if every discovered key was either copied or absent.
    pub fn is_clean(&self) -> bool {
        self.keys_failed == 0
    }
}
