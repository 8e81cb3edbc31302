//! # kvmigrate Core
//!
//! Migration engine for kvmigrate.
//!
//! This crate provides:
//! - JSON job configuration
//! - Depth-first key enumeration over a hierarchical namespace
//! - A bounded transfer queue between enumeration and transfer
//! - A worker pool copying entries from source to destination
//! - One-shot and cron-style recurring execution
//!
//! ## Architecture
//!
//! A migration run is a three-stage pipeline:
//! 1. The enumerator lists the source namespace and pushes leaf keys
//! 2. The transfer queue buffers at most `queuesize` keys (backpressure)
//! 3. `workers` threads read each key from the source and write it to the
//!    destination
//!
//! The scheduler re-executes the run on every tick, each inside its own
//! recovery boundary.
//!
//! ## Key Invariants
//!
//! - Every run constructs its own backends, queue and workers
//! - The queue is closed once enumeration returns, success or not
//! - A run returns only after every worker has drained the queue
//! - Per-key failures are logged and counted, never fatal to the run
//! - A failing scheduled run never takes the process down
//!
//! ## Example
//!
//! ```rust
//! use kvmigrate_core::transfer;
//! use kvmigrate_storage::InMemoryBackend;
//!
//! let source = InMemoryBackend::with_entries([("a", "1"), ("b/c", "2")]);
//! let destination = InMemoryBackend::new();
//!
//! let report = transfer(&source, &destination, 16, 2).unwrap();
//! assert_eq!(report.keys_copied, 2);
//! assert_eq!(destination.snapshot(), source.snapshot());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod enumerate;
mod error;
mod migrator;
pub mod queue;
mod run;
mod schedule;
mod scheduler;
mod stats;
mod worker;

pub use config::{
    BackendDescriptor, MigrationConfig, DEFAULT_HEARTBEAT_INTERVAL, DEFAULT_QUEUE_SIZE,
    DEFAULT_WORKERS,
};
pub use enumerate::enumerate;
pub use error::{BackendRole, MigrateError, MigrateResult};
pub use migrator::{idle, Migrator, Started};
pub use run::{transfer, MigrationRun};
pub use schedule::Schedule;
pub use scheduler::{run_isolated, ScheduledJob, Scheduler, SchedulerHandle};
pub use stats::{RunReport, TransferStats};
pub use worker::{run_worker, transfer_key};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
