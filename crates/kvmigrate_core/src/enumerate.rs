//! Depth-first discovery of leaf keys.

use crate::error::{MigrateError, MigrateResult};
use crate::queue::KeyProducer;
use crate::stats::TransferStats;
use kvmigrate_storage::{is_namespace, KvBackend, StorageKey};
use tracing::{debug, info, warn};

/// Walks the namespace under `prefix` and pushes every leaf key into
/// `producer`, returning how many keys were enqueued.
///
/// Children are visited depth-first in the order `list` returns them. The
/// walk keeps its own stack, so nesting depth is bounded only by memory.
/// Blocks whenever the queue is full.
///
/// # Errors
///
/// Returns [`MigrateError::List`] for the first namespace that cannot be
/// listed; keys pushed before the failure stay queued. Returns
/// [`MigrateError::QueueClosed`] if every consumer disappeared.
pub fn enumerate(
    source: &dyn KvBackend,
    prefix: &str,
    producer: &mut KeyProducer,
    stats: &TransferStats,
) -> MigrateResult<u64> {
    let mut enqueued = 0u64;
    // Pending paths, last element visited first.
    let mut stack: Vec<StorageKey> = Vec::new();
    push_children(source, prefix, &mut stack)?;

    while let Some(path) = stack.pop() {
        if is_namespace(&path) {
            push_children(source, &path, &mut stack)?;
            continue;
        }

        debug!(key = %path, "copying key");
        producer
            .push(path)
            .map_err(|_| MigrateError::QueueClosed)?;
        stats.record_enqueued();
        enqueued += 1;
    }

    if prefix.is_empty() {
        info!(keys = enqueued, "all keys enqueued");
    }
    Ok(enqueued)
}

fn push_children(
    source: &dyn KvBackend,
    prefix: &str,
    stack: &mut Vec<StorageKey>,
) -> MigrateResult<()> {
    let names = source.list(prefix).map_err(|source| MigrateError::List {
        prefix: prefix.to_string(),
        source,
    })?;

    for name in names.into_iter().rev() {
        if name.is_empty() {
            warn!(prefix, "skipping empty child name");
            continue;
        }
        stack.push(format!("{prefix}{name}"));
    }
    Ok(())
}
