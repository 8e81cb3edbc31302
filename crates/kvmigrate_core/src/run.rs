//! One complete migration pass.

use crate::config::MigrationConfig;
use crate::enumerate::enumerate;
use crate::error::{BackendRole, MigrateError, MigrateResult};
use crate::queue;
use crate::stats::{RunReport, TransferStats};
use crate::worker::run_worker;
use kvmigrate_storage::{BackendRegistry, KvBackend};
use std::sync::Arc;
use std::thread;
use std::time::Instant;
use tracing::{info, info_span, warn, Span};
use uuid::Uuid;

/// A migration pass bound to a configuration and a backend registry.
///
/// Every call to [`MigrationRun::execute`] constructs fresh backends, a
/// fresh transfer queue and a fresh worker pool; nothing is reused between
/// executions.
#[derive(Debug, Clone)]
pub struct MigrationRun {
    config: Arc<MigrationConfig>,
    registry: Arc<BackendRegistry>,
}

impl MigrationRun {
    /// Creates a run for `config`, resolving backends through `registry`.
    pub fn new(config: Arc<MigrationConfig>, registry: Arc<BackendRegistry>) -> Self {
        Self { config, registry }
    }

    /// Returns the configuration this run executes.
    pub fn config(&self) -> &MigrationConfig {
        &self.config
    }

    /// Executes one complete pass from source to destination.
    ///
    /// Per-key read/write failures do not fail the run; they are logged and
    /// counted in [`RunReport::keys_failed`].
    ///
    /// # Errors
    ///
    /// Returns the first fatal error: an invalid configuration, a backend
    /// that cannot be constructed, or a namespace that cannot be listed.
    pub fn execute(&self) -> MigrateResult<RunReport> {
        self.config.validate()?;

        let run_id = Uuid::new_v4();
        let span = info_span!("migration", %run_id);
        let _entered = span.enter();

        let from = &self.config.from;
        let to = &self.config.to;
        info!(from = %from.name, to = %to.name, "migration started");

        let source = self
            .registry
            .construct(&from.name, &from.config)
            .map_err(|e| MigrateError::construction(BackendRole::Source, e))?;
        let destination = self
            .registry
            .construct(&to.name, &to.config)
            .map_err(|e| MigrateError::construction(BackendRole::Destination, e))?;

        run_pipeline(
            run_id,
            source.as_ref(),
            destination.as_ref(),
            self.config.queue_size,
            self.config.workers,
        )
    }
}

/// Migrates every key of `source` into `destination` using already
/// constructed backends.
///
/// # Errors
///
/// Returns [`MigrateError::Config`] for zero sizing, otherwise the same
/// errors as [`MigrationRun::execute`] minus backend construction.
pub fn transfer(
    source: &dyn KvBackend,
    destination: &dyn KvBackend,
    queue_size: usize,
    workers: usize,
) -> MigrateResult<RunReport> {
    if queue_size == 0 || workers == 0 {
        return Err(MigrateError::Config(
            "queue size and worker count must be positive".into(),
        ));
    }
    let run_id = Uuid::new_v4();
    let span = info_span!("migration", %run_id);
    let _entered = span.enter();
    run_pipeline(run_id, source, destination, queue_size, workers)
}

/// Enumerator -> bounded queue -> worker pool.
///
/// The queue is closed as soon as enumeration returns, whatever the
/// outcome, and the pool is always joined before returning.
fn run_pipeline(
    run_id: Uuid,
    source: &dyn KvBackend,
    destination: &dyn KvBackend,
    queue_size: usize,
    workers: usize,
) -> MigrateResult<RunReport> {
    run_pipeline_on(run_id, source, destination, queue_size, workers, &|_| {
        thread::Builder::new()
    })
}

fn run_pipeline_on(
    run_id: Uuid,
    source: &dyn KvBackend,
    destination: &dyn KvBackend,
    queue_size: usize,
    workers: usize,
    builder: &dyn Fn(usize) -> thread::Builder,
) -> MigrateResult<RunReport> {
    let started = Instant::now();
    let stats = TransferStats::new();
    let (mut producer, consumer) = queue::bounded(queue_size);
    info!(queue_size = producer.capacity(), workers, "starting transfer");

    let (enumerated, panicked) = thread::scope(|scope| {
        let mut handles = Vec::with_capacity(workers);
        let mut spawn_failure = None;
        for id in 0..workers {
            let consumer = consumer.clone();
            let stats = &stats;
            let span = Span::current();
            let name = format!("kvmigrate-worker-{id}");
            let spawned = builder(id).name(name.clone()).spawn_scoped(scope, move || {
                let _entered = span.enter();
                run_worker(id, &consumer, source, destination, stats)
            });
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    spawn_failure = Some(MigrateError::ThreadSpawn { name, source: e });
                    break;
                }
            }
        }
        // Workers hold the only consumers, so a dead pool unblocks the producer.
        drop(consumer);

        let enumerated = match spawn_failure {
            Some(err) => Err(err),
            None => enumerate(source, "", &mut producer, &stats),
        };
        producer.close();
        if let Err(e) = &enumerated {
            warn!(error = %e, "run aborted; draining already queued keys");
        }

        let mut panicked = None;
        for (id, handle) in handles.into_iter().enumerate() {
            if handle.join().is_err() && panicked.is_none() {
                panicked = Some(id);
            }
        }
        (enumerated, panicked)
    });

    if let Some(worker) = panicked {
        return Err(MigrateError::WorkerPanicked { worker });
    }
    enumerated?;

    let report = stats.report(run_id, started.elapsed());
    info!(
        copied = report.keys_copied,
        absent = report.keys_absent,
        failed = report.keys_failed,
        bytes = report.bytes_copied,
        elapsed_ms = report.duration.as_millis() as u64,
        "all the keys have been copied"
    );
    Ok(report)
}
