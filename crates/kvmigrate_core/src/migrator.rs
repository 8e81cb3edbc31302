//! One-shot and recurring migration jobs.

use crate::config::MigrationConfig;
use crate::error::MigrateResult;
use crate::run::MigrationRun;
use crate::schedule::Schedule;
use crate::scheduler::{run_isolated, Scheduler, SchedulerHandle};
use crate::stats::RunReport;
use kvmigrate_storage::BackendRegistry;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::info;

/// How a job came up.
#[derive(Debug)]
pub enum Started {
    /// No schedule was configured; the single run has finished.
    Completed(RunReport),
    /// A schedule was configured; the initial run has finished (successfully
    /// or not) and the timer is live.
    Scheduled(SchedulerHandle),
}

/// Drives a [`MigrationConfig`] in one-shot or recurring mode.
#[derive(Debug, Clone)]
pub struct Migrator {
    run: MigrationRun,
}

impl Migrator {
    /// Creates a migrator resolving backends through `registry`.
    pub fn new(config: MigrationConfig, registry: BackendRegistry) -> Self {
        Self {
            run: MigrationRun::new(Arc::new(config), Arc::new(registry)),
        }
    }

    /// Returns the job configuration.
    pub fn config(&self) -> &MigrationConfig {
        self.run.config()
    }

    /// Executes a single migration run.
    ///
    /// # Errors
    ///
    /// Returns the run's fatal error, see [`MigrationRun::execute`].
    pub fn run_once(&self) -> MigrateResult<RunReport> {
        self.run.execute()
    }

    /// Starts the job.
    ///
    /// Without a schedule this runs once and returns the report. With a
    /// schedule, the expression is validated, the timer is started, and an
    /// initial run executes immediately inside the same recovery boundary
    /// as scheduled runs.
    ///
    /// # Errors
    ///
    /// In one-shot mode, the run's fatal error. In recurring mode, an
    /// invalid schedule expression or a timer thread that cannot be started.
    pub fn start(&self) -> MigrateResult<Started> {
        let Some(expression) = self.config().schedule.as_deref() else {
            return self.run_once().map(Started::Completed);
        };

        let schedule = Schedule::parse(expression)?;
        info!(%schedule, "starting recurring migration");

        let run = self.run.clone();
        let handle = Scheduler::new(schedule, move || run.execute()).start()?;

        info!("running initial migration");
        let _ = run_isolated(|| self.run.execute());

        Ok(Started::Scheduled(handle))
    }
}

/// Blocks the calling thread forever, logging a heartbeat every `interval`.
pub fn idle(interval: Duration) -> ! {
    loop {
        thread::sleep(interval);
        info!("waiting for the next scheduled run");
    }
}
