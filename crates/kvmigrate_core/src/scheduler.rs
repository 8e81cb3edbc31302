//! Recurring execution of migration runs.
//!
//! A timer thread sleeps until the next fire time of a [`Schedule`] and then
//! launches the job on a thread of its own, inside [`run_isolated`]. A failing
//! or panicking run is logged and the timer carries on. Runs are not
//! serialized: a slow run may still be active when the next one starts.

use crate::error::{MigrateError, MigrateResult};
use crate::schedule::Schedule;
use crate::stats::RunReport;
use crate::worker::panic_message;
use chrono::Utc;
use parking_lot::{Condvar, Mutex};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{error, info, warn};

/// A job the scheduler can trigger repeatedly.
pub type ScheduledJob = Arc<dyn Fn() -> MigrateResult<RunReport> + Send + Sync>;

/// Runs `job`, turning a panic into [`MigrateError::RecoveredFault`] and
/// logging the outcome.
///
/// # Errors
///
/// Returns whatever the job returned, or the recovered fault.
pub fn run_isolated<F>(job: F) -> MigrateResult<RunReport>
where
    F: FnOnce() -> MigrateResult<RunReport>,
{
    let outcome = panic::catch_unwind(AssertUnwindSafe(job)).unwrap_or_else(|payload| {
        Err(MigrateError::RecoveredFault(panic_message(payload.as_ref())))
    });

    match &outcome {
        Ok(report) => info!(
            run_id = %report.run_id,
            copied = report.keys_copied,
            failed = report.keys_failed,
            "scheduled migration finished"
        ),
        Err(e) => error!(error = %e, "scheduled migration failed"),
    }
    outcome
}

struct TimerState {
    stopped: Mutex<bool>,
    wake: Condvar,
    ticks: AtomicU64,
}

/// Triggers a job on every tick of a schedule.
pub struct Scheduler {
    schedule: Schedule,
    job: ScheduledJob,
}

impl Scheduler {
    /// Creates a scheduler for `job`.
    pub fn new<F>(schedule: Schedule, job: F) -> Self
    where
        F: Fn() -> MigrateResult<RunReport> + Send + Sync + 'static,
    {
        Self {
            schedule,
            job: Arc::new(job),
        }
    }

    /// Starts the timer thread.
    ///
    /// Dropping the returned handle stops future ticks.
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::ThreadSpawn`] if the timer thread cannot be
    /// started.
    pub fn start(self) -> MigrateResult<SchedulerHandle> {
        self.start_on(thread::Builder::new())
    }

    fn start_on(self, builder: thread::Builder) -> MigrateResult<SchedulerHandle> {
        let state = Arc::new(TimerState {
            stopped: Mutex::new(false),
            wake: Condvar::new(),
            ticks: AtomicU64::new(0),
        });

        let name = "kvmigrate-timer".to_string();
        let timer_state = Arc::clone(&state);
        let timer = builder
            .name(name.clone())
            .spawn(move || timer_loop(&self.schedule, &self.job, &timer_state))
            .map_err(|source| MigrateError::ThreadSpawn { name, source })?;

        Ok(SchedulerHandle {
            state,
            timer: Some(timer),
        })
    }
}

fn timer_loop(schedule: &Schedule, job: &ScheduledJob, state: &TimerState) {
    let mut last = Utc::now();

    loop {
        let Some(next) = schedule.next_after(last) else {
            warn!(%schedule, "schedule has no future fire time; timer stopping");
            return;
        };

        {
            let mut stopped = state.stopped.lock();
            loop {
                if *stopped {
                    return;
                }
                let now = Utc::now();
                if now >= next {
                    break;
                }
                let wait = (next - now).to_std().unwrap_or_default();
                state.wake.wait_for(&mut stopped, wait);
            }
        }

        last = next.max(Utc::now());
        let tick = state.ticks.fetch_add(1, Ordering::SeqCst) + 1;

        let job = Arc::clone(job);
        let spawned = thread::Builder::new()
            .name(format!("kvmigrate-run-{tick}"))
            .spawn(move || {
                let _ = run_isolated(|| job());
            });
        if let Err(e) = spawned {
            error!(tick, error = %e, "failed to spawn scheduled migration");
        }
    }
}

/// Controls a started [`Scheduler`].
pub struct SchedulerHandle {
    state: Arc<TimerState>,
    timer: Option<JoinHandle<()>>,
}

impl SchedulerHandle {
    /// Number of ticks fired so far.
    pub fn ticks(&self) -> u64 {
        self.state.ticks.load(Ordering::SeqCst)
    }

    /// Returns true while the timer thread is alive.
    pub fn is_running(&self) -> bool {
        self.timer.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stops future ticks and waits for the timer thread.
    ///
    /// Runs already launched are not interrupted.
    pub fn stop(&mut self) {
        *self.state.stopped.lock() = true;
        self.state.wake.notify_all();
        if let Some(timer) = self.timer.take() {
            if timer.join().is_err() {
                error!("scheduler thread panicked");
            }
        }
    }
}

impl Drop for SchedulerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for SchedulerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchedulerHandle")
            .field("ticks", &self.ticks())
            .field("running", &self.is_running())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::TransferStats;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;
    use uuid::Uuid;

    fn empty_report() -> RunReport {
        TransferStats::new().report(Uuid::nil(), Duration::ZERO)
    }

    fn wait_for(counter: &AtomicUsize, at_least: usize) -> bool {
        for _ in 0..200 {
            if counter.load(Ordering::SeqCst) >= at_least {
                return true;
            }
            thread::sleep(Duration::from_millis(10));
        }
        false
    }

    #[test]
    fn run_isolated_passes_through_success() {
        let report = run_isolated(|| Ok(empty_report())).unwrap();
        assert_eq!(report.keys_copied, 0);
    }

    #[test]
    fn run_isolated_passes_through_errors() {
        let err = run_isolated(|| Err(MigrateError::UnknownBackendKind("x".into()))).unwrap_err();
        assert!(matches!(err, MigrateError::UnknownBackendKind(_)));
    }

    #[test]
    fn run_isolated_recovers_panics() {
        let err = run_isolated(|| panic!("backend driver exploded")).unwrap_err();
        match err {
            MigrateError::RecoveredFault(msg) => assert!(msg.contains("exploded")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn fires_repeatedly() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        let schedule = Schedule::parse("@every 20ms").unwrap();

        let mut handle = Scheduler::new(schedule, move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(empty_report())
        })
        .start()
        .unwrap();

        assert!(wait_for(&runs, 3));
        assert!(handle.is_running());
        handle.stop();
        assert!(!handle.is_running());
        assert!(handle.ticks() >= 3);
    }

    #[test]
    fn failures_and_panics_do_not_stop_the_timer() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        let schedule = Schedule::parse("@every 20ms").unwrap();

        let handle = Scheduler::new(schedule, move || {
            match counter.fetch_add(1, Ordering::SeqCst) {
                0 => panic!("first run blows up"),
                1 => Err(MigrateError::Config("second run fails".into())),
                _ => Ok(empty_report()),
            }
        })
        .start()
        .unwrap();

        assert!(wait_for(&runs, 4));
        assert!(handle.is_running());
    }

    #[test]
    fn timer_spawn_failure_is_an_error() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        let schedule = Schedule::parse("@every 10ms").unwrap();
        // No address space can hold a stack this large.
        let builder = thread::Builder::new().stack_size(1 << 55);

        let err = Scheduler::new(schedule, move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(empty_report())
        })
        .start_on(builder)
        .unwrap_err();

        assert!(matches!(err, MigrateError::ThreadSpawn { ref name, .. } if name == "kvmigrate-timer"));
        thread::sleep(Duration::from_millis(50));
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn stop_prevents_future_ticks() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        let schedule = Schedule::parse("@every 1h").unwrap();

        let mut handle = Scheduler::new(schedule, move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(empty_report())
        })
        .start()
        .unwrap();

        handle.stop();
        assert_eq!(handle.ticks(), 0);
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }
}
