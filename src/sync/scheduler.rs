//! Drives the mirror: snapshot, reconcile, execute, sleep, repeat.
//!
//! ```text
//!   Idle ──tick──→ Syncing ──actions done / tick aborted──→ Idle ──sleep(interval)──→ ...
//! ```
//!
//! Everything runs on the calling thread. Ticks never overlap; the only
//! suspension point is the sleep between them. A [`StopSignal`] is checked
//! before each tick and before each sleep; a tick or sleep already under way
//! always runs to completion.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::{Duration, Instant};

use tracing::{debug, error, info};

use crate::config::SyncConfig;
use crate::error::Result;
use crate::fs::LocalFs;
use crate::hash::Fingerprinter;
use crate::log::SyncLog;
use crate::sync::engine::Reconciler;
use crate::sync::executor::{ActionOutcome, Executor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchedulerState {
    #[default]
    Idle,
    Syncing,
}

/// Cooperative stop request, shareable across threads.
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Counters for one tick.
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    pub copied: usize,
    pub updated: usize,
    pub removed: usize,
    /// Actions that failed and were skipped
    pub failed: usize,
    /// Actions dropped during reconciliation (fingerprint failure, unsupported entry)
    pub dropped: usize,
    pub unchanged: usize,
    /// Dry-run actions that were only logged
    pub planned: usize,
    pub elapsed: Duration,
}

impl TickReport {
    /// Number of changes made to the replica.
    pub fn changes(&self) -> usize {
        self.copied + self.updated + self.removed
    }

    fn record(&mut self, outcome: &ActionOutcome) {
        match outcome {
            ActionOutcome::Copied { .. } => self.copied += 1,
            ActionOutcome::Updated { .. } => self.updated += 1,
            ActionOutcome::Removed { .. } => self.removed += 1,
            ActionOutcome::Planned(_) => self.planned += 1,
            ActionOutcome::Failed { .. } => self.failed += 1,
        }
    }
}

pub struct Scheduler<'a> {
    config: &'a SyncConfig,
    log: SyncLog,
    reconciler: Reconciler,
    executor: Executor,
    state: SchedulerState,
    max_ticks: Option<u64>,
}

impl<'a> Scheduler<'a> {
    /// Build a scheduler for `config`, opening the log file.
    ///
    /// An unusable log file is returned as an error: without it nothing the
    /// mirror does would be on record.
    pub fn new(config: &'a SyncConfig) -> Result<Self> {
        let log = SyncLog::open(&config.log_file)?;
        Ok(Self::with_log(config, log))
    }

    /// Build a scheduler writing to an already opened log.
    pub fn with_log(config: &'a SyncConfig, log: SyncLog) -> Self {
        Self {
            config,
            log,
            reconciler: Reconciler::new(Fingerprinter::new(config.algorithm)),
            executor: Executor::new(config.dry_run),
            state: SchedulerState::Idle,
            max_ticks: None,
        }
    }

    /// Stop after `ticks` ticks instead of running forever.
    pub fn with_max_ticks(mut self, ticks: u64) -> Self {
        self.max_ticks = Some(ticks);
        self
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Run ticks until `stop` is raised (or the tick limit is hit).
    ///
    /// A tick that aborts is logged and the loop moves on to the next
    /// interval. Returns the number of ticks run.
    pub fn run(&mut self, stop: &StopSignal) -> u64 {
        info!(
            source = %self.config.source.display(),
            replica = %self.config.replica.display(),
            interval_secs = self.config.interval.as_secs(),
            "Mirror scheduler starting"
        );

        let mut ticks = 0u64;
        loop {
            if stop.is_stopped() || self.max_ticks.is_some_and(|max| ticks >= max) {
                break;
            }

            if let Ok(report) = self.run_once() {
                debug!(?report, "Tick complete");
            }
            ticks += 1;

            if stop.is_stopped() || self.max_ticks.is_some_and(|max| ticks >= max) {
                break;
            }
            std::thread::sleep(self.config.interval);
        }

        info!(ticks, "Mirror scheduler stopped");
        ticks
    }

    /// Run exactly one tick, bracketed by the start and finish markers.
    pub fn run_once(&mut self) -> Result<TickReport> {
        self.state = SchedulerState::Syncing;
        let started = Instant::now();
        let mut report = TickReport::default();

        let result = self.tick(&mut report);
        if let Err(err) = &result {
            error!(error = %err, "Synchronisation aborted");
            if let Err(log_err) = self.log.record(format!("Synchronisation aborted: {}", err)) {
                error!(error = %log_err, "Failed to record abort");
            }
        }
        let finished = self.log.finish_marker();

        self.state = SchedulerState::Idle;
        report.elapsed = started.elapsed();

        result?;
        finished?;
        Ok(report)
    }

    fn tick(&self, report: &mut TickReport) -> Result<()> {
        self.log.touch()?;
        self.log.start_marker()?;

        if LocalFs::ensure_dir(&self.config.source)? {
            self.log
                .record(format!("Created source directory \"{}\"", self.config.source.display()))?;
        }
        if LocalFs::ensure_dir(&self.config.replica)? {
            self.log
                .record(format!("Created replica directory \"{}\"", self.config.replica.display()))?;
        }

        let source = LocalFs::snapshot(&self.config.source)?;
        let replica = LocalFs::snapshot(&self.config.replica)?;
        let plan = self.reconciler.reconcile(&source, &replica);

        report.unchanged = plan.unchanged;
        report.dropped = plan.issues.len();
        for issue in &plan.issues {
            self.log.record(format!("Skipped: {}", issue))?;
        }

        for action in &plan.actions {
            let outcome = self.executor.execute(action)?;
            report.record(&outcome);
            self.log.record(outcome.message())?;
        }

        Ok(())
    }
}
