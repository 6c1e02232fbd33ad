//! Interval scheduler: one run in flight per job, serialized per resource kind.
//!
//! Each [`JobKind`] gets its own `tokio::time::interval` loop. The first
//! tick fires immediately, giving the startup run. A tick or manual trigger
//! for a job that is already in flight is dropped, never queued. Jobs that
//! touch the same tables (topology discovery and liveness probing) also
//! share a per-resource lock, so one waits for the other instead of losing
//! its run.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::{BoxFuture, FutureExt};
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::error::ReconcileError;
use crate::reconcilers::RunSummary;

/// Tables a job writes. Jobs of the same kind never run concurrently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Servers,
    LockedOutUsers,
    DomainControllers,
}

/// A schedulable reconciliation operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    ServerStatus,
    LockedOutUsers,
    DomainTopology,
    ControllerLiveness,
}

impl JobKind {
    pub const ALL: [JobKind; 4] = [
        JobKind::ServerStatus,
        JobKind::LockedOutUsers,
        JobKind::DomainTopology,
        JobKind::ControllerLiveness,
    ];

    pub fn resource(self) -> ResourceKind {
        match self {
            JobKind::ServerStatus => ResourceKind::Servers,
            JobKind::LockedOutUsers => ResourceKind::LockedOutUsers,
            JobKind::DomainTopology | JobKind::ControllerLiveness => {
                ResourceKind::DomainControllers
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobKind::ServerStatus => "server_status",
            JobKind::LockedOutUsers => "locked_out_users",
            JobKind::DomainTopology => "domain_topology",
            JobKind::ControllerLiveness => "controller_liveness",
        }
    }
}

/// What started a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Timer,
    Manual,
}

/// Result of asking a job to run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TriggerOutcome {
    Completed { summary: RunSummary },
    Failed { error: String },
    /// A run of the same job was in flight; nothing ran.
    AlreadyRunning,
    /// No job of that kind is registered.
    NotScheduled,
}

// ---------------------------------------------------------------------------
// Single-flight guard
// ---------------------------------------------------------------------------

/// At-most-one-in-flight flag for a single job.
#[derive(Debug, Default)]
pub struct SingleFlight {
    busy: AtomicBool,
}

impl SingleFlight {
    /// Claim the flight, or `None` if a run already holds it.
    pub fn try_claim(self: &Arc<Self>) -> Option<FlightGuard> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| FlightGuard(Arc::clone(self)))
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Releases the flight when dropped, including on panic or early return.
#[derive(Debug)]
pub struct FlightGuard(Arc<SingleFlight>);

impl Drop for FlightGuard {
    fn drop(&mut self) {
        self.0.busy.store(false, Ordering::Release);
    }
}

// ---------------------------------------------------------------------------
// Jobs
// ---------------------------------------------------------------------------

type JobFn = Arc<dyn Fn() -> BoxFuture<'static, Result<RunSummary, ReconcileError>> + Send + Sync>;

struct ScheduledJob {
    kind: JobKind,
    interval: Duration,
    flight: Arc<SingleFlight>,
    /// Shared with every job writing the same tables.
    resource: Arc<Mutex<()>>,
    run: JobFn,
}

impl ScheduledJob {
    async fn run_once(&self, trigger: Trigger) -> TriggerOutcome {
        let Some(_guard) = self.flight.try_claim() else {
            tracing::debug!(
                job = self.kind.as_str(),
                ?trigger,
                "Run already in flight; skipping"
            );
            return TriggerOutcome::AlreadyRunning;
        };

        let _resource = match self.resource.try_lock() {
            Ok(held) => held,
            Err(_) => {
                tracing::debug!(
                    job = self.kind.as_str(),
                    resource = ?self.kind.resource(),
                    "Waiting for sibling job to finish"
                );
                self.resource.lock().await
            }
        };

        let started = Instant::now();
        let result = (self.run)().await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(summary) => {
                tracing::debug!(job = self.kind.as_str(), ?trigger, elapsed_ms, "Run finished");
                TriggerOutcome::Completed { summary }
            }
            Err(e) => {
                tracing::error!(
                    job = self.kind.as_str(),
                    ?trigger,
                    elapsed_ms,
                    error = %e,
                    "Reconciliation run failed"
                );
                TriggerOutcome::Failed {
                    error: e.to_string(),
                }
            }
        }
    }

    async fn run_loop(self: Arc<Self>, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(
            job = self.kind.as_str(),
            interval_secs = self.interval.as_secs(),
            "Reconciliation job started"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!(job = self.kind.as_str(), "Reconciliation job stopping");
                    break;
                }
                _ = ticker.tick() => {
                    self.run_once(Trigger::Timer).await;
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Builder for the set of scheduled jobs.
#[derive(Default)]
pub struct Scheduler {
    jobs: HashMap<JobKind, Arc<ScheduledJob>>,
    resources: HashMap<ResourceKind, Arc<Mutex<()>>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `run` to execute every `interval` (must be non-zero).
    ///
    /// Registering the same kind twice replaces the earlier job.
    pub fn add_job<F, Fut>(&mut self, kind: JobKind, interval: Duration, run: F) -> &mut Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<RunSummary, ReconcileError>> + Send + 'static,
    {
        let resource = Arc::clone(self.resources.entry(kind.resource()).or_default());
        let run: JobFn = Arc::new(move || run().boxed());
        self.jobs.insert(
            kind,
            Arc::new(ScheduledJob {
                kind,
                interval,
                flight: Arc::default(),
                resource,
                run,
            }),
        );
        self
    }

    /// Handle for manual triggers without starting the timers.
    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            jobs: Arc::new(self.jobs.clone()),
        }
    }

    /// Start one timer loop per job. Loops exit when `cancel` fires, after
    /// any in-flight run completes.
    ///
    /// Loops start in [`JobKind::ALL`] order, so at startup topology
    /// discovery normally takes the domain lock before liveness probing.
    pub fn spawn(self, cancel: &CancellationToken) -> (SchedulerHandle, Vec<JoinHandle<()>>) {
        let handle = self.handle();
        let mut jobs: Vec<_> = self.jobs.into_values().collect();
        jobs.sort_by_key(|job| job.kind);
        let tasks = jobs
            .into_iter()
            .map(|job| tokio::spawn(job.run_loop(cancel.clone())))
            .collect();
        (handle, tasks)
    }
}

/// Cloneable handle for manual "refresh now" requests.
#[derive(Clone)]
pub struct SchedulerHandle {
    jobs: Arc<HashMap<JobKind, Arc<ScheduledJob>>>,
}

impl SchedulerHandle {
    /// Run `kind` now, unless a run of the same job is in flight. Waits for
    /// a sibling job on the same tables to finish first.
    pub async fn trigger(&self, kind: JobKind) -> TriggerOutcome {
        match self.jobs.get(&kind) {
            Some(job) => job.run_once(Trigger::Manual).await,
            None => TriggerOutcome::NotScheduled,
        }
    }

    /// Whether a run of `kind` is in flight, including one waiting on its
    /// sibling.
    pub fn is_running(&self, kind: JobKind) -> bool {
        self.jobs
            .get(&kind)
            .is_some_and(|job| job.flight.is_busy())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
