//! Registers the reconcilers with the scheduler.

use std::sync::Arc;

use crate::config::JobIntervals;
use crate::error::ReconcileError;
use crate::reconcilers::{DomainReconciler, LockedOutUserReconciler, RunSummary, ServerReconciler};
use crate::scheduler::{JobKind, Scheduler};
use crate::source::{
    DomainTopologySource, LockedOutUserSource, ReachabilityProbe, ServerStatusSource,
};

/// Build a scheduler with all four reconciliation jobs.
pub fn build_scheduler<S, L, T, P>(
    servers: Arc<ServerReconciler<S>>,
    locked_out: Arc<LockedOutUserReconciler<L>>,
    domain: Arc<DomainReconciler<T, P>>,
    intervals: &JobIntervals,
) -> Scheduler
where
    S: ServerStatusSource + 'static,
    L: LockedOutUserSource + 'static,
    T: DomainTopologySource + 'static,
    P: ReachabilityProbe + 'static,
{
    let mut scheduler = Scheduler::new();

    scheduler.add_job(JobKind::ServerStatus, intervals.server_status, move || {
        let servers = Arc::clone(&servers);
        async move {
            let report = servers.reconcile().await?;
            Ok::<_, ReconcileError>(RunSummary::from(&report))
        }
    });

    scheduler.add_job(JobKind::LockedOutUsers, intervals.locked_out_users, move || {
        let locked_out = Arc::clone(&locked_out);
        async move {
            let report = locked_out.reconcile().await?;
            Ok::<_, ReconcileError>(RunSummary::LockedOutUsers(report))
        }
    });

    scheduler.add_job(JobKind::DomainTopology, intervals.domain_topology, {
        let domain = Arc::clone(&domain);
        move || {
            let domain = Arc::clone(&domain);
            async move {
                let report = domain.discover().await?;
                Ok::<_, ReconcileError>(RunSummary::DomainTopology(report))
            }
        }
    });

    scheduler.add_job(
        JobKind::ControllerLiveness,
        intervals.controller_liveness,
        move || {
            let domain = Arc::clone(&domain);
            async move {
                let report = domain.probe_liveness().await?;
                Ok::<_, ReconcileError>(RunSummary::ControllerLiveness(report))
            }
        },
    );

    scheduler
}
