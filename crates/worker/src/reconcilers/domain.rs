//! Domain controller topology discovery and liveness probing.
//!
//! Discovery replaces the whole topology in one transaction. Liveness
//! probing runs more often, touches only each controller's status, and
//! writes each result as soon as that controller's probe completes.

use std::collections::HashMap;

use futures::stream::{self, StreamExt};
use helpdesk_core::reconcile::topology::assign_roles;
use helpdesk_core::status::ResourceStatus;
use helpdesk_db::models::domain_controller::{CurrentDomain, NewDomainController};
use helpdesk_db::repositories::DomainControllerRepo;
use helpdesk_db::DbPool;
use serde::Serialize;
use tokio::sync::RwLock;

use crate::error::ReconcileError;
use crate::source::{DomainTopologySource, ReachabilityProbe};

/// Result of one topology discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveryReport {
    pub domain_name: String,
    pub pdc_name: String,
    pub ddc_name: String,
    pub controllers: usize,
}

/// Result of one liveness pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProbeReport {
    pub online: usize,
    pub offline: usize,
    /// Probes that failed at the transport level (recorded as offline).
    pub probe_failures: usize,
    /// Status writes that failed; those controllers keep their old status.
    pub write_failures: usize,
    /// Controllers removed by a concurrent discovery before their write.
    pub vanished: usize,
}

/// Cached current-domain record.
///
/// Filled by discovery or on first read, cleared by
/// [`DomainCache::invalidate`].
#[derive(Debug, Default)]
pub struct DomainCache {
    current: RwLock<Option<CurrentDomain>>,
}

impl DomainCache {
    pub async fn get(&self) -> Option<CurrentDomain> {
        self.current.read().await.clone()
    }

    pub async fn set(&self, domain: CurrentDomain) {
        *self.current.write().await = Some(domain);
    }

    pub async fn invalidate(&self) {
        *self.current.write().await = None;
    }
}

/// Outcome of probing one controller.
struct ControllerProbe {
    status: ResourceStatus,
    probe_failed: bool,
    written: Result<bool, sqlx::Error>,
}

pub struct DomainReconciler<T, P> {
    pool: DbPool,
    topology: T,
    probe: P,
    probe_concurrency: usize,
    cache: DomainCache,
}

impl<T, P> DomainReconciler<T, P>
where
    T: DomainTopologySource,
    P: ReachabilityProbe,
{
    pub fn new(pool: DbPool, topology: T, probe: P, probe_concurrency: usize) -> Self {
        Self {
            pool,
            topology,
            probe,
            probe_concurrency: probe_concurrency.max(1),
            cache: DomainCache::default(),
        }
    }

    /// Fetch the topology and replace all controllers and the current domain.
    ///
    /// Controllers that survive the refresh keep their last probed status;
    /// new ones start offline until the next liveness pass.
    pub async fn discover(&self) -> Result<DiscoveryReport, ReconcileError> {
        let topology = self.topology.fetch_domain_topology().await?;
        let assignments = assign_roles(&topology);

        let mut tx = self.pool.begin().await?;
        let previous: HashMap<String, ResourceStatus> = DomainControllerRepo::list(&mut *tx)
            .await?
            .into_iter()
            .map(|c| {
                let status = c.status();
                (c.name, status)
            })
            .collect();

        let controllers: Vec<NewDomainController> = assignments
            .into_iter()
            .map(|a| NewDomainController {
                status: previous
                    .get(&a.name)
                    .copied()
                    .unwrap_or(ResourceStatus::Offline),
                name: a.name,
                details: a.details,
                role: a.role,
            })
            .collect();

        let domain = DomainControllerRepo::replace_topology(
            &mut tx,
            &topology.domain_name,
            &topology.pdc_name,
            &topology.ddc_name,
            &controllers,
        )
        .await?;
        tx.commit().await?;

        self.cache.set(domain).await;

        let report = DiscoveryReport {
            domain_name: topology.domain_name,
            pdc_name: topology.pdc_name,
            ddc_name: topology.ddc_name,
            controllers: controllers.len(),
        };
        tracing::info!(
            domain = %report.domain_name,
            pdc = %report.pdc_name,
            ddc = %report.ddc_name,
            controllers = report.controllers,
            "Domain topology discovered"
        );
        Ok(report)
    }

    /// Probe every known controller and record it online or offline.
    ///
    /// A failing probe marks only that controller offline. Only failing to
    /// list the controllers aborts the pass.
    pub async fn probe_liveness(&self) -> Result<ProbeReport, ReconcileError> {
        let names = DomainControllerRepo::list_names(&self.pool).await?;

        let results: Vec<(String, ControllerProbe)> = stream::iter(names)
            .map(|name| async move {
                let outcome = self.probe_one(&name).await;
                (name, outcome)
            })
            .buffer_unordered(self.probe_concurrency)
            .collect()
            .await;

        let mut report = ProbeReport::default();
        for (name, outcome) in results {
            match outcome.status {
                ResourceStatus::Online => report.online += 1,
                ResourceStatus::Offline => report.offline += 1,
            }
            if outcome.probe_failed {
                report.probe_failures += 1;
            }
            match outcome.written {
                Ok(true) => {}
                Ok(false) => {
                    tracing::debug!(controller = %name, "Controller disappeared before status write");
                    report.vanished += 1;
                }
                Err(e) => {
                    tracing::error!(controller = %name, error = %e, "Failed to record controller status");
                    report.write_failures += 1;
                }
            }
        }

        tracing::info!(
            online = report.online,
            offline = report.offline,
            probe_failures = report.probe_failures,
            write_failures = report.write_failures,
            "Controller liveness pass complete"
        );
        Ok(report)
    }

    /// The current domain, from cache or the database.
    pub async fn current_domain(&self) -> Result<Option<CurrentDomain>, ReconcileError> {
        if let Some(domain) = self.cache.get().await {
            return Ok(Some(domain));
        }
        let loaded = DomainControllerRepo::find_current_domain(&self.pool).await?;
        if let Some(domain) = &loaded {
            self.cache.set(domain.clone()).await;
        }
        Ok(loaded)
    }

    /// Drop the cached current domain so the next read hits the database.
    pub async fn invalidate_cache(&self) {
        self.cache.invalidate().await;
    }

    async fn probe_one(&self, name: &str) -> ControllerProbe {
        let (status, probe_failed) = match self.probe.is_reachable(name).await {
            Ok(true) => (ResourceStatus::Online, false),
            Ok(false) => (ResourceStatus::Offline, false),
            Err(e) => {
                tracing::warn!(error = %e, "Treating controller as offline");
                (ResourceStatus::Offline, true)
            }
        };
        let written = DomainControllerRepo::update_status(&self.pool, name, status).await;
        ControllerProbe {
            status,
            probe_failed,
            written,
        }
    }
}
