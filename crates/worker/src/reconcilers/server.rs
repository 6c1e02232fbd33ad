//! Member server status reconciliation.

use std::collections::BTreeMap;

use chrono::Utc;
use helpdesk_core::reconcile::server::{next_state, TransitionKind};
use helpdesk_core::types::Timestamp;
use helpdesk_db::models::server::{Server, ServerStatusUpdate};
use helpdesk_db::repositories::ServerRepo;
use helpdesk_db::DbPool;

use crate::error::{PartialRecordError, ReconcileError};
use crate::source::ServerStatusSource;

/// Result of one server reconciliation run.
#[derive(Debug, Clone, Default)]
pub struct ServerRunReport {
    /// Rows as written by this run.
    pub servers: Vec<Server>,
    /// Snapshot records with no registered server.
    pub skipped: Vec<PartialRecordError>,
}

/// Refreshes the status of every registered server.
///
/// Servers are never created or deleted here; registration and removal are
/// administrative actions.
pub struct ServerReconciler<S> {
    pool: DbPool,
    source: S,
}

impl<S: ServerStatusSource> ServerReconciler<S> {
    pub fn new(pool: DbPool, source: S) -> Self {
        Self { pool, source }
    }

    /// Run one cycle at the current time.
    pub async fn reconcile(&self) -> Result<ServerRunReport, ReconcileError> {
        self.reconcile_at(Utc::now()).await
    }

    /// Run one cycle treating `now` as the observation time.
    pub async fn reconcile_at(&self, now: Timestamp) -> Result<ServerRunReport, ReconcileError> {
        let names = ServerRepo::list_names(&self.pool).await?;
        if names.is_empty() {
            tracing::debug!("No registered servers; skipping status snapshot");
            return Ok(ServerRunReport::default());
        }

        let observations = self.source.fetch_server_statuses(&names).await?;
        if observations.is_empty() {
            tracing::warn!(
                registered = names.len(),
                "Server status snapshot was empty; leaving servers unchanged"
            );
        }

        let mut report = ServerRunReport::default();
        let mut transitions: BTreeMap<&'static str, usize> = BTreeMap::new();
        let mut tx = self.pool.begin().await?;

        for observation in observations {
            let Some(prior) = ServerRepo::find_by_name_for_update(&mut *tx, &observation.name).await?
            else {
                let skip = PartialRecordError {
                    name: observation.name,
                };
                tracing::warn!(error = %skip, "Skipping server status record");
                report.skipped.push(skip);
                continue;
            };

            let transition = next_state(&prior.prior_state(), observation.status, now);
            *transitions.entry(transition_label(transition.kind)).or_default() += 1;
            if matches!(
                transition.kind,
                TransitionKind::WentOffline | TransitionKind::Recovered
            ) {
                tracing::info!(
                    server = %prior.name,
                    transition = transition_label(transition.kind),
                    "Server status changed"
                );
            }

            let update = ServerStatusUpdate {
                status: transition.status,
                share_service_status: observation.share_service_status,
                downtime_minutes: transition.downtime_minutes,
                last_online: transition.last_online,
                back_online: transition.back_online,
            };
            // The row is locked, so it cannot have vanished since the read.
            if let Some(row) = ServerRepo::apply_status(&mut *tx, &prior.name, &update).await? {
                report.servers.push(row);
            }
        }

        tx.commit().await?;

        tracing::info!(
            applied = report.servers.len(),
            skipped = report.skipped.len(),
            unreported = names.len().saturating_sub(report.servers.len()),
            ?transitions,
            "Server status reconciliation complete"
        );
        Ok(report)
    }
}

fn transition_label(kind: TransitionKind) -> &'static str {
    match kind {
        TransitionKind::Recovered => "recovered",
        TransitionKind::StillOnline => "still_online",
        TransitionKind::WentOffline => "went_offline",
        TransitionKind::StillOffline => "still_offline",
    }
}
