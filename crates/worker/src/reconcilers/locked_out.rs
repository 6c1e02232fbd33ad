//! Locked-out account reconciliation.
//!
//! Persisted accounts mirror the latest snapshot exactly: an account that
//! is no longer in the snapshot has been unlocked and is removed.

use helpdesk_core::reconcile::set_diff;
use helpdesk_db::repositories::LockedOutUserRepo;
use helpdesk_db::DbPool;
use serde::Serialize;

use crate::error::ReconcileError;
use crate::source::LockedOutUserSource;

/// Result of one locked-out account reconciliation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LockedOutRunReport {
    pub upserted: usize,
    pub deleted: usize,
    /// The snapshot was empty and the table was cleared wholesale.
    pub cleared: bool,
}

pub struct LockedOutUserReconciler<S> {
    pool: DbPool,
    source: S,
}

impl<S: LockedOutUserSource> LockedOutUserReconciler<S> {
    pub fn new(pool: DbPool, source: S) -> Self {
        Self { pool, source }
    }

    pub async fn reconcile(&self) -> Result<LockedOutRunReport, ReconcileError> {
        let users = self.source.fetch_locked_out_users().await?;

        if users.is_empty() {
            let deleted = LockedOutUserRepo::delete_all(&self.pool).await? as usize;
            tracing::info!(deleted, "No locked-out accounts; cleared table");
            return Ok(LockedOutRunReport {
                upserted: 0,
                deleted,
                cleared: true,
            });
        }

        let mut tx = self.pool.begin().await?;
        let current = LockedOutUserRepo::list_ids(&mut *tx).await?;
        let plan = set_diff::plan(current, users);

        for account_id in &plan.deletes {
            LockedOutUserRepo::delete(&mut *tx, account_id).await?;
        }
        for user in &plan.upserts {
            LockedOutUserRepo::upsert(&mut *tx, user).await?;
        }
        tx.commit().await?;

        let report = LockedOutRunReport {
            upserted: plan.upserts.len(),
            deleted: plan.deletes.len(),
            cleared: false,
        };
        tracing::info!(
            upserted = report.upserted,
            unlocked = report.deleted,
            "Locked-out account reconciliation complete"
        );
        Ok(report)
    }
}
