//! The three resource reconcilers.
//!
//! Each one loads persisted identifiers, fetches a snapshot, derives the
//! writes, and applies them atomically. A run either commits every write
//! of the cycle or none.

pub mod domain;
pub mod locked_out;
pub mod server;

use serde::Serialize;

pub use domain::{DomainCache, DomainReconciler, DiscoveryReport, ProbeReport};
pub use locked_out::{LockedOutRunReport, LockedOutUserReconciler};
pub use server::{ServerReconciler, ServerRunReport};

/// Outcome of one successful run, for logs and manual refresh callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunSummary {
    Servers { applied: usize, skipped: usize },
    LockedOutUsers(LockedOutRunReport),
    DomainTopology(DiscoveryReport),
    ControllerLiveness(ProbeReport),
}

impl From<&ServerRunReport> for RunSummary {
    fn from(report: &ServerRunReport) -> Self {
        Self::Servers {
            applied: report.servers.len(),
            skipped: report.skipped.len(),
        }
    }
}
