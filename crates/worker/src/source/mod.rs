//! Snapshot sources consumed by the reconcilers.
//!
//! Each trait is one external collaborator from the reconcilers' point of
//! view. Production wires them to [`script::ScriptSnapshotSource`] and
//! [`probe::TcpProbe`]; tests substitute in-memory fakes.

use std::future::Future;

use helpdesk_core::snapshot::{
    DomainTopology, LockedOutUserObservation, ServerObservation, SnapshotError,
};

use crate::error::ProbeFailure;

pub mod probe;
pub mod script;

/// Current status of registered member servers.
pub trait ServerStatusSource: Send + Sync {
    /// Fetch the status of exactly the given servers.
    fn fetch_server_statuses(
        &self,
        names: &[String],
    ) -> impl Future<Output = Result<Vec<ServerObservation>, SnapshotError>> + Send;
}

/// Every directory account currently locked out.
pub trait LockedOutUserSource: Send + Sync {
    /// Fetch the full list. An empty list means no account is locked out.
    fn fetch_locked_out_users(
        &self,
    ) -> impl Future<Output = Result<Vec<LockedOutUserObservation>, SnapshotError>> + Send;
}

/// Controllers of the current domain and the designated role holders.
pub trait DomainTopologySource: Send + Sync {
    fn fetch_domain_topology(
        &self,
    ) -> impl Future<Output = Result<DomainTopology, SnapshotError>> + Send;
}

/// Reachability test for a single domain controller.
pub trait ReachabilityProbe: Send + Sync {
    /// `Ok(false)` for an unreachable controller; `Err` only for transport
    /// failures that prevented a verdict.
    fn is_reachable(&self, controller: &str)
        -> impl Future<Output = Result<bool, ProbeFailure>> + Send;
}
