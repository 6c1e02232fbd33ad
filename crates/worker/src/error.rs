use helpdesk_core::snapshot::SnapshotError;

/// Failure of a whole reconciliation run. Persisted state is unchanged.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    /// The snapshot could not be fetched or parsed.
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    /// The transactional apply failed and was rolled back.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// A snapshot record whose persisted counterpart is missing. The record is
/// skipped; the run continues.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("No persisted record for server {name}")]
pub struct PartialRecordError {
    pub name: String,
}

/// A reachability probe failed at the transport level. The controller is
/// recorded as offline; the probe pass continues.
#[derive(Debug, thiserror::Error)]
#[error("Reachability probe for {controller} failed: {source}")]
pub struct ProbeFailure {
    pub controller: String,
    #[source]
    pub source: std::io::Error,
}
