//! Snapshot sources backed by external scripts.

use std::path::{Path, PathBuf};
use std::time::Duration;

use helpdesk_core::scripting::executor::{ScriptError, ScriptExecutor, ScriptInput};
use helpdesk_core::snapshot::{
    self, DomainTopology, LockedOutUserObservation, ServerObservation, SnapshotError,
};
use serde_json::{json, Value};

use super::{DomainTopologySource, LockedOutUserSource, ServerStatusSource};

/// File names of the snapshot scripts inside the script directory.
pub const SERVER_STATUS_SCRIPT: &str = "Get-ServerStatus.ps1";
pub const LOCKED_OUT_USERS_SCRIPT: &str = "Get-LockedOutUsers.ps1";
pub const DOMAIN_TOPOLOGY_SCRIPT: &str = "Get-DomainTopology.ps1";

/// Location of each snapshot script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptPaths {
    pub server_status: PathBuf,
    pub locked_out_users: PathBuf,
    pub domain_topology: PathBuf,
}

impl ScriptPaths {
    /// The standard script names inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            server_status: dir.join(SERVER_STATUS_SCRIPT),
            locked_out_users: dir.join(LOCKED_OUT_USERS_SCRIPT),
            domain_topology: dir.join(DOMAIN_TOPOLOGY_SCRIPT),
        }
    }
}

/// Runs one script per resource kind and parses its JSON output.
///
/// The request is piped to stdin as JSON; the script writes its snapshot to
/// stdout. A non-zero exit, a timeout, or stdout that is not JSON fails the
/// fetch.
#[derive(Debug, Clone)]
pub struct ScriptSnapshotSource<E> {
    executor: E,
    paths: ScriptPaths,
    timeout: Duration,
}

impl<E: ScriptExecutor> ScriptSnapshotSource<E> {
    pub fn new(executor: E, paths: ScriptPaths, timeout: Duration) -> Self {
        Self {
            executor,
            paths,
            timeout,
        }
    }

    async fn run(&self, script: &Path, request: Value) -> Result<Value, SnapshotError> {
        let script_path = script.to_string_lossy();
        let output = self
            .executor
            .execute(&script_path, ScriptInput::new(request, self.timeout))
            .await?;

        tracing::debug!(
            script = %script_path,
            exit_code = output.exit_code,
            duration_ms = output.duration_ms,
            "Snapshot script finished"
        );

        if !output.succeeded() {
            return Err(ScriptError::ExecutionFailed {
                exit_code: output.exit_code,
                stderr: output.stderr.trim().to_string(),
            }
            .into());
        }

        output.parsed_output.ok_or_else(|| {
            SnapshotError::Malformed(format!("{script_path} did not print a JSON document"))
        })
    }
}

impl<E: ScriptExecutor> ServerStatusSource for ScriptSnapshotSource<E> {
    async fn fetch_server_statuses(
        &self,
        names: &[String],
    ) -> Result<Vec<ServerObservation>, SnapshotError> {
        let value = self
            .run(&self.paths.server_status, json!({ "names": names }))
            .await?;
        snapshot::parse_server_statuses(value)
    }
}

impl<E: ScriptExecutor> LockedOutUserSource for ScriptSnapshotSource<E> {
    async fn fetch_locked_out_users(&self) -> Result<Vec<LockedOutUserObservation>, SnapshotError> {
        let value = self.run(&self.paths.locked_out_users, json!({})).await?;
        snapshot::parse_locked_out_users(value)
    }
}

impl<E: ScriptExecutor> DomainTopologySource for ScriptSnapshotSource<E> {
    async fn fetch_domain_topology(&self) -> Result<DomainTopology, SnapshotError> {
        let value = self.run(&self.paths.domain_topology, json!({})).await?;
        snapshot::parse_domain_topology(value)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
