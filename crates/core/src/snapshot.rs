//! Snapshot payloads returned by the external scripts.
//!
//! Scripts emit JSON (usually via PowerShell's `ConvertTo-Json`, hence the
//! PascalCase aliases). The parsers here turn that JSON into typed
//! observations and decide what counts as a malformed snapshot.
//!
//! The three resource kinds differ on shape tolerance:
//! - server statuses accept a bare object as a one-element list, because
//!   `ConvertTo-Json` unwraps single-element arrays;
//! - locked-out accounts accept only an array, so an empty array is an
//!   unambiguous "nobody is locked out" and anything else is an error;
//! - domain topology must be a complete object naming both role holders.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::reconcile::set_diff::Keyed;
use crate::scripting::executor::ScriptError;
use crate::status::ResourceStatus;

/// Errors that abort a reconciliation run before anything is written.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("Snapshot script failed: {0}")]
    Script(#[from] ScriptError),

    #[error("Malformed snapshot: {0}")]
    Malformed(String),
}

// ---------------------------------------------------------------------------
// Servers
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawServerStatus {
    #[serde(alias = "Name", alias = "ComputerName")]
    name: String,
    #[serde(alias = "Status")]
    status: String,
    #[serde(default, alias = "ShareServiceStatus", alias = "LanmanServer")]
    share_service_status: Option<String>,
}

/// Observed state of one member server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerObservation {
    pub name: String,
    pub status: ResourceStatus,
    /// State of the file-share service as reported (e.g. `Running`).
    pub share_service_status: Option<String>,
}

/// Parse a server status snapshot.
///
/// A single object is normalized to a one-element list.
pub fn parse_server_statuses(value: Value) -> Result<Vec<ServerObservation>, SnapshotError> {
    let items = match value {
        Value::Array(items) => items,
        obj @ Value::Object(_) => vec![obj],
        other => {
            return Err(SnapshotError::Malformed(format!(
                "expected server status list, got {}",
                kind_of(&other)
            )))
        }
    };

    items
        .into_iter()
        .map(|item| {
            let raw: RawServerStatus = serde_json::from_value(item)
                .map_err(|e| SnapshotError::Malformed(format!("server status record: {e}")))?;
            Ok(ServerObservation {
                name: raw.name,
                status: ResourceStatus::from_observed(&raw.status),
                share_service_status: raw.share_service_status,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Locked-out accounts
// ---------------------------------------------------------------------------

/// A directory account currently locked out.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LockedOutUserObservation {
    #[serde(alias = "SamAccountName", alias = "Id")]
    pub account_id: String,
    #[serde(alias = "Name", alias = "DisplayName")]
    pub display_name: String,
    #[serde(default, alias = "Department")]
    pub department: Option<String>,
    /// Lockout instant in epoch milliseconds, as reported by the directory.
    #[serde(alias = "LockoutTime", alias = "AccountLockoutTime")]
    pub lockout_time_ms: i64,
}

impl Keyed for LockedOutUserObservation {
    type Key = String;

    fn key(&self) -> &String {
        &self.account_id
    }
}

/// Parse a locked-out account snapshot. Only a JSON array is accepted.
pub fn parse_locked_out_users(
    value: Value,
) -> Result<Vec<LockedOutUserObservation>, SnapshotError> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .map(|item| {
                serde_json::from_value(item).map_err(|e| {
                    SnapshotError::Malformed(format!("locked-out account record: {e}"))
                })
            })
            .collect(),
        other => Err(SnapshotError::Malformed(format!(
            "expected locked-out account list, got {}",
            kind_of(&other)
        ))),
    }
}

// ---------------------------------------------------------------------------
// Domain topology
// ---------------------------------------------------------------------------

/// One discovery payload: all controllers of the domain plus the two
/// designated role holders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainTopology {
    #[serde(alias = "DomainName", alias = "Domain")]
    pub domain_name: String,
    /// Controller name to opaque detail payload.
    #[serde(alias = "Controllers", alias = "DomainControllers")]
    pub controllers: BTreeMap<String, Value>,
    #[serde(alias = "PdcName", alias = "PDC", alias = "PDCEmulator")]
    pub pdc_name: String,
    #[serde(alias = "DdcName", alias = "DDC")]
    pub ddc_name: String,
}

/// Parse and validate a domain topology snapshot.
pub fn parse_domain_topology(value: Value) -> Result<DomainTopology, SnapshotError> {
    if !value.is_object() {
        return Err(SnapshotError::Malformed(format!(
            "expected domain topology object, got {}",
            kind_of(&value)
        )));
    }
    let topology: DomainTopology = serde_json::from_value(value)
        .map_err(|e| SnapshotError::Malformed(format!("domain topology: {e}")))?;

    if topology.domain_name.trim().is_empty() {
        return Err(SnapshotError::Malformed("domain name is empty".into()));
    }
    if topology.controllers.is_empty() {
        return Err(SnapshotError::Malformed(format!(
            "domain {} reported no controllers",
            topology.domain_name
        )));
    }
    for (role, name) in [("PDC", &topology.pdc_name), ("DDC", &topology.ddc_name)] {
        if !topology.controllers.contains_key(name) {
            return Err(SnapshotError::Malformed(format!(
                "{role} {name} is not among the reported controllers"
            )));
        }
    }
    Ok(topology)
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
