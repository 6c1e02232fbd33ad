//! Registered member servers.

use helpdesk_core::reconcile::server::PriorServerState;
use helpdesk_core::status::{ResourceStatus, StatusId};
use helpdesk_core::types::Timestamp;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `servers` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Server {
    pub name: String,
    pub description: String,
    pub location: String,
    pub status_id: StatusId,
    pub share_service_status: Option<String>,
    pub downtime_minutes: i32,
    pub last_online: Option<Timestamp>,
    pub back_online: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Server {
    /// Persisted status; unknown IDs read as offline.
    pub fn status(&self) -> ResourceStatus {
        ResourceStatus::from_id(self.status_id).unwrap_or(ResourceStatus::Offline)
    }

    /// The fields the status transition rules depend on.
    pub fn prior_state(&self) -> PriorServerState {
        PriorServerState {
            status: self.status(),
            last_online: self.last_online,
            back_online: self.back_online,
        }
    }
}

/// DTO for registering a server.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateServer {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
}

/// Fields written by one reconciliation cycle.
#[derive(Debug, Clone)]
pub struct ServerStatusUpdate {
    pub status: ResourceStatus,
    pub share_service_status: Option<String>,
    pub downtime_minutes: i32,
    pub last_online: Option<Timestamp>,
    pub back_online: Option<Timestamp>,
}
