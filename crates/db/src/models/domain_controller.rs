//! Domain controllers and the current domain.

use helpdesk_core::status::{ControllerRole, ResourceStatus, StatusId};
use helpdesk_core::types::Timestamp;
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `domain_controllers` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct DomainController {
    pub name: String,
    pub details: serde_json::Value,
    pub role_id: StatusId,
    pub status_id: StatusId,
    pub updated_at: Timestamp,
}

impl DomainController {
    pub fn role(&self) -> ControllerRole {
        ControllerRole::from_id(self.role_id).unwrap_or(ControllerRole::Other)
    }

    pub fn status(&self) -> ResourceStatus {
        ResourceStatus::from_id(self.status_id).unwrap_or(ResourceStatus::Offline)
    }
}

/// A row from the `current_domain` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct CurrentDomain {
    pub domain_name: String,
    pub pdc_name: Option<String>,
    pub ddc_name: Option<String>,
    pub discovered_at: Timestamp,
}

/// DTO for inserting a controller during a topology replace.
#[derive(Debug, Clone)]
pub struct NewDomainController {
    pub name: String,
    pub details: serde_json::Value,
    pub role: ControllerRole,
    pub status: ResourceStatus,
}
