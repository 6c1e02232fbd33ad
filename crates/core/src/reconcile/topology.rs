//! Role assignment for a discovered domain topology.

use serde_json::Value;

use crate::snapshot::DomainTopology;
use crate::status::ControllerRole;

/// A controller with the role it holds after discovery.
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerAssignment {
    pub name: String,
    pub details: Value,
    pub role: ControllerRole,
}

/// Assign roles to every controller in `topology`.
///
/// The designated PDC holds `Pdc`, the designated DDC holds `Ddc`, all
/// others `Other`. If both designations name the same controller it holds
/// `Pdc` and no controller holds `Ddc`. Output is ordered by name.
pub fn assign_roles(topology: &DomainTopology) -> Vec<ControllerAssignment> {
    topology
        .controllers
        .iter()
        .map(|(name, details)| {
            let role = if *name == topology.pdc_name {
                ControllerRole::Pdc
            } else if *name == topology.ddc_name {
                ControllerRole::Ddc
            } else {
                ControllerRole::Other
            };
            ControllerAssignment {
                name: name.clone(),
                details: details.clone(),
                role,
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
