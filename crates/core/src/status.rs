//! Status helper enums mapping to SMALLINT lookup tables.
//!
//! Each enum variant's discriminant matches the seed data order (1-based)
//! in the corresponding lookup table (`resource_statuses`, `controller_roles`).

use serde::{Deserialize, Serialize};

pub use crate::types::StatusId;

macro_rules! define_status_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $val:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(i16)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $val ),+
        }

        impl $name {
            /// Return the database status ID.
            pub fn id(self) -> StatusId {
                self as StatusId
            }

            /// Look up the variant for a database status ID.
            pub fn from_id(id: StatusId) -> Option<Self> {
                match id {
                    $( $val => Some(Self::$variant), )+
                    _ => None,
                }
            }
        }

        impl From<$name> for StatusId {
            fn from(value: $name) -> Self {
                value as StatusId
            }
        }
    };
}

define_status_enum! {
    /// Reachability of a member server or domain controller.
    ResourceStatus {
        Online = 1,
        Offline = 2,
    }
}

define_status_enum! {
    /// Role of a domain controller within the current domain topology.
    ControllerRole {
        Pdc = 1,
        Ddc = 2,
        Other = 3,
    }
}

impl ResourceStatus {
    /// Interpret a status string reported by a snapshot script.
    ///
    /// Only an explicit online marker counts as online; every other value,
    /// including unknown ones, is treated as offline.
    pub fn from_observed(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "online" | "up" | "true" => Self::Online,
            _ => Self::Offline,
        }
    }

    pub fn is_online(self) -> bool {
        self == Self::Online
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
