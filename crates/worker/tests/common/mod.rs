//! In-memory snapshot sources and probes for reconciler tests.
#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::io;
use std::sync::{Arc, Mutex};

use helpdesk_core::snapshot::{
    DomainTopology, LockedOutUserObservation, ServerObservation, SnapshotError,
};
use helpdesk_core::status::ResourceStatus;
use helpdesk_db::models::server::CreateServer;
use helpdesk_db::repositories::ServerRepo;
use helpdesk_worker::error::ProbeFailure;
use helpdesk_worker::source::{
    DomainTopologySource, LockedOutUserSource, ReachabilityProbe, ServerStatusSource,
};
use serde_json::json;
use sqlx::PgPool;

/// Shared slot holding the next snapshot, or the error to return instead.
#[derive(Clone)]
pub struct Scripted<T>(Arc<Mutex<Result<T, String>>>);

impl<T: Clone> Scripted<T> {
    pub fn new(value: T) -> Self {
        Self(Arc::new(Mutex::new(Ok(value))))
    }

    pub fn set(&self, value: T) {
        *self.0.lock().unwrap() = Ok(value);
    }

    /// Make the next fetches fail as a malformed snapshot.
    pub fn fail(&self, reason: &str) {
        *self.0.lock().unwrap() = Err(reason.to_string());
    }

    fn take(&self) -> Result<T, SnapshotError> {
        self.0.lock().unwrap().clone().map_err(SnapshotError::Malformed)
    }
}

impl ServerStatusSource for Scripted<Vec<ServerObservation>> {
    async fn fetch_server_statuses(
        &self,
        _names: &[String],
    ) -> Result<Vec<ServerObservation>, SnapshotError> {
        self.take()
    }
}

impl LockedOutUserSource for Scripted<Vec<LockedOutUserObservation>> {
    async fn fetch_locked_out_users(&self) -> Result<Vec<LockedOutUserObservation>, SnapshotError> {
        self.take()
    }
}

impl DomainTopologySource for Scripted<DomainTopology> {
    async fn fetch_domain_topology(&self) -> Result<DomainTopology, SnapshotError> {
        self.take()
    }
}

/// Probe verdicts per controller. Unlisted controllers are unreachable.
#[derive(Clone, Default)]
pub struct FakeProbe(Arc<Mutex<HashMap<String, Option<bool>>>>);

impl FakeProbe {
    pub fn reachable(&self, name: &str, up: bool) {
        self.0.lock().unwrap().insert(name.to_string(), Some(up));
    }

    /// Make probing `name` fail at the transport level.
    pub fn broken(&self, name: &str) {
        self.0.lock().unwrap().insert(name.to_string(), None);
    }
}

impl ReachabilityProbe for FakeProbe {
    async fn is_reachable(&self, controller: &str) -> Result<bool, ProbeFailure> {
        let verdict = self.0.lock().unwrap().get(controller).copied();
        match verdict {
            Some(Some(up)) => Ok(up),
            Some(None) => Err(ProbeFailure {
                controller: controller.to_string(),
                source: io::Error::other("no route to host"),
            }),
            None => Ok(false),
        }
    }
}

pub fn observed(name: &str, status: ResourceStatus) -> ServerObservation {
    ServerObservation {
        name: name.to_string(),
        status,
        share_service_status: Some("Running".to_string()),
    }
}

pub fn locked_out(account_id: &str, lockout_time_ms: i64) -> LockedOutUserObservation {
    LockedOutUserObservation {
        account_id: account_id.to_string(),
        display_name: format!("User {account_id}"),
        department: None,
        lockout_time_ms,
    }
}

pub fn topology(domain: &str, controllers: &[&str], pdc: &str, ddc: &str) -> DomainTopology {
    DomainTopology {
        domain_name: domain.to_string(),
        controllers: controllers
            .iter()
            .map(|name| (name.to_string(), json!({ "site": "HQ" })))
            .collect::<BTreeMap<_, _>>(),
        pdc_name: pdc.to_string(),
        ddc_name: ddc.to_string(),
    }
}

pub async fn register_server(pool: &PgPool, name: &str) {
    ServerRepo::create(
        pool,
        &CreateServer {
            name: name.to_string(),
            description: "Member server".to_string(),
            location: "HQ".to_string(),
        },
    )
    .await
    .unwrap();
}
