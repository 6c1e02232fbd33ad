//! Server status transitions and downtime derivation.
//!
//! The persisted server row carries history a single snapshot cannot
//! reproduce (when the outage started, when the server came back). Each
//! cycle combines the prior row with the newly observed status.

use serde::Serialize;

use crate::status::ResourceStatus;
use crate::types::Timestamp;

/// The persisted fields a transition depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriorServerState {
    pub status: ResourceStatus,
    pub last_online: Option<Timestamp>,
    pub back_online: Option<Timestamp>,
}

/// Which branch of the transition table applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    Recovered,
    StillOnline,
    WentOffline,
    StillOffline,
}

/// The derived fields to persist for one server this cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerTransition {
    pub kind: TransitionKind,
    pub status: ResourceStatus,
    pub last_online: Option<Timestamp>,
    pub back_online: Option<Timestamp>,
    pub downtime_minutes: i32,
}

/// Whole minutes elapsed from `since` to `now`, never negative.
pub fn downtime_minutes(since: Timestamp, now: Timestamp) -> i32 {
    let minutes = now.signed_duration_since(since).num_minutes();
    minutes.clamp(0, i64::from(i32::MAX)) as i32
}

/// Compute the next persisted state from the prior row and the observed status.
pub fn next_state(
    prior: &PriorServerState,
    observed: ResourceStatus,
    now: Timestamp,
) -> ServerTransition {
    match (observed.is_online(), prior.status.is_online()) {
        (true, false) => ServerTransition {
            kind: TransitionKind::Recovered,
            status: ResourceStatus::Online,
            last_online: prior.last_online,
            back_online: prior.last_online,
            downtime_minutes: 0,
        },
        (true, true) => ServerTransition {
            kind: TransitionKind::StillOnline,
            status: ResourceStatus::Online,
            last_online: prior.last_online,
            back_online: prior.back_online,
            downtime_minutes: 0,
        },
        (false, true) => ServerTransition {
            kind: TransitionKind::WentOffline,
            status: ResourceStatus::Offline,
            last_online: Some(now),
            back_online: None,
            downtime_minutes: 0,
        },
        (false, false) => {
            let since = prior.last_online.unwrap_or(now);
            ServerTransition {
                kind: TransitionKind::StillOffline,
                status: ResourceStatus::Offline,
                last_online: Some(since),
                back_online: None,
                downtime_minutes: downtime_minutes(since, now),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
