//! Domain logic for the helpdesk reconciliation engine.
//!
//! Everything in this crate is pure with respect to persistence: callers
//! fetch persisted state from the database and pass it in. The only I/O
//! lives in [`scripting`], which spawns the external snapshot scripts.

pub mod reconcile;
pub mod scripting;
pub mod snapshot;
pub mod status;
pub mod types;
