//! State reconciliation engine for the helpdesk console.
//!
//! Three reconcilers (member servers, locked-out accounts, domain
//! controllers) pull snapshots from external scripts, diff them against
//! Postgres and apply the minimal writes in a transaction. The
//! [`scheduler`] drives them on fixed intervals with a single-flight guard
//! per resource kind.

pub mod config;
pub mod error;
pub mod jobs;
pub mod reconcilers;
pub mod scheduler;
pub mod source;
