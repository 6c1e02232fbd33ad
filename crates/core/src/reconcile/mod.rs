//! Pure reconciliation logic shared by the three resource reconcilers.
//!
//! Nothing here touches the database; the worker loads persisted state,
//! calls into these functions, and applies the result in a transaction.

pub mod server;
pub mod set_diff;
pub mod topology;
