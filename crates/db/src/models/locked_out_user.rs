//! Locked-out directory accounts.

use helpdesk_core::types::Timestamp;
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `locked_out_users` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct LockedOutUser {
    pub account_id: String,
    pub display_name: String,
    pub department: Option<String>,
    /// Lockout instant in epoch milliseconds, as reported by the directory.
    pub lockout_time_ms: i64,
    pub updated_at: Timestamp,
}
