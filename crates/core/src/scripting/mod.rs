//! External snapshot script execution.
//!
//! Directory and server state is gathered by opaque scripts (PowerShell in
//! production). This module spawns them, pipes a JSON request to stdin and
//! collects stdout, bounded by a per-invocation timeout.

pub mod executor;
pub mod powershell;
pub mod shell;
pub mod subprocess;
