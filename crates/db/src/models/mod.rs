//! Entity structs and DTOs.
//!
//! Each submodule contains a `FromRow` + `Serialize` entity struct matching
//! the database row, plus the DTOs its repository accepts.

pub mod domain_controller;
pub mod locked_out_user;
pub mod server;
