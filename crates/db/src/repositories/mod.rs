//! Repository layer.
//!
//! Each repository is a zero-sized struct with async methods. Single-statement
//! methods accept any [`sqlx::PgExecutor`], so the same call runs on the pool
//! or inside a caller-owned transaction via `&mut *tx`.

pub mod domain_controller_repo;
pub mod locked_out_user_repo;
pub mod server_repo;

pub use domain_controller_repo::DomainControllerRepo;
pub use locked_out_user_repo::LockedOutUserRepo;
pub use server_repo::ServerRepo;
