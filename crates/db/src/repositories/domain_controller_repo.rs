//! Repository for the `domain_controllers` and `current_domain` tables.

use helpdesk_core::status::ResourceStatus;
use sqlx::PgExecutor;

use crate::models::domain_controller::{CurrentDomain, DomainController, NewDomainController};

/// Column list for `domain_controllers` queries.
const COLUMNS: &str = "name, details, role_id, status_id, updated_at";

/// Column list for `current_domain` queries.
const DOMAIN_COLUMNS: &str = "domain_name, pdc_name, ddc_name, discovered_at";

/// Provides query operations for the domain topology.
pub struct DomainControllerRepo;

impl DomainControllerRepo {
    /// All controllers, ordered by role then name.
    pub async fn list<'e>(executor: impl PgExecutor<'e>) -> Result<Vec<DomainController>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM domain_controllers ORDER BY role_id, name");
        sqlx::query_as::<_, DomainController>(&query)
            .fetch_all(executor)
            .await
    }

    /// Names of all controllers, sorted.
    pub async fn list_names<'e>(executor: impl PgExecutor<'e>) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>("SELECT name FROM domain_controllers ORDER BY name")
            .fetch_all(executor)
            .await
    }

    /// The current domain record, if a discovery has completed.
    pub async fn find_current_domain<'e>(
        executor: impl PgExecutor<'e>,
    ) -> Result<Option<CurrentDomain>, sqlx::Error> {
        let query = format!(
            "SELECT {DOMAIN_COLUMNS} FROM current_domain \
             ORDER BY discovered_at DESC LIMIT 1"
        );
        sqlx::query_as::<_, CurrentDomain>(&query)
            .fetch_optional(executor)
            .await
    }

    /// Replace the whole topology inside the caller's transaction.
    ///
    /// Deletes the current domain and every controller, then inserts
    /// `controllers` and the new current-domain row.
    pub async fn replace_topology(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        domain_name: &str,
        pdc_name: &str,
        ddc_name: &str,
        controllers: &[NewDomainController],
    ) -> Result<CurrentDomain, sqlx::Error> {
        sqlx::query("DELETE FROM current_domain")
            .execute(&mut **tx)
            .await?;
        sqlx::query("DELETE FROM domain_controllers")
            .execute(&mut **tx)
            .await?;

        for controller in controllers {
            sqlx::query(
                "INSERT INTO domain_controllers (name, details, role_id, status_id) \
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(&controller.name)
            .bind(&controller.details)
            .bind(controller.role.id())
            .bind(controller.status.id())
            .execute(&mut **tx)
            .await?;
        }

        let query = format!(
            "INSERT INTO current_domain (domain_name, pdc_name, ddc_name) \
             VALUES ($1, $2, $3) \
             RETURNING {DOMAIN_COLUMNS}"
        );
        sqlx::query_as::<_, CurrentDomain>(&query)
            .bind(domain_name)
            .bind(pdc_name)
            .bind(ddc_name)
            .fetch_one(&mut **tx)
            .await
    }

    /// Set one controller's liveness. Returns `false` if the controller no
    /// longer exists (a discovery replaced it mid-probe).
    pub async fn update_status<'e>(
        executor: impl PgExecutor<'e>,
        name: &str,
        status: ResourceStatus,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE domain_controllers SET status_id = $2, updated_at = NOW() WHERE name = $1",
        )
        .bind(name)
        .bind(status.id())
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
