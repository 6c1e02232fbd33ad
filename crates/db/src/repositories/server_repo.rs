//! Repository for the `servers` table.

use sqlx::PgExecutor;

use crate::models::server::{CreateServer, Server, ServerStatusUpdate};

/// Column list for `servers` queries.
const COLUMNS: &str = "\
    name, description, location, status_id, share_service_status, \
    downtime_minutes, last_online, back_online, created_at, updated_at";

/// Provides query operations for registered servers.
pub struct ServerRepo;

impl ServerRepo {
    /// Register a server. New servers start online with no downtime.
    pub async fn create<'e>(
        executor: impl PgExecutor<'e>,
        server: &CreateServer,
    ) -> Result<Server, sqlx::Error> {
        let query = format!(
            "INSERT INTO servers (name, description, location) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Server>(&query)
            .bind(&server.name)
            .bind(&server.description)
            .bind(&server.location)
            .fetch_one(executor)
            .await
    }

    /// Remove a server from the roster. Returns `true` if a row was removed.
    pub async fn delete<'e>(executor: impl PgExecutor<'e>, name: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM servers WHERE name = $1")
            .bind(name)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Names of every registered server, sorted.
    pub async fn list_names<'e>(executor: impl PgExecutor<'e>) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>("SELECT name FROM servers ORDER BY name")
            .fetch_all(executor)
            .await
    }

    /// All registered servers, sorted by name.
    pub async fn list<'e>(executor: impl PgExecutor<'e>) -> Result<Vec<Server>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM servers ORDER BY name");
        sqlx::query_as::<_, Server>(&query).fetch_all(executor).await
    }

    /// Find a server by name.
    pub async fn find_by_name<'e>(
        executor: impl PgExecutor<'e>,
        name: &str,
    ) -> Result<Option<Server>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM servers WHERE name = $1");
        sqlx::query_as::<_, Server>(&query)
            .bind(name)
            .fetch_optional(executor)
            .await
    }

    /// Find a server by name, locking the row until the transaction ends.
    pub async fn find_by_name_for_update<'e>(
        executor: impl PgExecutor<'e>,
        name: &str,
    ) -> Result<Option<Server>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM servers WHERE name = $1 FOR UPDATE");
        sqlx::query_as::<_, Server>(&query)
            .bind(name)
            .fetch_optional(executor)
            .await
    }

    /// Write the fields derived by one reconciliation cycle.
    ///
    /// Returns `None` if the server no longer exists.
    pub async fn apply_status<'e>(
        executor: impl PgExecutor<'e>,
        name: &str,
        update: &ServerStatusUpdate,
    ) -> Result<Option<Server>, sqlx::Error> {
        let query = format!(
            "UPDATE servers \
             SET status_id = $2, share_service_status = $3, downtime_minutes = $4, \
                 last_online = $5, back_online = $6, updated_at = NOW() \
             WHERE name = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Server>(&query)
            .bind(name)
            .bind(update.status.id())
            .bind(&update.share_service_status)
            .bind(update.downtime_minutes)
            .bind(update.last_online)
            .bind(update.back_online)
            .fetch_optional(executor)
            .await
    }
}
