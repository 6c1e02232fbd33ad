//! Repository for the `locked_out_users` table.

use helpdesk_core::snapshot::LockedOutUserObservation;
use sqlx::PgExecutor;

use crate::models::locked_out_user::LockedOutUser;

/// Column list for `locked_out_users` queries.
const COLUMNS: &str = "account_id, display_name, department, lockout_time_ms, updated_at";

/// Provides query operations for locked-out accounts.
pub struct LockedOutUserRepo;

impl LockedOutUserRepo {
    /// Identifiers of every persisted locked-out account.
    pub async fn list_ids<'e>(executor: impl PgExecutor<'e>) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>("SELECT account_id FROM locked_out_users")
            .fetch_all(executor)
            .await
    }

    /// All locked-out accounts, most recently locked first.
    pub async fn list<'e>(executor: impl PgExecutor<'e>) -> Result<Vec<LockedOutUser>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM locked_out_users \
             ORDER BY lockout_time_ms DESC, account_id"
        );
        sqlx::query_as::<_, LockedOutUser>(&query)
            .fetch_all(executor)
            .await
    }

    /// Insert or overwrite an account with the snapshot's values.
    pub async fn upsert<'e>(
        executor: impl PgExecutor<'e>,
        user: &LockedOutUserObservation,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO locked_out_users (account_id, display_name, department, lockout_time_ms) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (account_id) DO UPDATE SET \
                 display_name = EXCLUDED.display_name, \
                 department = EXCLUDED.department, \
                 lockout_time_ms = EXCLUDED.lockout_time_ms, \
                 updated_at = NOW()",
        )
        .bind(&user.account_id)
        .bind(&user.display_name)
        .bind(&user.department)
        .bind(user.lockout_time_ms)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Delete one account. Returns `true` if a row was removed.
    pub async fn delete<'e>(
        executor: impl PgExecutor<'e>,
        account_id: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM locked_out_users WHERE account_id = $1")
            .bind(account_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete every account. Returns the number of rows removed.
    pub async fn delete_all<'e>(executor: impl PgExecutor<'e>) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM locked_out_users")
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}
