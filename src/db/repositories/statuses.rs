use crate::{db::models::event_models::WorkStatus, error::Error};
use anyhow::Result;
use sqlx::PgExecutor;

/// Resolve the reference-table id of a workflow status
pub async fn status_id<'e, E>(executor: E, status: WorkStatus) -> Result<i32>
where
    E: PgExecutor<'e>,
{
    let id: Option<i32> =
        sqlx::query_scalar("SELECT id_status FROM status WHERE nama_status = $1 LIMIT 1")
            .bind(status.db_name())
            .fetch_optional(executor)
            .await
            .map_err(|e| Error::Database(format!("Failed to look up status: {}", e)))?;

    id.ok_or_else(|| {
        Error::Internal(format!("Status '{}' is missing from the database", status.db_name()))
            .into()
    })
}
