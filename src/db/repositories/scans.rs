use crate::db::models::event_models::ScanRecord;
use crate::error::Error;
use anyhow::Result;
use chrono::NaiveDateTime;
use sqlx::{PgConnection, PgPool};
use std::sync::Arc;
use tracing::warn;

/// Scan records (`qr_codes` table). Rows are always addressed through an event
/// and the owner key.
#[derive(Clone)]
pub struct ScansRepository {
    pool: Arc<PgPool>,
}

impl ScansRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Record a scanned code. Returns `false` when the code is already present
    /// under the event; the table is left unchanged in that case.
    pub async fn insert(
        &self,
        id_event: i32,
        owner: &str,
        qr_code: &str,
        id_status: i32,
        scanned_at: NaiveDateTime,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO qr_codes (id_event, firebase_uid, qr_code, scan_date, scan_time, id_status)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(id_event)
        .bind(owner)
        .bind(qr_code)
        .bind(scanned_at.date())
        .bind(scanned_at.time())
        .bind(id_status)
        .execute(&*self.pool)
        .await;

        match result {
            Ok(_) => Ok(true),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                warn!("Duplicate scan of {} in event {}", qr_code, id_event);
                Ok(false)
            }
            Err(e) => Err(Error::Database(format!("Failed to save scan: {}", e)).into()),
        }
    }

    /// Number of scans under the event
    pub async fn count(&self, id_event: i32, owner: &str) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM qr_codes WHERE id_event = $1 AND firebase_uid = $2",
        )
        .bind(id_event)
        .bind(owner)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to count scans: {}", e)))?;

        Ok(count)
    }

    /// Number of scans under the event that still carry the given status
    pub async fn count_with_status(&self, id_event: i32, owner: &str, id_status: i32) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM qr_codes
            WHERE id_event = $1 AND firebase_uid = $2 AND id_status = $3
            "#,
        )
        .bind(id_event)
        .bind(owner)
        .bind(id_status)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to count scans by status: {}", e)))?;

        Ok(count)
    }

    /// Remove one scanned code from the event
    pub async fn delete(&self, id_event: i32, owner: &str, qr_code: &str) -> Result<bool> {
        let result = sqlx::query(
            "DELETE FROM qr_codes WHERE id_event = $1 AND firebase_uid = $2 AND qr_code = $3",
        )
        .bind(id_event)
        .bind(owner)
        .bind(qr_code)
        .execute(&*self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to delete scan: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    /// Set a scanned code's status and stamp its completion time
    pub async fn complete(
        &self,
        id_event: i32,
        owner: &str,
        qr_code: &str,
        done_status: i32,
        completed_at: NaiveDateTime,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE qr_codes
            SET id_status = $1,
                tanggal_selesai = COALESCE(tanggal_selesai, $2),
                waktu_selesai = COALESCE(waktu_selesai, $3)
            WHERE id_event = $4 AND firebase_uid = $5 AND qr_code = $6
            "#,
        )
        .bind(done_status)
        .bind(completed_at.date())
        .bind(completed_at.time())
        .bind(id_event)
        .bind(owner)
        .bind(qr_code)
        .execute(&*self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to complete scan: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    /// Scans of one event with their status labels, in scan order
    pub async fn list_for_event(&self, id_event: i32, owner: &str) -> Result<Vec<ScanRecord>> {
        let result = sqlx::query_as::<_, ScanRecord>(
            r#"
            SELECT q.qr_code, q.scan_date, q.scan_time, q.tanggal_selesai, q.waktu_selesai,
                   q.id_status, s.nama_status AS status
            FROM qr_codes q
            JOIN status s ON q.id_status = s.id_status
            WHERE q.id_event = $1 AND q.firebase_uid = $2
            ORDER BY q.id
            "#,
        )
        .bind(id_event)
        .bind(owner)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to list scans: {}", e)))?;

        Ok(result)
    }

    /// Remove every scan of an event
    pub async fn delete_for_event(&self, conn: &mut PgConnection, id_event: i32, owner: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM qr_codes WHERE id_event = $1 AND firebase_uid = $2")
            .bind(id_event)
            .bind(owner)
            .execute(&mut *conn)
            .await
            .map_err(|e| Error::Database(format!("Failed to delete event scans: {}", e)))?;

        Ok(result.rows_affected())
    }
}
