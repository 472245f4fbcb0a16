use crate::db::models::event_models::{Event, EventFields, EventView};
use crate::error::Error;
use anyhow::Result;
use chrono::NaiveDateTime;
use sqlx::{PgConnection, PgPool};
use std::sync::Arc;

const EVENT_VIEW_SELECT: &str = r#"
    SELECT e.id_event, e.nama_event, e.tanggal, e.kota, e.kabupaten, e.id_status,
           s.nama_status AS status, e.waktu_dibuat, e.tanggal_selesai, e.waktu_selesai
    FROM events e
    JOIN status s ON e.id_status = s.id_status
"#;

/// Events repository. Every statement is scoped by the owner key.
#[derive(Clone)]
pub struct EventsRepository {
    pool: Arc<PgPool>,
}

impl EventsRepository {
    /// Create a new events repository
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Create a new event
    pub async fn create(
        &self,
        conn: &mut PgConnection,
        owner: &str,
        fields: &EventFields,
        id_status: i32,
        created_at: NaiveDateTime,
    ) -> Result<i32> {
        let id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO events (firebase_uid, nama_event, tanggal, kota, kabupaten, id_status, waktu_dibuat)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id_event
            "#,
        )
        .bind(owner)
        .bind(&fields.nama_event)
        .bind(fields.tanggal)
        .bind(&fields.kota)
        .bind(&fields.kabupaten)
        .bind(id_status)
        .bind(created_at)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| Error::Database(format!("Failed to create event: {}", e)))?;

        Ok(id)
    }

    /// Get the raw event row if the owner matches
    pub async fn get_owned(&self, id: i32, owner: &str) -> Result<Option<Event>> {
        let result = sqlx::query_as::<_, Event>(
            r#"
            SELECT id_event, firebase_uid, nama_event, tanggal, kota, kabupaten, id_status,
                   waktu_dibuat, tanggal_selesai, waktu_selesai
            FROM events
            WHERE id_event = $1 AND firebase_uid = $2
            "#,
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to get event by ID: {}", e)))?;

        Ok(result)
    }

    /// Whether the event exists and belongs to the owner
    pub async fn is_owned(&self, id: i32, owner: &str) -> Result<bool> {
        let owned: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM events WHERE id_event = $1 AND firebase_uid = $2)",
        )
        .bind(id)
        .bind(owner)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to check event owner: {}", e)))?;

        Ok(owned)
    }

    /// Edit name, date and place of an owned event
    pub async fn update(&self, id: i32, owner: &str, fields: &EventFields) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE events
            SET nama_event = $1, tanggal = $2, kota = $3, kabupaten = $4
            WHERE id_event = $5 AND firebase_uid = $6
            "#,
        )
        .bind(&fields.nama_event)
        .bind(fields.tanggal)
        .bind(&fields.kota)
        .bind(&fields.kabupaten)
        .bind(id)
        .bind(owner)
        .execute(&*self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to update event: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    /// Most recently created event of the owner
    pub async fn latest_id(&self, owner: &str) -> Result<Option<i32>> {
        let result = sqlx::query_scalar(
            "SELECT id_event FROM events WHERE firebase_uid = $1 ORDER BY id_event DESC LIMIT 1",
        )
        .bind(owner)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to get latest event: {}", e)))?;

        Ok(result)
    }

    /// All events of the owner, newest date first
    pub async fn list_views(&self, owner: &str) -> Result<Vec<EventView>> {
        let result = sqlx::query_as::<_, EventView>(&format!(
            "{} WHERE e.firebase_uid = $1 ORDER BY e.tanggal DESC, e.id_event DESC",
            EVENT_VIEW_SELECT
        ))
        .bind(owner)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to list events: {}", e)))?;

        Ok(result)
    }

    /// One event with its status label
    pub async fn get_view(&self, id: i32, owner: &str) -> Result<Option<EventView>> {
        let result = sqlx::query_as::<_, EventView>(&format!(
            "{} WHERE e.id_event = $1 AND e.firebase_uid = $2",
            EVENT_VIEW_SELECT
        ))
        .bind(id)
        .bind(owner)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to get event detail: {}", e)))?;

        Ok(result)
    }

    /// Mark an owned event as finished. The first completion stamp is kept.
    pub async fn complete(
        &self,
        id: i32,
        owner: &str,
        done_status: i32,
        completed_at: NaiveDateTime,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE events
            SET id_status = $1,
                tanggal_selesai = COALESCE(tanggal_selesai, $2),
                waktu_selesai = COALESCE(waktu_selesai, $3)
            WHERE id_event = $4 AND firebase_uid = $5
            "#,
        )
        .bind(done_status)
        .bind(completed_at.date())
        .bind(completed_at.time())
        .bind(id)
        .bind(owner)
        .execute(&*self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to complete event: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete an owned event row. Its scans must be removed first.
    pub async fn delete_owned(&self, conn: &mut PgConnection, id: i32, owner: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM events WHERE id_event = $1 AND firebase_uid = $2")
            .bind(id)
            .bind(owner)
            .execute(&mut *conn)
            .await
            .map_err(|e| Error::Database(format!("Failed to delete event: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }
}
