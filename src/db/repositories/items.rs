use crate::{
    db::models::item_models::{Item, ItemFields},
    error::Error,
};
use anyhow::Result;
use sqlx::{PgConnection, PgPool};
use std::sync::Arc;
use tracing::info;

const ITEM_COLUMNS: &str =
    "id, firebase_uid, name, quantity, code, brand, image_url, qr_code_url, created_at";

/// Items repository. Every statement is scoped by the owner key.
#[derive(Clone)]
pub struct ItemsRepository {
    pool: Arc<PgPool>,
}

impl ItemsRepository {
    /// Create a new items repository
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// All items of one owner
    pub async fn get_by_owner(&self, owner: &str) -> Result<Vec<Item>> {
        let result = sqlx::query_as::<_, Item>(&format!(
            "SELECT {} FROM items WHERE firebase_uid = $1 ORDER BY id",
            ITEM_COLUMNS
        ))
        .bind(owner)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to get items: {}", e)))?;

        Ok(result)
    }

    /// Get an item by ID if the owner matches
    pub async fn get_owned(&self, id: i32, owner: &str) -> Result<Option<Item>> {
        let result = sqlx::query_as::<_, Item>(&format!(
            "SELECT {} FROM items WHERE id = $1 AND firebase_uid = $2",
            ITEM_COLUMNS
        ))
        .bind(id)
        .bind(owner)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to get item by ID: {}", e)))?;

        Ok(result)
    }

    /// Scanner lookup by item code
    pub async fn get_by_code(&self, owner: &str, code: &str) -> Result<Option<Item>> {
        let result = sqlx::query_as::<_, Item>(&format!(
            "SELECT {} FROM items WHERE firebase_uid = $1 AND code = $2 ORDER BY id LIMIT 1",
            ITEM_COLUMNS
        ))
        .bind(owner)
        .bind(code)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to get item by code: {}", e)))?;

        Ok(result)
    }

    /// Insert a new item and return its id. File references are set afterwards.
    pub async fn insert(&self, conn: &mut PgConnection, owner: &str, fields: &ItemFields) -> Result<i32> {
        let id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO items (firebase_uid, name, quantity, code, brand)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(owner)
        .bind(&fields.name)
        .bind(fields.quantity)
        .bind(&fields.code)
        .bind(&fields.brand)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| Error::Database(format!("Failed to create item: {}", e)))?;

        info!("Inserted item {} for owner {}", id, owner);

        Ok(id)
    }

    /// Fetch an owned item and hold its row lock until the transaction ends
    pub async fn lock_owned(&self, conn: &mut PgConnection, id: i32, owner: &str) -> Result<Option<Item>> {
        let result = sqlx::query_as::<_, Item>(&format!(
            "SELECT {} FROM items WHERE id = $1 AND firebase_uid = $2 FOR UPDATE",
            ITEM_COLUMNS
        ))
        .bind(id)
        .bind(owner)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| Error::Database(format!("Failed to lock item: {}", e)))?;

        Ok(result)
    }

    /// Overwrite fields and file references of an owned item
    pub async fn update(
        &self,
        conn: &mut PgConnection,
        id: i32,
        owner: &str,
        fields: &ItemFields,
        image_url: &str,
        qr_code_url: Option<&str>,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE items
            SET name = $1, quantity = $2, code = $3, brand = $4, image_url = $5, qr_code_url = $6
            WHERE id = $7 AND firebase_uid = $8
            "#,
        )
        .bind(&fields.name)
        .bind(fields.quantity)
        .bind(&fields.code)
        .bind(&fields.brand)
        .bind(image_url)
        .bind(qr_code_url)
        .bind(id)
        .bind(owner)
        .execute(&mut *conn)
        .await
        .map_err(|e| Error::Database(format!("Failed to update item: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    /// Record the stored file references of an owned item
    pub async fn set_files(
        &self,
        conn: &mut PgConnection,
        id: i32,
        owner: &str,
        image_url: &str,
        qr_code_url: Option<&str>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE items
            SET image_url = $1, qr_code_url = $2
            WHERE id = $3 AND firebase_uid = $4
            "#,
        )
        .bind(image_url)
        .bind(qr_code_url)
        .bind(id)
        .bind(owner)
        .execute(&mut *conn)
        .await
        .map_err(|e| Error::Database(format!("Failed to record item files: {}", e)))?;

        Ok(())
    }

    /// Delete an owned item
    pub async fn delete_owned(&self, id: i32, owner: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM items WHERE id = $1 AND firebase_uid = $2")
            .bind(id)
            .bind(owner)
            .execute(&*self.pool)
            .await
            .map_err(|e| Error::Database(format!("Failed to delete item: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }
}
