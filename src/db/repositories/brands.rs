use crate::{db::models::item_models::Brand, error::Error};
use anyhow::Result;
use sqlx::PgPool;
use std::sync::Arc;

/// Read-only access to the brand lookup table
#[derive(Clone)]
pub struct BrandsRepository {
    pool: Arc<PgPool>,
}

impl BrandsRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// All brands ordered by name
    pub async fn get_all(&self) -> Result<Vec<Brand>> {
        let result = sqlx::query_as::<_, Brand>("SELECT id, name FROM brands ORDER BY name")
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| Error::Database(format!("Failed to get brands: {}", e)))?;

        Ok(result)
    }
}
