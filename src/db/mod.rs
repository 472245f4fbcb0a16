use crate::config::DatabaseConfig;
use crate::db::models::event_models::WorkStatus;
use crate::db::repositories::statuses::status_id;
use crate::error::Error;
use anyhow::Result;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

pub mod migrations;
pub mod models;
pub mod repositories;

/// Connection pool for the inventory and event tables
pub struct DatabaseService {
    pub pool: Arc<PgPool>,
}

impl DatabaseService {
    /// Connect the pool and bring the schema up to date when configured to
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        let target = config.display_target()?;
        info!("Connecting to PostgreSQL at {}", target);

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect(&config.connection_url()?)
            .await
            .map_err(|e| Error::Database(format!("Failed to connect to {}: {}", target, e)))?;

        let service = Self {
            pool: Arc::new(pool),
        };

        if config.auto_migrate {
            info!("Applying schema migrations");
            migrations::run_migrations(&service.pool)
                .await
                .map_err(|e| Error::Database(format!("Failed to run migrations: {}", e)))?;
        }

        Ok(service)
    }

    /// The database answers and both workflow statuses are seeded
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&*self.pool)
            .await
            .map_err(|e| Error::Database(format!("Database is unreachable: {}", e)))?;

        for status in [WorkStatus::InUse, WorkStatus::Done] {
            if let Err(e) = status_id(&*self.pool, status).await {
                error!("Health check failed: {}", e);
                return Err(e);
            }
        }

        Ok(())
    }
}
