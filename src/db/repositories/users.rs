use crate::{db::models::user_models::LocalUser, error::Error};
use anyhow::Result;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::info;

/// Users repository for the local profile cache
#[derive(Clone)]
pub struct UsersRepository {
    pool: Arc<PgPool>,
}

impl UsersRepository {
    /// Create a new users repository
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Record a freshly registered account
    pub async fn create(&self, firebase_uid: &str, email: &str, username: &str) -> Result<LocalUser> {
        info!("Creating local user: {}", username);

        let result = sqlx::query_as::<_, LocalUser>(
            r#"
            INSERT INTO users (firebase_uid, email, username)
            VALUES ($1, $2, $3)
            RETURNING firebase_uid, email, username, created_at
            "#,
        )
        .bind(firebase_uid)
        .bind(email)
        .bind(username)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to create user: {}", e)))?;

        Ok(result)
    }

    /// Get user by email
    pub async fn get_by_email(&self, email: &str) -> Result<Option<LocalUser>> {
        let result = sqlx::query_as::<_, LocalUser>(
            r#"
            SELECT firebase_uid, email, username, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to get user by email: {}", e)))?;

        Ok(result)
    }

    /// Get user by identity-provider uid
    pub async fn get_by_uid(&self, firebase_uid: &str) -> Result<Option<LocalUser>> {
        let result = sqlx::query_as::<_, LocalUser>(
            r#"
            SELECT firebase_uid, email, username, created_at
            FROM users
            WHERE firebase_uid = $1
            "#,
        )
        .bind(firebase_uid)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to get user by uid: {}", e)))?;

        Ok(result)
    }
}
