use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Locally cached profile of an identity-provider account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LocalUser {
    pub firebase_uid: String,
    pub email: String,
    pub username: String,
    pub created_at: NaiveDateTime,
}

/// Tokens returned to the client after a successful login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionTokens {
    pub id_token: String,
    pub refresh_token: String,
}
