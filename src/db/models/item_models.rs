use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Inventory item owned by one user
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Item {
    pub id: i32,
    pub firebase_uid: String,
    pub name: String,
    pub quantity: i32,
    pub code: String,
    pub brand: String,
    /// Path relative to the images directory
    pub image_url: String,
    /// Path relative to the QR code directory
    pub qr_code_url: Option<String>,
    pub created_at: NaiveDateTime,
}

/// Editable item attributes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFields {
    pub name: String,
    pub quantity: i32,
    pub code: String,
    pub brand: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Brand {
    pub id: i32,
    pub name: String,
}
