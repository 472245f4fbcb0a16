use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Scanning session row as stored
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Event {
    pub id_event: i32,
    pub firebase_uid: String,
    pub nama_event: String,
    pub tanggal: NaiveDate,
    pub kota: String,
    pub kabupaten: String,
    pub id_status: i32,
    pub waktu_dibuat: NaiveDateTime,
    pub tanggal_selesai: Option<NaiveDate>,
    pub waktu_selesai: Option<NaiveTime>,
}

/// Event joined with its status label
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct EventView {
    pub id_event: i32,
    pub nama_event: String,
    pub tanggal: NaiveDate,
    pub kota: String,
    pub kabupaten: String,
    pub id_status: i32,
    pub status: String,
    pub waktu_dibuat: NaiveDateTime,
    pub tanggal_selesai: Option<NaiveDate>,
    pub waktu_selesai: Option<NaiveTime>,
}

/// Fields supplied when creating or editing an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventFields {
    pub nama_event: String,
    pub tanggal: NaiveDate,
    pub kota: String,
    pub kabupaten: String,
}

/// One scanned code under an event, joined with its status label
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ScanRecord {
    pub qr_code: String,
    pub scan_date: NaiveDate,
    pub scan_time: NaiveTime,
    pub tanggal_selesai: Option<NaiveDate>,
    pub waktu_selesai: Option<NaiveTime>,
    pub id_status: i32,
    pub status: String,
}

/// Workflow state shared by events and scan records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkStatus {
    InUse,
    Done,
}

impl WorkStatus {
    /// Name of the row in the `status` reference table
    pub fn db_name(&self) -> &'static str {
        match self {
            WorkStatus::InUse => "Dipakai",
            WorkStatus::Done => "Selesai",
        }
    }
}
