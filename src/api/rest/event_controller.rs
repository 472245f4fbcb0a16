use crate::api::rest::forms::{flexible_id, path_id, required_text, JsonBody};
use crate::api::rest::{ApiResult, AppState, OrApi};
use crate::db::models::event_models::{Event, EventFields, EventView, ScanRecord, WorkStatus};
use crate::db::repositories::events::EventsRepository;
use crate::db::repositories::scans::ScansRepository;
use crate::db::repositories::statuses::status_id;
use crate::error::Error;
use crate::security::OwnerKey;
use crate::utils::dates::parse_event_date;
use anyhow::Result;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{delete, get, post, put};
use axum::Router;
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

/// Body of event create and edit
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct EventRequest {
    pub nama_event: Option<String>,
    pub tanggal: Option<String>,
    pub kota: Option<String>,
    pub kabupaten: Option<String>,
}

impl EventRequest {
    fn fields(&self) -> Result<EventFields, Error> {
        let (Some(nama_event), Some(tanggal), Some(kota), Some(kabupaten)) = (
            required_text(&self.nama_event),
            required_text(&self.tanggal),
            required_text(&self.kota),
            required_text(&self.kabupaten),
        ) else {
            return Err(Error::Validation("All fields are required".to_string()));
        };

        Ok(EventFields {
            nama_event: nama_event.to_string(),
            tanggal: parse_event_date(tanggal)?,
            kota: kota.to_string(),
            kabupaten: kabupaten.to_string(),
        })
    }
}

/// Scan body. Without `id_event` the caller's most recent event is used.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ScanRequest {
    pub qr_code: Option<String>,
    #[serde(deserialize_with = "flexible_id")]
    pub id_event: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct EventIdRequest {
    #[serde(deserialize_with = "flexible_id")]
    pub id_event: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct EventQuery {
    pub id_event: Option<String>,
}

impl EventQuery {
    fn id_event(&self) -> Result<Option<i32>, Error> {
        required_text(&self.id_event)
            .map(|raw| path_id(raw, "event"))
            .transpose()
    }
}

#[derive(Debug, Serialize)]
pub struct ScanList {
    pub message: String,
    pub data: Vec<ScanRecord>,
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/simpan", post(create_event))
        .route("/ambil-edit/:id", get(get_event_for_edit))
        .route("/update/:id", put(update_event))
        .route("/scan", post(record_scan))
        .route("/check-qrcode", get(check_qrcode))
        .route("/hapus-scan", delete(delete_scan))
        .route("/scan-complete", put(complete_scan))
        .route("/event-statuscheck/:id_event/check-status", get(check_event_status))
        .route("/tampil", get(list_events))
        .route("/detail/:id_event", get(event_detail))
        .route("/tampil_scan", get(list_scans))
        .route("/hapus/:id_event", delete(delete_event))
        .route("/event-selesai", put(complete_event))
}

fn event_not_found() -> Error {
    Error::NotFound("Event not found for this user".to_string())
}

/// Event a scan operation applies to: the given one if owned, else the newest
async fn resolve_event(state: &AppState, owner: &OwnerKey, explicit: Option<i32>) -> Result<i32> {
    let repo = EventsRepository::new(Arc::clone(&state.db_pool));
    match explicit {
        Some(id) => {
            if repo.is_owned(id, owner.as_str()).await? {
                Ok(id)
            } else {
                warn!("Event {} is not owned by {}", id, owner.as_str());
                Err(event_not_found().into())
            }
        }
        None => repo
            .latest_id(owner.as_str())
            .await?
            .ok_or_else(|| event_not_found().into()),
    }
}

async fn require_owned_event(state: &AppState, owner: &OwnerKey, id: i32) -> Result<()> {
    resolve_event(state, owner, Some(id)).await.map(|_| ())
}

pub async fn create_event(
    State(state): State<AppState>,
    owner: OwnerKey,
    JsonBody(body): JsonBody<EventRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let fields = body.fields()?;
    info!("Creating event {} for owner {}", fields.nama_event, owner.as_str());

    let id = insert_event(&state, &owner, &fields)
        .await
        .or_api("Failed to add event")?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Event added", "eventId": id })),
    ))
}

async fn insert_event(state: &AppState, owner: &OwnerKey, fields: &EventFields) -> Result<i32> {
    let repo = EventsRepository::new(Arc::clone(&state.db_pool));
    let mut tx = state.db_pool.begin().await.map_err(Error::from)?;

    let outcome = async {
        let in_use = status_id(&mut *tx, WorkStatus::InUse).await?;
        repo.create(&mut *tx, owner.as_str(), fields, in_use, state.clock.now())
            .await
    }
    .await;

    match outcome {
        Ok(id) => {
            tx.commit().await.map_err(Error::from)?;
            Ok(id)
        }
        Err(e) => {
            if let Err(rollback) = tx.rollback().await {
                error!("Rollback failed: {}", rollback);
            }
            Err(e)
        }
    }
}

pub async fn get_event_for_edit(
    State(state): State<AppState>,
    owner: OwnerKey,
    Path(id): Path<String>,
) -> ApiResult<Json<Event>> {
    let id = path_id(&id, "event")?;
    let repo = EventsRepository::new(Arc::clone(&state.db_pool));

    let event = repo
        .get_owned(id, owner.as_str())
        .await
        .or_api("Failed to get event")?
        .ok_or_else(|| Error::NotFound("Event not found".to_string()))?;

    Ok(Json(event))
}

pub async fn update_event(
    State(state): State<AppState>,
    owner: OwnerKey,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<EventRequest>,
) -> ApiResult<Json<Value>> {
    let id = path_id(&id, "event")?;
    let fields = body.fields()?;
    let repo = EventsRepository::new(Arc::clone(&state.db_pool));

    let updated = repo
        .update(id, owner.as_str(), &fields)
        .await
        .or_api("Failed to update event")?;
    if !updated {
        return Err(Error::NotFound("Event not found or access denied".to_string()).into());
    }

    info!("Updated event {} for owner {}", id, owner.as_str());
    Ok(Json(json!({ "message": "Event updated" })))
}

pub async fn record_scan(
    State(state): State<AppState>,
    owner: OwnerKey,
    JsonBody(body): JsonBody<ScanRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let qr_code = required_text(&body.qr_code)
        .ok_or_else(|| Error::Validation("QR code is required".to_string()))?;

    let id_event = resolve_event(&state, &owner, body.id_event)
        .await
        .or_api("Failed to save QR code")?;

    let scans = ScansRepository::new(Arc::clone(&state.db_pool));
    let in_use = status_id(&*state.db_pool, WorkStatus::InUse)
        .await
        .or_api("Failed to save QR code")?;
    let inserted = scans
        .insert(id_event, owner.as_str(), qr_code, in_use, state.clock.now())
        .await
        .or_api("Failed to save QR code")?;
    if !inserted {
        return Err(Error::Conflict("This QR code is already recorded in this event".to_string()).into());
    }

    info!("Recorded scan {} in event {}", qr_code, id_event);
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "QR code saved", "id_event": id_event })),
    ))
}

pub async fn check_qrcode(
    State(state): State<AppState>,
    owner: OwnerKey,
    Query(query): Query<EventQuery>,
) -> ApiResult<Json<Value>> {
    let explicit = query.id_event()?;
    let id_event = resolve_event(&state, &owner, explicit)
        .await
        .or_api("Failed to check QR codes")?;

    let scans = ScansRepository::new(Arc::clone(&state.db_pool));
    let count = scans
        .count(id_event, owner.as_str())
        .await
        .or_api("Failed to check QR codes")?;

    Ok(Json(json!({ "exists": count > 0, "id_event": id_event })))
}

pub async fn delete_scan(
    State(state): State<AppState>,
    owner: OwnerKey,
    JsonBody(body): JsonBody<ScanRequest>,
) -> ApiResult<Json<Value>> {
    let qr_code = required_text(&body.qr_code)
        .ok_or_else(|| Error::Validation("QR code is required".to_string()))?;

    let id_event = resolve_event(&state, &owner, body.id_event)
        .await
        .or_api("Failed to delete QR code")?;

    let scans = ScansRepository::new(Arc::clone(&state.db_pool));
    let deleted = scans
        .delete(id_event, owner.as_str(), qr_code)
        .await
        .or_api("Failed to delete QR code")?;
    if !deleted {
        return Err(Error::NotFound("QR code not found".to_string()).into());
    }

    info!("Deleted scan {} from event {}", qr_code, id_event);
    Ok(Json(json!({ "message": "QR code deleted" })))
}

pub async fn complete_scan(
    State(state): State<AppState>,
    owner: OwnerKey,
    JsonBody(body): JsonBody<ScanRequest>,
) -> ApiResult<Json<Value>> {
    let (Some(qr_code), Some(id_event)) = (required_text(&body.qr_code), body.id_event) else {
        return Err(Error::Validation("QR code and event id are required".to_string()).into());
    };

    require_owned_event(&state, &owner, id_event)
        .await
        .or_api("Failed to complete QR code")?;

    let scans = ScansRepository::new(Arc::clone(&state.db_pool));
    let done = status_id(&*state.db_pool, WorkStatus::Done)
        .await
        .or_api("Failed to complete QR code")?;
    let updated = scans
        .complete(id_event, owner.as_str(), qr_code, done, state.clock.now())
        .await
        .or_api("Failed to complete QR code")?;
    if !updated {
        return Err(Error::NotFound("QR code not found".to_string()).into());
    }

    info!("Completed scan {} in event {}", qr_code, id_event);
    Ok(Json(json!({ "success": true, "message": "QR code updated" })))
}

/// `{selesai: true}` once no scan of the event is still in use
pub async fn check_event_status(
    State(state): State<AppState>,
    owner: OwnerKey,
    Path(id_event): Path<String>,
) -> ApiResult<Json<Value>> {
    let id_event = path_id(&id_event, "event")?;
    require_owned_event(&state, &owner, id_event)
        .await
        .or_api("Failed to check QR code status")?;

    let scans = ScansRepository::new(Arc::clone(&state.db_pool));
    let in_use = status_id(&*state.db_pool, WorkStatus::InUse)
        .await
        .or_api("Failed to check QR code status")?;
    let open = scans
        .count_with_status(id_event, owner.as_str(), in_use)
        .await
        .or_api("Failed to check QR code status")?;

    Ok(Json(json!({ "selesai": open == 0 })))
}

pub async fn list_events(State(state): State<AppState>, owner: OwnerKey) -> ApiResult<Json<Vec<EventView>>> {
    let repo = EventsRepository::new(Arc::clone(&state.db_pool));
    let events = repo
        .list_views(owner.as_str())
        .await
        .or_api("Failed to get events")?;

    Ok(Json(events))
}

pub async fn event_detail(
    State(state): State<AppState>,
    owner: OwnerKey,
    Path(id_event): Path<String>,
) -> ApiResult<Json<EventView>> {
    let id_event = path_id(&id_event, "event")?;
    let repo = EventsRepository::new(Arc::clone(&state.db_pool));

    let event = repo
        .get_view(id_event, owner.as_str())
        .await
        .or_api("Failed to get event detail")?
        .ok_or_else(|| Error::NotFound("Event not found".to_string()))?;

    Ok(Json(event))
}

pub async fn list_scans(
    State(state): State<AppState>,
    owner: OwnerKey,
    Query(query): Query<EventQuery>,
) -> ApiResult<Json<ScanList>> {
    let id_event = query
        .id_event()?
        .ok_or_else(|| Error::Validation("Event id must be given in the query".to_string()))?;

    require_owned_event(&state, &owner, id_event)
        .await
        .or_api("Failed to get QR code data")?;

    let scans = ScansRepository::new(Arc::clone(&state.db_pool));
    let data = scans
        .list_for_event(id_event, owner.as_str())
        .await
        .or_api("Failed to get QR code data")?;

    Ok(Json(ScanList {
        message: "QR code data loaded".to_string(),
        data,
    }))
}

pub async fn delete_event(
    State(state): State<AppState>,
    owner: OwnerKey,
    Path(id_event): Path<String>,
) -> ApiResult<Json<Value>> {
    let id_event = path_id(&id_event, "event")?;

    remove_event(&state, &owner, id_event)
        .await
        .or_api("Failed to delete event and QR codes")?;

    info!("Deleted event {} for owner {}", id_event, owner.as_str());
    Ok(Json(json!({ "message": "Event and QR codes deleted" })))
}

async fn remove_event(state: &AppState, owner: &OwnerKey, id_event: i32) -> Result<()> {
    let events = EventsRepository::new(Arc::clone(&state.db_pool));
    let scans = ScansRepository::new(Arc::clone(&state.db_pool));
    let mut tx = state.db_pool.begin().await.map_err(Error::from)?;

    let outcome = async {
        let owned = events
            .get_owned(id_event, owner.as_str())
            .await?
            .ok_or_else(|| Error::NotFound("Event not found or access denied".to_string()))?;
        let removed = scans
            .delete_for_event(&mut *tx, owned.id_event, owner.as_str())
            .await?;
        events.delete_owned(&mut *tx, owned.id_event, owner.as_str()).await?;
        Ok::<u64, anyhow::Error>(removed)
    }
    .await;

    match outcome {
        Ok(removed) => {
            tx.commit().await.map_err(Error::from)?;
            info!("Removed {} scans with event {}", removed, id_event);
            Ok(())
        }
        Err(e) => {
            if let Err(rollback) = tx.rollback().await {
                error!("Rollback failed: {}", rollback);
            }
            Err(e)
        }
    }
}

/// Mark the event done. Repeating it keeps the first completion stamp.
pub async fn complete_event(
    State(state): State<AppState>,
    owner: OwnerKey,
    JsonBody(body): JsonBody<EventIdRequest>,
) -> ApiResult<Json<Value>> {
    let id_event = body
        .id_event
        .ok_or_else(|| Error::Validation("Event id is required".to_string()))?;

    let repo = EventsRepository::new(Arc::clone(&state.db_pool));
    let done = status_id(&*state.db_pool, WorkStatus::Done)
        .await
        .or_api("Failed to complete event")?;
    let updated = repo
        .complete(id_event, owner.as_str(), done, state.clock.now())
        .await
        .or_api("Failed to complete event")?;
    if !updated {
        return Err(Error::NotFound("Event not found or invalid".to_string()).into());
    }

    info!("Completed event {} for owner {}", id_event, owner.as_str());
    Ok(Json(json!({ "success": true, "message": "Event completed" })))
}
