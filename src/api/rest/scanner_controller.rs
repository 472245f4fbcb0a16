use crate::api::rest::{ApiResult, AppState, OrApi};
use crate::db::models::item_models::Item;
use crate::db::repositories::items::ItemsRepository;
use crate::error::Error;
use crate::security::OwnerKey;
use axum::extract::{Path, State};
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use log::info;
use std::sync::Arc;

pub fn create_router() -> Router<AppState> {
    Router::new().route("/:code", get(lookup_item))
}

/// Item of the caller matching a scanned code
pub async fn lookup_item(
    State(state): State<AppState>,
    owner: OwnerKey,
    Path(code): Path<String>,
) -> ApiResult<Json<Item>> {
    let code = code.trim();
    if code.is_empty() {
        return Err(Error::Validation("Code is required".to_string()).into());
    }
    info!("Scanner lookup of {} for owner {}", code, owner.as_str());

    let repo = ItemsRepository::new(Arc::clone(&state.db_pool));
    let item = repo
        .get_by_code(owner.as_str(), code)
        .await
        .or_api("Database error")?
        .ok_or_else(|| Error::NotFound("Item not found".to_string()))?;

    Ok(Json(item))
}
