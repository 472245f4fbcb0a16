use crate::api::rest::forms::path_id;
use crate::api::rest::uploads::{read_item_form, UploadedFile};
use crate::api::rest::{ApiError, ApiResult, AppState, OrApi};
use crate::db::models::item_models::{Brand, Item, ItemFields};
use crate::db::repositories::brands::BrandsRepository;
use crate::db::repositories::items::ItemsRepository;
use crate::error::Error;
use crate::security::OwnerKey;
use crate::services::{ImageKind, ImageStore, LabelInput, StagedFile};
use anyhow::Result;
use axum::extract::multipart::{Multipart, MultipartRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, put};
use axum::Router;
use log::{error, info, warn};
use serde::Serialize;
use serde_json::{json, Value};
use sqlx::{PgConnection, Postgres, Transaction};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateItemResponse {
    pub message: String,
    pub item_id: i32,
    pub image_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qr_code_url: Option<String>,
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_items).post(create_item))
        .route("/brands", get(list_brands))
        .route("/:id", put(update_item).delete(delete_item))
}

/// References the row ends up with
struct WrittenFiles {
    image_url: String,
    qr_code_url: Option<String>,
}

fn multipart_or_reject(multipart: Result<Multipart, MultipartRejection>) -> ApiResult<Multipart> {
    multipart.map_err(|e| Error::Validation(format!("Expected multipart form data: {}", e)).into())
}

async fn stage_upload(storage: &ImageStore, file: Option<UploadedFile>) -> Result<Option<StagedFile>> {
    match file {
        Some(file) => Ok(Some(storage.stage(&file.bytes, file.extension).await?)),
        None => Ok(None),
    }
}

/// Render a label for the item and stage it as PNG
async fn stage_label(state: &AppState, fields: &ItemFields, image_url: &str) -> Result<StagedFile> {
    let input = LabelInput {
        name: fields.name.clone(),
        quantity: fields.quantity,
        code: fields.code.clone(),
        brand: fields.brand.clone(),
        image: image_url.to_string(),
    };
    let composer = state.composer.clone();
    let png = tokio::task::spawn_blocking(move || composer.render_png(&input))
        .await
        .map_err(|e| Error::Internal(format!("Label task failed: {}", e)))??;

    state.storage.stage(&png, "png").await
}

async fn begin(state: &AppState) -> Result<Transaction<'static, Postgres>> {
    let tx = state
        .db_pool
        .begin()
        .await
        .map_err(|e| Error::Database(format!("Failed to begin transaction: {}", e)))?;
    Ok(tx)
}

/// Finish a transaction whose writes may have moved files into place.
/// `fresh` holds the files moved to new locations; they are removed again
/// whenever the transaction does not commit.
async fn settle<T>(
    storage: &ImageStore,
    tx: Transaction<'static, Postgres>,
    outcome: Result<T>,
    fresh: &[PathBuf],
) -> Result<T> {
    let result: Result<T> = match outcome {
        Ok(value) => tx
            .commit()
            .await
            .map(|()| value)
            .map_err(|e| Error::Database(format!("Failed to commit: {}", e)).into()),
        Err(e) => {
            if let Err(rollback) = tx.rollback().await {
                error!("Rollback failed: {}", rollback);
            }
            Err(e)
        }
    };

    if result.is_err() {
        for path in fresh {
            storage.discard(path).await;
        }
    }
    result
}

async fn finalize_into(
    storage: &ImageStore,
    staged: StagedFile,
    kind: ImageKind,
    reference: &str,
    previous: Option<&str>,
    fresh: &mut Vec<PathBuf>,
) -> Result<()> {
    let path = storage.finalize(staged, kind, reference).await?;
    if previous != Some(reference) {
        fresh.push(path);
    }
    Ok(())
}

pub async fn create_item(
    State(state): State<AppState>,
    owner: OwnerKey,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<(StatusCode, Json<CreateItemResponse>)> {
    let mut multipart = multipart_or_reject(multipart)?;
    let form = read_item_form(&mut multipart, state.storage.max_upload_bytes()).await?;
    let fields = form.fields()?;
    let image = form
        .image
        .ok_or_else(|| Error::Validation("Item image must be uploaded".to_string()))?;

    info!("Adding item {} for owner {}", fields.code, owner.as_str());

    let storage = Arc::clone(&state.storage);
    let staged_image = storage
        .stage(&image.bytes, image.extension)
        .await
        .or_api("Failed to add item")?;
    let staged_qr = stage_upload(&storage, form.qr_code_image)
        .await
        .or_api("Failed to add item")?;

    let mut tx = begin(&state).await.or_api("Failed to add item")?;
    let mut fresh = Vec::new();
    let outcome =
        write_new_item(&state, &mut *tx, &owner, &fields, staged_image, staged_qr, &mut fresh).await;
    let (item_id, files) = settle(&storage, tx, outcome, &fresh)
        .await
        .or_api("Failed to add item")?;

    Ok((
        StatusCode::CREATED,
        Json(CreateItemResponse {
            message: "Item added".to_string(),
            item_id,
            image_url: storage.public_url(ImageKind::Image, &files.image_url),
            qr_code_url: files
                .qr_code_url
                .as_deref()
                .map(|r| storage.public_url(ImageKind::QrCode, r)),
        }),
    ))
}

async fn write_new_item(
    state: &AppState,
    conn: &mut PgConnection,
    owner: &OwnerKey,
    fields: &ItemFields,
    staged_image: StagedFile,
    staged_qr: Option<StagedFile>,
    fresh: &mut Vec<PathBuf>,
) -> Result<(i32, WrittenFiles)> {
    let storage = &state.storage;
    let repo = ItemsRepository::new(Arc::clone(&state.db_pool));

    let id = repo.insert(&mut *conn, owner.as_str(), fields).await?;
    let image_url = storage.reference(owner.as_str(), id, ImageKind::Image, staged_image.extension())?;

    let staged_qr = match staged_qr {
        Some(staged) => Some(staged),
        None if storage.generate_qr_labels() => Some(stage_label(state, fields, &image_url).await?),
        None => None,
    };
    let qr_code_url = match &staged_qr {
        Some(staged) => Some(storage.reference(owner.as_str(), id, ImageKind::QrCode, staged.extension())?),
        None => None,
    };

    repo.set_files(&mut *conn, id, owner.as_str(), &image_url, qr_code_url.as_deref())
        .await?;

    finalize_into(storage, staged_image, ImageKind::Image, &image_url, None, fresh).await?;
    if let (Some(staged), Some(reference)) = (staged_qr, qr_code_url.as_deref()) {
        finalize_into(storage, staged, ImageKind::QrCode, reference, None, fresh).await?;
    }

    Ok((id, WrittenFiles { image_url, qr_code_url }))
}

pub async fn list_items(State(state): State<AppState>, owner: OwnerKey) -> ApiResult<Json<Vec<Item>>> {
    let repo = ItemsRepository::new(Arc::clone(&state.db_pool));
    let items = repo
        .get_by_owner(owner.as_str())
        .await
        .or_api("Database error")?;

    Ok(Json(items))
}

pub async fn update_item(
    State(state): State<AppState>,
    owner: OwnerKey,
    Path(id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<Value>> {
    let id = path_id(&id, "item")?;
    let mut multipart = multipart_or_reject(multipart)?;
    let form = read_item_form(&mut multipart, state.storage.max_upload_bytes()).await?;
    let fields = form.fields()?;

    let storage = Arc::clone(&state.storage);
    let staged_image = stage_upload(&storage, form.image)
        .await
        .or_api("Failed to update item")?;
    let staged_qr = stage_upload(&storage, form.qr_code_image)
        .await
        .or_api("Failed to update item")?;

    let mut tx = begin(&state).await.or_api("Failed to update item")?;
    let mut fresh = Vec::new();
    let outcome = write_item_update(
        &state,
        &mut *tx,
        &owner,
        id,
        &fields,
        staged_image,
        staged_qr,
        &mut fresh,
    )
    .await;
    let (previous, files) = settle(&storage, tx, outcome, &fresh)
        .await
        .or_api("Failed to update item")?;

    // Replaced files are only removed once the new references are committed
    if !previous.image_url.is_empty() && previous.image_url != files.image_url {
        remove_quietly(&storage, ImageKind::Image, &previous.image_url).await;
    }
    if let Some(old_qr) = previous.qr_code_url.as_deref() {
        if files.qr_code_url.as_deref() != Some(old_qr) {
            remove_quietly(&storage, ImageKind::QrCode, old_qr).await;
        }
    }

    info!("Updated item {} for owner {}", id, owner.as_str());
    Ok(Json(json!({ "message": "Item updated" })))
}

async fn write_item_update(
    state: &AppState,
    conn: &mut PgConnection,
    owner: &OwnerKey,
    id: i32,
    fields: &ItemFields,
    staged_image: Option<StagedFile>,
    staged_qr: Option<StagedFile>,
    fresh: &mut Vec<PathBuf>,
) -> Result<(Item, WrittenFiles)> {
    let storage = &state.storage;
    let repo = ItemsRepository::new(Arc::clone(&state.db_pool));

    let current = repo
        .lock_owned(&mut *conn, id, owner.as_str())
        .await?
        .ok_or_else(|| {
            warn!("Item {} not found for owner {}", id, owner.as_str());
            Error::NotFound("Item not found or access denied".to_string())
        })?;

    let image_url = match &staged_image {
        Some(staged) => storage.reference(owner.as_str(), id, ImageKind::Image, staged.extension())?,
        None => current.image_url.clone(),
    };

    let staged_qr = match staged_qr {
        Some(staged) => Some(staged),
        None if storage.generate_qr_labels() => Some(stage_label(state, fields, &image_url).await?),
        None => None,
    };
    let qr_code_url = match &staged_qr {
        Some(staged) => Some(storage.reference(owner.as_str(), id, ImageKind::QrCode, staged.extension())?),
        None => current.qr_code_url.clone(),
    };

    repo.update(&mut *conn, id, owner.as_str(), fields, &image_url, qr_code_url.as_deref())
        .await?;

    if let Some(staged) = staged_image {
        finalize_into(
            storage,
            staged,
            ImageKind::Image,
            &image_url,
            Some(current.image_url.as_str()),
            fresh,
        )
        .await?;
    }
    if let (Some(staged), Some(reference)) = (staged_qr, qr_code_url.as_deref()) {
        finalize_into(
            storage,
            staged,
            ImageKind::QrCode,
            reference,
            current.qr_code_url.as_deref(),
            fresh,
        )
        .await?;
    }

    Ok((current, WrittenFiles { image_url, qr_code_url }))
}

async fn remove_quietly(storage: &ImageStore, kind: ImageKind, reference: &str) {
    if let Err(e) = storage.remove(kind, reference).await {
        warn!("Failed to delete {} {}: {}", kind.dir_name(), reference, e);
    }
}

pub async fn delete_item(
    State(state): State<AppState>,
    owner: OwnerKey,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let id = path_id(&id, "item")?;
    let repo = ItemsRepository::new(Arc::clone(&state.db_pool));

    let item = repo
        .get_owned(id, owner.as_str())
        .await
        .or_api("Failed to delete item")?
        .ok_or_else(|| ApiError::from(Error::NotFound("Item not found or access denied".to_string())))?;

    if !repo
        .delete_owned(id, owner.as_str())
        .await
        .or_api("Failed to delete item")?
    {
        return Err(Error::NotFound("Item not found or access denied".to_string()).into());
    }

    let storage = &state.storage;
    if !item.image_url.is_empty() {
        remove_quietly(storage, ImageKind::Image, &item.image_url).await;
    }
    if let Some(qr) = item.qr_code_url.as_deref() {
        remove_quietly(storage, ImageKind::QrCode, qr).await;
    }
    for kind in [ImageKind::Image, ImageKind::QrCode] {
        if let Err(e) = storage.remove_owner_dir_if_empty(kind, owner.as_str()).await {
            warn!("Failed to tidy {} folder of {}: {}", kind.dir_name(), owner.as_str(), e);
        }
    }

    info!("Deleted item {} for owner {}", id, owner.as_str());
    Ok(Json(json!({ "message": "Item deleted" })))
}

pub async fn list_brands(State(state): State<AppState>, _owner: OwnerKey) -> ApiResult<Json<Vec<Brand>>> {
    let repo = BrandsRepository::new(Arc::clone(&state.db_pool));
    let brands = repo.get_all().await.or_api("Internal Server Error")?;
    Ok(Json(brands))
}
