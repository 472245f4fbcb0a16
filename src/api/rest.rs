use crate::config::ApiConfig;
use crate::error::Error;
use crate::security::auth::AuthService;
use crate::security::identity::IdentityProvider;
use crate::services::{ImageKind, ImageStore, QrLabelComposer};
use crate::utils::dates::WallClock;
use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    http::{Request, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use log::{error, info};
use serde::Serialize;
use sqlx::PgPool;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

pub mod auth_controller;
pub mod event_controller;
pub mod forms;
pub mod item_controller;
pub mod scanner_controller;
pub mod uploads;

#[cfg(test)]
mod tests;

// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db_pool: Arc<PgPool>,
    pub identity: Arc<dyn IdentityProvider>,
    pub auth_service: Arc<AuthService>,
    pub storage: Arc<ImageStore>,
    pub composer: QrLabelComposer,
    pub clock: WallClock,
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// JSON error body: `{error, details?}`
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip)]
    pub status: StatusCode,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
            status,
        }
    }
}

fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::Validation(_) | Error::AlreadyRegistered(_) => StatusCode::BAD_REQUEST,
        Error::Unauthenticated(_) | Error::Authentication(_) => StatusCode::UNAUTHORIZED,
        Error::InvalidToken(_) | Error::Forbidden(_) => StatusCode::FORBIDDEN,
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        Error::Conflict(_) => StatusCode::CONFLICT,
        Error::Upstream(_)
        | Error::Database(_)
        | Error::Io(_)
        | Error::Render(_)
        | Error::Config(_)
        | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError::new(status_for(&err), err.to_string())
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        if let Some(err) = err.downcast_ref::<Error>() {
            return err.clone().into();
        }

        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status;
        (status, Json(self)).into_response()
    }
}

/// Attach a handler-level message to server-side failures. Client errors
/// pass through with their own message.
pub trait OrApi<T> {
    fn or_api(self, message: &str) -> ApiResult<T>;
}

impl<T> OrApi<T> for Result<T> {
    fn or_api(self, message: &str) -> ApiResult<T> {
        self.map_err(|err| {
            let known = err.downcast_ref::<Error>();
            if let Some(e) = known.filter(|e| e.is_client_error()) {
                return ApiError::from(e.clone());
            }

            error!("{}: {:#}", message, err);
            ApiError {
                error: message.to_string(),
                details: Some(err.to_string()),
                status: known.map(status_for).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            }
        })
    }
}

async fn log_request<B>(req: Request<B>, next: Next<B>) -> Response {
    info!("Request received: {} {}", req.method(), req.uri());
    next.run(req).await
}

async fn health() -> &'static str {
    "Inventory scan API is running"
}

pub struct RestApi {
    config: ApiConfig,
    state: AppState,
}

impl RestApi {
    pub fn new(config: &ApiConfig, state: AppState) -> Self {
        Self {
            config: config.clone(),
            state,
        }
    }

    /// Full application router: API groups, static image folders and shared layers
    pub fn router(state: AppState) -> Router {
        let storage = Arc::clone(&state.storage);
        // Two files per item form plus text fields
        let body_limit = storage.max_upload_bytes() * 2 + 1024 * 1024;

        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
            .allow_credentials(false)
            .max_age(Duration::from_secs(3600));

        Router::new()
            .route("/", get(health))
            .nest("/api/auth", auth_controller::create_router())
            .nest("/api/barang", item_controller::create_router())
            .nest("/api/event", event_controller::create_router())
            .nest("/api/scanner", scanner_controller::create_router())
            .with_state(state)
            .nest_service("/images", ServeDir::new(storage.kind_dir(ImageKind::Image)))
            .nest_service("/qr_codes", ServeDir::new(storage.kind_dir(ImageKind::QrCode)))
            .layer(DefaultBodyLimit::max(body_limit))
            .layer(middleware::from_fn(log_request))
            .layer(cors)
    }

    pub async fn run(&self) -> Result<()> {
        let app = Self::router(self.state.clone());

        let addr = format!("{}:{}", self.config.address, self.config.port);
        let addr: SocketAddr = addr
            .parse()
            .map_err(|e| Error::Config(format!("Invalid listen address {}: {}", addr, e)))?;

        info!("API server listening on {}", addr);

        let listener = TcpListener::bind(addr).await?;
        axum::Server::from_tcp(listener.into_std()?)?
            .serve(app.into_make_service())
            .await?;

        Ok(())
    }
}
