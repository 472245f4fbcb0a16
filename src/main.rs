use anyhow::Result;
use inventory_scan::api::rest::{AppState, RestApi};
use inventory_scan::config;
use inventory_scan::db::DatabaseService;
use inventory_scan::security::auth::AuthService;
use inventory_scan::security::identity::FirebaseIdentity;
use inventory_scan::services::{ImageStore, QrLabelComposer, SmtpMailer};
use inventory_scan::utils::dates::WallClock;
use log::{info, warn};
use std::path::PathBuf;
use std::sync::Arc;

async fn run_app() -> Result<()> {
    // Config path: first argument, then INVENTORY_CONFIG
    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("INVENTORY_CONFIG").ok())
        .map(PathBuf::from);
    let config = config::setup_config(config_path.as_deref())?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.api.log_level.as_str()),
    )
    .init();
    info!("Starting inventory scan service");

    let database = DatabaseService::new(&config.database).await?;
    if let Err(e) = database.health_check().await {
        warn!("{}; requests may error until it recovers", e);
    }

    let storage = ImageStore::new(&config.storage);
    storage.ensure_layout().await?;
    info!("Image storage ready at {}", config.storage.root.display());

    let identity = Arc::new(FirebaseIdentity::new(&config.identity)?);
    let mailer = Arc::new(SmtpMailer::new(&config.mail)?);
    let auth_service = Arc::new(AuthService::new(
        Arc::clone(&database.pool),
        identity.clone(),
        mailer,
        &config.mail.app_name,
    ));

    let state = AppState {
        db_pool: Arc::clone(&database.pool),
        identity,
        auth_service,
        storage: Arc::new(storage),
        composer: QrLabelComposer::new(),
        clock: WallClock::new(config.api.utc_offset_hours),
    };

    let api = RestApi::new(&config.api, state);
    tokio::select! {
        result = api.run() => result?,
        _ = tokio::signal::ctrl_c() => info!("Shutting down..."),
    }

    Ok(())
}

fn main() {
    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Failed to start runtime: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(run_app()) {
        eprintln!("Application error: {:#}", e);
        std::process::exit(1);
    }
}
