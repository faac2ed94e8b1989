use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use sokoCore::{
    api::{self, AppState},
    config::AppConfig,
    db::DBLayer,
    device::{platform::HostPlatform, DeviceBindingPolicy},
    storage::{KeyValueStore, TimeoutStore},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // -----------------------------
    // Logging
    // -----------------------------
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;

    // -----------------------------
    // Storage / policy
    // -----------------------------
    let db = DBLayer::new(&config.db_path)?;
    let store: Arc<dyn KeyValueStore> = match config.storage_timeout {
        Some(limit) => Arc::new(TimeoutStore::new(db, limit)),
        None => Arc::new(db),
    };
    let platform = Arc::new(HostPlatform::from_env());
    let policy = Arc::new(DeviceBindingPolicy::new(store, platform));

    info!(device_id = %policy.get_device_id().await, "device identity ready");
    if !policy.ensure_legacy_migrated().await {
        warn!("legacy device mapping not migrated yet, will retry on first write");
    }

    let state = AppState { policy };

    // -----------------------------
    // Routers
    // -----------------------------
    let app = api::router()
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_headers(Any)
                .allow_methods(Any),
        )
        .with_state(state);

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;

    info!(addr = %config.bind_addr, db = %config.db_path.display(), "HTTP listening");

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
