pub(crate) mod api;
pub(crate) mod core;
pub(crate) mod db;
pub(crate) mod repositories;
pub(crate) mod schemas;
pub(crate) mod services;
pub(crate) mod tasks;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use crate::core::{config::Settings, redis::RedisHandle, state::AppState, telemetry};
use crate::services::session::store::{MemoryStore, RedisStore, SharedStore};
use crate::services::session::{SessionConfig, SessionEngine};
use crate::services::storage::StorageService;

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::load()?;
    telemetry::init_tracing(&settings)?;
    core::metrics::init(&settings)?;

    let db_pool = db::init_pool(&settings).await?;
    db::run_migrations(&db_pool).await?;

    let redis = RedisHandle::new(settings.redis().redis_url());
    let session_store: SharedStore = match redis.connect().await {
        Ok(()) => {
            tracing::info!("Redis connected successfully");
            Arc::new(RedisStore::new(redis.clone()))
        }
        Err(err) => {
            tracing::error!(
                error = %err,
                "Failed to connect to Redis; session state held in memory"
            );
            Arc::new(MemoryStore::new())
        }
    };

    let storage = StorageService::from_settings(&settings).await?;
    let sessions = SessionEngine::new(session_store, SessionConfig::from_settings(&settings));
    let state = AppState::new(settings, db_pool, redis.clone(), storage, sessions);

    if let Err(err) = core::bootstrap::ensure_superuser(&state).await {
        tracing::error!(error = %err, "Failed to ensure default superuser");
    }
    let app = api::router::router(state.clone());
    let listener = tokio::net::TcpListener::bind(state.settings().server_addr()).await?;

    tracing::info!(
        host = %state.settings().server_host(),
        port = state.settings().server_port(),
        environment = %state.settings().runtime().environment.as_str(),
        timer_policy = %state.settings().exam().timer_policy.as_str(),
        "EIT Rust API listening"
    );

    let result =
        axum::serve(listener, app).with_graceful_shutdown(core::shutdown::shutdown_signal()).await;

    state.sessions().shutdown_tickers().await;
    redis.disconnect().await;
    tracing::info!("Redis disconnected");

    result?;

    Ok(())
}
