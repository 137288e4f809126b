use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

mod config;
mod models;
mod routes;
mod schema;
mod services;

use config::AppConfig;
use flamer_shared::clients::db::{create_pool, DbPool};
use flamer_shared::clients::policy::PolicyClient;
use flamer_shared::clients::storage::StorageClient;

pub struct AppState {
    pub db: DbPool,
    pub config: AppConfig,
    pub policy: PolicyClient,
    pub storage: StorageClient,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    flamer_shared::middleware::init_tracing("flamer-api");

    let config = AppConfig::load()?;
    let port = config.port;

    let db = create_pool(&config.database_url)?;

    let policy = PolicyClient::new(&config.pdp_url, &config.pdp_api_key)?;
    let storage = StorageClient::new(
        &config.storage_endpoint,
        &config.storage_access_key,
        &config.storage_secret_key,
        &config.storage_bucket,
        &config.storage_public_url,
    )
    .await;

    let state = Arc::new(AppState { db, config, policy, storage });

    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/capabilities", get(routes::capabilities::get_capabilities))
        .route("/me", get(routes::profile::get_profile).put(routes::profile::upsert_profile))
        .route(
            "/me/photos",
            post(routes::photo::upload_photo).layer(DefaultBodyLimit::max(6 * 1024 * 1024)),
        )
        .route("/me/photos/:index", delete(routes::photo::delete_photo))
        .route("/discovery", get(routes::discovery::next_candidates))
        .route("/swipes", post(routes::swipes::record_swipe))
        .route("/quota", get(routes::swipes::get_quota))
        .route("/likes", get(routes::likes::list_likes))
        .route("/likes/:liker_id/respond", post(routes::likes::respond_to_like))
        .route("/plans/select", post(routes::plans::select_plan))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!(addr = %addr, "flamer-api starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
