use axum::Json;
use flamer_shared::types::api::HealthResponse;

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::healthy("flamer-api", env!("CARGO_PKG_VERSION")))
}
