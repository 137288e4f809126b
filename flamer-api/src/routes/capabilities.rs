use axum::extract::State;
use axum::Json;
use std::sync::Arc;

use flamer_shared::errors::AppResult;
use flamer_shared::types::auth::AuthUser;
use flamer_shared::types::{ApiResponse, CapabilitySnapshot};

use crate::AppState;

/// GET /capabilities - the viewer's page-load permission snapshot.
/// Gate failures surface as the all-denied snapshot, never as errors.
pub async fn get_capabilities(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<CapabilitySnapshot>>> {
    let caps = state.policy.resolve_capabilities(user.id).await;
    Ok(Json(ApiResponse::ok(caps)))
}
