use axum::extract::State;
use axum::Json;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use flamer_shared::errors::{AppError, AppResult, ErrorCode};
use flamer_shared::types::auth::AuthUser;
use flamer_shared::types::ApiResponse;

use crate::schema::profiles;
use crate::services::match_engine::{self, Quota};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SwipeRequest {
    pub target_id: Uuid,
    pub liked: bool,
}

#[derive(Debug, Serialize)]
pub struct SwipeResponse {
    pub matched: bool,
    pub quota: Quota,
}

/// POST /swipes - record one judgment about a candidate.
/// Repeats on the same pair are no-ops returning the settled outcome.
pub async fn record_swipe(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<SwipeRequest>,
) -> AppResult<Json<ApiResponse<SwipeResponse>>> {
    let caps = state.policy.resolve_capabilities(user.id).await;

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let target_exists: i64 = profiles::table
        .filter(profiles::id.eq(req.target_id))
        .count()
        .get_result(&mut conn)?;
    if target_exists == 0 {
        return Err(AppError::new(ErrorCode::ProfileNotFound, "target profile not found"));
    }

    let outcome = match_engine::record_swipe(&mut conn, user.id, req.target_id, req.liked, &caps)?;
    let quota = match_engine::check_quota(&mut conn, user.id, &caps)?;

    Ok(Json(ApiResponse::ok(SwipeResponse {
        matched: outcome.matched,
        quota,
    })))
}

/// GET /quota - today's swipe accounting for the viewer.
pub async fn get_quota(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Quota>>> {
    let caps = state.policy.resolve_capabilities(user.id).await;

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;
    let quota = match_engine::check_quota(&mut conn, user.id, &caps)?;

    Ok(Json(ApiResponse::ok(quota)))
}
