use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use flamer_shared::errors::{AppError, AppResult};
use flamer_shared::types::auth::AuthUser;
use flamer_shared::types::ApiResponse;

use crate::models::{Like, Profile};
use crate::schema::{likes, profiles};
use crate::services::match_engine;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct LikerSummary {
    pub id: Uuid,
    pub name: String,
    pub age: i32,
    pub location: Option<String>,
    /// Primary photo, resolved to a public URL.
    pub photo_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LikeEntry {
    pub id: Uuid,
    pub liker: LikerSummary,
    pub is_match: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct LikesInboxResponse {
    pub likes: Vec<LikeEntry>,
    /// True when the viewer is not entitled to the inbox; the client
    /// renders the upsell state instead of a list.
    pub upsell: bool,
}

/// GET /likes - who liked the viewer, most recent first.
/// Not entitled is not an error: the response is empty with `upsell`.
pub async fn list_likes(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<LikesInboxResponse>>> {
    let caps = state.policy.resolve_capabilities(user.id).await;

    if !caps.can_open_likes_inbox() {
        return Ok(Json(ApiResponse::ok(LikesInboxResponse {
            likes: vec![],
            upsell: true,
        })));
    }

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let rows = likes::table
        .inner_join(profiles::table)
        .filter(likes::liked_user_id.eq(user.id))
        .order(likes::created_at.desc())
        .load::<(Like, Profile)>(&mut conn)?;

    let entries = rows
        .into_iter()
        .map(|(like, liker)| LikeEntry {
            id: like.id,
            liker: LikerSummary {
                id: liker.id,
                name: liker.name,
                age: liker.age,
                location: liker.location,
                photo_url: liker
                    .photos
                    .as_array()
                    .and_then(|a| a.first())
                    .and_then(|v| v.as_str())
                    .map(|r| state.storage.resolve_url(r)),
            },
            is_match: like.is_match,
            created_at: like.created_at,
        })
        .collect();

    Ok(Json(ApiResponse::ok(LikesInboxResponse {
        likes: entries,
        upsell: false,
    })))
}

#[derive(Debug, Deserialize)]
pub struct RespondRequest {
    pub accept: bool,
}

#[derive(Debug, Serialize)]
pub struct RespondResponse {
    pub matched: bool,
}

/// POST /likes/:liker_id/respond - like back or pass on someone who
/// liked the viewer. Both paths go through the match engine, so a
/// like-back on an existing reverse like closes the pair and a repeat
/// response is swallowed as a duplicate swipe.
pub async fn respond_to_like(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(liker_id): Path<Uuid>,
    Json(req): Json<RespondRequest>,
) -> AppResult<Json<ApiResponse<RespondResponse>>> {
    let caps = state.policy.resolve_capabilities(user.id).await;

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let outcome = match_engine::record_swipe(&mut conn, user.id, liker_id, req.accept, &caps)?;

    Ok(Json(ApiResponse::ok(RespondResponse {
        matched: outcome.matched,
    })))
}
