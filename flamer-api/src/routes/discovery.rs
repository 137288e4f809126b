use axum::extract::State;
use axum::Json;
use diesel::prelude::*;
use serde::Serialize;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

use flamer_shared::errors::{AppError, AppResult, ErrorCode};
use flamer_shared::types::auth::AuthUser;
use flamer_shared::types::ApiResponse;

use crate::models::{LookingFor, Profile};
use crate::schema::{profiles, swipes};
use crate::services::match_engine::{self, Quota};
use crate::AppState;

/// Discovery batch size. Order is storage order; there is no ranking,
/// distance, or age filtering behind the UI affordances.
const CANDIDATE_LIMIT: i64 = 20;

#[derive(Debug, Serialize)]
pub struct Candidate {
    pub id: Uuid,
    pub name: String,
    pub age: i32,
    pub gender: String,
    pub location: Option<String>,
    pub about: Option<String>,
    /// Browser-reachable URLs, already redacted for the viewer.
    pub photos: Vec<String>,
    /// How many photos the viewer is not entitled to see.
    pub hidden_photo_count: usize,
}

#[derive(Debug, Serialize)]
pub struct DiscoveryResponse {
    pub candidates: Vec<Candidate>,
    pub quota: Quota,
}

/// GET /discovery - unseen candidates matching the viewer's preference.
///
/// Excludes the viewer and every profile already swiped on (any
/// outcome). A missing viewer profile is a 404; the client routes to
/// the profile form.
pub async fn next_candidates(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<DiscoveryResponse>>> {
    let caps = state.policy.resolve_capabilities(user.id).await;

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let viewer = profiles::table
        .find(user.id)
        .first::<Profile>(&mut conn)
        .map_err(|_| AppError::new(ErrorCode::ProfileNotFound, "profile not found"))?;

    let quota = match_engine::check_quota(&mut conn, user.id, &caps)?;

    let already_swiped = swipes::table
        .filter(swipes::user_id.eq(user.id))
        .select(swipes::swiped_profile_id);

    let mut query = profiles::table
        .filter(profiles::id.ne(user.id))
        .filter(profiles::id.ne_all(already_swiped))
        .into_boxed();

    let preference = LookingFor::from_str(&viewer.looking_for).unwrap_or(LookingFor::Everyone);
    if preference != LookingFor::Everyone {
        query = query.filter(profiles::gender.eq(preference.to_string()));
    }

    let rows = query.limit(CANDIDATE_LIMIT).load::<Profile>(&mut conn)?;

    let candidates = rows
        .into_iter()
        .map(|p| {
            let refs = p.photo_refs();
            let visible = match_engine::visible_photos(&refs, &caps);
            let hidden_photo_count = refs.len() - visible.len();
            Candidate {
                id: p.id,
                name: p.name,
                age: p.age,
                gender: p.gender,
                location: p.location,
                about: p.about,
                photos: visible.iter().map(|r| state.storage.resolve_url(r)).collect(),
                hidden_photo_count,
            }
        })
        .collect();

    Ok(Json(ApiResponse::ok(DiscoveryResponse { candidates, quota })))
}
