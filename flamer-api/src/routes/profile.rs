use axum::extract::State;
use axum::Json;
use chrono::Utc;
use diesel::prelude::*;
use serde::Deserialize;
use std::str::FromStr;
use std::sync::Arc;
use validator::Validate;

use flamer_shared::errors::{AppError, AppResult, ErrorCode};
use flamer_shared::types::auth::AuthUser;
use flamer_shared::types::ApiResponse;

use crate::models::{Gender, LookingFor, Profile, ProfileRecord};
use crate::schema::profiles;
use crate::AppState;

// --- GET /me ---

pub async fn get_profile(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Profile>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let profile = profiles::table
        .find(user.id)
        .first::<Profile>(&mut conn)
        .map_err(|_| AppError::new(ErrorCode::ProfileNotFound, "profile not found"))?;

    Ok(Json(ApiResponse::ok(profile)))
}

// --- PUT /me ---

#[derive(Debug, Deserialize, Validate)]
pub struct UpsertProfileRequest {
    #[validate(length(min = 1, max = 50, message = "name must be 1-50 characters"))]
    pub name: String,
    #[validate(range(min = 18, max = 120, message = "age must be at least 18"))]
    pub age: i32,
    pub gender: String,
    pub looking_for: String,
    #[validate(length(max = 500, message = "about must be at most 500 characters"))]
    pub about: Option<String>,
    pub location: Option<String>,
    #[validate(range(min = 1, max = 100, message = "max_distance must be 1-100"))]
    #[serde(default = "default_max_distance")]
    pub max_distance: i32,
    #[validate(length(max = 5, message = "at most 5 photos"))]
    #[serde(default)]
    pub photos: Vec<String>,
}

fn default_max_distance() -> i32 {
    25
}

/// Create-or-replace the viewer's profile. First submission creates the
/// row; later submissions overwrite it. Owner-only by construction (the
/// row id is the token subject).
pub async fn upsert_profile(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<UpsertProfileRequest>,
) -> AppResult<Json<ApiResponse<Profile>>> {
    req.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    // Enumerated fields are stored as text; reject anything the app
    // does not know how to filter on.
    Gender::from_str(&req.gender).map_err(AppError::Validation)?;
    LookingFor::from_str(&req.looking_for).map_err(AppError::Validation)?;

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let record = ProfileRecord {
        id: user.id,
        name: req.name,
        age: req.age,
        gender: req.gender,
        looking_for: req.looking_for,
        about: req.about,
        location: req.location,
        max_distance: req.max_distance,
        photos: serde_json::Value::from(req.photos),
        updated_at: Utc::now(),
    };

    let profile = diesel::insert_into(profiles::table)
        .values(&record)
        .on_conflict(profiles::id)
        .do_update()
        .set(&record)
        .get_result::<Profile>(&mut conn)?;

    tracing::info!(profile_id = %profile.id, "profile saved");

    Ok(Json(ApiResponse::ok(profile)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_request() -> UpsertProfileRequest {
        UpsertProfileRequest {
            name: "Ada".into(),
            age: 30,
            gender: "female".into(),
            looking_for: "everyone".into(),
            about: Some("hello".into()),
            location: Some("Berlin".into()),
            max_distance: 25,
            photos: vec![],
        }
    }

    #[test]
    fn minors_are_rejected() {
        let mut req = valid_request();
        req.age = 17;
        assert!(req.validate().is_err());
        req.age = 18;
        assert!(req.validate().is_ok());
    }

    #[test]
    fn about_is_capped_at_500_chars() {
        let mut req = valid_request();
        req.about = Some("x".repeat(501));
        assert!(req.validate().is_err());
        req.about = Some("x".repeat(500));
        assert!(req.validate().is_ok());
    }

    #[test]
    fn max_distance_bounds_are_enforced() {
        let mut req = valid_request();
        req.max_distance = 0;
        assert!(req.validate().is_err());
        req.max_distance = 101;
        assert!(req.validate().is_err());
        req.max_distance = 100;
        assert!(req.validate().is_ok());
    }

    #[test]
    fn photo_count_is_capped_at_5() {
        let mut req = valid_request();
        req.photos = (0..6).map(|i| format!("{i}.jpg")).collect();
        assert!(req.validate().is_err());
        req.photos.truncate(5);
        assert!(req.validate().is_ok());
    }
}
