use axum::extract::{Multipart, Path, State};
use axum::Json;
use chrono::Utc;
use diesel::prelude::*;
use serde::Serialize;
use std::sync::Arc;

use flamer_shared::clients::storage::StorageClient;
use flamer_shared::errors::{AppError, AppResult, ErrorCode};
use flamer_shared::types::auth::AuthUser;
use flamer_shared::types::ApiResponse;

use crate::models::Profile;
use crate::schema::profiles;
use crate::AppState;

const MAX_PHOTOS: usize = 5;
const MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Serialize)]
pub struct PhotoUploadResponse {
    pub photo_url: String,
    pub photos: Vec<String>,
}

/// POST /me/photos - append one photo to the viewer's profile.
pub async fn upload_photo(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> AppResult<Json<ApiResponse<PhotoUploadResponse>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let profile = profiles::table
        .find(user.id)
        .first::<Profile>(&mut conn)
        .map_err(|_| AppError::new(ErrorCode::ProfileNotFound, "profile not found"))?;

    let mut photos = profile.photo_refs();
    if photos.len() >= MAX_PHOTOS {
        return Err(AppError::new(
            ErrorCode::PhotoLimitReached,
            format!("a profile can have at most {MAX_PHOTOS} photos"),
        ));
    }

    let field = multipart
        .next_field()
        .await
        .map_err(|e| AppError::new(ErrorCode::PhotoUploadFailed, format!("failed to read multipart: {e}")))?
        .ok_or_else(|| AppError::new(ErrorCode::PhotoUploadFailed, "no file provided"))?;

    let content_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();

    let ext = match content_type.as_str() {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        _ => {
            return Err(AppError::new(
                ErrorCode::PhotoUploadFailed,
                "unsupported image format, accepted: jpeg, png, webp",
            ));
        }
    };

    let data = field
        .bytes()
        .await
        .map_err(|e| AppError::new(ErrorCode::PhotoUploadFailed, format!("failed to read file data: {e}")))?;

    if data.len() > MAX_PHOTO_BYTES {
        return Err(AppError::new(
            ErrorCode::PayloadTooLarge,
            "image size must be less than 5MB",
        ));
    }

    let key = StorageClient::photo_key(user.id, Utc::now().timestamp_millis(), ext);

    state
        .storage
        .upload(&key, data.to_vec(), &content_type)
        .await
        .map_err(|e| AppError::new(ErrorCode::PhotoUploadFailed, e))?;

    photos.push(key.clone());

    diesel::update(profiles::table.find(user.id))
        .set((
            profiles::photos.eq(serde_json::Value::from(photos.clone())),
            profiles::updated_at.eq(Utc::now()),
        ))
        .execute(&mut conn)?;

    let photo_url = state.storage.resolve_url(&key);

    tracing::info!(profile_id = %user.id, key = %key, "profile photo uploaded");

    Ok(Json(ApiResponse::ok(PhotoUploadResponse { photo_url, photos })))
}

#[derive(Debug, Serialize)]
pub struct PhotoDeleteResponse {
    pub photos: Vec<String>,
}

/// DELETE /me/photos/:index - remove a photo by display position.
/// Object-store cleanup is best effort; the profile row is the source
/// of truth for what is visible.
pub async fn delete_photo(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(index): Path<usize>,
) -> AppResult<Json<ApiResponse<PhotoDeleteResponse>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let profile = profiles::table
        .find(user.id)
        .first::<Profile>(&mut conn)
        .map_err(|_| AppError::new(ErrorCode::ProfileNotFound, "profile not found"))?;

    let mut photos = profile.photo_refs();
    if index >= photos.len() {
        return Err(AppError::new(ErrorCode::PhotoNotFound, "no photo at that position"));
    }

    let removed = photos.remove(index);

    diesel::update(profiles::table.find(user.id))
        .set((
            profiles::photos.eq(serde_json::Value::from(photos.clone())),
            profiles::updated_at.eq(Utc::now()),
        ))
        .execute(&mut conn)?;

    // Only keys we own live in the bucket; absolute URLs were never ours.
    if !removed.starts_with("http") {
        if let Err(e) = state.storage.delete(&removed).await {
            tracing::warn!(profile_id = %user.id, key = %removed, error = %e, "photo object cleanup failed");
        }
    }

    Ok(Json(ApiResponse::ok(PhotoDeleteResponse { photos })))
}
