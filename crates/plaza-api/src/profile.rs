//! Profile view and edits.

use axum::{Extension, Json, extract::State, response::IntoResponse};

use plaza_db::StoreError;
use plaza_types::api::{ProfileResponse, SetBackgroundRequest, UpdateProfileRequest};

use crate::auth::AppState;
use crate::error::Result;
use crate::middleware::CurrentUser;

/// GET /profile: the session user and their posts, newest first.
pub async fn profile(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<ProfileResponse>> {
    let st = state.clone();
    let username = user.0.username.clone();
    let rows = tokio::task::spawn_blocking(move || st.db.list_posts_by_username(&username)).await??;

    Ok(Json(ProfileResponse {
        user: user.0.into_model(),
        posts: rows.into_iter().map(|r| r.into_model()).collect(),
    }))
}

/// POST /profile: rename and/or point the avatar at a new image URL.
/// A name already owned by another user answers 409.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse> {
    let st = state.clone();
    let updated = tokio::task::spawn_blocking(move || {
        st.db
            .update_user_profile(user.0.id, &req.username, req.avatar_url.as_deref())?;
        st.db.find_user_by_id(user.0.id)?.ok_or(StoreError::NotFound)
    })
    .await??;

    Ok(Json(updated.into_model()))
}

/// POST /background: record an uploaded file as the profile background.
pub async fn set_background(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<SetBackgroundRequest>,
) -> Result<impl IntoResponse> {
    let st = state.clone();
    tokio::task::spawn_blocking(move || st.db.update_user_background(user.0.id, &req.file_path))
        .await??;

    Ok(Json(serde_json::json!({ "ok": true })))
}
