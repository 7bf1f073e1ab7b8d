//! Proxy for the external emoji catalog so the API key stays server-side.

use axum::{Json, extract::State};

use plaza_db::StoreError;

use crate::auth::AppState;
use crate::error::{ApiError, Result};

/// GET /emojis: forward the catalog verbatim; 404 when no key is
/// configured.
pub async fn list_emojis(State(state): State<AppState>) -> Result<Json<serde_json::Value>> {
    let Some(key) = state.config.emoji_api_key.as_deref() else {
        return Err(ApiError::Store(StoreError::NotFound));
    };

    let emojis: serde_json::Value = state
        .http
        .get("https://emoji-api.com/emojis")
        .query(&[("access_key", key)])
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    Ok(Json(emojis))
}
