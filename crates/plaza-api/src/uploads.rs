//! Multipart upload handling. Files land in the upload directory under a
//! timestamped name and are served back through the static /uploads route.

use std::path::Path as FsPath;

use axum::{
    Json,
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use tracing::info;

use plaza_types::api::UploadResponse;

use crate::auth::AppState;
use crate::error::{ApiError, Result};

/// 10 MB upload limit
pub const MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024;

/// POST /upload: store the first `file` field and answer with its path.
pub async fn upload(State(state): State<AppState>, mut multipart: Multipart) -> Result<impl IntoResponse> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::InvalidInput(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let original = field.file_name().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::InvalidInput(e.to_string()))?;
        if data.is_empty() {
            break;
        }
        if data.len() > MAX_UPLOAD_SIZE {
            return Err(ApiError::PayloadTooLarge);
        }

        let filename = upload_filename(&original, Utc::now().timestamp_millis());
        tokio::fs::create_dir_all(&state.config.upload_dir).await?;
        let dest = FsPath::new(&state.config.upload_dir).join(&filename);
        tokio::fs::write(&dest, &data).await?;

        info!("File uploaded to: /uploads/{}", filename);
        return Ok((
            StatusCode::CREATED,
            Json(UploadResponse {
                file_path: format!("/uploads/{filename}"),
                size: data.len() as u64,
            }),
        ));
    }

    Err(ApiError::InvalidInput("no file uploaded".to_string()))
}

/// Timestamped name keeping only the original extension; client-supplied
/// names never reach the filesystem.
fn upload_filename(original: &str, now_ms: i64) -> String {
    match FsPath::new(original).extension().and_then(|e| e.to_str()) {
        Some(ext) if !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()) => {
            format!("{now_ms}.{ext}")
        }
        _ => now_ms.to_string(),
    }
}
