use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use plaza_db::StoreError;

/// Application error type
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    #[error("task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error("session token rejected: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not signed in")]
    Unauthorized,

    #[error("username already taken")]
    UsernameTaken,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("payload too large")]
    PayloadTooLarge,
}

/// Convert errors into HTTP responses. Store and upstream failures are
/// logged server-side and answered with a generic message.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Store(StoreError::NotFound) => {
                (StatusCode::NOT_FOUND, "Not found".to_string())
            }
            ApiError::Store(StoreError::Conflict) => {
                (StatusCode::CONFLICT, "Already exists".to_string())
            }
            ApiError::Store(ref e) => {
                tracing::error!("Store error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
            ApiError::Upstream(ref e) => {
                tracing::error!("Upstream fetch failed: {:?}", e);
                (StatusCode::BAD_GATEWAY, "Upstream request failed".to_string())
            }
            ApiError::TaskJoin(ref e) => {
                tracing::error!("Task join error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
            ApiError::Token(_) | ApiError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, "Not signed in".to_string())
            }
            ApiError::UsernameTaken => {
                (StatusCode::CONFLICT, "Username already taken".to_string())
            }
            ApiError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Io(ref e) => {
                tracing::error!("IO error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
            ApiError::PayloadTooLarge => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "File exceeds the upload limit".to_string(),
            ),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

/// Result type alias for handler results
pub type Result<T> = std::result::Result<T, ApiError>;
