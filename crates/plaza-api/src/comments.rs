//! Comment creation. Listing rides along with the post detail view.

use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};

use plaza_types::api::CreateCommentRequest;

use crate::auth::AppState;
use crate::error::{ApiError, Result};
use crate::middleware::CurrentUser;

/// POST /comment: attach a comment to a post. The post id is taken as
/// given; a comment on a vanished post is stored like any other.
pub async fn create_comment(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<CreateCommentRequest>,
) -> Result<impl IntoResponse> {
    if req.content.is_empty() {
        return Err(ApiError::InvalidInput("comment must not be empty".to_string()));
    }

    let st = state.clone();
    let row = tokio::task::spawn_blocking(move || {
        st.db.create_comment(req.post_id, &user.0.username, &req.content)
    })
    .await??;

    Ok((StatusCode::CREATED, Json(row.into_model())))
}
