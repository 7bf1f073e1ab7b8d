//! Post listing, creation, detail, and likes.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use plaza_db::{PostSort, StoreError};
use plaza_types::api::{CreatePostRequest, HomeResponse, PostDetailResponse};

use crate::auth::AppState;
use crate::error::{ApiError, Result};
use crate::middleware::{self, CurrentUser};

#[derive(Debug, Deserialize)]
pub struct PostsQuery {
    pub sort: Option<String>,
}

fn parse_sort(raw: Option<&str>) -> PostSort {
    match raw {
        Some("likes") => PostSort::Likes,
        _ => PostSort::Recency,
    }
}

/// GET /: recent posts plus the signed-in user, if any.
pub async fn home(State(state): State<AppState>, jar: CookieJar) -> Result<Json<HomeResponse>> {
    let user = middleware::current_user(&state, &jar).await?;

    let st = state.clone();
    let rows = tokio::task::spawn_blocking(move || st.db.list_posts(PostSort::Recency)).await??;

    Ok(Json(HomeResponse {
        posts: rows.into_iter().map(|r| r.into_model()).collect(),
        user: user.map(|u| u.into_model()),
    }))
}

/// GET /posts?sort=recency|likes: the raw post list.
pub async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<PostsQuery>,
) -> Result<impl IntoResponse> {
    let sort = parse_sort(query.sort.as_deref());
    let st = state.clone();
    let rows = tokio::task::spawn_blocking(move || st.db.list_posts(sort)).await??;
    Ok(Json(
        rows.into_iter().map(|r| r.into_model()).collect::<Vec<_>>(),
    ))
}

/// POST /posts: create a post under the session user's name.
pub async fn create_post(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<CreatePostRequest>,
) -> Result<impl IntoResponse> {
    if req.title.is_empty() || req.content.is_empty() {
        return Err(ApiError::InvalidInput(
            "title and content must not be empty".to_string(),
        ));
    }

    let st = state.clone();
    let row = tokio::task::spawn_blocking(move || {
        st.db
            .create_post(&req.title, &req.content, &user.0.username, req.file_path.as_deref())
    })
    .await??;

    Ok((StatusCode::CREATED, Json(row.into_model())))
}

/// GET /post/{id}: a single post with its comments, newest first.
pub async fn post_detail(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<PostDetailResponse>> {
    let st = state.clone();
    let (post, comments) = tokio::task::spawn_blocking(move || {
        let Some(post) = st.db.find_post_by_id(id)? else {
            return Err(StoreError::NotFound);
        };
        let comments = st.db.list_comments_by_post_id(id)?;
        Ok((post, comments))
    })
    .await??;

    Ok(Json(PostDetailResponse {
        post: post.into_model(),
        comments: comments.into_iter().map(|c| c.into_model()).collect(),
    }))
}

/// POST /like/{id}: bump the counter and answer with the fresh post.
/// Likes are not deduplicated per user.
pub async fn like_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let st = state.clone();
    let row = tokio::task::spawn_blocking(move || {
        st.db.increment_post_likes(id)?;
        st.db.find_post_by_id(id)
    })
    .await??
    .ok_or(ApiError::Store(StoreError::NotFound))?;

    Ok(Json(row.into_model()))
}
