use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;

use plaza_db::StoreError;
use plaza_db::models::UserRow;

use crate::auth::AppState;
use crate::error::{ApiError, Result};
use crate::identity::{self, SESSION_COOKIE};

/// The session user attached to authenticated requests.
#[derive(Clone)]
pub struct CurrentUser(pub UserRow);

/// Resolve the session cookie to a full user row; 401 when the cookie is
/// absent, invalid, or points at an account that no longer exists.
pub async fn require_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response> {
    let token = jar
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .ok_or(ApiError::Unauthorized)?;

    let st = state.clone();
    let user = tokio::task::spawn_blocking(move || {
        identity::restore_session_user(&st.db, &st.config.session_secret, &token)
    })
    .await?
    .map_err(|e| match e {
        // the account vanished between requests; the session is dead
        ApiError::Store(StoreError::NotFound) => ApiError::Unauthorized,
        other => other,
    })?;

    req.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(req).await)
}

/// Provisional accounts may only reach the username-registration flow;
/// everything else bounces them there. Layer after [`require_auth`].
pub async fn require_registered(req: Request, next: Next) -> Result<Response> {
    let user = req
        .extensions()
        .get::<CurrentUser>()
        .ok_or(ApiError::Unauthorized)?;
    if user.0.is_provisional() {
        return Ok(Redirect::to("/register-username").into_response());
    }
    Ok(next.run(req).await)
}

/// Best-effort session restoration for pages that render with or without a
/// signed-in user. A missing or stale session reads as signed-out; store
/// failures still propagate.
pub async fn current_user(state: &AppState, jar: &CookieJar) -> Result<Option<UserRow>> {
    let Some(cookie) = jar.get(SESSION_COOKIE) else {
        return Ok(None);
    };
    let token = cookie.value().to_string();
    let st = state.clone();
    match tokio::task::spawn_blocking(move || {
        identity::restore_session_user(&st.db, &st.config.session_secret, &token)
    })
    .await?
    {
        Ok(user) => Ok(Some(user)),
        Err(ApiError::Token(_)) | Err(ApiError::Store(StoreError::NotFound)) => Ok(None),
        Err(other) => Err(other),
    }
}
