//! Google sign-in flow, username registration, and application state.

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Query, State},
    response::{IntoResponse, Redirect},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use plaza_db::Database;
use plaza_types::api::RegisterUsernameRequest;

use crate::config::Config;
use crate::error::{ApiError, Result};
use crate::identity::{self, SESSION_COOKIE};
use crate::middleware::CurrentUser;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub config: Config,
    pub http: reqwest::Client,
}

const OAUTH_STATE_COOKIE: &str = "plaza_oauth_state";

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    code: String,
    state: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// The slice of the userinfo document we rely on: the stable subject id.
#[derive(Debug, Deserialize)]
struct UserInfo {
    sub: String,
}

/// GET /auth/google: send the browser to the provider's consent page.
pub async fn google_login(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse> {
    let csrf = Uuid::new_v4().to_string();
    let url = reqwest::Url::parse_with_params(
        "https://accounts.google.com/o/oauth2/v2/auth",
        &[
            ("client_id", state.config.google_client_id.as_str()),
            ("redirect_uri", state.config.oauth_redirect_url.as_str()),
            ("response_type", "code"),
            ("scope", "openid"),
            ("state", csrf.as_str()),
        ],
    )
    .map_err(|e| ApiError::InvalidInput(e.to_string()))?;

    let jar = jar.add(
        Cookie::build((OAUTH_STATE_COOKIE, csrf))
            .path("/")
            .http_only(true)
            .build(),
    );
    Ok((jar, Redirect::to(url.as_str())))
}

/// GET /auth/google/callback: exchange the code, resolve the local user,
/// and establish the session.
pub async fn google_callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<CallbackQuery>,
) -> Result<impl IntoResponse> {
    // the state parameter must match the cookie set at login
    let expected = jar
        .get(OAUTH_STATE_COOKIE)
        .map(|c| c.value().to_string())
        .ok_or(ApiError::Unauthorized)?;
    if expected != query.state {
        return Err(ApiError::Unauthorized);
    }

    let token: TokenResponse = state
        .http
        .post("https://oauth2.googleapis.com/token")
        .form(&[
            ("code", query.code.as_str()),
            ("client_id", state.config.google_client_id.as_str()),
            ("client_secret", state.config.google_client_secret.as_str()),
            ("redirect_uri", state.config.oauth_redirect_url.as_str()),
            ("grant_type", "authorization_code"),
        ])
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    let profile: UserInfo = state
        .http
        .get("https://openidconnect.googleapis.com/v1/userinfo")
        .bearer_auth(&token.access_token)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    let st = state.clone();
    let user =
        tokio::task::spawn_blocking(move || identity::resolve_or_create_user(&st.db, &profile.sub))
            .await??;

    let session = identity::issue_session_token(&state.config.session_secret, user.id)?;
    let jar = jar
        .remove(Cookie::build((OAUTH_STATE_COOKIE, "")).path("/").build())
        .add(
            Cookie::build((SESSION_COOKIE, session))
                .path("/")
                .http_only(true)
                .build(),
        );

    let destination = if user.is_provisional() {
        "/register-username"
    } else {
        "/"
    };
    info!("User {} signed in", user.id);
    Ok((jar, Redirect::to(destination)))
}

/// GET /register-username: the account pending a name choice.
pub async fn register_username_form(Extension(user): Extension<CurrentUser>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "username": user.0.username,
        "provisional": user.0.is_provisional(),
    }))
}

/// POST /register-username: claim a username; 409 when taken.
pub async fn register_username(
    State(state): State<AppState>,
    jar: CookieJar,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<RegisterUsernameRequest>,
) -> Result<impl IntoResponse> {
    if req.username.len() < 3 || req.username.len() > 32 {
        return Err(ApiError::InvalidInput(
            "username must be 3-32 characters".to_string(),
        ));
    }

    let st = state.clone();
    let updated = tokio::task::spawn_blocking(move || {
        identity::register_username(&st.db, &user.0, &req.username)
    })
    .await??;

    // refresh the session so the cookie outlives the rename
    let session = identity::issue_session_token(&state.config.session_secret, updated.id)?;
    let jar = jar.add(
        Cookie::build((SESSION_COOKIE, session))
            .path("/")
            .http_only(true)
            .build(),
    );

    info!("User {} registered as {}", updated.id, updated.username);
    Ok((jar, Json(updated.into_model())))
}

/// GET /logout: drop the session cookie.
pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    let jar = jar.remove(Cookie::build((SESSION_COOKIE, "")).path("/").build());
    (jar, Redirect::to("/"))
}
