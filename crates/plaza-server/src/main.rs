use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use plaza_api::auth::{self, AppState, AppStateInner};
use plaza_api::middleware::{require_auth, require_registered};
use plaza_api::{Config, avatar, comments, emoji, posts, profile, uploads};
use plaza_db::Database;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "plaza=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    // Migrations run inside open(); the listener binds only once the schema
    // is current.
    let db = Database::open(&PathBuf::from(&config.database_path))?;

    let state: AppState = Arc::new(AppStateInner {
        db,
        config: config.clone(),
        http: reqwest::Client::new(),
    });

    let public_routes = Router::new()
        .route("/", get(posts::home))
        .route("/posts", get(posts::list_posts))
        .route("/post/{id}", get(posts::post_detail))
        .route("/like/{id}", post(posts::like_post))
        .route("/avatar/{username}", get(avatar::avatar))
        .route("/emojis", get(emoji::list_emojis))
        .route("/auth/google", get(auth::google_login))
        .route("/auth/google/callback", get(auth::google_callback))
        .route("/logout", get(auth::logout))
        .route(
            "/upload",
            post(uploads::upload).layer(DefaultBodyLimit::max(uploads::MAX_UPLOAD_SIZE)),
        );

    // signed in, possibly still provisional
    let session_routes = Router::new()
        .route(
            "/register-username",
            get(auth::register_username_form).post(auth::register_username),
        )
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    // signed in with a chosen username
    let registered_routes = Router::new()
        .route("/posts", post(posts::create_post))
        .route("/comment", post(comments::create_comment))
        .route("/profile", get(profile::profile).post(profile::update_profile))
        .route("/background", post(profile::set_background))
        .layer(middleware::from_fn(require_registered))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let app = Router::new()
        .merge(public_routes)
        .merge(session_routes)
        .merge(registered_routes)
        .nest_service("/uploads", ServeDir::new(&config.upload_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr: SocketAddr = config.server_address().parse()?;
    info!("Plaza server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
