pub mod auth;
pub mod avatar;
pub mod comments;
pub mod config;
pub mod emoji;
pub mod error;
pub mod identity;
pub mod middleware;
pub mod posts;
pub mod profile;
pub mod uploads;

pub use auth::{AppState, AppStateInner};
pub use config::Config;
pub use error::{ApiError, Result};
