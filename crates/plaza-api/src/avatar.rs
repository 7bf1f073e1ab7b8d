//! Avatar delivery: proxy a configured image URL, or fall back to a
//! generated initial-letter tile.

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};

use plaza_db::StoreError;

use crate::auth::AppState;
use crate::error::{ApiError, Result};

const AVATAR_SIZE: u32 = 50;

/// GET /avatar/{username}
pub async fn avatar(State(state): State<AppState>, Path(username): Path<String>) -> Result<Response> {
    let st = state.clone();
    let name = username.clone();
    let user = tokio::task::spawn_blocking(move || st.db.find_user_by_username(&name))
        .await??
        .ok_or(ApiError::Store(StoreError::NotFound))?;

    match user.avatar_url.as_deref() {
        Some(url) if !url.is_empty() => {
            let resp = state.http.get(url).send().await?.error_for_status()?;
            let content_type = resp
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("image/png")
                .to_string();
            let bytes = resp.bytes().await?;
            Ok(([(header::CONTENT_TYPE, content_type)], bytes).into_response())
        }
        _ => {
            // first markup-safe character of the name; '?' for the degenerate case
            let letter = user
                .username
                .chars()
                .find(|c| c.is_alphanumeric())
                .unwrap_or('?');
            let svg = letter_avatar(letter, AVATAR_SIZE);
            Ok((
                [(header::CONTENT_TYPE, "image/svg+xml".to_string())],
                svg,
            )
                .into_response())
        }
    }
}

/// Single-letter tile in the app's accent color.
fn letter_avatar(letter: char, size: u32) -> String {
    let glyph: String = letter.to_uppercase().collect();
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{size}" height="{size}">
  <rect width="{size}" height="{size}" fill="#007bff"/>
  <text x="50%" y="50%" fill="#ffffff" font-family="Arial" font-size="{font}" text-anchor="middle" dominant-baseline="central">{glyph}</text>
</svg>"#,
        size = size,
        font = size / 2,
        glyph = glyph,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letter_is_uppercased() {
        let svg = letter_avatar('a', 50);
        assert!(svg.contains(">A<"));
    }

    #[test]
    fn tile_matches_requested_size() {
        let svg = letter_avatar('z', 50);
        assert!(svg.contains(r#"width="50""#));
        assert!(svg.contains(r#"font-size="25""#));
    }
}
