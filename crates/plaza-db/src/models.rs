//! Database row types matching the SQLite tables one to one.
//! Distinct from the plaza-types API models so raw TEXT timestamps and the
//! provider identity hash stay inside the storage layer.

use chrono::{DateTime, Utc};
use tracing::warn;

use plaza_types::models::{Comment, Post, User};

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub hashed_google_id: String,
    pub avatar_url: Option<String>,
    pub member_since: String,
    pub background_url: Option<String>,
}

impl UserRow {
    /// A user stays provisional until the provider-derived placeholder is
    /// replaced by a chosen username.
    pub fn is_provisional(&self) -> bool {
        self.username == self.hashed_google_id
    }

    pub fn into_model(self) -> User {
        User {
            id: self.id,
            username: self.username,
            avatar_url: self.avatar_url.filter(|u| !u.is_empty()),
            background_url: self.background_url.filter(|u| !u.is_empty()),
            member_since: parse_timestamp(&self.member_since, "member_since"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PostRow {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub username: String,
    pub timestamp: String,
    pub likes: i64,
    pub file_path: Option<String>,
}

impl PostRow {
    pub fn into_model(self) -> Post {
        Post {
            id: self.id,
            title: self.title,
            content: self.content,
            username: self.username,
            timestamp: parse_timestamp(&self.timestamp, "timestamp"),
            likes: self.likes,
            file_path: self.file_path.filter(|p| !p.is_empty()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CommentRow {
    pub id: i64,
    pub post_id: i64,
    pub username: String,
    pub content: String,
    pub timestamp: String,
}

impl CommentRow {
    pub fn into_model(self) -> Comment {
        Comment {
            id: self.id,
            post_id: self.post_id,
            username: self.username,
            content: self.content,
            timestamp: parse_timestamp(&self.timestamp, "timestamp"),
        }
    }
}

fn parse_timestamp(raw: &str, field: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // Seeded rows use "YYYY-MM-DD HH:MM:SS" without a timezone.
            // Parse as naive UTC and convert.
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt {} value '{}': {}", field, raw, e);
            DateTime::default()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provisional_tracks_username() {
        let mut row = UserRow {
            id: 1,
            username: "abc123".into(),
            hashed_google_id: "abc123".into(),
            avatar_url: None,
            member_since: "2024-01-01T12:00:00+00:00".into(),
            background_url: None,
        };
        assert!(row.is_provisional());
        row.username = "alice".into();
        assert!(!row.is_provisional());
    }

    #[test]
    fn empty_avatar_reads_as_absent() {
        let row = UserRow {
            id: 1,
            username: "alice".into(),
            hashed_google_id: "g1".into(),
            avatar_url: Some(String::new()),
            member_since: "2024-01-01T12:00:00+00:00".into(),
            background_url: None,
        };
        assert!(row.into_model().avatar_url.is_none());
    }

    #[test]
    fn parses_both_timestamp_formats() {
        let rfc = parse_timestamp("2024-01-01T12:00:00+00:00", "t");
        let naive = parse_timestamp("2024-01-01 12:00:00", "t");
        assert_eq!(rfc, naive);
    }
}
