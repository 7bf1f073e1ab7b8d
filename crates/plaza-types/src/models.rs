use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A member as exposed to clients. The provider-supplied identity hash is
/// deliberately absent; only the storage layer sees it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub avatar_url: Option<String>,
    pub background_url: Option<String>,
    pub member_since: DateTime<Utc>,
}

/// Posts reference their author by username rather than user id. After a
/// rename, old posts point at a name that no longer resolves; callers treat
/// a failed author lookup as an absent author.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub username: String,
    pub timestamp: DateTime<Utc>,
    pub likes: i64,
    pub file_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub username: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}
