use chrono::Utc;
use rusqlite::{Connection, params};

use crate::Database;
use crate::error::{Result, StoreError};
use crate::models::{CommentRow, PostRow, UserRow};

/// Sort orders accepted by [`Database::list_posts`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PostSort {
    #[default]
    Recency,
    Likes,
}

impl PostSort {
    fn order_clause(self) -> &'static str {
        match self {
            PostSort::Recency => "timestamp DESC",
            PostSort::Likes => "likes DESC, timestamp DESC",
        }
    }
}

impl Database {
    // -- Users --

    /// Insert a new user. The avatar starts empty and `member_since` is
    /// stamped at call time. A duplicate username or identity hash surfaces
    /// as [`StoreError::Conflict`].
    pub fn create_user(&self, username: &str, hashed_google_id: &str) -> Result<UserRow> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (username, hashed_google_id, avatar_url, member_since)
                 VALUES (?1, ?2, '', ?3)",
                params![username, hashed_google_id, Utc::now().to_rfc3339()],
            )?;
            let id = conn.last_insert_rowid();
            query_user(
                conn,
                "SELECT id, username, hashed_google_id, avatar_url, member_since, background_url
                 FROM users WHERE id = ?1",
                params![id],
            )?
            .ok_or(StoreError::NotFound)
        })
    }

    pub fn find_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            query_user(
                conn,
                "SELECT id, username, hashed_google_id, avatar_url, member_since, background_url
                 FROM users WHERE username = ?1",
                params![username],
            )
        })
    }

    pub fn find_user_by_id(&self, id: i64) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            query_user(
                conn,
                "SELECT id, username, hashed_google_id, avatar_url, member_since, background_url
                 FROM users WHERE id = ?1",
                params![id],
            )
        })
    }

    pub fn find_user_by_google_id(&self, hashed_google_id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            query_user(
                conn,
                "SELECT id, username, hashed_google_id, avatar_url, member_since, background_url
                 FROM users WHERE hashed_google_id = ?1",
                params![hashed_google_id],
            )
        })
    }

    /// Update username and avatar in place. The UNIQUE constraint is the
    /// only arbiter of name availability; a clash with another row surfaces
    /// as [`StoreError::Conflict`] without a separate lookup.
    pub fn update_user_profile(&self, id: i64, username: &str, avatar_url: Option<&str>) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE users SET username = ?1, avatar_url = ?2 WHERE id = ?3",
                params![username, avatar_url.unwrap_or(""), id],
            )?;
            Ok(())
        })
    }

    pub fn update_user_background(&self, id: i64, file_path: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE users SET background_url = ?1 WHERE id = ?2",
                params![file_path, id],
            )?;
            Ok(())
        })
    }

    // -- Posts --

    /// Insert a post. Likes start at zero; the timestamp is stamped at call
    /// time.
    pub fn create_post(
        &self,
        title: &str,
        content: &str,
        username: &str,
        file_path: Option<&str>,
    ) -> Result<PostRow> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO posts (title, content, username, timestamp, likes, file_path)
                 VALUES (?1, ?2, ?3, ?4, 0, ?5)",
                params![title, content, username, Utc::now().to_rfc3339(), file_path],
            )?;
            let id = conn.last_insert_rowid();
            query_post(
                conn,
                "SELECT id, title, content, username, timestamp, likes, file_path
                 FROM posts WHERE id = ?1",
                params![id],
            )?
            .ok_or(StoreError::NotFound)
        })
    }

    pub fn list_posts(&self, sort: PostSort) -> Result<Vec<PostRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT id, title, content, username, timestamp, likes, file_path
                 FROM posts ORDER BY {}",
                sort.order_clause()
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], row_to_post)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn find_post_by_id(&self, id: i64) -> Result<Option<PostRow>> {
        self.with_conn(|conn| {
            query_post(
                conn,
                "SELECT id, title, content, username, timestamp, likes, file_path
                 FROM posts WHERE id = ?1",
                params![id],
            )
        })
    }

    /// Unconditional increment. Likes are a bare counter; nothing tracks who
    /// liked what, so repeat likes from the same caller all count.
    pub fn increment_post_likes(&self, id: i64) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("UPDATE posts SET likes = likes + 1 WHERE id = ?1", params![id])?;
            Ok(())
        })
    }

    pub fn list_posts_by_username(&self, username: &str) -> Result<Vec<PostRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, title, content, username, timestamp, likes, file_path
                 FROM posts WHERE username = ?1 ORDER BY timestamp DESC",
            )?;
            let rows = stmt
                .query_map(params![username], row_to_post)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Comments --

    pub fn create_comment(&self, post_id: i64, username: &str, content: &str) -> Result<CommentRow> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO comments (post_id, username, content, timestamp)
                 VALUES (?1, ?2, ?3, ?4)",
                params![post_id, username, content, Utc::now().to_rfc3339()],
            )?;
            let id = conn.last_insert_rowid();
            conn.query_row(
                "SELECT id, post_id, username, content, timestamp
                 FROM comments WHERE id = ?1",
                params![id],
                row_to_comment,
            )
            .optional()?
            .ok_or(StoreError::NotFound)
        })
    }

    pub fn list_comments_by_post_id(&self, post_id: i64) -> Result<Vec<CommentRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, post_id, username, content, timestamp
                 FROM comments WHERE post_id = ?1 ORDER BY timestamp DESC",
            )?;
            let rows = stmt
                .query_map(params![post_id], row_to_comment)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

fn query_user(conn: &Connection, sql: &str, params: impl rusqlite::Params) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(sql)?;
    stmt.query_row(params, row_to_user).optional()
}

fn query_post(conn: &Connection, sql: &str, params: impl rusqlite::Params) -> Result<Option<PostRow>> {
    let mut stmt = conn.prepare(sql)?;
    stmt.query_row(params, row_to_post).optional()
}

fn row_to_user(row: &rusqlite::Row) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        hashed_google_id: row.get(2)?,
        avatar_url: row.get(3)?,
        member_since: row.get(4)?,
        background_url: row.get(5)?,
    })
}

fn row_to_post(row: &rusqlite::Row) -> rusqlite::Result<PostRow> {
    Ok(PostRow {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        username: row.get(3)?,
        timestamp: row.get(4)?,
        likes: row.get(5)?,
        file_path: row.get(6)?,
    })
}

fn row_to_comment(row: &rusqlite::Row) -> rusqlite::Result<CommentRow> {
    Ok(CommentRow {
        id: row.get(0)?,
        post_id: row.get(1)?,
        username: row.get(2)?,
        content: row.get(3)?,
        timestamp: row.get(4)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[test]
    fn created_user_is_found_by_username() {
        let db = db();
        db.create_user("alice", "g1").unwrap();
        let user = db.find_user_by_username("alice").unwrap().unwrap();
        assert_eq!(user.hashed_google_id, "g1");
        assert!(user.avatar_url.as_deref() == Some(""));
    }

    #[test]
    fn missing_lookups_return_none() {
        let db = db();
        assert!(db.find_user_by_username("nobody").unwrap().is_none());
        assert!(db.find_user_by_id(42).unwrap().is_none());
        assert!(db.find_user_by_google_id("gX").unwrap().is_none());
        assert!(db.find_post_by_id(42).unwrap().is_none());
        assert!(db.list_comments_by_post_id(42).unwrap().is_empty());
    }

    #[test]
    fn duplicate_username_is_a_conflict() {
        let db = db();
        db.create_user("alice", "g1").unwrap();
        let err = db.create_user("alice", "g2").unwrap_err();
        assert!(matches!(err, StoreError::Conflict));
    }

    #[test]
    fn duplicate_google_id_is_a_conflict() {
        let db = db();
        db.create_user("alice", "g1").unwrap();
        let err = db.create_user("bob", "g1").unwrap_err();
        assert!(matches!(err, StoreError::Conflict));
    }

    #[test]
    fn profile_update_rejects_taken_username() {
        let db = db();
        db.create_user("alice", "g1").unwrap();
        let bob = db.create_user("bob", "g2").unwrap();
        let err = db.update_user_profile(bob.id, "alice", None).unwrap_err();
        assert!(matches!(err, StoreError::Conflict));
    }

    #[test]
    fn profile_update_to_own_name_succeeds() {
        let db = db();
        let alice = db.create_user("alice", "g1").unwrap();
        db.update_user_profile(alice.id, "alice", Some("https://img.example/a.png"))
            .unwrap();
        let user = db.find_user_by_id(alice.id).unwrap().unwrap();
        assert_eq!(user.avatar_url.as_deref(), Some("https://img.example/a.png"));
    }

    #[test]
    fn background_update_sticks() {
        let db = db();
        let alice = db.create_user("alice", "g1").unwrap();
        db.update_user_background(alice.id, "/uploads/1.png").unwrap();
        let user = db.find_user_by_id(alice.id).unwrap().unwrap();
        assert_eq!(user.background_url.as_deref(), Some("/uploads/1.png"));
    }

    #[test]
    fn likes_increase_by_exactly_n() {
        let db = db();
        let first = db.create_post("A", "a", "alice", None).unwrap();
        let second = db.create_post("B", "b", "bob", None).unwrap();

        for _ in 0..3 {
            db.increment_post_likes(first.id).unwrap();
        }
        db.increment_post_likes(second.id).unwrap();
        db.increment_post_likes(first.id).unwrap();

        assert_eq!(db.find_post_by_id(first.id).unwrap().unwrap().likes, 4);
        assert_eq!(db.find_post_by_id(second.id).unwrap().unwrap().likes, 1);
    }

    #[test]
    fn posts_list_newest_first() {
        let db = db();
        db.create_post("older", "x", "alice", None).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(2));
        db.create_post("newer", "y", "alice", None).unwrap();

        let posts = db.list_posts(PostSort::Recency).unwrap();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].title, "newer");
    }

    #[test]
    fn posts_list_by_likes() {
        let db = db();
        let low = db.create_post("low", "x", "alice", None).unwrap();
        let high = db.create_post("high", "y", "alice", None).unwrap();
        db.increment_post_likes(high.id).unwrap();
        db.increment_post_likes(high.id).unwrap();
        db.increment_post_likes(low.id).unwrap();

        let posts = db.list_posts(PostSort::Likes).unwrap();
        assert_eq!(posts[0].title, "high");
    }

    #[test]
    fn posts_filtered_by_author() {
        let db = db();
        db.create_post("mine", "x", "alice", None).unwrap();
        db.create_post("theirs", "y", "bob", None).unwrap();

        let posts = db.list_posts_by_username("alice").unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].title, "mine");
    }

    #[test]
    fn comments_list_newest_first() {
        let db = db();
        let post = db.create_post("A", "a", "alice", None).unwrap();
        db.create_comment(post.id, "bob", "first").unwrap();
        std::thread::sleep(std::time::Duration::from_millis(2));
        db.create_comment(post.id, "carol", "second").unwrap();
        db.create_comment(post.id + 1, "dave", "elsewhere").unwrap();

        let comments = db.list_comments_by_post_id(post.id).unwrap();
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].content, "second");
    }

    #[test]
    fn post_lifecycle_end_to_end() {
        let db = db();
        db.create_user("alice", "g1").unwrap();
        let created = db.create_post("Hi", "Hello", "alice", None).unwrap();

        let posts = db.list_posts(PostSort::Recency).unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].title, "Hi");
        assert_eq!(posts[0].likes, 0);

        db.increment_post_likes(created.id).unwrap();
        assert_eq!(db.find_post_by_id(created.id).unwrap().unwrap().likes, 1);
    }
}
