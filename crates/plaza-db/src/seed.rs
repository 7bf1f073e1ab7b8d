//! Demo-data population.
//!
//! Inserts a fixed set of users and posts so a fresh install has something
//! to render. Rows that already exist are skipped; running the seed twice
//! is a logged no-op, not an error.

use rusqlite::params;
use tracing::info;

use crate::Database;
use crate::error::Result;

struct DemoUser {
    username: &'static str,
    hashed_google_id: &'static str,
    member_since: &'static str,
}

struct DemoPost {
    title: &'static str,
    content: &'static str,
    username: &'static str,
    timestamp: &'static str,
}

const DEMO_USERS: &[DemoUser] = &[
    DemoUser {
        username: "user1",
        hashed_google_id: "demo-hashed-google-id-1",
        member_since: "2024-01-01 12:00:00",
    },
    DemoUser {
        username: "user2",
        hashed_google_id: "demo-hashed-google-id-2",
        member_since: "2024-01-02 12:00:00",
    },
];

const DEMO_POSTS: &[DemoPost] = &[
    DemoPost {
        title: "First Post",
        content: "This is the first post",
        username: "user1",
        timestamp: "2024-01-01 12:30:00",
    },
    DemoPost {
        title: "Second Post",
        content: "This is the second post",
        username: "user2",
        timestamp: "2024-01-02 12:30:00",
    },
];

pub fn populate(db: &Database) -> Result<()> {
    for user in DEMO_USERS {
        if db.find_user_by_google_id(user.hashed_google_id)?.is_some() {
            info!("User {} already exists. Skipping insert.", user.username);
            continue;
        }
        db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (username, hashed_google_id, avatar_url, member_since)
                 VALUES (?1, ?2, '', ?3)",
                params![user.username, user.hashed_google_id, user.member_since],
            )?;
            Ok(())
        })?;
        info!("User {} inserted.", user.username);
    }

    for post in DEMO_POSTS {
        let exists = db.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM posts WHERE title = ?1 AND username = ?2",
                params![post.title, post.username],
                |row| row.get(0),
            )?;
            Ok(count > 0)
        })?;
        if exists {
            info!("Post \"{}\" already exists. Skipping insert.", post.title);
            continue;
        }
        db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO posts (title, content, username, timestamp, likes)
                 VALUES (?1, ?2, ?3, ?4, 0)",
                params![post.title, post.content, post.username, post.timestamp],
            )?;
            Ok(())
        })?;
        info!("Post \"{}\" inserted.", post.title);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PostSort;

    #[test]
    fn populate_twice_inserts_each_row_once() {
        let db = Database::open_in_memory().unwrap();
        populate(&db).unwrap();
        populate(&db).unwrap();

        let users: i64 = db
            .with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?))
            .unwrap();
        assert_eq!(users, 2);

        let posts = db.list_posts(PostSort::Recency).unwrap();
        assert_eq!(posts.len(), 2);
        assert!(posts.iter().all(|p| p.likes == 0));
    }

    #[test]
    fn seeded_users_are_registered() {
        let db = Database::open_in_memory().unwrap();
        populate(&db).unwrap();
        let user = db.find_user_by_username("user1").unwrap().unwrap();
        assert!(!user.is_provisional());
    }
}
