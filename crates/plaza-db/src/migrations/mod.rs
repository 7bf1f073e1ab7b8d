//! Database migration runner.
//!
//! Migrations are executed in order on every [`Database::open`] call. Each
//! step is guarded by the `user_version` pragma so it runs exactly once per
//! database, and the column-adding steps additionally check the live table
//! so a database that already grew the column out-of-band upgrades cleanly.
//! Steps only ever create tables or add nullable columns; nothing is dropped
//! or renamed.
//!
//! [`Database::open`]: crate::Database::open

pub mod v001_initial;
pub mod v002_profile_backgrounds;
pub mod v003_post_attachments;

use rusqlite::Connection;

use crate::error::{Result, StoreError};

/// Current schema version. Bump this and add a new migration module whenever
/// the schema changes.
const CURRENT_VERSION: u32 = 3;

/// Run all pending migrations against the open connection.
pub fn run(conn: &Connection) -> Result<()> {
    let current: u32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

    tracing::info!(
        current_version = current,
        target_version = CURRENT_VERSION,
        "checking database migrations"
    );

    if current < 1 {
        tracing::info!("applying migration v001_initial");
        v001_initial::up(conn).map_err(|e| StoreError::Migration(e.to_string()))?;
        conn.pragma_update(None, "user_version", 1)?;
    }
    if current < 2 {
        tracing::info!("applying migration v002_profile_backgrounds");
        v002_profile_backgrounds::up(conn).map_err(|e| StoreError::Migration(e.to_string()))?;
        conn.pragma_update(None, "user_version", 2)?;
    }
    if current < 3 {
        tracing::info!("applying migration v003_post_attachments");
        v003_post_attachments::up(conn).map_err(|e| StoreError::Migration(e.to_string()))?;
        conn.pragma_update(None, "user_version", 3)?;
    }

    Ok(())
}

/// True when `table` already has a column named `column`.
pub(crate) fn column_exists(
    conn: &Connection,
    table: &str,
    column: &str,
) -> std::result::Result<bool, rusqlite::Error> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema_dump(conn: &Connection) -> Vec<String> {
        let mut stmt = conn
            .prepare("SELECT sql FROM sqlite_master WHERE sql IS NOT NULL ORDER BY name")
            .unwrap();
        stmt.query_map([], |row| row.get::<_, String>(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap()
    }

    #[test]
    fn fresh_database_reaches_current_version() {
        let conn = Connection::open_in_memory().unwrap();
        run(&conn).unwrap();

        let version: u32 = conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap();
        assert_eq!(version, CURRENT_VERSION);

        for (table, column) in [
            ("users", "hashed_google_id"),
            ("users", "background_url"),
            ("posts", "file_path"),
            ("comments", "post_id"),
        ] {
            assert!(column_exists(&conn, table, column).unwrap(), "{table}.{column}");
        }
    }

    #[test]
    fn run_twice_yields_identical_schema() {
        let conn = Connection::open_in_memory().unwrap();
        run(&conn).unwrap();
        let first = schema_dump(&conn);
        run(&conn).unwrap();
        assert_eq!(first, schema_dump(&conn));
    }

    #[test]
    fn upgrade_from_v1_preserves_rows() {
        let conn = Connection::open_in_memory().unwrap();
        // A database as v001 left it, before the column-adding steps existed.
        conn.execute_batch(
            "CREATE TABLE users (
                 id               INTEGER PRIMARY KEY AUTOINCREMENT,
                 username         TEXT NOT NULL UNIQUE,
                 hashed_google_id TEXT NOT NULL UNIQUE,
                 avatar_url       TEXT,
                 member_since     TEXT NOT NULL
             );
             CREATE TABLE posts (
                 id        INTEGER PRIMARY KEY AUTOINCREMENT,
                 title     TEXT NOT NULL,
                 content   TEXT NOT NULL,
                 username  TEXT NOT NULL,
                 timestamp TEXT NOT NULL,
                 likes     INTEGER NOT NULL DEFAULT 0
             );
             CREATE TABLE comments (
                 id        INTEGER PRIMARY KEY AUTOINCREMENT,
                 post_id   INTEGER NOT NULL,
                 username  TEXT NOT NULL,
                 content   TEXT NOT NULL,
                 timestamp TEXT NOT NULL
             );
             INSERT INTO users (username, hashed_google_id, avatar_url, member_since)
                 VALUES ('alice', 'g1', '', '2024-01-01T12:00:00+00:00');
             INSERT INTO posts (title, content, username, timestamp, likes)
                 VALUES ('Hi', 'Hello', 'alice', '2024-01-01T12:30:00+00:00', 3);",
        )
        .unwrap();
        conn.pragma_update(None, "user_version", 1).unwrap();

        run(&conn).unwrap();

        assert!(column_exists(&conn, "users", "background_url").unwrap());
        assert!(column_exists(&conn, "posts", "file_path").unwrap());

        let (username, background): (String, Option<String>) = conn
            .query_row(
                "SELECT username, background_url FROM users WHERE hashed_google_id = 'g1'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(username, "alice");
        assert!(background.is_none());

        let likes: i64 = conn
            .query_row("SELECT likes FROM posts WHERE title = 'Hi'", [], |row| row.get(0))
            .unwrap();
        assert_eq!(likes, 3);
    }

    #[test]
    fn full_schema_with_stale_version_marker_upgrades_cleanly() {
        // A database created at the current schema but whose version marker
        // was lost; the column guards keep the ALTERs from failing.
        let conn = Connection::open_in_memory().unwrap();
        run(&conn).unwrap();
        conn.pragma_update(None, "user_version", 0).unwrap();

        run(&conn).unwrap();

        let version: u32 = conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap();
        assert_eq!(version, CURRENT_VERSION);
    }
}
