//! v001 -- Initial schema creation.
//!
//! Creates the three core tables: `users`, `posts`, and `comments`.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Users
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS users (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    username         TEXT NOT NULL UNIQUE,
    hashed_google_id TEXT NOT NULL UNIQUE,     -- SHA-256 of the provider subject, hex
    avatar_url       TEXT,
    member_since     TEXT NOT NULL             -- RFC 3339
);

-- ----------------------------------------------------------------
-- Posts
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS posts (
    id        INTEGER PRIMARY KEY AUTOINCREMENT,
    title     TEXT NOT NULL,
    content   TEXT NOT NULL,
    username  TEXT NOT NULL,                   -- author by name, no foreign key
    timestamp TEXT NOT NULL,
    likes     INTEGER NOT NULL DEFAULT 0
);

-- ----------------------------------------------------------------
-- Comments
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS comments (
    id        INTEGER PRIMARY KEY AUTOINCREMENT,
    post_id   INTEGER NOT NULL,                -- references posts(id), unenforced
    username  TEXT NOT NULL,
    content   TEXT NOT NULL,
    timestamp TEXT NOT NULL
);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
