//! v003 -- Post file attachments.

use rusqlite::Connection;

use super::column_exists;

/// Adds the attachment-path column to `posts`.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    if !column_exists(conn, "posts", "file_path")? {
        conn.execute_batch("ALTER TABLE posts ADD COLUMN file_path TEXT;")?;
    }
    Ok(())
}
