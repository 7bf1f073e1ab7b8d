//! v002 -- Profile background images.

use rusqlite::Connection;

use super::column_exists;

/// Adds the uploaded-background column to `users`.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    if !column_exists(conn, "users", "background_url")? {
        conn.execute_batch("ALTER TABLE users ADD COLUMN background_url TEXT;")?;
    }
    Ok(())
}
