//! First-contact provisioning and session tokens.
//!
//! Everything here deals in plain scalars and the injected [`Database`];
//! nothing touches request or response types.

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use sha2::{Digest, Sha256};

use plaza_db::models::UserRow;
use plaza_db::{Database, StoreError};
use plaza_types::api::Claims;

use crate::error::{ApiError, Result};

/// Cookie under which the session token travels.
pub const SESSION_COOKIE: &str = "plaza_session";

const SESSION_TTL_DAYS: i64 = 30;

/// Provider subject ids are hashed before they are stored or compared, so
/// the raw Google identifier never lands in the database.
pub fn hash_external_id(subject: &str) -> String {
    hex::encode(Sha256::digest(subject.as_bytes()))
}

/// Resolve an external identity to a local user, creating a provisional row
/// on first sight. Existing rows are never mutated. Two racing first logins
/// both reach the INSERT; the loser's unique-constraint failure falls back
/// to the row the winner created.
pub fn resolve_or_create_user(
    db: &Database,
    external_subject: &str,
) -> std::result::Result<UserRow, StoreError> {
    let hashed = hash_external_id(external_subject);
    if let Some(user) = db.find_user_by_google_id(&hashed)? {
        return Ok(user);
    }
    match db.create_user(&hashed, &hashed) {
        Ok(user) => Ok(user),
        Err(StoreError::Conflict) => db
            .find_user_by_google_id(&hashed)?
            .ok_or(StoreError::NotFound),
        Err(e) => Err(e),
    }
}

/// Replace a provisional username with a chosen one. The UNIQUE constraint
/// is the arbiter: there is no separate availability check, so two racing
/// registrations cannot both win. Re-registering the same name for the same
/// user succeeds unchanged.
pub fn register_username(db: &Database, user: &UserRow, chosen: &str) -> Result<UserRow> {
    match db.update_user_profile(user.id, chosen, user.avatar_url.as_deref()) {
        Ok(()) => {}
        Err(StoreError::Conflict) => return Err(ApiError::UsernameTaken),
        Err(e) => return Err(e.into()),
    }
    db.find_user_by_id(user.id)?
        .ok_or(ApiError::Store(StoreError::NotFound))
}

/// Serialize a session. The token carries only the user id.
pub fn issue_session_token(secret: &str, user_id: i64) -> Result<String> {
    let claims = Claims {
        sub: user_id,
        exp: (Utc::now() + Duration::days(SESSION_TTL_DAYS)).timestamp() as usize,
    };
    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?)
}

/// Restore a session: verify the token, then re-fetch the full user row.
/// The lookup happens on every request; a vanished account surfaces as
/// [`StoreError::NotFound`] rather than a stale cached user.
pub fn restore_session_user(db: &Database, secret: &str, token: &str) -> Result<UserRow> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    db.find_user_by_id(data.claims.sub)?
        .ok_or(ApiError::Store(StoreError::NotFound))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    fn db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn user_count(db: &Database) -> i64 {
        db.with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?))
            .unwrap()
    }

    #[test]
    fn hash_is_stable_hex() {
        let a = hash_external_id("subject-1");
        let b = hash_external_id("subject-1");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, hash_external_id("subject-2"));
    }

    #[test]
    fn resolve_twice_creates_one_provisional_row() {
        let db = db();
        let first = resolve_or_create_user(&db, "subject-1").unwrap();
        let second = resolve_or_create_user(&db, "subject-1").unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(user_count(&db), 1);
        assert!(first.is_provisional());
    }

    #[test]
    fn registration_transitions_to_registered() {
        let db = db();
        let user = resolve_or_create_user(&db, "subject-1").unwrap();
        let updated = register_username(&db, &user, "alice").unwrap();

        assert_eq!(updated.username, "alice");
        assert!(!updated.is_provisional());

        // a later authentication resolves to the registered row untouched
        let again = resolve_or_create_user(&db, "subject-1").unwrap();
        assert_eq!(again.username, "alice");
        assert_eq!(user_count(&db), 1);
    }

    #[test]
    fn registration_rejects_taken_name() {
        let db = db();
        db.create_user("alice", "g-other").unwrap();
        let user = resolve_or_create_user(&db, "subject-1").unwrap();

        let err = register_username(&db, &user, "alice").unwrap_err();
        assert!(matches!(err, ApiError::UsernameTaken));
    }

    #[test]
    fn reregistering_same_name_is_idempotent() {
        let db = db();
        let user = resolve_or_create_user(&db, "subject-1").unwrap();
        let first = register_username(&db, &user, "alice").unwrap();
        let second = register_username(&db, &first, "alice").unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.username, "alice");
    }

    #[test]
    fn session_token_round_trip() {
        let db = db();
        let user = db.create_user("alice", "g1").unwrap();

        let token = issue_session_token(SECRET, user.id).unwrap();
        let restored = restore_session_user(&db, SECRET, &token).unwrap();
        assert_eq!(restored.id, user.id);
        assert_eq!(restored.username, "alice");
    }

    #[test]
    fn garbage_token_is_rejected() {
        let db = db();
        let err = restore_session_user(&db, SECRET, "not-a-token").unwrap_err();
        assert!(matches!(err, ApiError::Token(_)));
    }

    #[test]
    fn restore_fails_when_account_vanished() {
        let db = db();
        let token = issue_session_token(SECRET, 9999).unwrap();
        let err = restore_session_user(&db, SECRET, &token).unwrap_err();
        assert!(matches!(err, ApiError::Store(StoreError::NotFound)));
    }
}
