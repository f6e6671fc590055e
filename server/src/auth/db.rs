use crate::models::{NewSession, User};
use crate::schema::{sessions, users};
use chrono::{Duration, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::crypto::{generate_token, hash_token, TokenError};

/// How long an issued token stays valid.
pub const SESSION_LIFETIME_DAYS: i64 = 30;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("failed to store session: {0}")]
    Database(#[from] diesel::result::Error),
}

/// Issue a new token for `user_id`. Every login gets its own session row.
pub fn create_session(conn: &mut PgConnection, user_id: i32) -> Result<String, SessionError> {
    let token = generate_token()?;
    let token_hash = hash_token(&token);
    let expires_at = Utc::now() + Duration::days(SESSION_LIFETIME_DAYS);

    diesel::insert_into(sessions::table)
        .values(&NewSession {
            user_id,
            token_hash: &token_hash,
            expires_at,
        })
        .execute(conn)?;

    Ok(token)
}

/// Resolve an unexpired token to its session id and owner.
pub fn find_session(conn: &mut PgConnection, token: &str) -> QueryResult<Option<(Uuid, User)>> {
    let token_hash = hash_token(token);

    sessions::table
        .inner_join(users::table)
        .filter(sessions::token_hash.eq(&token_hash))
        .filter(sessions::expires_at.gt(Utc::now()))
        .select((sessions::id, User::as_select()))
        .first(conn)
        .optional()
}

pub fn delete_session(conn: &mut PgConnection, session_id: Uuid) -> QueryResult<usize> {
    diesel::delete(sessions::table.find(session_id)).execute(conn)
}

/// Drop every session of a user, e.g. after a password change.
pub fn delete_user_sessions(
    conn: &mut PgConnection,
    user_id: i32,
    keep: Option<Uuid>,
) -> QueryResult<usize> {
    let mut query = diesel::delete(sessions::table)
        .filter(sessions::user_id.eq(user_id))
        .into_boxed();
    if let Some(keep) = keep {
        query = query.filter(sessions::id.ne(keep));
    }
    query.execute(conn)
}
