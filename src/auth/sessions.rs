// src/auth/sessions.rs
use rusqlite::{params, Connection, OptionalExtension};

use crate::auth::roles::Role;
use crate::auth::token::{is_well_formed, session_digest, SessionToken};
use crate::errors::ServerError;

const SESSION_TTL_SECS: i64 = 60 * 60 * 24 * 7; // 7 days

/// Who is signed in. Demo sign-in only: there is no credential check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Normalized email; doubles as the customer id on applications.
    pub user_id: String,
    pub display_name: String,
    pub role: Role,
}

/// Trim + lowercase, minimal sanity check.
pub fn normalize_email(email: &str) -> Result<String, ServerError> {
    let e = email.trim().to_lowercase();
    if e.is_empty() || !e.contains('@') || e.starts_with('@') || e.ends_with('@') {
        return Err(ServerError::BadRequest("invalid email".into()));
    }
    Ok(e)
}

/// Start a session and return the raw token for the cookie.
pub fn create_session(
    conn: &Connection,
    email: &str,
    display_name: &str,
    role: Role,
    now: i64,
) -> Result<(String, Session), ServerError> {
    let user_id = normalize_email(email)?;
    let display_name = match display_name.trim() {
        "" => user_id.clone(),
        name => name.to_string(),
    };

    let token = SessionToken::issue();
    let hash = token.digest();

    conn.execute(
        r#"
        insert into sessions (token_hash, user_id, display_name, role, created_at, expires_at)
        values (?, ?, ?, ?, ?, ?)
        "#,
        params![
            hash.as_slice(),
            user_id,
            display_name,
            role.as_str(),
            now,
            now + SESSION_TTL_SECS
        ],
    )
    .map_err(|e| ServerError::DbError(format!("create session failed: {e}")))?;

    Ok((
        token.into_cookie_value(),
        Session {
            user_id,
            display_name,
            role,
        },
    ))
}

pub fn load_session(
    conn: &Connection,
    raw_token: &str,
    now: i64,
) -> Result<Option<Session>, ServerError> {
    if !is_well_formed(raw_token) {
        return Ok(None);
    }
    let hash = session_digest(raw_token);

    let row: Option<(String, String, String)> = conn
        .query_row(
            r#"
            select user_id, display_name, role
            from sessions
            where token_hash = ?
              and expires_at > ?
              and revoked_at is null
            "#,
            params![hash.as_slice(), now],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .optional()
        .map_err(|e| ServerError::DbError(format!("session lookup failed: {e}")))?;

    match row {
        Some((user_id, display_name, role)) => Ok(Some(Session {
            user_id,
            display_name,
            role: role.parse()?,
        })),
        None => Ok(None),
    }
}

pub fn revoke_session(conn: &Connection, raw_token: &str, now: i64) -> Result<(), ServerError> {
    let hash = session_digest(raw_token);
    conn.execute(
        "update sessions set revoked_at = ? where token_hash = ? and revoked_at is null",
        params![now, hash.as_slice()],
    )
    .map_err(|e| ServerError::DbError(format!("revoke session failed: {e}")))?;
    Ok(())
}
