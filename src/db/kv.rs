// src/db/kv.rs
//! Key/value snapshots, the server-side stand-in for browser local storage.
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::errors::ServerError;

pub const APPLICATIONS_KEY: &str = "applications";
/// Key written by the older of the two client stores.
pub const LEGACY_APPLICATIONS_KEY: &str = "loanApplications";
pub const NOTIFICATIONS_KEY: &str = "notifications";

pub fn theme_key(user_id: &str) -> String {
    format!("theme:{user_id}")
}

pub fn get_item(conn: &Connection, key: &str) -> Result<Option<String>, ServerError> {
    conn.query_row(
        "select value from kv_store where key = ?",
        params![key],
        |r| r.get(0),
    )
    .optional()
    .map_err(|e| ServerError::DbError(format!("kv get '{key}' failed: {e}")))
}

pub fn set_item(conn: &Connection, key: &str, value: &str, now: i64) -> Result<(), ServerError> {
    conn.execute(
        r#"
        insert into kv_store (key, value, updated_at) values (?, ?, ?)
        on conflict(key) do update set value = excluded.value, updated_at = excluded.updated_at
        "#,
        params![key, value, now],
    )
    .map_err(|e| ServerError::DbError(format!("kv set '{key}' failed: {e}")))?;
    Ok(())
}

pub fn remove_item(conn: &Connection, key: &str) -> Result<(), ServerError> {
    conn.execute("delete from kv_store where key = ?", params![key])
        .map_err(|e| ServerError::DbError(format!("kv remove '{key}' failed: {e}")))?;
    Ok(())
}

/// Decode the JSON snapshot under `key`. A value that no longer parses is
/// moved to `{key}:unreadable` and reported as absent.
pub fn load_snapshot<T: DeserializeOwned>(
    conn: &Connection,
    key: &str,
    now: i64,
) -> Result<Option<T>, ServerError> {
    let Some(raw) = get_item(conn, key)? else {
        return Ok(None);
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            tracing::warn!(key, error = %e, "snapshot unreadable, setting it aside");
            set_item(conn, &format!("{key}:unreadable"), &raw, now)?;
            remove_item(conn, key)?;
            Ok(None)
        }
    }
}

pub fn set_json<T: Serialize + ?Sized>(
    conn: &Connection,
    key: &str,
    value: &T,
    now: i64,
) -> Result<(), ServerError> {
    let raw = serde_json::to_string(value)?;
    set_item(conn, key, &raw, now)
}
