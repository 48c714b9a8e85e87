// src/prefs.rs
use crate::db::kv::{self, theme_key};
use crate::db::Database;
use crate::errors::ServerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Theme {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    fn parse(s: &str) -> Theme {
        if s == "dark" {
            Theme::Dark
        } else {
            Theme::Light
        }
    }
}

pub fn load_theme(db: &Database, user_id: &str) -> Result<Theme, ServerError> {
    let raw = db.with_conn(|conn| kv::get_item(conn, &theme_key(user_id)))?;
    Ok(raw.as_deref().map(Theme::parse).unwrap_or_default())
}

pub fn save_theme(db: &Database, user_id: &str, theme: Theme, now: i64) -> Result<(), ServerError> {
    db.with_conn(|conn| kv::set_item(conn, &theme_key(user_id), theme.as_str(), now))
}
