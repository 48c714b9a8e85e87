// src/config.rs
use crate::effects::EffectDelays;
use crate::errors::ServerError;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct PortalConfig {
    pub addr: SocketAddr,
    /// SQLite file holding the key/value snapshots and sessions.
    pub db_path: PathBuf,
    /// Static content tree driving navigation.
    pub epics_path: PathBuf,
    pub max_workers: usize,
    pub effect_delays: EffectDelays,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            db_path: PathBuf::from("swan_portal.sqlite3"),
            epics_path: PathBuf::from("content/epics.json"),
            max_workers: 8,
            effect_delays: EffectDelays::default(),
        }
    }
}

impl PortalConfig {
    pub fn from_env() -> Result<Self, ServerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ServerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(addr) = lookup("PORTAL_ADDR") {
            cfg.addr = addr
                .parse()
                .map_err(|e| ServerError::BadRequest(format!("PORTAL_ADDR '{addr}': {e}")))?;
        }
        if let Some(path) = lookup("PORTAL_DB_PATH") {
            cfg.db_path = PathBuf::from(path);
        }
        if let Some(path) = lookup("PORTAL_EPICS_PATH") {
            cfg.epics_path = PathBuf::from(path);
        }
        if let Some(n) = lookup("PORTAL_WORKERS") {
            cfg.max_workers = match n.parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ServerError::BadRequest(format!(
                        "PORTAL_WORKERS must be a positive integer, got '{n}'"
                    )))
                }
            };
        }
        if let Some(ms) = lookup("PORTAL_EFFECT_DELAY_MS") {
            let ms: u64 = ms.parse().map_err(|e| {
                ServerError::BadRequest(format!("PORTAL_EFFECT_DELAY_MS '{ms}': {e}"))
            })?;
            cfg.effect_delays = EffectDelays::uniform(Duration::from_millis(ms));
        }

        Ok(cfg)
    }
}
