use crate::app::App;
use crate::config::PortalConfig;
use crate::content::Catalog;
use crate::db::{init_db, Database};
use crate::effects::RandomServices;
use crate::router::handle;
use astra::Server;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

mod app;
mod auth;
mod config;
mod content;
mod db;
mod effects;
mod errors;
mod forms;
mod prefs;
mod responses;
mod router;
mod spreadsheets;
mod store;
mod templates;

#[cfg(test)]
mod tests;

fn main() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("swan_portal=info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cfg = match PortalConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            std::process::exit(2);
        }
    };

    let db = Database::new(&cfg.db_path);
    if let Err(e) = init_db(&db) {
        tracing::error!(error = %e, path = %cfg.db_path.display(), "database initialization failed");
        std::process::exit(1);
    }

    let catalog = match Catalog::load(&cfg.epics_path) {
        Ok(catalog) => catalog,
        Err(e) => {
            tracing::error!(error = %e, path = %cfg.epics_path.display(), "content catalog is invalid");
            std::process::exit(1);
        }
    };

    let app = match App::new(db, catalog, Arc::new(RandomServices::new()), cfg.effect_delays) {
        Ok(app) => app,
        Err(e) => {
            tracing::error!(error = %e, "store hydration failed");
            std::process::exit(1);
        }
    };

    tracing::info!(addr = %cfg.addr, workers = cfg.max_workers, "starting server");

    let server = Server::bind(&cfg.addr).max_workers(cfg.max_workers);

    let result = server.serve(move |req, _info| match handle(req, &app) {
        Ok(resp) => resp,
        Err(err) => templates::html_error_response(err),
    });

    if let Err(e) = result {
        tracing::error!(error = %e, "server ended with error");
    }

    tracing::info!("server shut down");
}
