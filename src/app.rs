// src/app.rs
use std::sync::Arc;

use crate::content::Catalog;
use crate::db::Database;
use crate::effects::{EffectDelays, Effects, ExternalServices};
use crate::errors::ServerError;
use crate::store::ApplicationStore;

/// Everything a request handler needs; cheap to clone into worker threads.
#[derive(Clone)]
pub struct App {
    pub db: Database,
    pub store: ApplicationStore,
    pub effects: Effects,
    pub catalog: Arc<Catalog>,
}

impl App {
    pub fn new(
        db: Database,
        catalog: Catalog,
        services: Arc<dyn ExternalServices>,
        delays: EffectDelays,
    ) -> Result<Self, ServerError> {
        let store = ApplicationStore::open(db.clone())?;
        let effects = Effects::new(store.clone(), services, delays);
        Ok(Self {
            db,
            store,
            effects,
            catalog: Arc::new(catalog),
        })
    }
}
