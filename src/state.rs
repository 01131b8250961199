use std::sync::Arc;

use crate::{
    admission::{AdmissionStore, MemoryAdmissionStore},
    config::Config,
    store::{CatalogStore, MemoryStore},
};

pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn CatalogStore>,
    pub admission: Arc<dyn AdmissionStore>,
}

impl AppState {
    pub fn new() -> Arc<Self> {
        let config = Config::load();

        Arc::new(Self {
            config,
            store: Arc::new(MemoryStore::new()),
            admission: Arc::new(MemoryAdmissionStore::new()),
        })
    }

    pub fn with_parts(
        config: Config,
        store: Arc<dyn CatalogStore>,
        admission: Arc<dyn AdmissionStore>,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            store,
            admission,
        })
    }
}
