use std::sync::Arc;

use crate::{config::AppConfig, dao::session_store::SessionStore};

/// Cheaply clonable handle to the central application state.
pub type SharedState = Arc<AppState>;

/// Central application state: the injected session store and the runtime
/// configuration. The store is constructed once at process start and handed in
/// here; no layer initializes storage on first access.
pub struct AppState {
    store: Arc<dyn SessionStore>,
    config: AppConfig,
}

impl AppState {
    /// Construct the shared state around an already-built store.
    pub fn new(store: Arc<dyn SessionStore>, config: AppConfig) -> SharedState {
        Arc::new(Self { store, config })
    }

    /// Handle to the session store.
    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}
