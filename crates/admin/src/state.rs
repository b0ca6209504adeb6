//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::AdminConfig;
use crate::storage::LocalObjectStore;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    pool: PgPool,
    store: LocalObjectStore,
}

impl AppState {
    /// Create a new application state. Media is stored under `config.media_dir`.
    #[must_use]
    pub fn new(config: AdminConfig, pool: PgPool) -> Self {
        let store = LocalObjectStore::new(config.media_dir.clone());
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                store,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Object store for uploaded media.
    #[must_use]
    pub fn store(&self) -> &LocalObjectStore {
        &self.inner.store
    }
}
