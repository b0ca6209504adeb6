//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;

use pazar_core::ProductId;

use crate::config::StorefrontConfig;
use crate::econt::EcontDirectory;
use crate::models::{ProductDetail, StoreSettings};

/// Settings change rarely; a minute of staleness is acceptable.
const SETTINGS_TTL: Duration = Duration::from_secs(60);

/// Product pages show stock, so keep them fresher than settings.
const PRODUCT_TTL: Duration = Duration::from_secs(30);

const PRODUCT_CACHE_CAPACITY: u64 = 1000;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    econt: EcontDirectory,
    settings_cache: Cache<(), StoreSettings>,
    product_cache: Cache<ProductId, ProductDetail>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: StorefrontConfig, pool: PgPool, econt: EcontDirectory) -> Self {
        let settings_cache = Cache::builder()
            .max_capacity(1)
            .time_to_live(SETTINGS_TTL)
            .build();

        let product_cache = Cache::builder()
            .max_capacity(PRODUCT_CACHE_CAPACITY)
            .time_to_live(PRODUCT_TTL)
            .build();

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                econt,
                settings_cache,
                product_cache,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Econt office directory.
    #[must_use]
    pub fn econt(&self) -> &EcontDirectory {
        &self.inner.econt
    }

    /// Cached store settings (single entry).
    #[must_use]
    pub fn settings_cache(&self) -> &Cache<(), StoreSettings> {
        &self.inner.settings_cache
    }

    /// Cached product detail pages, keyed by product.
    #[must_use]
    pub fn product_cache(&self) -> &Cache<ProductId, ProductDetail> {
        &self.inner.product_cache
    }
}
