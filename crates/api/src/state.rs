use std::sync::Arc;

use sqlx::PgPool;
use storefront_cms_core::mutation::PartialUpdateExecutor;

use crate::config::AppConfig;

/// Shared application state, passed to all handlers via Axum's `State` extractor.
/// Wrapped in `Arc` so cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    pool: PgPool,
    config: AppConfig,
    updates: PartialUpdateExecutor,
}

impl AppState {
    pub fn new(pool: PgPool, config: AppConfig) -> Self {
        Self {
            inner: Arc::new(InnerState {
                updates: PartialUpdateExecutor::new(pool.clone()),
                pool,
                config,
            }),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    pub fn updates(&self) -> &PartialUpdateExecutor {
        &self.inner.updates
    }
}
