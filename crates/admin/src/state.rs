//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::services::OrderService;
use crate::storage::StorageServices;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AppConfig,
    storage: StorageServices,
    orders: OrderService,
}

impl AppState {
    #[must_use]
    pub fn new(config: AppConfig, storage: StorageServices) -> Self {
        let orders = OrderService::new(storage.clone());
        Self {
            inner: Arc::new(AppStateInner {
                config,
                storage,
                orders,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn storage(&self) -> &StorageServices {
        &self.inner.storage
    }

    #[must_use]
    pub fn orders(&self) -> &OrderService {
        &self.inner.orders
    }
}
