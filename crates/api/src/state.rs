//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::DbPools;
use crate::ehr::{EhrClient, EhrError};
use crate::intake::IntakeClient;
use crate::services::CompositeService;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`; holds the immutable configuration snapshot,
/// the two database pools and the wired orchestration service.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AppConfig,
    pools: DbPools,
    composite: CompositeService,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the EHR client cannot be constructed from the
    /// configuration.
    pub fn new(config: AppConfig, pools: DbPools) -> Result<Self, EhrError> {
        let ehr = EhrClient::new(&config.ehr)?;
        let intake = IntakeClient::new(&config.intake);
        let composite = CompositeService::new(
            pools.clone(),
            ehr,
            intake,
            config.offerings_cache_ttl,
        );

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pools,
                composite,
            }),
        })
    }

    /// The configuration snapshot.
    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    /// The database pools.
    #[must_use]
    pub fn pools(&self) -> &DbPools {
        &self.inner.pools
    }

    /// The orchestration service.
    #[must_use]
    pub fn composite(&self) -> &CompositeService {
        &self.inner.composite
    }
}
