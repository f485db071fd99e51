//! Profile context - wires the cache, bus and fetcher together

use std::sync::Arc;

use tracing::info;
use userdeck_core::{EventBus, ProfileFetcher, ProfileStore, RefreshCoordinator, Subscription};
use userdeck_domain::{Config, ConfigResult, RefreshEvent, SiteId};

use crate::events::InMemoryEventBus;
use crate::webservice::WebServiceProfileFetcher;

/// Holds the shared profile services for one process
pub struct ProfileContext {
    pub config: Config,
    pub bus: Arc<InMemoryEventBus>,
    pub store: Arc<ProfileStore>,
    pub coordinator: Arc<RefreshCoordinator>,
}

impl ProfileContext {
    /// Build the context against the configured sites' web services.
    ///
    /// # Errors
    /// Returns `ConfigError` if the configuration is invalid or the HTTP
    /// client cannot be constructed.
    pub fn from_config(config: Config) -> ConfigResult<Self> {
        let fetcher = WebServiceProfileFetcher::from_config(&config)?;
        Self::with_fetcher(config, Arc::new(fetcher))
    }

    /// Build the context around a caller-supplied fetcher.
    ///
    /// # Errors
    /// Returns `ConfigError` if the configuration is invalid.
    pub fn with_fetcher(config: Config, fetcher: Arc<dyn ProfileFetcher>) -> ConfigResult<Self> {
        config.validate()?;

        let bus = Arc::new(InMemoryEventBus::new());
        let store = Arc::new(ProfileStore::new(fetcher).with_ttl(config.cache.ttl()));
        let coordinator = Arc::new(RefreshCoordinator::new(
            Arc::clone(&store),
            Arc::clone(&bus) as Arc<dyn EventBus>,
        ));

        info!(
            sites = config.sites.len(),
            ttl_seconds = ?config.cache.ttl_seconds,
            "profile context initialized"
        );

        Ok(Self { config, bus, store, coordinator })
    }

    /// Receive refresh events for `site_id`.
    pub fn subscribe<F>(&self, site_id: &SiteId, handler: F) -> Subscription
    where
        F: Fn(&RefreshEvent) + Send + Sync + 'static,
    {
        self.coordinator.subscribe(site_id, handler)
    }
}
