//! Refresh coordinator - invalidate, re-fetch, notify

use std::sync::Arc;

use tracing::{info, warn};
use userdeck_domain::{
    FetchResult, ProfileEntity, ProfileEvent, ProfileKey, RefreshEvent, SiteId, PROFILE_REFRESHED,
};

use super::ports::{EventBus, Subscription};
use super::store::ProfileStore;

/// Runs user-initiated refresh cycles and announces their results
pub struct RefreshCoordinator {
    store: Arc<ProfileStore>,
    bus: Arc<dyn EventBus>,
}

impl RefreshCoordinator {
    pub fn new(store: Arc<ProfileStore>, bus: Arc<dyn EventBus>) -> Self {
        Self { store, bus }
    }

    pub fn store(&self) -> &Arc<ProfileStore> {
        &self.store
    }

    /// Drop the cached profile for `key`, fetch it again and publish a
    /// [`RefreshEvent`] scoped to the key's site.
    ///
    /// Always costs one remote round trip that starts after the call, even
    /// when another read of `key` is already in flight. Nothing is published
    /// on failure.
    ///
    /// # Errors
    /// Returns the fetcher's `FetchError` unchanged.
    pub async fn refresh(&self, key: &ProfileKey) -> FetchResult<Arc<ProfileEntity>> {
        self.store.invalidate(key);

        match self.store.fetch_fresh(key).await {
            Ok(profile) => {
                let event = RefreshEvent::new(key, Arc::clone(&profile));
                self.bus.publish(PROFILE_REFRESHED, event.into(), Some(&key.site_id));
                info!(
                    user_id = key.user_id,
                    context_id = ?key.context_id,
                    site_id = %key.site_id,
                    "profile refreshed"
                );
                Ok(profile)
            }
            Err(err) => {
                warn!(
                    user_id = key.user_id,
                    context_id = ?key.context_id,
                    site_id = %key.site_id,
                    error = %err,
                    "profile refresh failed"
                );
                Err(err)
            }
        }
    }

    /// Receive every refresh completed for `site_id`.
    pub fn subscribe<F>(&self, site_id: &SiteId, handler: F) -> Subscription
    where
        F: Fn(&RefreshEvent) + Send + Sync + 'static,
    {
        self.bus.subscribe(
            PROFILE_REFRESHED,
            Some(site_id.clone()),
            Arc::new(move |event: &ProfileEvent| match event {
                ProfileEvent::Refreshed(refreshed) => handler(refreshed),
            }),
        )
    }
}
