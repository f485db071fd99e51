//! Port interfaces for profile retrieval and notification
//!
//! These traits define the boundaries between the profile cache logic and
//! the infrastructure that talks to remote sites and delivers events.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use userdeck_domain::{FetchResult, ProfileEntity, ProfileEvent, ProfileKey, SiteId};

/// Remote source of profile data
#[async_trait]
pub trait ProfileFetcher: Send + Sync {
    /// Fetch a fresh profile for `key` from its site.
    ///
    /// Timeouts, retries and cancellation are the implementation's concern.
    async fn fetch_profile(&self, key: &ProfileKey) -> FetchResult<ProfileEntity>;
}

/// Callback invoked for every event delivered to a subscription
pub type EventHandler = Arc<dyn Fn(&ProfileEvent) + Send + Sync>;

/// Publish/subscribe channel for profile notifications
pub trait EventBus: Send + Sync {
    /// Deliver `event` to every subscriber of `topic` whose scope matches.
    ///
    /// Subscribers without a scope receive events for every scope.
    fn publish(&self, topic: &str, event: ProfileEvent, scope: Option<&SiteId>);

    /// Register `handler` for `topic`, optionally limited to one site.
    fn subscribe(&self, topic: &str, scope: Option<SiteId>, handler: EventHandler) -> Subscription;
}

/// Handle for an active subscription
///
/// Dropping the handle keeps the subscription alive; call
/// [`Subscription::unsubscribe`] to stop delivery.
pub struct Subscription {
    id: u64,
    cancel: Box<dyn FnOnce() + Send + Sync>,
}

impl Subscription {
    pub fn new(id: u64, cancel: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self { id, cancel: Box::new(cancel) }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Stop receiving events.
    pub fn unsubscribe(self) {
        (self.cancel)();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish_non_exhaustive()
    }
}
