//! Profile notification payloads

use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::key::{ProfileKey, SiteId};
use super::profile::ProfileEntity;

/// Topic under which completed refreshes are published
pub const PROFILE_REFRESHED: &str = "profile-refreshed";

/// Emitted once per successful refresh cycle
#[derive(Debug, Clone)]
pub struct RefreshEvent {
    pub user_id: i64,
    pub context_id: Option<i64>,
    pub site_id: SiteId,
    pub profile: Arc<ProfileEntity>,
    pub refreshed_at: DateTime<Utc>,
}

impl RefreshEvent {
    pub fn new(key: &ProfileKey, profile: Arc<ProfileEntity>) -> Self {
        Self {
            user_id: key.user_id,
            context_id: key.context_id,
            site_id: key.site_id.clone(),
            profile,
            refreshed_at: Utc::now(),
        }
    }

    /// Key the refreshed profile is cached under.
    pub fn key(&self) -> ProfileKey {
        ProfileKey::new(self.user_id, self.context_id, self.site_id.clone())
    }
}

/// Payloads carried by the profile event bus
#[derive(Debug, Clone)]
pub enum ProfileEvent {
    Refreshed(RefreshEvent),
}

impl ProfileEvent {
    /// Topic the event belongs to.
    pub fn topic(&self) -> &'static str {
        match self {
            ProfileEvent::Refreshed(_) => PROFILE_REFRESHED,
        }
    }

    /// Site the event is scoped to.
    pub fn site_id(&self) -> &SiteId {
        match self {
            ProfileEvent::Refreshed(event) => &event.site_id,
        }
    }
}

impl From<RefreshEvent> for ProfileEvent {
    fn from(value: RefreshEvent) -> Self {
        ProfileEvent::Refreshed(value)
    }
}
