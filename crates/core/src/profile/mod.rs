//! Profile caching and refresh coordination

pub mod ports;
pub mod refresh;
pub mod stats;
pub mod store;

pub use ports::{EventBus, EventHandler, ProfileFetcher, Subscription};
pub use refresh::RefreshCoordinator;
pub use stats::ProfileCacheStats;
pub use store::{CachedProfile, ProfileStore};
