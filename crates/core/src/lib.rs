//! # Userdeck Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - The profile cache with coalesced remote fetches
//! - The refresh coordinator that publishes refresh notifications
//! - Port interfaces (traits) for the remote source and the event bus
//!
//! ## Architecture Principles
//! - Only depends on `userdeck-domain`
//! - No HTTP or platform code
//! - All external dependencies via traits

pub mod profile;

pub use profile::ports::{EventBus, EventHandler, ProfileFetcher, Subscription};
pub use profile::{CachedProfile, ProfileCacheStats, ProfileStore, RefreshCoordinator};
