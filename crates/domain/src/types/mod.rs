//! Domain types and models

pub mod event;
pub mod key;
pub mod profile;

pub use event::{ProfileEvent, RefreshEvent, PROFILE_REFRESHED};
pub use key::{ProfileKey, SiteId};
pub use profile::{CustomField, ProfileEntity, ProfileRole};
