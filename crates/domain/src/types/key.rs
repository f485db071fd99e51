//! Cache identity types

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a remote site (tenant)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SiteId(String);

impl SiteId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SiteId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SiteId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for SiteId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Composite cache key for a profile: (user, context, site).
///
/// A missing context is its own key value and never aliases a concrete
/// context id, `Some(0)` included.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProfileKey {
    pub user_id: i64,
    pub context_id: Option<i64>,
    pub site_id: SiteId,
}

impl ProfileKey {
    pub fn new(user_id: i64, context_id: Option<i64>, site_id: impl Into<SiteId>) -> Self {
        Self { user_id, context_id, site_id: site_id.into() }
    }

    /// Key for the profile without any context scoping.
    pub fn without_context(user_id: i64, site_id: impl Into<SiteId>) -> Self {
        Self::new(user_id, None, site_id)
    }
}

impl fmt::Display for ProfileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.context_id {
            Some(context_id) => write!(f, "{}/{}@{}", self.site_id, self.user_id, context_id),
            None => write!(f, "{}/{}", self.site_id, self.user_id),
        }
    }
}
