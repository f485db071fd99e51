//! Configuration structures
//!
//! Loading lives in `userdeck-infra`; this module only defines the shape and
//! the validation rules.

use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::{ConfigError, ConfigResult};
use crate::types::SiteId;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub sites: Vec<SiteConfig>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Profile cache behaviour
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum age of a cached profile. `None` keeps entries until they are
    /// invalidated.
    #[serde(default)]
    pub ttl_seconds: Option<u64>,
}

impl CacheConfig {
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl_seconds.map(Duration::from_secs)
    }
}

/// HTTP transport settings for the web-service fetcher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    /// Total attempts per request (initial try + retries)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
    #[serde(default = "default_base_backoff_ms")]
    pub base_backoff_ms: u64,
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout_seconds(),
            max_attempts: default_max_attempts(),
            base_backoff_ms: default_base_backoff_ms(),
            user_agent: None,
        }
    }
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_max_attempts() -> usize {
    3
}

fn default_base_backoff_ms() -> u64 {
    200
}

/// A remote site the profiles are fetched from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteConfig {
    pub id: SiteId,
    pub base_url: String,
    pub token: String,
}

/// Logging output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `userdeck_core=debug`
    #[serde(default = "default_log_filter")]
    pub filter: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { filter: default_log_filter(), json: false }
    }
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Config {
    /// Look up a configured site.
    pub fn site(&self, id: &SiteId) -> Option<&SiteConfig> {
        self.sites.iter().find(|site| &site.id == id)
    }

    /// Check invariants that serde cannot express.
    ///
    /// # Errors
    /// Returns `ConfigError::Invalid` for empty or duplicate site ids, base
    /// URLs that are not http(s), empty tokens, or a zero timeout.
    pub fn validate(&self) -> ConfigResult<()> {
        let mut seen = HashSet::new();
        for site in &self.sites {
            if site.id.as_str().trim().is_empty() {
                return Err(ConfigError::Invalid("site id must not be empty".into()));
            }
            if !seen.insert(&site.id) {
                return Err(ConfigError::Invalid(format!("duplicate site id: {}", site.id)));
            }
            let url = Url::parse(&site.base_url).map_err(|e| {
                ConfigError::Invalid(format!("site {}: invalid base_url: {}", site.id, e))
            })?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(ConfigError::Invalid(format!(
                    "site {}: unsupported scheme {}",
                    site.id,
                    url.scheme()
                )));
            }
            if site.token.is_empty() {
                return Err(ConfigError::Invalid(format!("site {}: token is empty", site.id)));
            }
        }

        if self.http.timeout_seconds == 0 {
            return Err(ConfigError::Invalid("http.timeout_seconds must be positive".into()));
        }

        Ok(())
    }
}
