//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load a single-site configuration from environment
//!    variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! Every loaded configuration is validated before it is returned.
//!
//! ## Environment Variables
//! - `USERDECK_SITE_ID`: Site identifier (required)
//! - `USERDECK_SITE_URL`: Site base URL (required)
//! - `USERDECK_SITE_TOKEN`: Web-service token (required)
//! - `USERDECK_CACHE_TTL`: Cache entry lifetime in seconds
//! - `USERDECK_HTTP_TIMEOUT`: Request timeout in seconds
//! - `USERDECK_HTTP_MAX_ATTEMPTS`: Attempts per request
//! - `USERDECK_LOG_FILTER`: Log filter directive
//! - `USERDECK_LOG_JSON`: Emit JSON logs (true/false)
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./config.json` or `./config.toml` (current working directory)
//! 2. `./userdeck.json` or `./userdeck.toml` (current working directory)
//! 3. `../config.json` or `../config.toml` (parent directory)
//! 4. Relative to executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;

use userdeck_domain::{Config, ConfigError, ConfigResult, SiteConfig, SiteId};

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If any required
/// variables are missing, falls back to loading from a config file. A
/// present but malformed environment value is reported, not skipped.
///
/// # Errors
/// Returns `ConfigError` if configuration cannot be loaded from either
/// source, an environment value is invalid, the file format is invalid, or
/// validation fails.
pub fn load() -> ConfigResult<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(ConfigError::Missing(reason)) => {
            tracing::debug!(%reason, "Environment configuration incomplete, trying file");
            load_from_file(None)
        }
        Err(e) => Err(e),
    }
}

/// Load configuration from environment variables
///
/// # Errors
/// Returns `ConfigError::Missing` if a required variable is absent and
/// `ConfigError::Invalid` if a value cannot be parsed.
pub fn load_from_env() -> ConfigResult<Config> {
    let site = SiteConfig {
        id: SiteId::new(env_var("USERDECK_SITE_ID")?),
        base_url: env_var("USERDECK_SITE_URL")?,
        token: env_var("USERDECK_SITE_TOKEN")?,
    };

    let mut config = Config { sites: vec![site], ..Config::default() };

    if let Some(ttl) = env_parse::<u64>("USERDECK_CACHE_TTL")? {
        config.cache.ttl_seconds = Some(ttl);
    }
    if let Some(timeout) = env_parse::<u64>("USERDECK_HTTP_TIMEOUT")? {
        config.http.timeout_seconds = timeout;
    }
    if let Some(attempts) = env_parse::<usize>("USERDECK_HTTP_MAX_ATTEMPTS")? {
        config.http.max_attempts = attempts;
    }
    if let Ok(filter) = std::env::var("USERDECK_LOG_FILTER") {
        config.logging.filter = filter;
    }
    config.logging.json = env_bool("USERDECK_LOG_JSON", false);

    config.validate()?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `ConfigError` if the file is missing or unreadable, the format is
/// invalid, or validation fails.
pub fn load_from_file(path: Option<PathBuf>) -> ConfigResult<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(ConfigError::Missing(format!("config file not found: {}", p.display())));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            ConfigError::Missing("no config file found in any of the standard locations".into())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| ConfigError::Io(format!("failed to read config file: {}", e)))?;

    let config = parse_config(&contents, &config_path)?;
    config.validate()?;
    Ok(config)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> ConfigResult<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| ConfigError::Parse(format!("invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| ConfigError::Parse(format!("invalid JSON format: {}", e))),
        _ => Err(ConfigError::Parse(format!("unsupported config format: {}", extension))),
    }
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    const NAMES: [&str; 4] = ["config.json", "config.toml", "userdeck.json", "userdeck.toml"];

    let mut roots = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        roots.push(cwd.clone());
        roots.push(cwd.join(".."));
    }
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            roots.push(exe_dir.to_path_buf());
        }
    }

    roots
        .iter()
        .flat_map(|root| NAMES.iter().map(move |name| root.join(name)))
        .find(|path| path.exists())
}

/// Get required environment variable
fn env_var(key: &str) -> ConfigResult<String> {
    std::env::var(key)
        .map_err(|_| ConfigError::Missing(format!("environment variable {}", key)))
}

/// Parse an optional environment variable
fn env_parse<T>(key: &str) -> ConfigResult<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::Invalid(format!("{}: {}", key, e))),
        Err(_) => Ok(None),
    }
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
