//! Logging setup
//!
//! Installs the global `tracing` subscriber. `RUST_LOG` takes precedence over
//! the configured filter so operators can raise verbosity without editing
//! config files.

use tracing_subscriber::{fmt, EnvFilter};
use userdeck_domain::{ConfigError, ConfigResult, LoggingConfig};

/// Install the global subscriber described by `config`.
///
/// # Errors
/// Returns `ConfigError::Invalid` if the filter directive cannot be parsed or
/// a global subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> ConfigResult<()> {
    let filter = build_filter(config)?;
    let builder = fmt().with_env_filter(filter).with_target(false);

    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    installed.map_err(|e| ConfigError::Invalid(format!("failed to install logger: {e}")))
}

fn build_filter(config: &LoggingConfig) -> ConfigResult<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.filter)
            .map_err(|e| ConfigError::Invalid(format!("logging.filter: {e}"))),
    }
}
