//! Configuration loading
//!
//! Reads the application [`Config`](userdeck_domain::Config) from environment
//! variables or JSON/TOML files.

pub mod loader;

pub use loader::{load, load_from_env, load_from_file, probe_config_paths};
