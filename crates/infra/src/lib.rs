//! # Userdeck Infrastructure
//!
//! Infrastructure implementations of the core profile ports.
//!
//! This crate contains:
//! - The web-service profile fetcher and its HTTP client
//! - An in-process event bus
//! - Configuration loading and logging setup
//! - [`ProfileContext`], which wires everything together
//!
//! ## Architecture
//! - Implements traits defined in `userdeck-core`
//! - Depends on `userdeck-domain` and `userdeck-core`
//! - Contains all "impure" code (network, environment, files)

pub mod config;
pub mod context;
pub mod errors;
pub mod events;
pub mod http;
pub mod observability;
pub mod webservice;

// Re-export commonly used items
pub use context::ProfileContext;
pub use errors::InfraError;
pub use events::InMemoryEventBus;
pub use http::{HttpClient, HttpClientBuilder};
pub use observability::init_logging;
pub use webservice::WebServiceProfileFetcher;
