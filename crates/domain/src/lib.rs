//! # Userdeck Domain
//!
//! Business domain types and models for Userdeck.
//!
//! This crate contains:
//! - Profile data types and their derived flags
//! - Cache keys and refresh notification payloads
//! - Domain error types and Result definitions
//! - Configuration structures
//!
//! ## Architecture
//! - No dependencies on other Userdeck crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
