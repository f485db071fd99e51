//! Infrastructure error conversions

pub mod conversions;

pub use conversions::{exception_to_fetch_error, status_to_fetch_error, InfraError};
