//! Remote site web-service adapters

pub mod profile_fetcher;

pub use profile_fetcher::WebServiceProfileFetcher;
