//! Event delivery adapters

pub mod bus;

pub use bus::InMemoryEventBus;
