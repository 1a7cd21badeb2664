//! Adapters Layer (Driven Adapters)
//!
//! Infrastructure adapters implementing the outbound/side-effecting half of
//! the hexagonal architecture.
//!
//! ## Adapters
//!
//! - `EventBusAdapter` - rebuilds the index and publishes `BloomIndexRebuilt`
//! - `FileIndexStore` - loads/saves the filter's raw bytes to a fixed-size file

pub mod bus_adapter;
pub mod persistence;

pub use bus_adapter::{BloomIndexBusAdapter, EventBusAdapter};
pub use persistence::FileIndexStore;
