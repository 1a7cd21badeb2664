//! Adapters layer: publishes routing outcomes to the shared event bus.

pub mod bus_adapter;

pub use bus_adapter::{EventBusAdapter, GapRouterBusAdapter};
