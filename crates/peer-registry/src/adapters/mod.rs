pub mod bus_adapter;

pub use bus_adapter::{EventBusAdapter, RegistryBusAdapter};
