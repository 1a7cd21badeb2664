//! # Node Runtime
//!
//! The composition root for a GNUnet-style core node: builds the ten
//! subsystems (C1-C10), wires the GAP router's outbound ports to its
//! siblings' authenticated IPC surfaces, and drives their lifecycle
//! through the shared [`shared_types::subsystem_registry::SubsystemRegistry`].
//!
//! ```text
//! config/   - NodeConfig (FS/GNUNETD/NETWORK/LOAD sections)
//! error/    - CoreError, Outcome<T>
//! adapters/ - gap-router outbound port adapters, signed-IPC client helper
//! wiring/   - builds every subsystem and its registry entry
//! ```

pub mod adapters;
pub mod config;
pub mod error;
pub mod wiring;

pub use config::NodeConfig;
pub use error::{CoreError, Outcome};
