//! Ports Layer
//!
//! Driving (inbound) and driven (outbound) trait definitions for the
//! hexagonal architecture.

pub mod inbound;
pub mod outbound;

pub use inbound::BloomIndexApi;
pub use outbound::DatastoreKeyProvider;
