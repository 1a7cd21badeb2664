//! Hexagonal architecture boundaries for the GAP router.
//!
//! - Inbound: `GapRouterApi`, the query/reply entry points.
//! - Outbound: codec verification, bloom membership, the datastore, peer
//!   trust, cover-traffic admission, peer transport, time, and randomness.

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
