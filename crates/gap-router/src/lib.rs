//! # GAP Query/Response Router (C10)
//!
//! Routes content queries through the network: answers from the local
//! store where possible, forwards the rest to a weighted-random subset of
//! peers, and routes matching replies back to whoever is waiting on them.
//!
//! ## Indirection, not store-and-forward
//!
//! This node never retransmits — a query it cannot answer or forward is
//! simply dropped and counted. The outstanding-query table exists only so
//! that a reply arriving later can be matched back to its requester; it is
//! not a durable queue.
//!
//! ## Module layout (hexagonal architecture)
//!
//! ```text
//! domain/   - QueryTable, forwarding selection, TTL/priority decay, errors
//! ports/    - GapRouterApi (inbound); codec/bloom/datastore/peer-trust/
//!             cover-traffic/transport/time/random (outbound)
//! service/  - GapRouterService: the single-lock table + forwarding logic
//! handler/  - GAP_QUERY/GAP_RESULT wire framing and dispatch
//! adapters/ - event bus publication of routing outcomes
//! ```
//!
//! ## Locking order
//!
//! This crate's query-table lock is always acquired and released before
//! any call into the datastore or SQstore layers it depends on — never
//! held across one of those calls. See `service::router` for where the
//! lock scope ends relative to outbound calls.
//!
//! ## Outbound dependencies
//!
//! | Subsystem | Port | Purpose |
//! |-----------|------|---------|
//! | C1 (ECRS codec) | `BlockVerifier` | Verify replies before storing/forwarding |
//! | C2 (Bloom index) | `BloomIndex` | Cheap local-hit probe |
//! | C4 (Datastore) | `LocalStore` | Answer from, and store into, local content |
//! | C6 (Peer registry) | `PeerDirectory` | Forwarding candidates, trust updates |
//! | C8 (Traffic accountant) | `CoverTrafficGate` | Admission for anonymity-constrained replies |

pub mod adapters;
pub mod domain;
pub mod handler;
pub mod ports;
pub mod service;

pub use domain::*;
pub use handler::{dispatch_query, dispatch_reply, GapQueryMessage, GapResultMessage};
pub use ports::*;
pub use service::GapRouterService;
