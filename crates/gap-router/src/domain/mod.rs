//! Domain layer: the outstanding-query table and the forwarding decisions
//! built on top of it. No I/O, no IPC — every outbound dependency (codec,
//! bloom index, datastore, peer registry, cover-traffic admission) is
//! reached only through the ports the service layer is handed.

pub mod entities;
pub mod errors;
pub mod forwarding;
pub mod query_table;

pub use entities::{Fingerprint, GapConfig, QueryTableEntry, Requester};
pub use errors::GapError;
pub use forwarding::{decrement_priority, decrement_ttl, select_forward_peers, ForwardCandidate};
pub use query_table::QueryTable;
