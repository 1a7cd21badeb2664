//! GAP router error taxonomy.
//!
//! Collapses the OK/NO/SYSERR/FATAL distinction used throughout this
//! substrate into a single sum type. `NotFound` and `Rejected` are the "NO"
//! cases — they never propagate past the layer that produced them.
//! `TransientFailure` is "SYSERR" — logged and surfaced one layer up, never
//! retried here. There is no `Fatal` variant: nothing in query routing is
//! an unrecoverable init-time failure.

use shared_types::entities::PeerId;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GapError {
    /// No local hit and no further forwarding was possible (TTL exhausted
    /// or no eligible peers). Not an error condition callers should log.
    #[error("no route available for query")]
    NotFound,

    /// The table is at capacity; the query was dropped under load.
    #[error("query table full at capacity {capacity}")]
    TableFull { capacity: usize },

    /// A reply failed codec verification and was discarded.
    #[error("reply rejected: {reason}")]
    Rejected { reason: String },

    /// An outbound dependency (datastore, bloom index, peer registry,
    /// traffic accountant, codec) returned a transient failure.
    #[error("{dependency} unavailable: {detail}")]
    DependencyUnavailable { dependency: &'static str, detail: String },

    /// A peer a caller named is not known to this node.
    #[error("unknown peer {0:?}")]
    UnknownPeer(PeerId),
}
