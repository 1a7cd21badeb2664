//! Outbound Ports (Driven Ports)
//!
//! The bloom index depends on the datastore manager to enumerate its keys
//! for a rebuild. The datastore crate implements this port; bloom-index
//! never calls it directly outside of `rebuild`.

use async_trait::async_trait;
use shared_types::entities::Query;

/// Enumerates every query key currently held by the datastore.
#[async_trait]
pub trait DatastoreKeyProvider: Send + Sync {
    /// All queries presently stored, in no particular order.
    async fn all_queries(&self) -> Result<Vec<Query>, String>;
}
