//! Inbound Ports (Driving Ports)
//!
//! The API other subsystems call: the GAP router's local lookup step tests
//! membership before forwarding a query onward, and the datastore manager
//! keeps the index in sync on every put/delete.

use crate::error::BloomError;
use crate::ports::outbound::DatastoreKeyProvider;
use async_trait::async_trait;
use shared_types::entities::Query;

/// Primary bloom index API (Driving Port).
#[async_trait]
pub trait BloomIndexApi: Send + Sync {
    /// Record that `query` was stored.
    fn insert(&self, query: &Query);

    /// Record that `query` was deleted. Accurate only if `query` was
    /// inserted exactly once since the last full rebuild.
    fn remove(&self, query: &Query);

    /// "maybe" (`true`) or "no" (`false`) — never a false negative.
    fn test(&self, query: &Query) -> bool;

    /// Rebuild the filter from scratch by iterating every key `source`
    /// holds. Returns the number of keys re-inserted.
    async fn rebuild(&self, source: &(dyn DatastoreKeyProvider + Sync)) -> Result<usize, BloomError>;
}
