//! Inbound (driving) port: the two entry points a peer's wire traffic or a
//! local client feeds into this subsystem.

use shared_types::entities::{DatastoreBlock, PeerId, Query};

use crate::domain::{GapError, Requester};

/// Outcome of handling one inbound query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    /// Answered entirely from the local store; nothing was forwarded.
    AnsweredLocally { replies_sent: usize },
    /// Forwarded to `forwarded_to` peers after any local hits were sent.
    Forwarded { replies_sent: usize, forwarded_to: Vec<PeerId> },
    /// TTL was already exhausted and there were no local hits.
    Dropped,
}

/// Outcome of handling one inbound reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyOutcome {
    /// Stored and forwarded to every matching table entry's requester.
    Routed { forwarded_to: usize },
    /// The reply failed codec verification and was discarded.
    RejectedInvalid,
    /// No table entry matched; the reply was stored (if new) but nothing
    /// was forwarded.
    NoMatchingRequester,
}

/// The GAP query/response router (C10).
pub trait GapRouterApi: Send + Sync {
    /// Handles an inbound query from `from` (or a local client, via
    /// `Requester::LocalClient`) with the given TTL, priority, and
    /// anonymity level. `already_seen` carries the hop set the sender
    /// itself observed, so a query that has looped back through this node
    /// is not admitted a second time.
    #[allow(clippy::too_many_arguments)]
    fn handle_query(
        &self,
        query: Query,
        key_count: u32,
        ttl: i32,
        priority: u32,
        anonymity_level: u32,
        requester: Requester,
        already_seen: Vec<PeerId>,
    ) -> Result<QueryOutcome, GapError>;

    /// Handles an inbound reply for `query`, delivered by `delivered_by`.
    fn handle_reply(
        &self,
        query: Query,
        block: DatastoreBlock,
        delivered_by: PeerId,
    ) -> Result<ReplyOutcome, GapError>;

    /// Sweeps expired table entries; returns how many were removed.
    fn expire_stale(&self, now: u64) -> usize;

    /// Count of inbound queries dropped for load since startup.
    fn dropped_for_load(&self) -> u64;

    /// Current number of live table entries.
    fn table_len(&self) -> usize;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_outcome_variants_compare_by_value() {
        assert_eq!(QueryOutcome::Dropped, QueryOutcome::Dropped);
        assert_ne!(
            QueryOutcome::AnsweredLocally { replies_sent: 1 },
            QueryOutcome::AnsweredLocally { replies_sent: 2 }
        );
    }
}
