//! # Core Events
//!
//! Defines all event types that flow through the shared bus. These are
//! fire-and-forget notifications for choreography between subsystems;
//! request/response traffic goes through `AuthenticatedMessage<T>` IPC
//! instead (see `shared-types::ipc`).

use serde::{Deserialize, Serialize};
use shared_types::entities::{BlockType, PeerId, Query};

/// All events that can be published to the event bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CoreEvent {
    // =========================================================================
    // C1: ECRS BLOCK CODEC
    // =========================================================================
    /// A block passed query-consistency verification.
    BlockVerified { query: Query, block_type: BlockType },

    /// A block failed query-consistency verification.
    BlockVerificationFailed { query: Query, reason: String },

    /// A plaintext was content-hash-key-encoded into a DATA block.
    BlockEncoded { query: Query },

    // =========================================================================
    // C2: BLOOM INDEX
    // =========================================================================
    /// The bloom filter was rebuilt from the datastore (e.g. after a resize).
    BloomIndexRebuilt { entry_count: usize },

    // =========================================================================
    // C4: DATASTORE MANAGER
    // =========================================================================
    /// A block was admitted and persisted to the store.
    BlockStored { query: Query, block_type: BlockType },

    /// A block was evicted to make room under the quota (low-priority
    /// eviction, not an explicit delete request).
    BlockEvicted { query: Query, reason: String },

    // =========================================================================
    // C6: PEER IDENTITY REGISTRY
    // =========================================================================
    /// A new peer HELLO was accepted and added to the registry.
    PeerDiscovered(PeerId),

    /// A peer was evicted from the registry (e.g. HELLO expired).
    PeerDisconnected(PeerId),

    /// A peer was blacklisted after repeated failures.
    PeerBlacklisted { peer: PeerId, until: u64 },

    // =========================================================================
    // C7: SESSION KEY CACHE
    // =========================================================================
    /// A session key was established (or refreshed) for a peer.
    SessionKeyEstablished { peer: PeerId },

    // =========================================================================
    // C8: TRAFFIC ACCOUNTANT
    // =========================================================================
    /// Cover traffic was insufficient to justify a send at the requested
    /// anonymity level; the GAP router should drop or delay.
    CoverTrafficInsufficient { level: u32 },

    // =========================================================================
    // C10: GAP ROUTER
    // =========================================================================
    /// A query was forwarded to one or more peers.
    QueryRouted { query: Query, ttl: u32 },

    /// A query was dropped (backpressure, no route, or TTL exhausted).
    QueryDropped { query: Query, reason: String },

    // =========================================================================
    // CRITICAL EVENTS (DLQ)
    // =========================================================================
    /// Critical error requiring operator attention.
    CriticalError { subsystem_id: u8, error: String },
}

impl CoreEvent {
    /// Get the topic for this event (for filtering).
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::BlockVerified { .. }
            | Self::BlockVerificationFailed { .. }
            | Self::BlockEncoded { .. } => EventTopic::EcrsCodec,
            Self::BloomIndexRebuilt { .. } => EventTopic::BloomIndex,
            Self::BlockStored { .. } | Self::BlockEvicted { .. } => EventTopic::Datastore,
            Self::PeerDiscovered(_) | Self::PeerDisconnected(_) | Self::PeerBlacklisted { .. } => {
                EventTopic::PeerRegistry
            }
            Self::SessionKeyEstablished { .. } => EventTopic::SessionCache,
            Self::CoverTrafficInsufficient { .. } => EventTopic::TrafficAccountant,
            Self::QueryRouted { .. } | Self::QueryDropped { .. } => EventTopic::GapRouter,
            Self::CriticalError { .. } => EventTopic::DeadLetterQueue,
        }
    }

    /// Get the originating subsystem ID.
    #[must_use]
    pub fn source_subsystem(&self) -> u8 {
        match self {
            Self::BlockVerified { .. }
            | Self::BlockVerificationFailed { .. }
            | Self::BlockEncoded { .. } => 1,
            Self::BloomIndexRebuilt { .. } => 2,
            Self::BlockStored { .. } | Self::BlockEvicted { .. } => 4,
            Self::PeerDiscovered(_) | Self::PeerDisconnected(_) | Self::PeerBlacklisted { .. } => 6,
            Self::SessionKeyEstablished { .. } => 7,
            Self::CoverTrafficInsufficient { .. } => 8,
            Self::QueryRouted { .. } | Self::QueryDropped { .. } => 10,
            Self::CriticalError { subsystem_id, .. } => *subsystem_id,
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// Subsystem 1 (ECRS block codec).
    EcrsCodec,
    /// Subsystem 2 (bloom index).
    BloomIndex,
    /// Subsystem 4 (datastore manager).
    Datastore,
    /// Subsystem 6 (peer identity registry).
    PeerRegistry,
    /// Subsystem 7 (session key cache).
    SessionCache,
    /// Subsystem 8 (traffic accountant).
    TrafficAccountant,
    /// Subsystem 10 (GAP router).
    GapRouter,
    /// Dead letter queue for critical errors.
    DeadLetterQueue,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
    /// Source subsystems to include. Empty means all sources.
    pub source_subsystems: Vec<u8>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self {
            topics,
            source_subsystems: Vec::new(),
        }
    }

    /// Create a filter for events from specific subsystems.
    #[must_use]
    pub fn from_subsystems(subsystems: Vec<u8>) -> Self {
        Self {
            topics: Vec::new(),
            source_subsystems: subsystems,
        }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &CoreEvent) -> bool {
        let topic_match = self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic());

        let source_match = self.source_subsystems.is_empty()
            || self.source_subsystems.contains(&event.source_subsystem());

        topic_match && source_match
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::entities::hash512;

    fn sample_query() -> Query {
        Query(hash512(b"sample"))
    }

    #[test]
    fn event_topic_mapping() {
        let event = CoreEvent::BlockStored {
            query: sample_query(),
            block_type: BlockType::Data,
        };
        assert_eq!(event.topic(), EventTopic::Datastore);
        assert_eq!(event.source_subsystem(), 4);
    }

    #[test]
    fn filter_all_matches_everything() {
        let filter = EventFilter::all();
        let event = CoreEvent::QueryRouted { query: sample_query(), ttl: 3 };
        assert!(filter.matches(&event));
    }

    #[test]
    fn filter_by_topic() {
        let filter = EventFilter::topics(vec![EventTopic::GapRouter]);

        let routed = CoreEvent::QueryRouted { query: sample_query(), ttl: 3 };
        assert!(filter.matches(&routed));

        let stored = CoreEvent::BlockStored {
            query: sample_query(),
            block_type: BlockType::Data,
        };
        assert!(!filter.matches(&stored));
    }

    #[test]
    fn filter_by_subsystem() {
        let filter = EventFilter::from_subsystems(vec![4, 10]);

        let stored = CoreEvent::BlockStored {
            query: sample_query(),
            block_type: BlockType::Data,
        };
        assert!(filter.matches(&stored));

        let peer_event = CoreEvent::PeerDiscovered(PeerId::from_public_key(&[0u8; 32]));
        assert!(!filter.matches(&peer_event));
    }
}
