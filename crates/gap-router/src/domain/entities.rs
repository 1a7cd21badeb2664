//! Outstanding-query bookkeeping: the fingerprint a query is tracked under,
//! who to send matching replies back to, and one table row's full state.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use shared_types::entities::{PeerId, Query};
use uuid::Uuid;

/// Identifies one outstanding query: the query hash plus the key count it
/// was issued with. Two requests for the same hash but different key counts
/// (multi-keyword AND search) are tracked as distinct entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint {
    pub query: Query,
    pub key_count: u32,
}

impl Fingerprint {
    pub fn new(query: Query, key_count: u32) -> Self {
        Self { query, key_count }
    }
}

/// Who a reply for a tracked query should ultimately go to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Requester {
    /// The query arrived from another peer; forward replies back to it.
    Peer(PeerId),
    /// The query originated at a local client session.
    LocalClient(Uuid),
}

/// One row of the indirection table: a query this node forwarded or
/// answered, kept around so a later reply can be routed back.
#[derive(Debug, Clone)]
pub struct QueryTableEntry {
    pub fingerprint: Fingerprint,
    pub ttl_remaining: i32,
    pub priority: u32,
    pub anonymity_level: u32,
    pub requester: Requester,
    pub started_at: u64,
    /// Peers this query has already passed through; never forward to one
    /// of these again (see the no-loop invariant).
    pub hop_seen_peers: HashSet<PeerId>,
    /// Payload hashes already delivered to `requester`, so a duplicate
    /// reply for the same query is suppressed instead of forwarded twice.
    pub delivered_payload_hashes: HashSet<[u8; 32]>,
    pub expires_at: u64,
}

impl QueryTableEntry {
    pub fn new(
        fingerprint: Fingerprint,
        ttl_remaining: i32,
        priority: u32,
        anonymity_level: u32,
        requester: Requester,
        started_at: u64,
        expires_at: u64,
    ) -> Self {
        Self {
            fingerprint,
            ttl_remaining,
            priority,
            anonymity_level,
            requester,
            started_at,
            hop_seen_peers: HashSet::new(),
            delivered_payload_hashes: HashSet::new(),
            expires_at,
        }
    }

    pub fn has_seen(&self, peer: PeerId) -> bool {
        self.hop_seen_peers.contains(&peer)
    }

    pub fn mark_seen(&mut self, peer: PeerId) {
        self.hop_seen_peers.insert(peer);
    }

    /// Records a delivered payload hash. Returns `true` if this is the
    /// first time this payload has been delivered for this entry, `false`
    /// if it is a duplicate that should not be forwarded again.
    pub fn record_delivery(&mut self, payload_hash: [u8; 32]) -> bool {
        self.delivered_payload_hashes.insert(payload_hash)
    }

    pub fn is_expired(&self, now: u64) -> bool {
        now >= self.expires_at
    }
}

/// Tunable constants governing forwarding fan-out, TTL/priority decay, and
/// table lifetime. Defaults mirror the order of magnitude used elsewhere
/// in this substrate for similarly-scoped caches.
#[derive(Debug, Clone, Copy)]
pub struct GapConfig {
    /// Maximum outstanding table entries; beyond this, inbound queries are
    /// dropped and counted rather than admitted.
    pub max_table_entries: usize,
    /// Number of peers a query is forwarded to per hop, when eligible.
    pub forward_peer_count: usize,
    /// Base TTL decrement applied on every forward, before jitter.
    pub ttl_decrement_base: i32,
    /// Upper bound (exclusive) of the random jitter added to the TTL
    /// decrement, so forwarding chains can't be fingerprinted by their TTL
    /// decay rate alone.
    pub ttl_decrement_jitter_max: i32,
    /// Seconds per unit of TTL, used to compute a table entry's expiry.
    pub ttl_unit_secs: u64,
    /// Extra seconds of slack added past `ttl * ttl_unit_secs` before a
    /// table entry expires, to tolerate reply latency.
    pub table_entry_slack_secs: u64,
}

impl Default for GapConfig {
    fn default() -> Self {
        Self {
            max_table_entries: 4096,
            forward_peer_count: 3,
            ttl_decrement_base: 2,
            ttl_decrement_jitter_max: 3,
            ttl_unit_secs: 1,
            table_entry_slack_secs: 30,
        }
    }
}
