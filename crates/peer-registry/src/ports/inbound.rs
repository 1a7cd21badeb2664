//! Driving ports (API): what the rest of the node calls on the host
//! registry (C6), session cache (C7), and bootstrap driver (C9).

use crate::domain::RegistryError;
use shared_types::entities::{HelloRecord, PeerId};

/// Either a specific protocol number or "any protocol this peer advertises".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolFilter {
    Any,
    Only(u16),
}

pub trait HostRegistryApi: Send + Sync {
    /// Verify identity-key consistency, keep the later of any existing
    /// HELLO for `(peer, protocol)`, and persist the winner.
    fn add_host(&self, hello: HelloRecord) -> Result<(), RegistryError>;

    /// Insert into the fixed-capacity temporary ring; never persisted.
    fn add_temporary(&self, hello: HelloRecord);

    /// A copy of a cached HELLO for `peer`. When `protocol` is `Any` and
    /// more than one matches, one is picked uniformly at random.
    fn identity_to_hello(
        &self,
        peer: PeerId,
        protocol: ProtocolFilter,
        allow_temporary: bool,
    ) -> Option<HelloRecord>;

    /// Visit every persistent host, plus temporary hosts that are either
    /// not currently blacklisted or `now == 0`.
    fn for_each_host(&self, now: u64, visit: &mut dyn FnMut(PeerId, &HelloRecord));

    /// Saturating trust adjustment; marks the entry dirty for the next
    /// periodic flush. Returns the delta actually applied.
    fn change_trust(&self, peer: PeerId, delta: i64) -> i64;

    /// The trust value currently cached for `peer` (0 if never seen).
    /// A pure read: unlike `change_trust`, never marks the entry dirty.
    fn current_trust(&self, peer: PeerId) -> u32;

    fn blacklist(&self, peer: PeerId, desperation: u32, strict: bool);
    fn whitelist(&self, peer: PeerId);
    fn is_blacklisted(&self, peer: PeerId, strict_query: bool) -> bool;

    /// Verify `signature` over `message` using the public key from any
    /// cached HELLO for `peer` (persistent or temporary).
    fn verify_peer_signature(&self, peer: PeerId, message: &[u8], signature: &[u8]) -> bool;

    /// Notified by the transport layer when a peer connects or drops, so
    /// the bootstrap driver can read `connected_count()`.
    fn record_connected(&self, peer: PeerId);
    fn record_disconnected(&self, peer: PeerId);
    fn connected_count(&self) -> usize;

    /// Flush dirty trust entries to durable storage. Called every 5
    /// minutes; also safe to call on demand.
    fn flush_trust(&self) -> Result<usize, RegistryError>;

    /// Rescan the host directory, drop files that don't match the naming
    /// convention. Called every 15 minutes.
    fn rescan_hosts(&self) -> Result<usize, RegistryError>;

    /// Delete persisted HELLOs older than 90 days. Called every 24 hours.
    fn prune_stale_hosts(&self, now: u64) -> Result<usize, RegistryError>;
}

pub trait SessionCacheApi: Send + Sync {
    #[allow(clippy::too_many_arguments)]
    fn get(&self, peer: PeerId, session_key: [u8; 32], time_limit: u64, message_size: u32) -> Option<Vec<u8>>;
    fn put(&self, peer: PeerId, session_key: [u8; 32], time_limit: u64, message_size: u32, message: Vec<u8>);

    /// The session key currently established with `peer`, if a key
    /// exchange has completed and nothing has invalidated it since.
    /// Distinct from `get`/`put`, which dedup in-flight exchange messages
    /// rather than track the exchange's outcome.
    fn established_key(&self, peer: PeerId) -> Option<[u8; 32]>;
    fn record_established(&self, peer: PeerId, session_key: [u8; 32]);
}

#[async_trait::async_trait]
pub trait BootstrapDriverApi: Send + Sync {
    /// Run one 2-second tick of the state machine; `true` if a bootstrap
    /// round was triggered this tick.
    async fn tick(&self, now: u64) -> bool;

    /// Whether the driver currently considers the node settled (connection
    /// count at or above target).
    fn is_settled(&self) -> bool;
}
