//! Pure entities for the host registry, session cache, and bootstrap driver.
//!
//! No I/O lives here; everything is plain data plus the logic that only
//! needs its own fields (see `host_registry.rs`, `session_cache.rs`, and
//! `bootstrap.rs` for the operations built on top of these types).

use shared_types::entities::{HelloRecord, PeerId};

/// Capacity of the temporary-peer ring (unconfirmed HELLOs, not yet
/// PONG-confirmed and never persisted).
pub const TEMPORARY_RING_CAPACITY: usize = 32;

/// A slot in the temporary-peer ring.
#[derive(Debug, Clone)]
pub struct TemporarySlot {
    pub peer: PeerId,
    pub hello: HelloRecord,
}

/// Fixed-capacity round-robin ring of unconfirmed HELLOs.
///
/// A HELLO for a peer already present overwrites its existing slot rather
/// than consuming a fresh one, so one noisy peer can't push every other
/// temporary entry out.
#[derive(Debug, Default)]
pub struct TemporaryRing {
    slots: Vec<Option<TemporarySlot>>,
    next_slot: usize,
}

impl TemporaryRing {
    pub fn new() -> Self {
        Self { slots: vec![None; TEMPORARY_RING_CAPACITY], next_slot: 0 }
    }

    pub fn insert(&mut self, peer: PeerId, hello: HelloRecord) {
        if let Some(existing) = self.slots.iter_mut().flatten().find(|s| s.peer == peer) {
            existing.hello = hello;
            return;
        }
        self.slots[self.next_slot] = Some(TemporarySlot { peer, hello });
        self.next_slot = (self.next_slot + 1) % self.slots.len();
    }

    pub fn iter(&self) -> impl Iterator<Item = &TemporarySlot> {
        self.slots.iter().flatten()
    }

    pub fn get(&self, peer: PeerId) -> Vec<&TemporarySlot> {
        self.slots.iter().flatten().filter(|s| s.peer == peer).collect()
    }
}

/// A peer's trust value plus whether it has unflushed changes.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrustEntry {
    pub value: u32,
    pub dirty: bool,
}

/// A blacklist back-off window for one peer.
#[derive(Debug, Clone, Copy)]
pub struct BlacklistEntry {
    pub until: u64,
    pub strict: bool,
}

impl BlacklistEntry {
    #[must_use]
    pub fn covers(&self, now: u64, strict_query: bool) -> bool {
        now < self.until && (self.strict || !strict_query)
    }
}

/// Cap on a blacklist back-off window: 4 hours.
pub const MAX_BLACKLIST_DELTA_SECS: u64 = 4 * 60 * 60;

/// Persisted HELLOs older than this are pruned by the daily sweep.
pub const HOST_FILE_MAX_AGE_SECS: u64 = 90 * 24 * 60 * 60;

/// Interval between host-directory rescans.
pub const HOST_RESCAN_INTERVAL_SECS: u64 = 15 * 60;

/// Interval between stale-host-file sweeps.
pub const HOST_PRUNE_INTERVAL_SECS: u64 = 24 * 60 * 60;

/// Interval between dirty-trust flushes.
pub const TRUST_FLUSH_INTERVAL_SECS: u64 = 5 * 60;
