//! Outbound (driven) ports: everything the GAP router calls out to but
//! does not own. Every one of these mirrors a request this subsystem is
//! authorized to send per the cross-subsystem authorization matrix — codec
//! verification (C1), bloom membership (C2), the datastore (C4), peer
//! trust (C6), and cover-traffic admission (C8). The actual wiring from
//! these traits to the sibling crates' real services is the composition
//! root's job, not this crate's; these are plain synchronous contracts so
//! unit tests can supply in-memory fakes.

use shared_types::entities::{BlockType, DatastoreBlock, PeerId, Query};

use crate::domain::forwarding::ForwardCandidate;

/// C1: verifies that a reply's payload is a well-formed block for its
/// claimed query and type.
pub trait BlockVerifier: Send + Sync {
    fn verify(&self, query: Query, block_type: BlockType, payload: &[u8]) -> bool;
}

/// C2: cheap membership probe and index maintenance, so most local misses
/// never touch the datastore at all.
pub trait BloomIndex: Send + Sync {
    fn maybe_present(&self, query: Query) -> bool;
    fn update(&self, query: Query, insert: bool);
}

/// C4: the quota-enforcing store this node answers queries from and files
/// replies into.
pub trait LocalStore: Send + Sync {
    fn get(&self, query: Query, block_type: Option<BlockType>) -> Vec<DatastoreBlock>;

    /// Returns `true` if the block was newly stored, `false` if it was a
    /// duplicate the datastore silently ignored (the "NO" case — never an
    /// error from this port's point of view).
    fn put(&self, query: Query, block: DatastoreBlock) -> bool;
}

/// C6: peer trust accounting and the candidate pool forwarding selects
/// over.
pub trait PeerDirectory: Send + Sync {
    fn forward_candidates(&self) -> Vec<ForwardCandidate>;
    fn change_trust(&self, peer: PeerId, delta: i64) -> i64;
}

/// C8: cover-traffic admission gating replies sent under an anonymity
/// constraint. Never gates forwarding, only the replies this node sends.
pub trait CoverTrafficGate: Send + Sync {
    fn cover_sufficient(&self, message_type: u16, anonymity_level: u32) -> bool;
}

/// The wire-level send: handing a query or reply to a specific peer's
/// outbound buffer. Fire-and-forget at this layer — no retransmission, no
/// delivery confirmation.
pub trait PeerTransport: Send + Sync {
    fn send_query(&self, peer: PeerId, fingerprint_bytes: &[u8]);
    fn send_reply(&self, peer: PeerId, block: &DatastoreBlock);
}

pub trait TimeSource: Send + Sync {
    fn now(&self) -> u64;
}

#[derive(Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

/// Randomness abstraction for TTL jitter and weighted peer selection, kept
/// testable the same way the rest of this substrate keeps its randomness
/// testable.
pub trait RandomSource: Send + Sync {
    /// A value in `0..upper_exclusive`, or `0` if `upper_exclusive == 0`.
    fn gen_range(&self, upper_exclusive: i32) -> i32;
    /// A value in `[0.0, 1.0)`.
    fn gen_unit(&self) -> f64;
}

pub struct ThreadRngSource;

impl RandomSource for ThreadRngSource {
    fn gen_range(&self, upper_exclusive: i32) -> i32 {
        if upper_exclusive == 0 {
            return 0;
        }
        rand::Rng::gen_range(&mut rand::thread_rng(), 0..upper_exclusive)
    }

    fn gen_unit(&self) -> f64 {
        rand::Rng::gen_range(&mut rand::thread_rng(), 0.0..1.0)
    }
}

#[cfg(test)]
pub mod test_doubles {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;

    pub struct FixedTime(pub AtomicU64);

    impl TimeSource for FixedTime {
        fn now(&self) -> u64 {
            self.0.load(Ordering::SeqCst)
        }
    }

    pub struct FixedRandom {
        pub range: i32,
        pub unit: f64,
    }

    impl RandomSource for FixedRandom {
        fn gen_range(&self, upper_exclusive: i32) -> i32 {
            if upper_exclusive == 0 {
                0
            } else {
                self.range % upper_exclusive
            }
        }

        fn gen_unit(&self) -> f64 {
            self.unit
        }
    }

    #[derive(Default)]
    pub struct InMemoryLocalStore {
        rows: Mutex<HashMap<Query, Vec<DatastoreBlock>>>,
    }

    impl LocalStore for InMemoryLocalStore {
        fn get(&self, query: Query, block_type: Option<BlockType>) -> Vec<DatastoreBlock> {
            self.rows
                .lock()
                .unwrap()
                .get(&query)
                .map(|blocks| {
                    blocks
                        .iter()
                        .filter(|b| block_type.map_or(true, |t| b.header.block_type == t))
                        .cloned()
                        .collect()
                })
                .unwrap_or_default()
        }

        fn put(&self, query: Query, block: DatastoreBlock) -> bool {
            let mut rows = self.rows.lock().unwrap();
            let entry = rows.entry(query).or_default();
            if entry.iter().any(|b| b.payload == block.payload) {
                return false;
            }
            entry.push(block);
            true
        }
    }
}
