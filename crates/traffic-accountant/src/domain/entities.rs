//! Plain data for the traffic accountant: per-slot counters, the rotating
//! window built from them, and the peer-diversity ring.
//!
//! No I/O lives here — see `window.rs` for the advance/record logic built
//! on these types, and `service/accountant.rs` for the part that talks to
//! a clock.

/// Number of slots in a rotating window (`H` in the accounting contract).
pub const WINDOW_SLOTS: usize = 32;

/// Duration of one slot, in seconds (`U` in the accounting contract).
pub const SLOT_DURATION_SECS: u64 = 5;

/// Capacity of the peer-diversity ring.
pub const DIVERSITY_CAPACITY: usize = 15;

/// Which way a message crossed the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageDirection {
    Sent,
    Received,
}

/// One slot's running tally: a count plus a running average size, updated
/// sample by sample rather than from a stored sum (so a slot never needs
/// to remember how many bytes it has seen in total, only the average).
#[derive(Debug, Clone, Copy, Default)]
pub struct Slot {
    pub count: u32,
    pub avg_size: f64,
}

impl Slot {
    pub fn record(&mut self, size: u32) {
        self.count += 1;
        self.avg_size += (f64::from(size) - self.avg_size) / f64::from(self.count);
    }
}

/// A diversity-ring entry: the first four bytes of a peer's identity plus
/// the window slot its most recent interaction landed in.
#[derive(Debug, Clone, Copy)]
pub struct DiversityEntry {
    pub peer_prefix: [u8; 4],
    pub slot_index: usize,
}

/// Fixed-capacity ring of recent distinct peers, for the diversity half of
/// `cover_sufficient`'s admission check. A peer already in the ring
/// refreshes its existing entry in place rather than consuming a fresh
/// slot, so the ring's occupancy is always its distinct-peer count.
#[derive(Debug, Default)]
pub struct DiversityRing {
    entries: Vec<Option<DiversityEntry>>,
    next_slot: usize,
}

impl DiversityRing {
    pub fn new() -> Self {
        Self { entries: vec![None; DIVERSITY_CAPACITY], next_slot: 0 }
    }

    /// Insert a fresh sighting of `peer_prefix`, or refresh it if already
    /// present. When the ring is full of other peers, the least-recently
    /// touched slot (the next one due for round-robin reuse) is replaced.
    pub fn insert_or_refresh(&mut self, peer_prefix: [u8; 4], slot_index: usize) {
        if let Some(existing) =
            self.entries.iter_mut().flatten().find(|e| e.peer_prefix == peer_prefix)
        {
            existing.slot_index = slot_index;
            return;
        }
        self.entries[self.next_slot] = Some(DiversityEntry { peer_prefix, slot_index });
        self.next_slot = (self.next_slot + 1) % self.entries.len();
    }

    /// Count ring entries whose slot is still live in `mask` — the bitmask
    /// of slots touched within the current window. A peer's entry survives
    /// in the ring past its slot aging out (the ring has no eviction timer
    /// of its own), so without this filter a peer seen once, long ago,
    /// would count toward diversity forever. Mirrors the original
    /// accounting module's recency check on each ring entry at query time.
    pub fn distinct_peer_count(&self, mask: u32) -> usize {
        self.entries
            .iter()
            .flatten()
            .filter(|e| mask & (1 << e.slot_index) != 0)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_running_average_tracks_samples() {
        let mut slot = Slot::default();
        slot.record(100);
        slot.record(200);
        assert_eq!(slot.count, 2);
        assert_eq!(slot.avg_size, 150.0);
    }

    #[test]
    fn diversity_ring_refresh_does_not_grow_occupancy() {
        let mut ring = DiversityRing::new();
        ring.insert_or_refresh([1, 2, 3, 4], 0);
        ring.insert_or_refresh([1, 2, 3, 4], 5);
        assert_eq!(ring.distinct_peer_count(u32::MAX), 1);
    }

    #[test]
    fn diversity_ring_evicts_round_robin_when_full() {
        let mut ring = DiversityRing::new();
        for i in 0..DIVERSITY_CAPACITY {
            ring.insert_or_refresh([i as u8, 0, 0, 0], 0);
        }
        assert_eq!(ring.distinct_peer_count(u32::MAX), DIVERSITY_CAPACITY);
        ring.insert_or_refresh([99, 0, 0, 0], 0);
        assert_eq!(ring.distinct_peer_count(u32::MAX), DIVERSITY_CAPACITY);
    }

    #[test]
    fn a_slot_that_has_aged_out_of_the_mask_no_longer_counts() {
        let mut ring = DiversityRing::new();
        ring.insert_or_refresh([1, 2, 3, 4], 3);
        assert_eq!(ring.distinct_peer_count(1 << 3), 1);
        assert_eq!(ring.distinct_peer_count(1 << 7), 0);
    }
}
