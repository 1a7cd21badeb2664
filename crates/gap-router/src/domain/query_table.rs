//! The in-memory indirection table: outstanding queries this node has
//! forwarded or answered, kept so a later reply can find its way back.
//!
//! Capacity-checked but with no priority queue of its own — eviction is
//! purely time-based via `sweep_expired`, matching the "no retransmission,
//! drop under load" backpressure rule for this layer.

use std::collections::HashMap;

use shared_types::entities::PeerId;

use super::entities::{Fingerprint, QueryTableEntry};
use super::errors::GapError;

pub struct QueryTable {
    entries: HashMap<Fingerprint, QueryTableEntry>,
    capacity: usize,
    dropped_for_load: u64,
}

impl QueryTable {
    pub fn new(capacity: usize) -> Self {
        Self { entries: HashMap::new(), capacity, dropped_for_load: 0 }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dropped_for_load(&self) -> u64 {
        self.dropped_for_load
    }

    pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.entries.contains_key(fingerprint)
    }

    pub fn get(&self, fingerprint: &Fingerprint) -> Option<&QueryTableEntry> {
        self.entries.get(fingerprint)
    }

    pub fn get_mut(&mut self, fingerprint: &Fingerprint) -> Option<&mut QueryTableEntry> {
        self.entries.get_mut(fingerprint)
    }

    /// Inserts a fresh entry, or refreshes an existing one's TTL/priority in
    /// place (a re-seen query for a fingerprint already being tracked).
    /// Fails with `TableFull` only when the fingerprint is new and the table
    /// is already at capacity; the caller counts this as one dropped
    /// request under load.
    pub fn insert_or_refresh(&mut self, entry: QueryTableEntry) -> Result<(), GapError> {
        if !self.entries.contains_key(&entry.fingerprint) && self.entries.len() >= self.capacity {
            self.dropped_for_load += 1;
            return Err(GapError::TableFull { capacity: self.capacity });
        }
        match self.entries.get_mut(&entry.fingerprint) {
            Some(existing) => {
                existing.ttl_remaining = existing.ttl_remaining.max(entry.ttl_remaining);
                existing.priority = existing.priority.max(entry.priority);
                existing.expires_at = existing.expires_at.max(entry.expires_at);
            }
            None => {
                self.entries.insert(entry.fingerprint, entry);
            }
        }
        Ok(())
    }

    /// Every live entry whose fingerprint's query matches `query`,
    /// regardless of key count — a reply answers the hash, not a specific
    /// multi-keyword combination.
    pub fn matching_entries(&mut self, query: shared_types::entities::Query) -> Vec<Fingerprint> {
        self.entries
            .iter()
            .filter(|(fp, _)| fp.query == query)
            .map(|(fp, _)| *fp)
            .collect()
    }

    /// Removes every entry past its deadline, returning how many were
    /// swept, for telemetry.
    pub fn sweep_expired(&mut self, now: u64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        before - self.entries.len()
    }

    /// Peers already crossed by any live entry for this fingerprint, used
    /// by the forwarding step to enforce the no-loop invariant.
    pub fn hop_seen_peers(&self, fingerprint: &Fingerprint) -> Vec<PeerId> {
        self.entries
            .get(fingerprint)
            .map(|e| e.hop_seen_peers.iter().copied().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Requester;
    use shared_types::entities::Query;

    fn fp(byte: u8) -> Fingerprint {
        Fingerprint::new(Query([byte; 64]), 1)
    }

    fn entry(fp: Fingerprint, ttl: i32, expires_at: u64) -> QueryTableEntry {
        QueryTableEntry::new(fp, ttl, 10, 0, Requester::LocalClient(uuid::Uuid::new_v4()), 0, expires_at)
    }

    #[test]
    fn a_table_at_capacity_drops_new_fingerprints_but_still_refreshes_known_ones() {
        let mut table = QueryTable::new(1);
        table.insert_or_refresh(entry(fp(1), 10, 100)).unwrap();
        assert!(matches!(table.insert_or_refresh(entry(fp(2), 10, 100)), Err(GapError::TableFull { .. })));
        assert_eq!(table.dropped_for_load(), 1);

        table.insert_or_refresh(entry(fp(1), 20, 200)).unwrap();
        assert_eq!(table.get(&fp(1)).unwrap().ttl_remaining, 20);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn sweeping_removes_only_entries_past_their_deadline() {
        let mut table = QueryTable::new(10);
        table.insert_or_refresh(entry(fp(1), 10, 50)).unwrap();
        table.insert_or_refresh(entry(fp(2), 10, 150)).unwrap();
        assert_eq!(table.sweep_expired(100), 1);
        assert!(!table.contains(&fp(1)));
        assert!(table.contains(&fp(2)));
    }

    #[test]
    fn matching_entries_ignores_key_count() {
        let mut table = QueryTable::new(10);
        let q = Query([9; 64]);
        table.insert_or_refresh(entry(Fingerprint::new(q, 1), 10, 100)).unwrap();
        table.insert_or_refresh(entry(Fingerprint::new(q, 2), 10, 100)).unwrap();
        assert_eq!(table.matching_entries(q).len(), 2);
    }
}
