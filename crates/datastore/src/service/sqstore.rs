//! SQstore (C3): an ordered, file-backed block store keyed by a monotonic
//! row id, with secondary indices for every iteration order GAP routing
//! and the manager's maintenance loop need.

use crate::domain::{DatastoreError, KVStoreError, StoredRow};
use crate::ports::inbound::{IterControl, SqstoreApi};
use crate::ports::outbound::{BatchOperation, KeyValueStore};
use rand::Rng;
use shared_types::entities::{BlockType, Query};
use std::sync::RwLock;

/// Rows are stored under `row:<row_id big-endian>` so a prefix scan yields
/// them in row-id order; every other order is computed in memory from a
/// cached copy of the live rows, since the corpus this store runs over
/// (single-node quota-bounded content cache) fits comfortably in memory.
struct Index {
    rows: std::collections::BTreeMap<u64, StoredRow>,
    next_row_id: u64,
    total_size: u64,
}

impl Index {
    fn live_iter<'a>(&'a self, now: u64) -> impl Iterator<Item = &'a StoredRow> {
        self.rows.values().filter(move |r| !r.is_expired(now))
    }
}

pub struct SqstoreService<KV: KeyValueStore> {
    kv: RwLock<KV>,
    index: RwLock<Index>,
}

fn row_key(row_id: u64) -> Vec<u8> {
    let mut k = Vec::with_capacity(12);
    k.extend_from_slice(b"row:");
    k.extend_from_slice(&row_id.to_be_bytes());
    k
}

impl<KV: KeyValueStore> SqstoreService<KV> {
    pub fn new(kv: KV) -> Result<Self, DatastoreError> {
        let rows = Self::load_rows(&kv)?;
        let total_size = rows.values().map(|r| r.size()).sum();
        let next_row_id = rows.keys().next_back().map(|id| id + 1).unwrap_or(0);
        Ok(Self {
            kv: RwLock::new(kv),
            index: RwLock::new(Index { rows, next_row_id, total_size }),
        })
    }

    fn load_rows(kv: &KV) -> Result<std::collections::BTreeMap<u64, StoredRow>, DatastoreError> {
        let mut rows = std::collections::BTreeMap::new();
        for (key, value) in kv.prefix_scan(b"row:").map_err(DatastoreError::Backend)? {
            if key.len() != 12 {
                continue;
            }
            let row_id = u64::from_be_bytes(key[4..12].try_into().unwrap());
            let row: StoredRow = bincode::deserialize(&value)
                .map_err(|e| DatastoreError::Serialization(e.to_string()))?;
            rows.insert(row_id, row);
        }
        Ok(rows)
    }

    fn persist(&self, row: &StoredRow) -> Result<(), DatastoreError> {
        let bytes =
            bincode::serialize(row).map_err(|e| DatastoreError::Serialization(e.to_string()))?;
        self.kv
            .write()
            .unwrap()
            .put(&row_key(row.row_id), &bytes)
            .map_err(DatastoreError::Backend)
    }

    fn remove_persisted(&self, row_id: u64) -> Result<(), DatastoreError> {
        self.kv
            .write()
            .unwrap()
            .delete(&row_key(row_id))
            .map_err(DatastoreError::Backend)
    }

    /// Visits `ordered` (a snapshot taken with the index lock already
    /// released) and deletes afterward — never while still holding the
    /// read lock `ordered` was collected under, or a `DeleteAndContinue`
    /// deadlocks against `delete`'s write lock.
    fn walk_ordered<I>(&self, ordered: I, visit: &mut dyn FnMut(&StoredRow) -> IterControl)
    where
        I: Iterator<Item = StoredRow>,
    {
        let mut to_delete = Vec::new();
        for row in ordered {
            match visit(&row) {
                IterControl::Continue => continue,
                IterControl::DeleteAndContinue => {
                    to_delete.push(row.row_id);
                }
                IterControl::Abort => break,
            }
        }
        for row_id in to_delete {
            let _ = self.delete(row_id);
        }
    }
}

impl<KV: KeyValueStore> SqstoreApi for SqstoreService<KV> {
    fn put(
        &self,
        query: Query,
        block_type: BlockType,
        priority: u32,
        anonymity_level: u32,
        expiration_time: u64,
        payload: Vec<u8>,
    ) -> Result<u64, DatastoreError> {
        let row_id = {
            let mut index = self.index.write().unwrap();
            let row_id = index.next_row_id;
            index.next_row_id += 1;
            row_id
        };
        let row = StoredRow { row_id, query, block_type, priority, anonymity_level, expiration_time, payload };
        self.persist(&row)?;
        let mut index = self.index.write().unwrap();
        index.total_size += row.size();
        index.rows.insert(row_id, row);
        Ok(row_id)
    }

    fn get(&self, query: &Query, block_type: Option<BlockType>) -> Result<Vec<StoredRow>, DatastoreError> {
        let index = self.index.read().unwrap();
        let now = current_unix_time();
        let mut matches: Vec<&StoredRow> = index
            .live_iter(now)
            .filter(|r| &r.query == query && block_type.map(|bt| bt == r.block_type).unwrap_or(true))
            .collect();
        if matches.is_empty() {
            return Ok(Vec::new());
        }
        let offset = rand::thread_rng().gen_range(0..matches.len());
        matches.rotate_left(offset);
        Ok(matches.into_iter().cloned().collect())
    }

    fn delete(&self, row_id: u64) -> Result<bool, DatastoreError> {
        let removed = {
            let mut index = self.index.write().unwrap();
            if let Some(row) = index.rows.remove(&row_id) {
                index.total_size = index.total_size.saturating_sub(row.size());
                true
            } else {
                false
            }
        };
        if removed {
            self.remove_persisted(row_id)?;
        }
        Ok(removed)
    }

    fn update(&self, row_id: u64, delta_priority: i64, new_expiration: u64) -> Result<(), DatastoreError> {
        let updated = {
            let mut index = self.index.write().unwrap();
            let row = index.rows.get_mut(&row_id).ok_or(DatastoreError::RowNotFound(row_id))?;
            row.priority = (row.priority as i64 + delta_priority).max(0) as u32;
            row.expiration_time = row.expiration_time.max(new_expiration);
            row.clone()
        };
        self.persist(&updated)
    }

    fn get_size(&self) -> u64 {
        self.index.read().unwrap().total_size
    }

    fn iterate_low_priority(&self, now: u64, visit: &mut dyn FnMut(&StoredRow) -> IterControl) {
        let mut rows: Vec<StoredRow> = {
            let index = self.index.read().unwrap();
            index.live_iter(now).cloned().collect()
        };
        rows.sort_by_key(|r| r.priority);
        self.walk_ordered(rows.into_iter(), visit);
    }

    fn iterate_non_anonymous(&self, now: u64, visit: &mut dyn FnMut(&StoredRow) -> IterControl) {
        let rows: Vec<StoredRow> = {
            let index = self.index.read().unwrap();
            index.live_iter(now).filter(|r| r.is_non_anonymous()).cloned().collect()
        };
        self.walk_ordered(rows.into_iter(), visit);
    }

    fn iterate_expiration_time(&self, now: u64, visit: &mut dyn FnMut(&StoredRow) -> IterControl) {
        let mut rows: Vec<StoredRow> = {
            let index = self.index.read().unwrap();
            index.live_iter(now).filter(|r| r.expiration_time != 0).cloned().collect()
        };
        rows.sort_by_key(|r| r.expiration_time);
        self.walk_ordered(rows.into_iter(), visit);
    }

    fn iterate_migration_order(&self, now: u64, visit: &mut dyn FnMut(&StoredRow) -> IterControl) {
        let rows: Vec<StoredRow> = {
            let index = self.index.read().unwrap();
            index.live_iter(now).filter(|r| !r.is_ondemand()).cloned().collect()
        };
        self.walk_ordered(rows.into_iter(), visit);
    }

    fn iterate_all_now(&self, now: u64, visit: &mut dyn FnMut(&StoredRow) -> IterControl) {
        let _ = now;
        let rows: Vec<StoredRow> = {
            let index = self.index.read().unwrap();
            index.rows.values().cloned().collect()
        };
        self.walk_ordered(rows.into_iter(), visit);
    }
}

fn current_unix_time() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
