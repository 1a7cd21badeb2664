//! Datastore Manager (C4): the sole client-facing entry point. Wraps
//! SQstore with a bloom-index membership probe so a miss never touches
//! the row store, and enforces the quota by deciding what gets admitted
//! and, periodically, what gets evicted to keep a free floor available.

use crate::domain::{admits, aging_bonus, DatastoreConfig, DatastoreError, StoredRow};
use crate::ports::inbound::{DatastoreApi, IterControl, SqstoreApi};
use bloom_index::BloomIndexApi;
use shared_types::entities::{BlockType, DatastoreBlock, DatastoreBlockHeader, Query};
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::RwLock;

fn payload_hash(payload: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(payload);
    hasher.finalize().into()
}

/// What the maintenance tick actually did, so the bus adapter can publish
/// one `BlockEvicted`/`BlockStored` event per row without the service
/// layer depending on `shared-bus` directly.
#[derive(Debug, Default)]
pub struct MaintenanceReport {
    pub expired_evicted: Vec<Query>,
    pub floor_evicted: Vec<Query>,
}

pub struct DatastoreManagerService<S: SqstoreApi, B: BloomIndexApi> {
    sqstore: S,
    bloom: B,
    config: DatastoreConfig,
    min_priority: AtomicU32,
    last_maintenance: RwLock<u64>,
}

impl<S: SqstoreApi, B: BloomIndexApi> DatastoreManagerService<S, B> {
    pub fn new(sqstore: S, bloom: B, config: DatastoreConfig) -> Self {
        Self { sqstore, bloom, config, min_priority: AtomicU32::new(0), last_maintenance: RwLock::new(0) }
    }

    fn available(&self) -> u64 {
        self.config.quota_bytes.saturating_sub(self.sqstore.get_size())
    }

    /// Unix timestamp of the last completed maintenance tick, or 0 if
    /// none has run yet.
    pub fn last_maintenance(&self) -> u64 {
        *self.last_maintenance.read().unwrap()
    }

    /// Sweep expired rows (bounded by a wall-clock budget) then, if the
    /// remaining free space is below the configured floor, evict
    /// low-priority rows until it's restored, raising `min_priority` to the
    /// priority of the last row retained (the first row past the deficit
    /// that wasn't evicted).
    pub fn maintenance_tick(&self, now: u64) -> MaintenanceReport {
        let mut report = MaintenanceReport::default();
        let deadline = now.saturating_add(crate::domain::config::MAINTENANCE_SWEEP_BUDGET_SECS);

        // `iterate_all_now` is the only order that doesn't already filter
        // expired rows out, since that's exactly what this sweep needs to
        // see.
        let expired = RwLock::new(Vec::new());
        self.sqstore.iterate_all_now(now, &mut |row: &StoredRow| {
            if current_unix_time() >= deadline {
                return IterControl::Abort;
            }
            if row.is_expired(now) {
                expired.write().unwrap().push((row.row_id, row.query));
                IterControl::DeleteAndContinue
            } else {
                IterControl::Continue
            }
        });
        for (_, query) in expired.into_inner().unwrap() {
            self.bloom.remove(&query);
            report.expired_evicted.push(query);
        }

        let floor = self.config.free_floor_bytes();
        if self.available() < floor {
            let mut retained_priority = self.min_priority.load(Ordering::Relaxed);
            let to_evict = RwLock::new(Vec::new());
            let deficit = RwLock::new(floor.saturating_sub(self.available()));
            self.sqstore.iterate_low_priority(now, &mut |row: &StoredRow| {
                let mut remaining = deficit.write().unwrap();
                if *remaining == 0 {
                    // The deficit is already cleared, so this row survives —
                    // it's the last retained row, and the new priority floor.
                    retained_priority = row.priority;
                    return IterControl::Abort;
                }
                *remaining = remaining.saturating_sub(row.size());
                to_evict.write().unwrap().push((row.row_id, row.query));
                IterControl::DeleteAndContinue
            });
            for (_, query) in to_evict.into_inner().unwrap() {
                self.bloom.remove(&query);
                report.floor_evicted.push(query);
            }
            self.min_priority.store(retained_priority, Ordering::Relaxed);
        }

        *self.last_maintenance.write().unwrap() = now;
        report
    }
}

fn current_unix_time() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[async_trait::async_trait]
impl<S: SqstoreApi, B: BloomIndexApi> DatastoreApi for DatastoreManagerService<S, B> {
    async fn put(&self, query: Query, block: DatastoreBlock) -> Result<(), DatastoreError> {
        let now = current_unix_time();

        // Duplicate check: same query, same exact payload already stored.
        let existing = self.sqstore.get(&query, Some(block.header.block_type))?;
        let incoming_hash = payload_hash(&block.payload);
        if existing.iter().any(|row| payload_hash(&row.payload) == incoming_hash) {
            return Ok(());
        }

        let size = block.total_size() as u64;
        let bonus = aging_bonus(now, self.config.db_creation_time);
        let min_priority = self.min_priority.load(Ordering::Relaxed);
        if !admits(self.available(), size, block.header.priority, min_priority, bonus) {
            return Err(DatastoreError::Rejected {
                reason: "insufficient quota or priority too low".to_string(),
            });
        }

        self.sqstore.put(
            query,
            block.header.block_type,
            block.header.priority.saturating_add(bonus),
            block.header.anonymity_level,
            block.header.expiration_time,
            block.payload,
        )?;
        self.bloom.insert(&query);
        Ok(())
    }

    async fn get(
        &self,
        query: Query,
        value_hash: Option<[u8; 32]>,
        block_type: Option<BlockType>,
    ) -> Result<Vec<DatastoreBlock>, DatastoreError> {
        if !self.bloom.test(&query) {
            return Ok(Vec::new());
        }

        let rows = self.sqstore.get(&query, block_type)?;
        let matches: Vec<DatastoreBlock> = rows
            .into_iter()
            .filter(|row| value_hash.map(|h| payload_hash(&row.payload) == h).unwrap_or(true))
            .map(|row| DatastoreBlock {
                header: DatastoreBlockHeader {
                    size: row.payload.len() as u32,
                    block_type: row.block_type,
                    priority: row.priority,
                    anonymity_level: row.anonymity_level,
                    expiration_time: row.expiration_time,
                },
                payload: row.payload,
            })
            .collect();

        // Bloom said "maybe" but SQstore had nothing live for this query:
        // a false positive, not a data-integrity problem.
        Ok(matches)
    }

    async fn del(&self, query: Query, value_hash: [u8; 32]) -> Result<bool, DatastoreError> {
        if !self.bloom.test(&query) {
            return Ok(false);
        }

        let rows = self.sqstore.get(&query, None)?;
        let mut deleted = false;
        for row in rows {
            if payload_hash(&row.payload) == value_hash {
                self.sqstore.delete(row.row_id)?;
                deleted = true;
            }
        }
        if deleted {
            self.bloom.remove(&query);
        }
        Ok(deleted)
    }

    async fn fast_get(&self, query: Query) -> bool {
        self.bloom.test(&query)
    }
}
