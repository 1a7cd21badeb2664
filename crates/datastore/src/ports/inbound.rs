//! Driving ports: the three APIs this crate exposes — the ordered row
//! store, the quota-enforcing manager built on top of it, and the
//! on-demand encoder that indexes local files without copying them.

use crate::domain::{DatastoreError, StoredRow};
use shared_types::entities::{BlockType, DatastoreBlock, Query};

/// Result of visiting one row during an iteration.
///
/// Mirrors a callback-driven cursor: `Continue` keeps walking, `DeleteAndContinue`
/// removes the just-visited row before continuing, `Abort` stops the walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterControl {
    Continue,
    DeleteAndContinue,
    Abort,
}

/// The ordered block store (C3). Every iteration order returns rows still
/// live at the instant of the call — no expired row is ever yielded except
/// via `iterate_all_now`, which exists precisely to sweep them.
pub trait SqstoreApi: Send + Sync {
    /// Insert a new row, returning its assigned row id.
    fn put(
        &self,
        query: Query,
        block_type: BlockType,
        priority: u32,
        anonymity_level: u32,
        expiration_time: u64,
        payload: Vec<u8>,
    ) -> Result<u64, DatastoreError>;

    /// Fetch rows matching `query` (and, if given, `block_type`), starting
    /// from a uniformly random offset among the matches.
    fn get(
        &self,
        query: &Query,
        block_type: Option<BlockType>,
    ) -> Result<Vec<StoredRow>, DatastoreError>;

    fn delete(&self, row_id: u64) -> Result<bool, DatastoreError>;

    /// Bump a row's priority by `delta_priority` (saturating at zero) and
    /// raise its expiration to `max(current, new_expiration)`.
    fn update(
        &self,
        row_id: u64,
        delta_priority: i64,
        new_expiration: u64,
    ) -> Result<(), DatastoreError>;

    /// Total bytes currently occupied by live rows.
    fn get_size(&self) -> u64;

    /// Lowest-priority rows first.
    fn iterate_low_priority(&self, now: u64, visit: &mut dyn FnMut(&StoredRow) -> IterControl);

    /// Only rows with `anonymity_level == 0`.
    fn iterate_non_anonymous(&self, now: u64, visit: &mut dyn FnMut(&StoredRow) -> IterControl);

    /// Soonest-to-expire rows first.
    fn iterate_expiration_time(&self, now: u64, visit: &mut dyn FnMut(&StoredRow) -> IterControl);

    /// Insertion order, excluding ON_DEMAND blocks — the order content is
    /// offered to a peer requesting bulk migration.
    fn iterate_migration_order(&self, now: u64, visit: &mut dyn FnMut(&StoredRow) -> IterControl);

    /// Every row, including already-expired ones — the only order that
    /// does not filter expired rows out, used by the expiry sweep itself.
    fn iterate_all_now(&self, now: u64, visit: &mut dyn FnMut(&StoredRow) -> IterControl);
}

/// The quota-enforcing entry point every other subsystem calls through
/// (C4). Wraps a `SqstoreApi` with admission control and a bloom-index
/// membership probe so most misses never touch the row store at all.
#[async_trait::async_trait]
pub trait DatastoreApi: Send + Sync {
    async fn put(&self, query: Query, block: DatastoreBlock) -> Result<(), DatastoreError>;

    async fn get(
        &self,
        query: Query,
        value_hash: Option<[u8; 32]>,
        block_type: Option<BlockType>,
    ) -> Result<Vec<DatastoreBlock>, DatastoreError>;

    async fn del(&self, query: Query, value_hash: [u8; 32]) -> Result<bool, DatastoreError>;

    /// Membership probe only — no row store access, no decode.
    async fn fast_get(&self, query: Query) -> bool;
}

/// On-demand content indexing (C5): symlink a local file into the store
/// instead of copying its blocks, encoding them lazily on retrieval.
#[async_trait::async_trait]
pub trait OnDemandApi: Send + Sync {
    async fn init_index(
        &self,
        file_id: String,
        source_path: std::path::PathBuf,
    ) -> Result<(), DatastoreError>;

    #[allow(clippy::too_many_arguments)]
    async fn index(
        &self,
        priority: u32,
        expiration_time: u64,
        file_offset: u64,
        anonymity_level: u32,
        file_id: String,
        block_size: u32,
        plaintext_block: Vec<u8>,
    ) -> Result<Query, DatastoreError>;

    async fn get_indexed(&self, row: &StoredRow, query: Query) -> Result<DatastoreBlock, DatastoreError>;

    async fn unindex(&self, file_id: String, block_size: u32) -> Result<(), DatastoreError>;
}
