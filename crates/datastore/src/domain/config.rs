//! Datastore Manager configuration: quota, database age, and the directory
//! the On-Demand Encoder keeps its content symlinks in.

/// Fraction of the quota that must always remain free. When the remaining
/// space drops below this, the maintenance loop evicts low-priority rows
/// until it's restored.
pub const FREE_FLOOR_FRACTION: f64 = 0.01;

/// Period, in seconds, over which the one-time aging bonus accrues.
pub const AGING_BONUS_PERIOD_SECS: u64 = 30 * 24 * 60 * 60;

/// Maintenance loop tick interval.
pub const MAINTENANCE_TICK_SECS: u64 = 10;

/// Wall-clock budget for the expired-row sweep within a single maintenance
/// tick, so one tick can't starve the rest of the node.
pub const MAINTENANCE_SWEEP_BUDGET_SECS: u64 = 5;

#[derive(Debug, Clone)]
pub struct DatastoreConfig {
    /// Total bytes the store may occupy.
    pub quota_bytes: u64,
    /// Unix timestamp the database was created, used to compute the aging
    /// bonus applied to newly admitted blocks.
    pub db_creation_time: u64,
    /// Directory the On-Demand Encoder keeps `<file-id>` symlinks in.
    pub ondemand_index_dir: std::path::PathBuf,
}

impl DatastoreConfig {
    pub fn new(quota_bytes: u64, db_creation_time: u64, ondemand_index_dir: std::path::PathBuf) -> Self {
        Self { quota_bytes, db_creation_time, ondemand_index_dir }
    }

    pub fn free_floor_bytes(&self) -> u64 {
        (self.quota_bytes as f64 * FREE_FLOOR_FRACTION) as u64
    }
}
