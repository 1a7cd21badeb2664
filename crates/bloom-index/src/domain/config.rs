//! Bloom index configuration and validation.

use crate::error::BloomError;
use serde::{Deserialize, Serialize};

/// Configuration for the bloom index's size and target accuracy.
///
/// The filter's bit budget is derived from `quota_bytes` — the same byte
/// quota the datastore manager enforces — rather than from an expected
/// element count, since the index has to fit a fixed-size file regardless
/// of how full the store actually is.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BloomIndexConfig {
    /// Byte quota of the datastore this index mirrors; the index file's
    /// fixed size is derived from this.
    pub quota_bytes: u64,
    /// Target false positive rate used when sizing hash function count.
    pub target_fpr: f64,
    /// Path of the persisted index file.
    pub index_path: std::path::PathBuf,
}

impl BloomIndexConfig {
    pub fn new(quota_bytes: u64, target_fpr: f64, index_path: std::path::PathBuf) -> Result<Self, BloomError> {
        let config = Self { quota_bytes, target_fpr, index_path };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), BloomError> {
        if self.quota_bytes == 0 {
            return Err(BloomError::InvalidParameters("quota_bytes cannot be 0".to_string()));
        }
        if !(0.0..1.0).contains(&self.target_fpr) {
            return Err(BloomError::InvalidFpr { fpr: self.target_fpr });
        }
        Ok(())
    }

    /// Bytes the on-disk index file occupies: one 4-bit counter per two
    /// quota bytes, packed two counters per byte, i.e. one index byte per
    /// two quota bytes (`m = quota_bytes * 2` counters, `m / 2` bytes).
    pub fn index_file_bytes(&self) -> u64 {
        self.quota_bytes
    }
}
