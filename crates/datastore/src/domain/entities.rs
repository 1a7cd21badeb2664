//! Domain entities for the ordered block store.

use shared_types::entities::{BlockType, Query};

/// A single SQstore row: a content block keyed by its query, annotated with
/// the fields every iteration order and admission decision keys off of.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StoredRow {
    /// Monotonic row identifier, assigned at insertion time.
    pub row_id: u64,
    pub query: Query,
    pub block_type: BlockType,
    pub priority: u32,
    pub anonymity_level: u32,
    pub expiration_time: u64,
    pub payload: Vec<u8>,
}

impl StoredRow {
    pub fn size(&self) -> u64 {
        self.payload.len() as u64
    }

    pub fn is_expired(&self, now: u64) -> bool {
        self.expiration_time != 0 && self.expiration_time <= now
    }

    pub fn is_ondemand(&self) -> bool {
        self.block_type == BlockType::OnDemand
    }

    pub fn is_non_anonymous(&self) -> bool {
        self.anonymity_level == 0
    }
}

/// Per-file bookkeeping the on-demand encoder keeps alongside a symlinked
/// indexed file: when its backing content last went missing, if ever.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct OnDemandFileState {
    pub first_unavailable: Option<u64>,
}

impl OnDemandFileState {
    pub fn available() -> Self {
        Self { first_unavailable: None }
    }

    /// Grace window after which an unreachable indexed file's blocks are
    /// dropped from the store.
    pub const GRACE_PERIOD_SECS: u64 = 3 * 24 * 60 * 60;

    pub fn past_grace(&self, now: u64) -> bool {
        match self.first_unavailable {
            Some(since) => now.saturating_sub(since) > Self::GRACE_PERIOD_SECS,
            None => false,
        }
    }
}
