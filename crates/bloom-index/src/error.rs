//! Error types for the bloom index subsystem.

use shared_types::entities::SubsystemId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BloomError {
    #[error("invalid false positive rate: {fpr} (must be in [0, 1))")]
    InvalidFpr { fpr: f64 },

    #[error("invalid filter parameters: {0}")]
    InvalidParameters(String),

    #[error("unauthorized sender: {0:?}")]
    UnauthorizedSender(SubsystemId),

    #[error("index persistence error: {0}")]
    Persistence(String),

    #[error("rebuild source error: {0}")]
    RebuildSource(String),
}
