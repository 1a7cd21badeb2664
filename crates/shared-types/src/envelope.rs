//! # `AuthenticatedMessage` Envelope
//!
//! The universal wrapper for inter-subsystem IPC (not the on-wire peer
//! protocol, which is owned by the crates that define it).
//!
//! ## Security Properties
//!
//! - **Versioning**: every message carries a `version` for forward compat.
//! - **Correlation**: request/response flows use `correlation_id`/`reply_to`.
//! - **Time-bounded replay prevention**: nonces are valid only within the
//!   timestamp window (see `security::NonceCache`).
//! - **Envelope authority**: `sender_id` is the sole source of truth for the
//!   sender's identity; payloads must not duplicate it.

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use uuid::Uuid;

use crate::entities::SubsystemId;

/// Routing information for responses in request/response flows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyTo {
    pub topic: String,
    pub subsystem_id: SubsystemId,
}

/// The universal envelope for inter-subsystem IPC.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticatedMessage<T> {
    pub version: u16,
    pub sender_id: SubsystemId,
    pub recipient_id: SubsystemId,
    pub correlation_id: Uuid,
    pub reply_to: Option<ReplyTo>,
    pub timestamp: u64,
    pub nonce: Uuid,
    #[serde_as(as = "Bytes")]
    pub signature: [u8; 64],
    pub payload: T,
}

impl<T> AuthenticatedMessage<T> {
    pub const CURRENT_VERSION: u16 = 1;
    pub const MAX_FUTURE_SKEW: u64 = 10;
    pub const MAX_AGE: u64 = 60;
    pub const NONCE_CACHE_TTL: u64 = 120;
}

/// Result of message verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationResult {
    Valid,
    UnsupportedVersion { received: u16, supported: u16 },
    TimestampOutOfRange { timestamp: u64, now: u64 },
    ReplayDetected { nonce: Uuid },
    InvalidSignature,
    ReplyToMismatch { reply_to: SubsystemId, sender: SubsystemId },
}

impl VerificationResult {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, VerificationResult::Valid)
    }
}
