//! # IPC Message Payloads
//!
//! Payloads exchanged between subsystems over the `shared-bus` event bus,
//! wrapped in `AuthenticatedMessage<T>`. Payloads never duplicate the
//! envelope's `sender_id`.

use serde::{Deserialize, Serialize};

use crate::entities::{BlockType, DatastoreBlock, PeerId, Query};

// =============================================================================
// C1 ECRS BLOCK CODEC
// =============================================================================

/// Request to verify that `payload` is a well-formed block of `block_type`
/// consistent with `query`. Sender: C10 (incoming network block) or C5
/// (freshly encoded on-demand block).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyBlockRequest {
    pub query: Query,
    pub block_type: BlockType,
    pub payload: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyBlockResponse {
    pub valid: bool,
    pub reason: Option<String>,
}

/// Request to content-hash-key-encrypt a plaintext DATA block. Sender: C5
/// (on-demand encoder), producing the ciphertext + query to hand to C10/C4.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodeBlockRequest {
    pub plaintext: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodeBlockResponse {
    pub query: Query,
    pub ciphertext: Vec<u8>,
}

// =============================================================================
// C2 BLOOM INDEX
// =============================================================================

/// Probe for whether `query` might be present in the datastore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BloomTestRequest {
    pub query: Query,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BloomTestResponse {
    pub maybe_present: bool,
}

/// Insert or remove a query from the bloom index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BloomUpdateRequest {
    pub query: Query,
    pub insert: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BloomUpdateResponse {
    pub applied: bool,
}

// =============================================================================
// C7 SESSION CACHE
// =============================================================================

/// Look up (or build-and-cache) a session key for a peer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionLookupRequest {
    pub peer: PeerId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionLookupResponse {
    pub session_key: Option<[u8; 32]>,
}

// =============================================================================
// C4 DATASTORE MANAGER
// =============================================================================

/// Request to store a block. Sender: C10 (GAP router) or C5 (on-demand).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatastorePutRequest {
    pub query: Query,
    pub value: DatastoreBlock,
}

/// Request to retrieve blocks matching a query and optional type filter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatastoreGetRequest {
    pub query: Query,
    pub value_hash: Option<[u8; 32]>,
    pub block_type: Option<BlockType>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatastoreGetResponse {
    pub matches: Vec<DatastoreBlock>,
}

// =============================================================================
// C6 PEER REGISTRY
// =============================================================================

/// Request to verify a signature using a peer's cached public key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyPeerSignatureRequest {
    pub peer: PeerId,
    pub message: Vec<u8>,
    pub signature: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyPeerSignatureResponse {
    pub valid: bool,
}

/// Request to adjust a peer's trust value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeTrustRequest {
    pub peer: PeerId,
    pub delta: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeTrustResponse {
    pub applied_delta: i64,
}

// =============================================================================
// C8 TRAFFIC ACCOUNTANT
// =============================================================================

/// Request to check whether cover traffic justifies an anonymity-constrained
/// send at the given level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverSufficientRequest {
    pub message_type: u16,
    pub level: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverSufficientResponse {
    pub sufficient: bool,
}
