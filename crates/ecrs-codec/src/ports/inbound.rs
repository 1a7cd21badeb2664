//! # Inbound Ports (Driving Ports / API)
//!
//! Traits that define the public API of this subsystem.

use crate::domain::entities::EncodedBlock;
use crate::domain::errors::CodecError;
use shared_types::entities::{BlockType, Query};

/// Primary ECRS block codec API.
///
/// Implementations must be thread-safe (`Send + Sync`).
pub trait EcrsCodecApi: Send + Sync {
    /// Content-hash-key-encrypt a plaintext DATA block.
    fn encode_data_block(&self, plaintext: &[u8]) -> EncodedBlock;

    /// Decrypt a DATA block's ciphertext, given the hash of its plaintext.
    fn decode_data_block(&self, ciphertext: &[u8], plaintext_hash: &[u8; 64]) -> Result<Vec<u8>, CodecError>;

    /// Verify that `payload` is a well-formed block of `block_type` whose
    /// query-consistency rule matches `query`.
    fn verify_block(&self, query: &Query, block_type: BlockType, payload: &[u8]) -> Result<(), CodecError>;
}
