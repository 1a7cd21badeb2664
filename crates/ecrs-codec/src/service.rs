//! # ECRS Codec Service
//!
//! Application service layer that implements `EcrsCodecApi` by delegating
//! to the pure domain logic.

use crate::domain::codec;
use crate::domain::entities::EncodedBlock;
use crate::domain::errors::CodecError;
use crate::ports::inbound::EcrsCodecApi;
use shared_types::entities::{BlockType, Query};

/// Stateless ECRS codec service — encoding and verification need no
/// per-instance state, so this is a zero-sized type.
#[derive(Debug, Default, Clone, Copy)]
pub struct EcrsCodecService;

impl EcrsCodecService {
    pub fn new() -> Self {
        Self
    }
}

impl EcrsCodecApi for EcrsCodecService {
    fn encode_data_block(&self, plaintext: &[u8]) -> EncodedBlock {
        codec::encode_data_block(plaintext)
    }

    fn decode_data_block(&self, ciphertext: &[u8], plaintext_hash: &[u8; 64]) -> Result<Vec<u8>, CodecError> {
        codec::decode_data_block(ciphertext, plaintext_hash)
    }

    fn verify_block(&self, query: &Query, block_type: BlockType, payload: &[u8]) -> Result<(), CodecError> {
        codec::verify_block(query, block_type, payload)
    }
}
