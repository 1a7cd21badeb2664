//! On-the-wire GAP query/result framing. This is the network-facing
//! protocol peers speak to each other — distinct from the signed
//! `AuthenticatedMessage<T>` IPC this subsystem uses to call out to its
//! sibling subsystems (see `ports::outbound`).
//!
//! Wire layout (network byte order):
//!
//! - `GAP_QUERY`: 2-byte size | 2-byte type | 4-byte priority | 4-byte ttl
//!   (signed) | 4-byte key count | N x 64-byte keys | 64-byte reply-to peer
//!   identity.
//! - `GAP_RESULT`: 2-byte size | 2-byte type | block-on-wire (the
//!   datastore's header followed by its payload).

use shared_types::entities::{BlockType, DatastoreBlock, DatastoreBlockHeader, PeerId, Query};

pub const GAP_QUERY_TYPE: u16 = 0x0603;
pub const GAP_RESULT_TYPE: u16 = 0x0604;

const KEY_LEN: usize = 64;
const QUERY_HEADER_LEN: usize = 2 + 2 + 4 + 4 + 4;

#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("message shorter than its declared header")]
    Truncated,
    #[error("unexpected message type {0:#06x}")]
    WrongType(u16),
    #[error("unknown block type {0}")]
    UnknownBlockType(u32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GapQueryMessage {
    pub priority: u32,
    pub ttl: i32,
    pub keys: Vec<Query>,
    pub reply_to: PeerId,
}

impl GapQueryMessage {
    pub fn key_count(&self) -> u32 {
        self.keys.len() as u32
    }

    pub fn encode(&self) -> Vec<u8> {
        let total_len = QUERY_HEADER_LEN + self.keys.len() * KEY_LEN + KEY_LEN;
        let mut out = Vec::with_capacity(total_len);
        out.extend_from_slice(&(total_len as u16).to_be_bytes());
        out.extend_from_slice(&GAP_QUERY_TYPE.to_be_bytes());
        out.extend_from_slice(&self.priority.to_be_bytes());
        out.extend_from_slice(&self.ttl.to_be_bytes());
        out.extend_from_slice(&self.key_count().to_be_bytes());
        for key in &self.keys {
            out.extend_from_slice(key.as_bytes());
        }
        out.extend_from_slice(self.reply_to.as_bytes());
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, WireError> {
        if bytes.len() < QUERY_HEADER_LEN {
            return Err(WireError::Truncated);
        }
        let msg_type = u16::from_be_bytes(bytes[2..4].try_into().unwrap());
        if msg_type != GAP_QUERY_TYPE {
            return Err(WireError::WrongType(msg_type));
        }
        let priority = u32::from_be_bytes(bytes[4..8].try_into().unwrap());
        let ttl = i32::from_be_bytes(bytes[8..12].try_into().unwrap());
        let key_count = u32::from_be_bytes(bytes[12..16].try_into().unwrap()) as usize;

        let keys_end = QUERY_HEADER_LEN + key_count * KEY_LEN;
        if bytes.len() < keys_end + KEY_LEN {
            return Err(WireError::Truncated);
        }

        let mut keys = Vec::with_capacity(key_count);
        for i in 0..key_count {
            let start = QUERY_HEADER_LEN + i * KEY_LEN;
            let mut key = [0u8; KEY_LEN];
            key.copy_from_slice(&bytes[start..start + KEY_LEN]);
            keys.push(Query(key));
        }

        let mut reply_to = [0u8; KEY_LEN];
        reply_to.copy_from_slice(&bytes[keys_end..keys_end + KEY_LEN]);

        Ok(Self { priority, ttl, keys, reply_to: PeerId(reply_to) })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GapResultMessage {
    pub block: DatastoreBlock,
}

impl GapResultMessage {
    pub fn encode(&self) -> Vec<u8> {
        let header = &self.block.header;
        let total_len = 4 + DatastoreBlockHeader::WIRE_LEN + self.block.payload.len();
        let mut out = Vec::with_capacity(total_len);
        out.extend_from_slice(&(total_len as u16).to_be_bytes());
        out.extend_from_slice(&GAP_RESULT_TYPE.to_be_bytes());
        out.extend_from_slice(&header.size.to_be_bytes());
        out.extend_from_slice(&(header.block_type_as_u32()).to_be_bytes());
        out.extend_from_slice(&header.priority.to_be_bytes());
        out.extend_from_slice(&header.anonymity_level.to_be_bytes());
        out.extend_from_slice(&header.expiration_time.to_be_bytes());
        out.extend_from_slice(&self.block.payload);
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, WireError> {
        const PREFIX: usize = 4;
        if bytes.len() < PREFIX + DatastoreBlockHeader::WIRE_LEN {
            return Err(WireError::Truncated);
        }
        let msg_type = u16::from_be_bytes(bytes[2..4].try_into().unwrap());
        if msg_type != GAP_RESULT_TYPE {
            return Err(WireError::WrongType(msg_type));
        }
        let mut cursor = PREFIX;
        let size = u32::from_be_bytes(bytes[cursor..cursor + 4].try_into().unwrap());
        cursor += 4;
        let block_type_raw = u32::from_be_bytes(bytes[cursor..cursor + 4].try_into().unwrap());
        let block_type =
            BlockType::from_u32(block_type_raw).ok_or(WireError::UnknownBlockType(block_type_raw))?;
        cursor += 4;
        let priority = u32::from_be_bytes(bytes[cursor..cursor + 4].try_into().unwrap());
        cursor += 4;
        let anonymity_level = u32::from_be_bytes(bytes[cursor..cursor + 4].try_into().unwrap());
        cursor += 4;
        let expiration_time = u64::from_be_bytes(bytes[cursor..cursor + 8].try_into().unwrap());
        cursor += 8;

        let payload = bytes[cursor..].to_vec();
        Ok(Self {
            block: DatastoreBlock {
                header: DatastoreBlockHeader { size, block_type, priority, anonymity_level, expiration_time },
                payload,
            },
        })
    }
}

trait BlockTypeAsU32 {
    fn block_type_as_u32(&self) -> u32;
}

impl BlockTypeAsU32 for DatastoreBlockHeader {
    fn block_type_as_u32(&self) -> u32 {
        self.block_type as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_query_message_round_trips_through_the_wire() {
        let msg = GapQueryMessage {
            priority: 42,
            ttl: 10,
            keys: vec![Query([7; 64]), Query([9; 64])],
            reply_to: PeerId([3; 64]),
        };
        let encoded = msg.encode();
        let decoded = GapQueryMessage::decode(&encoded).unwrap();
        assert_eq!(msg, decoded);
    }

    #[test]
    fn a_truncated_query_message_is_rejected() {
        let msg = GapQueryMessage { priority: 1, ttl: 1, keys: vec![Query([1; 64])], reply_to: PeerId([2; 64]) };
        let encoded = msg.encode();
        assert!(matches!(GapQueryMessage::decode(&encoded[..encoded.len() - 1]), Err(WireError::Truncated)));
    }

    #[test]
    fn a_result_message_round_trips_through_the_wire() {
        let msg = GapResultMessage {
            block: DatastoreBlock {
                header: DatastoreBlockHeader {
                    size: 0,
                    block_type: BlockType::Data,
                    priority: 5,
                    anonymity_level: 1,
                    expiration_time: 12345,
                },
                payload: vec![1, 2, 3, 4],
            },
        };
        let encoded = msg.encode();
        let decoded = GapResultMessage::decode(&encoded).unwrap();
        assert_eq!(msg, decoded);
    }

    #[test]
    fn decoding_a_query_message_as_a_result_fails() {
        let msg = GapQueryMessage { priority: 1, ttl: 1, keys: vec![], reply_to: PeerId([2; 64]) };
        let encoded = msg.encode();
        assert!(matches!(GapResultMessage::decode(&encoded), Err(WireError::WrongType(_))));
    }
}
