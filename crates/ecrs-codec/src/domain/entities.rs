//! # Codec Entities
//!
//! Parsed views of the block payloads this crate knows how to verify.
//!
//! Reference: §4.1 block-type → query rules.

use shared_types::entities::{Hash512, Query};

/// A freshly encoded DATA block: the ciphertext and the query that retrieves it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedBlock {
    pub query: Query,
    pub ciphertext: Vec<u8>,
}

/// A SIGNED (namespace entry) or NAMESPACE (namespace root) block: the query
/// is the embedded `identifier` field, not a hash of anything, and the whole
/// record is signed by the subspace owner.
///
/// Wire layout: `identifier (64) | subspace_pubkey (33) | signature (64) |
/// payload (remainder)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedBlockPayload {
    pub identifier: Hash512,
    pub subspace_pubkey: [u8; 33],
    pub signature: [u8; 64],
    pub payload: Vec<u8>,
}

impl SignedBlockPayload {
    const HEADER_LEN: usize = 64 + 33 + 64;

    /// The bytes the signature covers: `{identifier, subspace pubkey, payload}`.
    #[must_use]
    pub fn signed_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(64 + 33 + self.payload.len());
        buf.extend_from_slice(&self.identifier);
        buf.extend_from_slice(&self.subspace_pubkey);
        buf.extend_from_slice(&self.payload);
        buf
    }

    #[must_use]
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::HEADER_LEN {
            return None;
        }
        let mut identifier = [0u8; 64];
        identifier.copy_from_slice(&bytes[0..64]);
        let mut subspace_pubkey = [0u8; 33];
        subspace_pubkey.copy_from_slice(&bytes[64..97]);
        let mut signature = [0u8; 64];
        signature.copy_from_slice(&bytes[97..161]);
        Some(Self {
            identifier,
            subspace_pubkey,
            signature,
            payload: bytes[161..].to_vec(),
        })
    }
}

/// A KEYWORD block: the query is `hash(keyspace_pubkey)`, and the record is
/// signed by the keyspace's own key (anyone who knows the keyword can derive
/// the keyspace keypair and verify, but only the deriver can have signed it).
///
/// Wire layout: `keyspace_pubkey (33) | signature (64) | payload (remainder)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordBlockPayload {
    pub keyspace_pubkey: [u8; 33],
    pub signature: [u8; 64],
    pub payload: Vec<u8>,
}

impl KeywordBlockPayload {
    const HEADER_LEN: usize = 33 + 64;

    #[must_use]
    pub fn signed_bytes(&self) -> &[u8] {
        &self.payload
    }

    #[must_use]
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::HEADER_LEN {
            return None;
        }
        let mut keyspace_pubkey = [0u8; 33];
        keyspace_pubkey.copy_from_slice(&bytes[0..33]);
        let mut signature = [0u8; 64];
        signature.copy_from_slice(&bytes[33..97]);
        Some(Self {
            keyspace_pubkey,
            signature,
            payload: bytes[97..].to_vec(),
        })
    }
}

/// A KEYWORD_FOR_NAMESPACE block: an outer KEYWORD-shaped envelope whose
/// payload is itself a serialized SIGNED block pointing into a namespace.
/// The query is `hash(inner.subspace_pubkey)` — the inner block's keyspace
/// key, not the outer one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordForNamespaceBlockPayload {
    pub outer: KeywordBlockPayload,
    pub inner: SignedBlockPayload,
}

impl KeywordForNamespaceBlockPayload {
    #[must_use]
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        let outer = KeywordBlockPayload::parse(bytes)?;
        let inner = SignedBlockPayload::parse(&outer.payload)?;
        Some(Self { outer, inner })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_block_roundtrip_parse() {
        let block = SignedBlockPayload {
            identifier: [7u8; 64],
            subspace_pubkey: [2u8; 33],
            signature: [9u8; 64],
            payload: b"namespace entry body".to_vec(),
        };
        // signed_bytes() excludes the signature; rebuild the full wire form.
        let mut full = Vec::new();
        full.extend_from_slice(&block.identifier);
        full.extend_from_slice(&block.subspace_pubkey);
        full.extend_from_slice(&block.signature);
        full.extend_from_slice(&block.payload);

        let parsed = SignedBlockPayload::parse(&full).unwrap();
        assert_eq!(parsed, block);
    }

    #[test]
    fn keyword_block_too_short_is_none() {
        assert!(KeywordBlockPayload::parse(&[0u8; 10]).is_none());
    }
}
