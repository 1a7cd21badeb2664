//! # Core Domain Entities
//!
//! Defines the identity, HELLO, and block primitives shared across the
//! content-routing substrate.
//!
//! ## Clusters
//!
//! - **Identity**: `PeerId`, `HelloRecord`, `TrustValue`
//! - **Content**: `Query`, `BlockType`, `DatastoreBlockHeader`
//! - **Subsystems**: `SubsystemId`

use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use sha2::{Digest, Sha512};
use std::fmt;

/// A 512-bit hash. Used for both peer identities and content queries.
pub type Hash512 = [u8; 64];

/// Hash arbitrary bytes with SHA-512, the hash function used throughout the
/// content-routing substrate for peer identities and block queries.
#[must_use]
pub fn hash512(data: &[u8]) -> Hash512 {
    let mut hasher = Sha512::new();
    hasher.update(data);
    let digest = hasher.finalize();
    let mut out = [0u8; 64];
    out.copy_from_slice(&digest);
    out
}

/// Identity of a peer: the SHA-512 hash of its public key.
///
/// Equality and ordering are defined over the hash bytes, never the public
/// key or any cached metadata.
#[serde_as]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PeerId(#[serde_as(as = "[_; 64]")] pub Hash512);

impl PeerId {
    /// Derive a peer identity from a public key.
    #[must_use]
    pub fn from_public_key(public_key: &[u8]) -> Self {
        Self(hash512(public_key))
    }

    #[must_use]
    pub fn as_bytes(&self) -> &Hash512 {
        &self.0
    }

    /// First 4 bytes, used as the compact identifier in the traffic
    /// accountant's peer-diversity ring.
    #[must_use]
    pub fn prefix(&self) -> [u8; 4] {
        let mut p = [0u8; 4];
        p.copy_from_slice(&self.0[..4]);
        p
    }
}

impl fmt::Debug for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PeerId({})", crate::base32::encode(&self.0))
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", crate::base32::encode(&self.0))
    }
}

/// A query identity: the 512-bit hash used to route and retrieve a block.
/// Derivation depends on block type (see the `ecrs-codec` crate).
#[serde_as]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Query(#[serde_as(as = "[_; 64]")] pub Hash512);

impl Query {
    #[must_use]
    pub fn as_bytes(&self) -> &Hash512 {
        &self.0
    }
}

impl fmt::Debug for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Query({})", crate::base32::encode(&self.0))
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", crate::base32::encode(&self.0))
    }
}

/// Trust accrues in `[0, i32::MAX]`; negative deltas saturate at 0.
pub const MAX_TRUST: u32 = i32::MAX as u32;

/// The signed advertisement by which a peer publishes one network address
/// under one protocol number.
///
/// Wire layout (network byte order): 2-byte size | 2-byte type (=HELLO) |
/// signature | public key | 64-byte peer identity | 4-byte expiration |
/// 4-byte MTU | 2-byte sender-address size | 2-byte protocol | address.
///
/// The original protocol signs with a 2048-bit RSA key (512-byte signature,
/// 264-byte public key). This implementation substitutes the ECDSA
/// (secp256k1) scheme already used elsewhere in the crypto stack; see
/// `shared-crypto::ecdsa` and DESIGN.md for the substitution rationale.
/// Field widths below reflect that substitution rather than the RSA sizes
/// named in the original wire format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelloRecord {
    /// The sender's public key bytes (compressed secp256k1 point, 33 bytes).
    pub public_key: Vec<u8>,
    /// Redundant with `hash512(public_key)`; must be validated on receipt.
    pub peer_id: PeerId,
    /// Seconds since epoch after which this HELLO is no longer authoritative.
    pub expiration: u64,
    /// Advertised maximum transmission unit for this protocol.
    pub mtu: u32,
    /// Protocol number this address is valid under (0..=65535).
    pub protocol: u16,
    /// Protocol-specific address bytes (opaque to this layer).
    pub address: Vec<u8>,
    /// Signature over every other field, computed with the sender's key.
    pub signature: Vec<u8>,
}

impl HelloRecord {
    /// Bytes that the signature is computed over: every field except the
    /// signature itself, in wire order.
    #[must_use]
    pub fn signed_payload(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.public_key.len() + 64 + 8 + 4 + 2 + 2 + self.address.len());
        buf.extend_from_slice(&self.public_key);
        buf.extend_from_slice(&self.peer_id.0);
        buf.extend_from_slice(&self.expiration.to_be_bytes());
        buf.extend_from_slice(&self.mtu.to_be_bytes());
        buf.extend_from_slice(&(self.address.len() as u16).to_be_bytes());
        buf.extend_from_slice(&self.protocol.to_be_bytes());
        buf.extend_from_slice(&self.address);
        buf
    }

    /// Invariant (1): `hash(public_key) == peer_id`.
    #[must_use]
    pub fn identity_consistent(&self) -> bool {
        PeerId::from_public_key(&self.public_key) == self.peer_id
    }

    #[must_use]
    pub fn is_expired(&self, now: u64) -> bool {
        now >= self.expiration
    }
}

/// Block-type dispatch for the ECRS codec and the datastore.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum BlockType {
    /// Sentinel matching any type (never stored).
    Any = 0,
    /// Leaf data block: query = hash(ciphertext).
    Data = 1,
    /// Namespace entry: query = embedded identifier, signed.
    Signed = 2,
    /// Keyword entry: query = hash(keyspace public key).
    Keyword = 3,
    /// Namespace root block.
    Namespace = 4,
    /// Keyword entry pointing at a namespace entry.
    KeywordForNamespace = 5,
    /// Indirection to a plaintext file + offset; never appears on the wire.
    OnDemand = 6,
}

impl BlockType {
    #[must_use]
    pub fn from_u32(v: u32) -> Option<Self> {
        match v {
            0 => Some(Self::Any),
            1 => Some(Self::Data),
            2 => Some(Self::Signed),
            3 => Some(Self::Keyword),
            4 => Some(Self::Namespace),
            5 => Some(Self::KeywordForNamespace),
            6 => Some(Self::OnDemand),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_routable(&self) -> bool {
        !matches!(self, Self::Any | Self::OnDemand)
    }
}

/// Header preceding every datastore block's payload.
///
/// `size` is the total on-disk size (header + payload); invariant:
/// `size >= header size`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DatastoreBlockHeader {
    pub size: u32,
    pub block_type: BlockType,
    pub priority: u32,
    pub anonymity_level: u32,
    pub expiration_time: u64,
}

impl DatastoreBlockHeader {
    pub const WIRE_LEN: usize = 4 + 4 + 4 + 4 + 8;
}

/// A stored block: header plus payload bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatastoreBlock {
    pub header: DatastoreBlockHeader,
    pub payload: Vec<u8>,
}

impl DatastoreBlock {
    #[must_use]
    pub fn total_size(&self) -> usize {
        DatastoreBlockHeader::WIRE_LEN + self.payload.len()
    }
}

/// The compile-time registry of known subsystems (replaces dynamic-symbol
/// plugin loading with an enum-keyed dispatch table).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum SubsystemId {
    /// C1: ECRS block codec.
    EcrsCodec = 1,
    /// C2: bloom-filter content index.
    BloomIndex = 2,
    /// C3: ordered block store.
    SqStore = 3,
    /// C4: quota-enforcing datastore manager.
    DatastoreManager = 4,
    /// C5: on-demand (symlinked) block encoder.
    OnDemandEncoder = 5,
    /// C6: peer-identity registry.
    PeerRegistry = 6,
    /// C7: session-key exchange cache.
    SessionCache = 7,
    /// C8: rotating-window traffic accountant.
    TrafficAccountant = 8,
    /// C9: advertising / bootstrap driver.
    BootstrapDriver = 9,
    /// C10: GAP query/response router.
    GapRouter = 10,
}

impl SubsystemId {
    #[must_use]
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            1 => Some(Self::EcrsCodec),
            2 => Some(Self::BloomIndex),
            3 => Some(Self::SqStore),
            4 => Some(Self::DatastoreManager),
            5 => Some(Self::OnDemandEncoder),
            6 => Some(Self::PeerRegistry),
            7 => Some(Self::SessionCache),
            8 => Some(Self::TrafficAccountant),
            9 => Some(Self::BootstrapDriver),
            10 => Some(Self::GapRouter),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peer_id_derivation_is_deterministic() {
        let a = PeerId::from_public_key(b"a-public-key");
        let b = PeerId::from_public_key(b"a-public-key");
        assert_eq!(a, b);
    }

    #[test]
    fn hello_identity_consistency() {
        let pk = b"some-public-key-bytes".to_vec();
        let peer_id = PeerId::from_public_key(&pk);
        let hello = HelloRecord {
            public_key: pk,
            peer_id,
            expiration: 1000,
            mtu: 1500,
            protocol: 6,
            address: vec![127, 0, 0, 1],
            signature: vec![],
        };
        assert!(hello.identity_consistent());
    }

    #[test]
    fn hello_identity_mismatch_detected() {
        let hello = HelloRecord {
            public_key: b"real-key".to_vec(),
            peer_id: PeerId::from_public_key(b"other-key"),
            expiration: 1000,
            mtu: 1500,
            protocol: 6,
            address: vec![],
            signature: vec![],
        };
        assert!(!hello.identity_consistent());
    }
}
