//! # Codec Errors
//!
//! Reference: §4.1 failure modes — `mismatched_query`, `unknown_type`, `malformed`.

use thiserror::Error;

/// Errors that can occur while encoding, decoding, or verifying a block.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Payload is too short, or a length field doesn't fit the remaining bytes.
    #[error("malformed block payload")]
    Malformed,

    /// The numeric block type has no defined encoding/verification rule.
    #[error("unknown block type {0}")]
    UnknownType(u32),

    /// The block's query doesn't match what its type's derivation rule produces.
    #[error("block fails query-consistency check for its type")]
    MismatchedQuery,

    /// A SIGNED/KEYWORD/KEYWORD_FOR_NAMESPACE block's signature didn't verify.
    #[error("block signature verification failed")]
    SignatureInvalid,

    /// ONDEMAND blocks are a storage-internal indirection and must never be
    /// accepted from or sent out to the network.
    #[error("ONDEMAND blocks must not appear on the wire")]
    NotRoutable,

    /// Underlying symmetric-cipher or signature-library failure.
    #[error(transparent)]
    Crypto(#[from] shared_crypto::CryptoError),
}
