//! # Block Encoding and Query Verification
//!
//! Reference: §4.1. Pure functions; no I/O, no subsystem wiring.

use super::entities::{
    EncodedBlock, KeywordBlockPayload, KeywordForNamespaceBlockPayload, SignedBlockPayload,
};
use super::errors::CodecError;
use shared_crypto::ecdsa::{Secp256k1PublicKey, Secp256k1Signature};
use shared_types::entities::{hash512, BlockType, Query};

/// Encodes a plaintext DATA block: `h := hash(b)`, `(key, iv) := KDF(h)`,
/// `c := AES-CFB(key, iv, b)`, `query := hash(c)`.
#[must_use]
pub fn encode_data_block(plaintext: &[u8]) -> EncodedBlock {
    let h = hash512(plaintext);
    let ciphertext = shared_crypto::symmetric::encrypt_content(plaintext, &h)
        .expect("AES-128-CFB encryption does not fail for well-formed keys");
    let query = Query(hash512(&ciphertext));
    EncodedBlock { query, ciphertext }
}

/// Decodes a DATA block's ciphertext back to plaintext, given the hash of
/// the original plaintext (callers get this from wherever they learned the
/// query — e.g. a KEYWORD block's decrypted content, or a keyword search).
pub fn decode_data_block(ciphertext: &[u8], plaintext_hash: &[u8; 64]) -> Result<Vec<u8>, CodecError> {
    Ok(shared_crypto::symmetric::decrypt_content(
        ciphertext,
        plaintext_hash,
    )?)
}

/// Verifies that `payload`, claimed to be a block of `block_type`, is
/// internally consistent with `query` per the §4.1 block-type → query table.
pub fn verify_block(query: &Query, block_type: BlockType, payload: &[u8]) -> Result<(), CodecError> {
    match block_type {
        BlockType::Data => verify_data(query, payload),
        BlockType::Signed | BlockType::Namespace => verify_signed(query, payload),
        BlockType::Keyword => verify_keyword(query, payload),
        BlockType::KeywordForNamespace => verify_keyword_for_namespace(query, payload),
        BlockType::OnDemand => Err(CodecError::NotRoutable),
        BlockType::Any => Err(CodecError::UnknownType(block_type as u32)),
    }
}

fn verify_data(query: &Query, payload: &[u8]) -> Result<(), CodecError> {
    if payload.is_empty() {
        return Err(CodecError::Malformed);
    }
    if Query(hash512(payload)) != *query {
        return Err(CodecError::MismatchedQuery);
    }
    Ok(())
}

fn verify_signed(query: &Query, payload: &[u8]) -> Result<(), CodecError> {
    let block = SignedBlockPayload::parse(payload).ok_or(CodecError::Malformed)?;
    if block.identifier != query.0 {
        return Err(CodecError::MismatchedQuery);
    }
    verify_secp256k1(&block.subspace_pubkey, &block.signed_bytes(), &block.signature)
}

fn verify_keyword(query: &Query, payload: &[u8]) -> Result<(), CodecError> {
    let block = KeywordBlockPayload::parse(payload).ok_or(CodecError::Malformed)?;
    if hash512(&block.keyspace_pubkey) != query.0 {
        return Err(CodecError::MismatchedQuery);
    }
    verify_secp256k1(&block.keyspace_pubkey, block.signed_bytes(), &block.signature)
}

fn verify_keyword_for_namespace(query: &Query, payload: &[u8]) -> Result<(), CodecError> {
    let block = KeywordForNamespaceBlockPayload::parse(payload).ok_or(CodecError::Malformed)?;
    if hash512(&block.inner.subspace_pubkey) != query.0 {
        return Err(CodecError::MismatchedQuery);
    }
    verify_secp256k1(
        &block.outer.keyspace_pubkey,
        block.outer.signed_bytes(),
        &block.outer.signature,
    )?;
    verify_secp256k1(
        &block.inner.subspace_pubkey,
        &block.inner.signed_bytes(),
        &block.inner.signature,
    )
}

fn verify_secp256k1(pubkey: &[u8; 33], message: &[u8], signature: &[u8; 64]) -> Result<(), CodecError> {
    let pk = Secp256k1PublicKey::from_bytes(*pubkey).map_err(|_| CodecError::SignatureInvalid)?;
    let sig = Secp256k1Signature::from_bytes(*signature);
    pk.verify(message, &sig).map_err(|_| CodecError::SignatureInvalid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_crypto::ecdsa::Secp256k1KeyPair;

    #[test]
    fn data_block_roundtrip() {
        let plaintext = b"a shared block of content";
        let encoded = encode_data_block(plaintext);
        let h = hash512(plaintext);
        let decoded = decode_data_block(&encoded.ciphertext, &h).unwrap();
        assert_eq!(decoded, plaintext);
    }

    #[test]
    fn data_block_query_matches_hash_of_ciphertext() {
        let encoded = encode_data_block(b"content");
        assert_eq!(encoded.query, Query(hash512(&encoded.ciphertext)));
        assert!(verify_block(&encoded.query, BlockType::Data, &encoded.ciphertext).is_ok());
    }

    #[test]
    fn data_block_tampered_ciphertext_mismatches_query() {
        let mut encoded = encode_data_block(b"content");
        encoded.ciphertext[0] ^= 0xFF;
        assert!(matches!(
            verify_block(&encoded.query, BlockType::Data, &encoded.ciphertext),
            Err(CodecError::MismatchedQuery)
        ));
    }

    #[test]
    fn identical_plaintext_yields_identical_query_across_encodings() {
        let a = encode_data_block(b"dedup me");
        let b = encode_data_block(b"dedup me");
        assert_eq!(a.query, b.query);
        assert_eq!(a.ciphertext, b.ciphertext);
    }

    #[test]
    fn signed_block_verifies_with_matching_key() {
        let keypair = Secp256k1KeyPair::generate();
        let identifier = hash512(b"namespace entry id");
        let mut block = SignedBlockPayload {
            identifier,
            subspace_pubkey: *keypair.public_key().as_bytes(),
            signature: [0u8; 64],
            payload: b"entry payload".to_vec(),
        };
        block.signature = *keypair.sign(&block.signed_bytes()).as_bytes();

        let mut wire = Vec::new();
        wire.extend_from_slice(&block.identifier);
        wire.extend_from_slice(&block.subspace_pubkey);
        wire.extend_from_slice(&block.signature);
        wire.extend_from_slice(&block.payload);

        let query = Query(identifier);
        assert!(verify_block(&query, BlockType::Signed, &wire).is_ok());
    }

    #[test]
    fn signed_block_wrong_identifier_mismatches_query() {
        let keypair = Secp256k1KeyPair::generate();
        let identifier = hash512(b"namespace entry id");
        let mut block = SignedBlockPayload {
            identifier,
            subspace_pubkey: *keypair.public_key().as_bytes(),
            signature: [0u8; 64],
            payload: b"entry payload".to_vec(),
        };
        block.signature = *keypair.sign(&block.signed_bytes()).as_bytes();

        let mut wire = Vec::new();
        wire.extend_from_slice(&block.identifier);
        wire.extend_from_slice(&block.subspace_pubkey);
        wire.extend_from_slice(&block.signature);
        wire.extend_from_slice(&block.payload);

        let wrong_query = Query(hash512(b"some other id"));
        assert!(matches!(
            verify_block(&wrong_query, BlockType::Signed, &wire),
            Err(CodecError::MismatchedQuery)
        ));
    }

    #[test]
    fn keyword_block_verifies_and_derives_query_from_pubkey() {
        let keypair = Secp256k1KeyPair::generate();
        let pubkey = *keypair.public_key().as_bytes();
        let payload = b"keyword-indexed content".to_vec();
        let signature = *keypair.sign(&payload).as_bytes();

        let mut wire = Vec::new();
        wire.extend_from_slice(&pubkey);
        wire.extend_from_slice(&signature);
        wire.extend_from_slice(&payload);

        let query = Query(hash512(&pubkey));
        assert!(verify_block(&query, BlockType::Keyword, &wire).is_ok());
    }

    #[test]
    fn ondemand_block_is_never_routable() {
        let query = Query([0u8; 64]);
        assert!(matches!(
            verify_block(&query, BlockType::OnDemand, b"irrelevant"),
            Err(CodecError::NotRoutable)
        ));
    }

    #[test]
    fn unknown_block_type_rejected() {
        let query = Query([0u8; 64]);
        assert!(matches!(
            verify_block(&query, BlockType::Any, b"irrelevant"),
            Err(CodecError::UnknownType(_))
        ));
    }

    #[test]
    fn malformed_signed_block_too_short() {
        let query = Query([0u8; 64]);
        assert!(matches!(
            verify_block(&query, BlockType::Signed, &[1, 2, 3]),
            Err(CodecError::Malformed)
        ));
    }
}
