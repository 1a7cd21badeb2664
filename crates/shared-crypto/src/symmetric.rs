//! # ECRS Content Encryption
//!
//! Content-hash-keyed symmetric encryption: the key and IV are derived from
//! the hash of the plaintext itself, so encrypting the same plaintext twice
//! (on different peers, at different times) produces byte-identical
//! ciphertext. That determinism is what lets the network deduplicate stored
//! blocks without any peer ever holding another peer's content query.
//!
//! A random-nonce AEAD cannot provide this property, so content encryption
//! uses AES-128-CFB instead: no authentication tag, but the query
//! (`hash(ciphertext)`) already binds the reader to the exact bytes they
//! asked for, and tampering changes the query so a mismatched block is
//! simply rejected rather than decrypted.

use crate::hashing::blake3_derive_key;
use crate::CryptoError;
use aes::cipher::{AsyncStreamCipher, KeyIvInit};
use aes::Aes128;
use cfb_mode::{Decryptor, Encryptor};
use zeroize::Zeroize;

type Aes128CfbEnc = Encryptor<Aes128>;
type Aes128CfbDec = Decryptor<Aes128>;

const KEY_CONTEXT: &str = "ecrs content key v1";
const IV_CONTEXT: &str = "ecrs content iv v1";

/// A 128-bit key/IV pair derived deterministically from a content hash.
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct ContentKey {
    key: [u8; 16],
    iv: [u8; 16],
}

impl ContentKey {
    #[must_use]
    pub fn key(&self) -> &[u8; 16] {
        &self.key
    }

    #[must_use]
    pub fn iv(&self) -> &[u8; 16] {
        &self.iv
    }
}

/// Derives the `(key, iv)` pair for a block from the hash of its plaintext.
///
/// Uses BLAKE3's keyed-derivation mode with distinct context strings so the
/// key and IV are independent even though both come from the same 64-byte
/// input.
#[must_use]
pub fn derive_content_key(plaintext_hash: &[u8]) -> ContentKey {
    let key_material = blake3_derive_key(KEY_CONTEXT, plaintext_hash);
    let iv_material = blake3_derive_key(IV_CONTEXT, plaintext_hash);

    let mut key = [0u8; 16];
    let mut iv = [0u8; 16];
    key.copy_from_slice(&key_material[..16]);
    iv.copy_from_slice(&iv_material[..16]);
    ContentKey { key, iv }
}

/// Encrypts `plaintext` under the key/IV derived from `plaintext_hash`.
///
/// # Errors
///
/// Returns `CryptoError::InvalidInput` if `plaintext_hash` came from the
/// wrong hash (callers must pass the hash of `plaintext`, not of the
/// ciphertext or something else).
pub fn encrypt_content(plaintext: &[u8], plaintext_hash: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let content_key = derive_content_key(plaintext_hash);
    let mut buf = plaintext.to_vec();
    Aes128CfbEnc::new(&content_key.key.into(), &content_key.iv.into()).encrypt(&mut buf);
    Ok(buf)
}

/// Decrypts `ciphertext` that was produced by [`encrypt_content`] for the
/// plaintext whose hash is `plaintext_hash`.
///
/// Callers are expected to have already verified `hash(ciphertext)` matches
/// the expected query before calling this; decryption itself cannot detect
/// tampering since CFB has no authentication tag.
pub fn decrypt_content(ciphertext: &[u8], plaintext_hash: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let content_key = derive_content_key(plaintext_hash);
    let mut buf = ciphertext.to_vec();
    Aes128CfbDec::new(&content_key.key.into(), &content_key.iv.into()).decrypt(&mut buf);
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashing::blake3_hash;

    #[test]
    fn encrypt_decrypt_roundtrip() {
        let plaintext = b"a block of content to be published";
        let hash = blake3_hash(plaintext);

        let ciphertext = encrypt_content(plaintext, &hash).unwrap();
        let decrypted = decrypt_content(&ciphertext, &hash).unwrap();

        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn same_plaintext_same_hash_same_ciphertext() {
        let plaintext = b"identical content published twice";
        let hash = blake3_hash(plaintext);

        let a = encrypt_content(plaintext, &hash).unwrap();
        let b = encrypt_content(plaintext, &hash).unwrap();

        assert_eq!(a, b, "content-hash keying must be deterministic");
    }

    #[test]
    fn different_hash_different_ciphertext() {
        let plaintext = b"same bytes, different derivation input";
        let hash_a = blake3_hash(b"context a");
        let hash_b = blake3_hash(b"context b");

        let a = encrypt_content(plaintext, &hash_a).unwrap();
        let b = encrypt_content(plaintext, &hash_b).unwrap();

        assert_ne!(a, b);
    }

    #[test]
    fn wrong_key_produces_garbage_not_error() {
        let plaintext = b"secret payload";
        let hash = blake3_hash(plaintext);
        let wrong_hash = blake3_hash(b"wrong plaintext");

        let ciphertext = encrypt_content(plaintext, &hash).unwrap();
        let garbage = decrypt_content(&ciphertext, &wrong_hash).unwrap();

        assert_ne!(garbage, plaintext);
    }
}
