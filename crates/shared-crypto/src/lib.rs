//! # Content-Routing Cryptography
//!
//! ## Components
//!
//! | Module | Algorithm | Use case |
//! |--------|-----------|----------|
//! | `symmetric` | AES-128-CFB, key derived from the content hash | ECRS content encryption |
//! | `hashing` | BLAKE3 | Key/IV derivation |
//! | `ecdsa` | secp256k1 | Node identity, HELLO, and block signatures |
//!
//! ## Security properties
//!
//! - **Content-hash keying**: `symmetric::derive_content_key` is a pure
//!   function of the plaintext's hash, not a random value. Two peers
//!   encrypting the same plaintext produce byte-identical ciphertext; this is
//!   what lets the network deduplicate storage without any peer ever seeing
//!   another peer's plaintext. A random-nonce AEAD cannot provide this.
//! - **secp256k1**: RFC 6979 deterministic nonces, no RNG dependency for signing.
//! - **BLAKE3**: content-key KDF; SIMD-accelerated.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ecdsa;
pub mod errors;
pub mod hashing;
pub mod symmetric;

pub use ecdsa::{Secp256k1KeyPair, Secp256k1PublicKey, Secp256k1Signature};
pub use errors::CryptoError;
pub use hashing::{blake3_derive_key, blake3_hash};
pub use symmetric::{decrypt_content, derive_content_key, encrypt_content, ContentKey};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
