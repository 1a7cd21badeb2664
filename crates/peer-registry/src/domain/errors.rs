//! Domain errors for the peer registry, session cache, and bootstrap driver.

use std::fmt;

/// Errors surfaced by host-registry operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A HELLO's `peer_id` did not match `hash(public_key)`.
    IdentityMismatch,
    /// The underlying host or trust file store failed.
    Storage(String),
    /// The HELLO's public key could not produce a valid signature check
    /// (no cached HELLO for the peer at all).
    UnknownPeer,
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IdentityMismatch => write!(f, "HELLO identity-key consistency check failed"),
            Self::Storage(reason) => write!(f, "host registry storage error: {reason}"),
            Self::UnknownPeer => write!(f, "no cached HELLO for peer"),
        }
    }
}

impl std::error::Error for RegistryError {}
