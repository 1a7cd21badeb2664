//! # IPC Security
//!
//! The single implementation of authenticated-message validation shared by
//! every subsystem: HMAC signing, timestamp windows, nonce-replay rejection,
//! and sender/recipient authorization.
//!
//! Prior to this module each subsystem rolled its own nonce cache and HMAC
//! check, which drifted out of sync with each other. Centralizing it means a
//! policy change (tightening the timestamp window, adding a message type to
//! the authorization matrix) only needs to happen once.

use crate::entities::SubsystemId;
use crate::envelope::{AuthenticatedMessage, VerificationResult};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

pub const MAX_FUTURE_SKEW: u64 = AuthenticatedMessage::<()>::MAX_FUTURE_SKEW;
pub const MAX_AGE: u64 = AuthenticatedMessage::<()>::MAX_AGE;
pub const NONCE_CACHE_TTL: Duration = Duration::from_secs(120);
pub const MAX_NONCE_CACHE_SIZE: usize = 100_000;

// =============================================================================
// NONCE CACHE
// =============================================================================

/// Thread-safe replay cache: a nonce is valid only the first time it is seen
/// within its window. Bounded to prevent memory exhaustion from a flood of
/// distinct nonces.
#[derive(Debug)]
pub struct NonceCache {
    cache: RwLock<HashMap<Uuid, Instant>>,
}

impl NonceCache {
    pub fn new() -> Self {
        Self {
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Returns `true` if the nonce is fresh (and records it), `false` if it
    /// is a replay.
    pub fn check_and_insert(&self, nonce: Uuid) -> bool {
        let now = Instant::now();
        let expiry = now + NONCE_CACHE_TTL;

        let mut cache = match self.cache.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if cache.len() >= MAX_NONCE_CACHE_SIZE {
            cache.retain(|_, exp| *exp > now);
        }

        if let Some(&exp) = cache.get(&nonce) {
            if exp > now {
                return false;
            }
        }

        cache.insert(nonce, expiry);
        true
    }

    /// Primarily for testing.
    pub fn clear(&self) {
        if let Ok(mut cache) = self.cache.write() {
            cache.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.cache.read().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for NonceCache {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// HMAC VALIDATION
// =============================================================================

/// Validates the HMAC-SHA256 signature of an authenticated message.
///
/// Only the first 32 bytes of the 64-byte signature field carry the HMAC;
/// the remainder is reserved so the field can later carry a longer MAC
/// without a wire-format change.
pub fn validate_hmac_signature(message_bytes: &[u8], signature: &[u8; 64], shared_secret: &[u8]) -> bool {
    let hmac_bytes = &signature[..32];

    let mut mac = match HmacSha256::new_from_slice(shared_secret) {
        Ok(m) => m,
        Err(_) => return false,
    };

    mac.update(message_bytes);
    mac.verify_slice(hmac_bytes).is_ok()
}

/// Signs a message with HMAC-SHA256, returning a 64-byte signature (HMAC in
/// the first 32 bytes, zeros in the remainder).
pub fn sign_message(message_bytes: &[u8], shared_secret: &[u8]) -> [u8; 64] {
    let mut mac = HmacSha256::new_from_slice(shared_secret).expect("HMAC accepts a key of any size");
    mac.update(message_bytes);
    let hmac_bytes = mac.finalize().into_bytes();

    let mut signature = [0u8; 64];
    signature[..32].copy_from_slice(&hmac_bytes);
    signature
}

// =============================================================================
// TIMESTAMP VALIDATION
// =============================================================================

/// Valid range: `now - MAX_AGE <= timestamp <= now + MAX_FUTURE_SKEW`.
pub fn validate_timestamp(timestamp: u64) -> Result<(), VerificationResult> {
    let now = current_timestamp();

    if timestamp + MAX_AGE < now {
        return Err(VerificationResult::TimestampOutOfRange { timestamp, now });
    }
    if timestamp > now + MAX_FUTURE_SKEW {
        return Err(VerificationResult::TimestampOutOfRange { timestamp, now });
    }
    Ok(())
}

/// Current Unix timestamp; returns 0 if the system clock is before the epoch.
pub fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

// =============================================================================
// MESSAGE VERIFIER
// =============================================================================

/// Runs every check an incoming `AuthenticatedMessage` must pass, in order:
/// version, timestamp, nonce, signature, reply-to consistency.
pub struct MessageVerifier<K: KeyProvider> {
    recipient_id: SubsystemId,
    nonce_cache: Arc<NonceCache>,
    key_provider: K,
    auth_matrix: AuthorizationMatrix,
}

/// Supplies the shared secret used to validate a sender's HMAC.
pub trait KeyProvider: Send + Sync {
    /// `None` means the sender is unknown and the message must be rejected.
    fn get_shared_secret(&self, sender_id: SubsystemId) -> Option<Vec<u8>>;
}

impl<K: KeyProvider> MessageVerifier<K> {
    pub fn new(recipient_id: SubsystemId, nonce_cache: Arc<NonceCache>, key_provider: K) -> Self {
        Self {
            recipient_id,
            nonce_cache,
            key_provider,
            auth_matrix: AuthorizationMatrix::new(),
        }
    }

    pub fn verify<T>(&self, message: &AuthenticatedMessage<T>, message_bytes: &[u8]) -> VerificationResult {
        if message.version != AuthenticatedMessage::<T>::CURRENT_VERSION {
            return VerificationResult::UnsupportedVersion {
                received: message.version,
                supported: AuthenticatedMessage::<T>::CURRENT_VERSION,
            };
        }

        if let Err(e) = validate_timestamp(message.timestamp) {
            return e;
        }

        if !self.nonce_cache.check_and_insert(message.nonce) {
            return VerificationResult::ReplayDetected { nonce: message.nonce };
        }

        let shared_secret = match self.key_provider.get_shared_secret(message.sender_id) {
            Some(s) => s,
            None => return VerificationResult::InvalidSignature,
        };

        if !validate_hmac_signature(message_bytes, &message.signature, &shared_secret) {
            return VerificationResult::InvalidSignature;
        }

        if let Some(ref reply_to) = message.reply_to {
            if reply_to.subsystem_id != message.sender_id {
                return VerificationResult::ReplyToMismatch {
                    reply_to: reply_to.subsystem_id,
                    sender: message.sender_id,
                };
            }
        }

        VerificationResult::Valid
    }

    pub fn is_authorized(&self, sender_id: SubsystemId, message_type: &str) -> bool {
        self.auth_matrix.is_authorized(sender_id, self.recipient_id, message_type)
    }
}

// =============================================================================
// AUTHORIZATION MATRIX
// =============================================================================

/// Which subsystem may send which message type to which recipient. A pair
/// with no explicit rule is unauthorized by default.
#[derive(Debug, Clone)]
pub struct AuthorizationMatrix {
    rules: HashMap<(SubsystemId, SubsystemId, &'static str), bool>,
}

impl AuthorizationMatrix {
    pub fn new() -> Self {
        use SubsystemId::*;

        let mut rules = HashMap::new();

        // Datastore manager (C4): fed by the GAP router's reply path and the
        // on-demand encoder's materialized blocks.
        rules.insert((GapRouter, DatastoreManager, "DatastorePutRequest"), true);
        rules.insert((OnDemandEncoder, DatastoreManager, "DatastorePutRequest"), true);
        rules.insert((GapRouter, DatastoreManager, "DatastoreGetRequest"), true);

        // Bloom index (C2): queried and updated by the GAP router's local
        // lookup step and kept in sync with the store by C4.
        rules.insert((GapRouter, BloomIndex, "BloomTestRequest"), true);
        rules.insert((DatastoreManager, BloomIndex, "BloomUpdateRequest"), true);

        // Peer registry (C6): trust and signature checks driven by the GAP
        // router and the bootstrap driver.
        rules.insert((GapRouter, PeerRegistry, "VerifyPeerSignatureRequest"), true);
        rules.insert((GapRouter, PeerRegistry, "ChangeTrustRequest"), true);
        rules.insert((BootstrapDriver, PeerRegistry, "VerifyPeerSignatureRequest"), true);

        // Session cache (C7): consulted by the peer registry during
        // handshake key exchange.
        rules.insert((PeerRegistry, SessionCache, "SessionLookupRequest"), true);

        // Traffic accountant (C8): consulted by the GAP router before an
        // indirection at a non-zero anonymity level.
        rules.insert((GapRouter, TrafficAccountant, "CoverSufficientRequest"), true);

        // ECRS codec (C1): every block entering the store is verified first.
        rules.insert((GapRouter, EcrsCodec, "VerifyBlockRequest"), true);
        rules.insert((OnDemandEncoder, EcrsCodec, "EncodeBlockRequest"), true);

        Self { rules }
    }

    pub fn is_authorized(&self, sender_id: SubsystemId, recipient_id: SubsystemId, message_type: &str) -> bool {
        self.rules
            .get(&(sender_id, recipient_id, message_type))
            .copied()
            .unwrap_or(false)
    }
}

impl Default for AuthorizationMatrix {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// KEY PROVIDER
// =============================================================================

/// Derives each subsystem's shared secret from a single master secret, so
/// the node only needs to provision one value at startup.
#[derive(Clone)]
pub struct DerivedKeyProvider {
    master_secret: Vec<u8>,
}

impl DerivedKeyProvider {
    pub fn new(master_secret: Vec<u8>) -> Self {
        Self { master_secret }
    }

    fn derive_key(&self, subsystem_id: SubsystemId) -> Vec<u8> {
        let mut mac = HmacSha256::new_from_slice(&self.master_secret).expect("HMAC accepts a key of any size");
        mac.update(&[subsystem_id.as_u8()]);
        mac.finalize().into_bytes().to_vec()
    }
}

impl KeyProvider for DerivedKeyProvider {
    fn get_shared_secret(&self, sender_id: SubsystemId) -> Option<Vec<u8>> {
        Some(self.derive_key(sender_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nonce_cache_rejects_replay() {
        let cache = NonceCache::new();
        let nonce = Uuid::new_v4();
        assert!(cache.check_and_insert(nonce));
        assert!(!cache.check_and_insert(nonce));
    }

    #[test]
    fn nonce_cache_accepts_distinct_nonces() {
        let cache = NonceCache::new();
        assert!(cache.check_and_insert(Uuid::new_v4()));
        assert!(cache.check_and_insert(Uuid::new_v4()));
    }

    #[test]
    fn hmac_roundtrip() {
        let secret = b"test_secret_key";
        let message = b"hello world";
        let signature = sign_message(message, secret);
        assert!(validate_hmac_signature(message, &signature, secret));
    }

    #[test]
    fn hmac_rejects_wrong_key() {
        let message = b"hello world";
        let signature = sign_message(message, b"test_secret_key");
        assert!(!validate_hmac_signature(message, &signature, b"wrong_secret_key"));
    }

    #[test]
    fn hmac_rejects_tampered_message() {
        let secret = b"test_secret_key";
        let signature = sign_message(b"hello world", secret);
        assert!(!validate_hmac_signature(b"hello World", &signature, secret));
    }

    #[test]
    fn timestamp_now_is_valid() {
        assert!(validate_timestamp(current_timestamp()).is_ok());
    }

    #[test]
    fn timestamp_too_old_rejected() {
        let old = current_timestamp() - MAX_AGE - 10;
        assert!(matches!(validate_timestamp(old), Err(VerificationResult::TimestampOutOfRange { .. })));
    }

    #[test]
    fn timestamp_too_far_future_rejected() {
        let future = current_timestamp() + MAX_FUTURE_SKEW + 10;
        assert!(matches!(validate_timestamp(future), Err(VerificationResult::TimestampOutOfRange { .. })));
    }

    #[test]
    fn authorization_matrix_allows_known_pairs() {
        let matrix = AuthorizationMatrix::new();
        assert!(matrix.is_authorized(SubsystemId::GapRouter, SubsystemId::DatastoreManager, "DatastorePutRequest"));
        assert!(matrix.is_authorized(SubsystemId::GapRouter, SubsystemId::PeerRegistry, "ChangeTrustRequest"));
    }

    #[test]
    fn authorization_matrix_rejects_unknown_pairs() {
        let matrix = AuthorizationMatrix::new();
        assert!(!matrix.is_authorized(SubsystemId::PeerRegistry, SubsystemId::DatastoreManager, "DatastorePutRequest"));
        assert!(!matrix.is_authorized(SubsystemId::GapRouter, SubsystemId::DatastoreManager, "NotAMessage"));
    }

    #[test]
    fn derived_key_provider_differs_per_subsystem() {
        let provider = DerivedKeyProvider::new(b"master_secret".to_vec());
        let a = provider.get_shared_secret(SubsystemId::EcrsCodec).unwrap();
        let b = provider.get_shared_secret(SubsystemId::GapRouter).unwrap();
        assert_ne!(a, b);
        assert_eq!(a, provider.get_shared_secret(SubsystemId::EcrsCodec).unwrap());
    }
}
