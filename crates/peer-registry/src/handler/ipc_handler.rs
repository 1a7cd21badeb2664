//! IPC handler for the host registry, session cache, and bootstrap driver.
//!
//! Enforces the sender/recipient authorization matrix before dispatching:
//! the GAP router and the bootstrap driver may both ask for signature
//! verification, only the GAP router may adjust trust, and the host
//! registry is the only subsystem allowed to ask the session cache for an
//! established key.

use async_trait::async_trait;
use shared_types::entities::SubsystemId;
use shared_types::envelope::{AuthenticatedMessage, VerificationResult};
use shared_types::ipc::{
    ChangeTrustRequest, ChangeTrustResponse, SessionLookupRequest, SessionLookupResponse,
    VerifyPeerSignatureRequest, VerifyPeerSignatureResponse,
};
use shared_types::security::{KeyProvider, MessageVerifier};
use shared_types::subsystem_trait::{Subsystem, SubsystemError, SubsystemErrorKind, SubsystemStatus};
use thiserror::Error;
use tracing::warn;

use crate::ports::inbound::{BootstrapDriverApi, HostRegistryApi, SessionCacheApi};

#[derive(Debug, Error)]
pub enum IpcError {
    #[error("message failed verification: {0:?}")]
    Unverified(VerificationResult),

    #[error("sender {sender:?} is not authorized to send {message_type}")]
    Unauthorized { sender: SubsystemId, message_type: &'static str },
}

fn authorize<K: KeyProvider, T: serde::Serialize>(
    verifier: &MessageVerifier<K>,
    message: &AuthenticatedMessage<T>,
    message_bytes: &[u8],
    message_type: &'static str,
) -> Result<(), IpcError> {
    let result = verifier.verify(message, message_bytes);
    if !result.is_valid() {
        warn!(?result, sender = ?message.sender_id, message_type, "rejected unverified IPC message");
        return Err(IpcError::Unverified(result));
    }
    if !verifier.is_authorized(message.sender_id, message_type) {
        warn!(sender = ?message.sender_id, message_type, "rejected unauthorized IPC sender");
        return Err(IpcError::Unauthorized { sender: message.sender_id, message_type });
    }
    Ok(())
}

/// Dispatches verified, authorized IPC requests to a `HostRegistryApi`.
pub struct HostRegistryHandler<H: HostRegistryApi, K: KeyProvider> {
    service: H,
    verifier: MessageVerifier<K>,
}

impl<H: HostRegistryApi, K: KeyProvider> HostRegistryHandler<H, K> {
    pub fn new(service: H, verifier: MessageVerifier<K>) -> Self {
        Self { service, verifier }
    }

    pub async fn handle_verify_signature(
        &self,
        message: &AuthenticatedMessage<VerifyPeerSignatureRequest>,
        message_bytes: &[u8],
    ) -> Result<VerifyPeerSignatureResponse, IpcError> {
        authorize(&self.verifier, message, message_bytes, "VerifyPeerSignatureRequest")?;
        let request = &message.payload;
        let valid = self.service.verify_peer_signature(request.peer, &request.message, &request.signature);
        Ok(VerifyPeerSignatureResponse { valid })
    }

    pub async fn handle_change_trust(
        &self,
        message: &AuthenticatedMessage<ChangeTrustRequest>,
        message_bytes: &[u8],
    ) -> Result<ChangeTrustResponse, IpcError> {
        authorize(&self.verifier, message, message_bytes, "ChangeTrustRequest")?;
        let request = &message.payload;
        let applied_delta = self.service.change_trust(request.peer, request.delta);
        Ok(ChangeTrustResponse { applied_delta })
    }
}

/// Dispatches verified, authorized IPC requests to a `SessionCacheApi`.
pub struct SessionCacheHandler<S: SessionCacheApi, K: KeyProvider> {
    service: S,
    verifier: MessageVerifier<K>,
}

impl<S: SessionCacheApi, K: KeyProvider> SessionCacheHandler<S, K> {
    pub fn new(service: S, verifier: MessageVerifier<K>) -> Self {
        Self { service, verifier }
    }

    pub async fn handle_lookup(
        &self,
        message: &AuthenticatedMessage<SessionLookupRequest>,
        message_bytes: &[u8],
    ) -> Result<SessionLookupResponse, IpcError> {
        authorize(&self.verifier, message, message_bytes, "SessionLookupRequest")?;
        let session_key = self.service.established_key(message.payload.peer);
        Ok(SessionLookupResponse { session_key })
    }
}

/// Lifecycle wrapper registering the host registry in the subsystem registry.
pub struct PeerRegistrySubsystem<H: HostRegistryApi> {
    service: H,
}

impl<H: HostRegistryApi> PeerRegistrySubsystem<H> {
    pub fn new(service: H) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &H {
        &self.service
    }
}

#[async_trait]
impl<H: HostRegistryApi> Subsystem for PeerRegistrySubsystem<H> {
    fn id(&self) -> SubsystemId {
        SubsystemId::PeerRegistry
    }

    fn name(&self) -> &'static str {
        "Peer Registry"
    }

    async fn start(&self) -> Result<(), SubsystemError> {
        Ok(())
    }

    async fn stop(&self) -> Result<(), SubsystemError> {
        self.service.flush_trust().map_err(|e| SubsystemError {
            subsystem_id: SubsystemId::PeerRegistry,
            kind: SubsystemErrorKind::ShutdownFailed,
            message: e.to_string(),
        })?;
        Ok(())
    }

    async fn health_check(&self) -> SubsystemStatus {
        SubsystemStatus::Healthy
    }
}

/// Lifecycle wrapper registering the session cache in the subsystem registry.
pub struct SessionCacheSubsystem<S: SessionCacheApi> {
    service: S,
}

impl<S: SessionCacheApi> SessionCacheSubsystem<S> {
    pub fn new(service: S) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &S {
        &self.service
    }
}

#[async_trait]
impl<S: SessionCacheApi> Subsystem for SessionCacheSubsystem<S> {
    fn id(&self) -> SubsystemId {
        SubsystemId::SessionCache
    }

    fn name(&self) -> &'static str {
        "Session Key Cache"
    }

    async fn start(&self) -> Result<(), SubsystemError> {
        Ok(())
    }

    async fn stop(&self) -> Result<(), SubsystemError> {
        Ok(())
    }

    async fn health_check(&self) -> SubsystemStatus {
        SubsystemStatus::Healthy
    }
}

/// Lifecycle wrapper registering the bootstrap driver in the subsystem registry.
pub struct BootstrapDriverSubsystem<B: BootstrapDriverApi> {
    service: B,
}

impl<B: BootstrapDriverApi> BootstrapDriverSubsystem<B> {
    pub fn new(service: B) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &B {
        &self.service
    }
}

#[async_trait]
impl<B: BootstrapDriverApi> Subsystem for BootstrapDriverSubsystem<B> {
    fn id(&self) -> SubsystemId {
        SubsystemId::BootstrapDriver
    }

    fn name(&self) -> &'static str {
        "Bootstrap Driver"
    }

    async fn start(&self) -> Result<(), SubsystemError> {
        Ok(())
    }

    async fn stop(&self) -> Result<(), SubsystemError> {
        Ok(())
    }

    async fn health_check(&self) -> SubsystemStatus {
        if self.service.is_settled() { SubsystemStatus::Healthy } else { SubsystemStatus::Degraded }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::outbound::{InMemoryHostStore, InMemoryTrustStore, SystemTimeSource, ThreadRngSource};
    use crate::service::{HostRegistryService, SessionCacheService};
    use shared_types::security::NonceCache;
    use std::sync::Arc;
    use uuid::Uuid;

    struct StaticKeyProvider(Vec<u8>);

    impl KeyProvider for StaticKeyProvider {
        fn get_shared_secret(&self, _sender_id: SubsystemId) -> Option<Vec<u8>> {
            Some(self.0.clone())
        }
    }

    fn signed_message<T: serde::Serialize + Clone>(
        secret: &[u8],
        sender_id: SubsystemId,
        recipient_id: SubsystemId,
        payload: T,
    ) -> (AuthenticatedMessage<T>, Vec<u8>) {
        let mut message = AuthenticatedMessage {
            version: AuthenticatedMessage::<T>::CURRENT_VERSION,
            sender_id,
            recipient_id,
            correlation_id: Uuid::new_v4(),
            reply_to: None,
            timestamp: shared_types::security::current_timestamp(),
            nonce: Uuid::new_v4(),
            signature: [0u8; 64],
            payload,
        };
        let bytes = bincode::serialize(&message).expect("serializable");
        message.signature = shared_types::security::sign_message(&bytes, secret);
        let signed_bytes = bincode::serialize(&message).expect("serializable");
        (message, signed_bytes)
    }

    fn registry() -> HostRegistryService<InMemoryHostStore, InMemoryTrustStore, ThreadRngSource, SystemTimeSource> {
        HostRegistryService::new(InMemoryHostStore::new(), InMemoryTrustStore::new(), ThreadRngSource, SystemTimeSource)
    }

    #[tokio::test]
    async fn gap_router_can_change_trust_but_bootstrap_driver_cannot() {
        let secret = b"shared-secret".to_vec();
        let verifier = MessageVerifier::new(SubsystemId::PeerRegistry, Arc::new(NonceCache::new()), StaticKeyProvider(secret.clone()));
        let handler = HostRegistryHandler::new(registry(), verifier);
        let peer = shared_types::entities::PeerId::from_public_key(b"peer");

        let (msg, bytes) = signed_message(&secret, SubsystemId::GapRouter, SubsystemId::PeerRegistry, ChangeTrustRequest { peer, delta: 5 });
        let response = handler.handle_change_trust(&msg, &bytes).await.unwrap();
        assert_eq!(response.applied_delta, 5);

        let (msg, bytes) = signed_message(&secret, SubsystemId::BootstrapDriver, SubsystemId::PeerRegistry, ChangeTrustRequest { peer, delta: 5 });
        assert!(matches!(handler.handle_change_trust(&msg, &bytes).await, Err(IpcError::Unauthorized { .. })));
    }

    #[tokio::test]
    async fn bootstrap_driver_can_request_signature_verification() {
        let secret = b"shared-secret".to_vec();
        let verifier = MessageVerifier::new(SubsystemId::PeerRegistry, Arc::new(NonceCache::new()), StaticKeyProvider(secret.clone()));
        let handler = HostRegistryHandler::new(registry(), verifier);
        let peer = shared_types::entities::PeerId::from_public_key(b"peer");

        let (msg, bytes) = signed_message(
            &secret,
            SubsystemId::BootstrapDriver,
            SubsystemId::PeerRegistry,
            VerifyPeerSignatureRequest { peer, message: vec![1], signature: vec![2] },
        );
        let response = handler.handle_verify_signature(&msg, &bytes).await.unwrap();
        assert!(!response.valid);
    }

    #[tokio::test]
    async fn session_lookup_reports_none_when_no_key_established() {
        let secret = b"shared-secret".to_vec();
        let verifier = MessageVerifier::new(SubsystemId::SessionCache, Arc::new(NonceCache::new()), StaticKeyProvider(secret.clone()));
        let handler = SessionCacheHandler::new(SessionCacheService::new(), verifier);
        let peer = shared_types::entities::PeerId::from_public_key(b"peer");

        let (msg, bytes) =
            signed_message(&secret, SubsystemId::PeerRegistry, SubsystemId::SessionCache, SessionLookupRequest { peer });
        let response = handler.handle_lookup(&msg, &bytes).await.unwrap();
        assert_eq!(response.session_key, None);
    }
}
