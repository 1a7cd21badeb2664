//! IPC handler for the traffic accountant: only the GAP router may ask
//! whether cover traffic justifies a send at a given anonymity level.

use async_trait::async_trait;
use shared_types::entities::SubsystemId;
use shared_types::envelope::{AuthenticatedMessage, VerificationResult};
use shared_types::ipc::{CoverSufficientRequest, CoverSufficientResponse};
use shared_types::security::{KeyProvider, MessageVerifier};
use shared_types::subsystem_trait::{Subsystem, SubsystemError, SubsystemStatus};
use thiserror::Error;
use tracing::warn;

use crate::ports::inbound::TrafficAccountantApi;

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

/// Dispatches verified, authorized IPC requests to a `TrafficAccountantApi`.
pub struct TrafficAccountantHandler<A: TrafficAccountantApi, K: KeyProvider> {
    service: A,
    verifier: MessageVerifier<K>,
}

impl<A: TrafficAccountantApi, K: KeyProvider> TrafficAccountantHandler<A, K> {
    pub fn new(service: A, verifier: MessageVerifier<K>) -> Self {
        Self { service, verifier }
    }

    pub async fn handle_cover_sufficient(
        &self,
        message: &AuthenticatedMessage<CoverSufficientRequest>,
        message_bytes: &[u8],
    ) -> Result<CoverSufficientResponse, IpcError> {
        authorize(&self.verifier, message, message_bytes, "CoverSufficientRequest")?;
        let request = &message.payload;
        let sufficient = self.service.cover_sufficient(request.message_type, request.level);
        Ok(CoverSufficientResponse { sufficient })
    }
}

/// Lifecycle wrapper registering the traffic accountant in the subsystem
/// registry. Nothing to flush on shutdown — the rotating windows are
/// deliberately ephemeral.
pub struct TrafficAccountantSubsystem<A: TrafficAccountantApi> {
    service: A,
}

impl<A: TrafficAccountantApi> TrafficAccountantSubsystem<A> {
    pub fn new(service: A) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &A {
        &self.service
    }
}

#[async_trait]
impl<A: TrafficAccountantApi> Subsystem for TrafficAccountantSubsystem<A> {
    fn id(&self) -> SubsystemId {
        SubsystemId::TrafficAccountant
    }

    fn name(&self) -> &'static str {
        "Traffic Accountant"
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MessageDirection;
    use crate::ports::outbound::SystemTimeSource;
    use crate::service::TrafficAccountantService;
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

    #[tokio::test]
    async fn gap_router_can_ask_but_peer_registry_cannot() {
        let secret = b"shared-secret".to_vec();
        let verifier =
            MessageVerifier::new(SubsystemId::TrafficAccountant, Arc::new(NonceCache::new()), StaticKeyProvider(secret.clone()));
        let service = TrafficAccountantService::new(SystemTimeSource);
        service.record(17, MessageDirection::Received, shared_types::entities::PeerId::from_public_key(b"p"), 64);
        let handler = TrafficAccountantHandler::new(service, verifier);

        let (msg, bytes) = signed_message(
            &secret,
            SubsystemId::GapRouter,
            SubsystemId::TrafficAccountant,
            CoverSufficientRequest { message_type: 17, level: 1 },
        );
        let response = handler.handle_cover_sufficient(&msg, &bytes).await.unwrap();
        assert!(response.sufficient);

        let (msg, bytes) = signed_message(
            &secret,
            SubsystemId::PeerRegistry,
            SubsystemId::TrafficAccountant,
            CoverSufficientRequest { message_type: 17, level: 1 },
        );
        assert!(matches!(handler.handle_cover_sufficient(&msg, &bytes).await, Err(IpcError::Unauthorized { .. })));
    }
}
