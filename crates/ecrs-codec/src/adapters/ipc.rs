//! # IPC Message Handler
//!
//! Handles incoming `AuthenticatedMessage` requests from other subsystems,
//! enforcing the sender/recipient authorization matrix before dispatching
//! to the codec service.
//!
//! Authorized senders (see `shared_types::security::AuthorizationMatrix`):
//! the GAP router (`VerifyBlockRequest`, on incoming network blocks) and
//! the on-demand encoder (`EncodeBlockRequest`, on freshly materialized
//! DATA blocks).

use crate::ports::inbound::EcrsCodecApi;
use async_trait::async_trait;
use shared_types::entities::SubsystemId;
use shared_types::envelope::{AuthenticatedMessage, VerificationResult};
use shared_types::ipc::{EncodeBlockRequest, EncodeBlockResponse, VerifyBlockRequest, VerifyBlockResponse};
use shared_types::security::{KeyProvider, MessageVerifier};
use shared_types::subsystem_trait::{Subsystem, SubsystemError, SubsystemStatus};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors surfaced to the transport layer when a request cannot be handled.
#[derive(Debug, Error)]
pub enum IpcError {
    #[error("message failed verification: {0:?}")]
    Unverified(VerificationResult),

    #[error("sender {sender:?} is not authorized to send {message_type}")]
    Unauthorized { sender: SubsystemId, message_type: &'static str },
}

/// Dispatches verified, authorized IPC requests to an `EcrsCodecApi`.
pub struct IpcHandler<S: EcrsCodecApi, K: KeyProvider> {
    service: S,
    verifier: MessageVerifier<K>,
}

impl<S: EcrsCodecApi, K: KeyProvider> IpcHandler<S, K> {
    pub fn new(service: S, verifier: MessageVerifier<K>) -> Self {
        Self { service, verifier }
    }

    fn authorize(
        &self,
        message: &AuthenticatedMessage<impl serde::Serialize>,
        message_bytes: &[u8],
        message_type: &'static str,
    ) -> Result<(), IpcError> {
        let result = self.verifier.verify(message, message_bytes);
        if !result.is_valid() {
            warn!(?result, sender = ?message.sender_id, message_type, "rejected unverified IPC message");
            return Err(IpcError::Unverified(result));
        }
        if !self.verifier.is_authorized(message.sender_id, message_type) {
            warn!(sender = ?message.sender_id, message_type, "rejected unauthorized IPC sender");
            return Err(IpcError::Unauthorized {
                sender: message.sender_id,
                message_type,
            });
        }
        Ok(())
    }

    pub fn handle_verify_block(
        &self,
        message: &AuthenticatedMessage<VerifyBlockRequest>,
        message_bytes: &[u8],
    ) -> Result<VerifyBlockResponse, IpcError> {
        self.authorize(message, message_bytes, "VerifyBlockRequest")?;

        let request = &message.payload;
        match self
            .service
            .verify_block(&request.query, request.block_type, &request.payload)
        {
            Ok(()) => {
                debug!(block_type = ?request.block_type, "block verified");
                Ok(VerifyBlockResponse { valid: true, reason: None })
            }
            Err(e) => Ok(VerifyBlockResponse {
                valid: false,
                reason: Some(e.to_string()),
            }),
        }
    }

    pub fn handle_encode_block(
        &self,
        message: &AuthenticatedMessage<EncodeBlockRequest>,
        message_bytes: &[u8],
    ) -> Result<EncodeBlockResponse, IpcError> {
        self.authorize(message, message_bytes, "EncodeBlockRequest")?;

        let encoded = self.service.encode_data_block(&message.payload.plaintext);
        Ok(EncodeBlockResponse {
            query: encoded.query,
            ciphertext: encoded.ciphertext,
        })
    }
}

/// Lifecycle wrapper so the codec can be registered in the subsystem
/// registry alongside the stateful components. The codec itself holds no
/// background tasks or mutable state, so lifecycle is a formality.
pub struct EcrsCodecSubsystem<S: EcrsCodecApi> {
    service: S,
}

impl<S: EcrsCodecApi> EcrsCodecSubsystem<S> {
    pub fn new(service: S) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &S {
        &self.service
    }
}

#[async_trait]
impl<S: EcrsCodecApi + Send + Sync> Subsystem for EcrsCodecSubsystem<S> {
    fn id(&self) -> SubsystemId {
        SubsystemId::EcrsCodec
    }

    fn name(&self) -> &'static str {
        "ECRS Block Codec"
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
    use crate::service::EcrsCodecService;
    use shared_types::security::NonceCache;
    use std::sync::Arc;
    use uuid::Uuid;

    struct StaticKeyProvider(Vec<u8>);

    impl KeyProvider for StaticKeyProvider {
        fn get_shared_secret(&self, _sender_id: SubsystemId) -> Option<Vec<u8>> {
            Some(self.0.clone())
        }
    }

    fn signed_message(
        secret: &[u8],
        sender_id: SubsystemId,
        payload: VerifyBlockRequest,
    ) -> (AuthenticatedMessage<VerifyBlockRequest>, Vec<u8>) {
        let mut message = AuthenticatedMessage {
            version: AuthenticatedMessage::<VerifyBlockRequest>::CURRENT_VERSION,
            sender_id,
            recipient_id: SubsystemId::EcrsCodec,
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

    #[test]
    fn authorized_sender_gets_verified() {
        let secret = b"shared-secret".to_vec();
        let verifier = MessageVerifier::new(
            SubsystemId::EcrsCodec,
            Arc::new(NonceCache::new()),
            StaticKeyProvider(secret.clone()),
        );
        let handler = IpcHandler::new(EcrsCodecService::new(), verifier);

        let encoded = handler.service.encode_data_block(b"payload");
        let request = VerifyBlockRequest {
            query: encoded.query,
            block_type: shared_types::entities::BlockType::Data,
            payload: encoded.ciphertext,
        };
        let (message, bytes) = signed_message(&secret, SubsystemId::GapRouter, request);

        let response = handler.handle_verify_block(&message, &bytes).unwrap();
        assert!(response.valid);
    }

    #[test]
    fn unauthorized_sender_rejected() {
        let secret = b"shared-secret".to_vec();
        let verifier = MessageVerifier::new(
            SubsystemId::EcrsCodec,
            Arc::new(NonceCache::new()),
            StaticKeyProvider(secret.clone()),
        );
        let handler = IpcHandler::new(EcrsCodecService::new(), verifier);

        let request = VerifyBlockRequest {
            query: shared_types::entities::Query([0u8; 64]),
            block_type: shared_types::entities::BlockType::Data,
            payload: vec![1, 2, 3],
        };
        let (message, bytes) = signed_message(&secret, SubsystemId::BloomIndex, request);

        assert!(matches!(
            handler.handle_verify_block(&message, &bytes),
            Err(IpcError::Unauthorized { .. })
        ));
    }
}
