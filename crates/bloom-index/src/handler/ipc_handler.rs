//! IPC Handler for the bloom index subsystem
//!
//! Enforces the sender/recipient authorization matrix before dispatching
//! to the service: the GAP router tests membership on its local lookup
//! step, and the datastore manager is the only sender allowed to mutate
//! the index (see `shared_types::security::AuthorizationMatrix`).

use async_trait::async_trait;
use shared_types::entities::SubsystemId;
use shared_types::envelope::{AuthenticatedMessage, VerificationResult};
use shared_types::ipc::{BloomTestRequest, BloomTestResponse, BloomUpdateRequest, BloomUpdateResponse};
use shared_types::security::{KeyProvider, MessageVerifier};
use shared_types::subsystem_trait::{Subsystem, SubsystemError, SubsystemStatus};
use thiserror::Error;
use tracing::{debug, warn};

use crate::ports::inbound::BloomIndexApi;

#[derive(Debug, Error)]
pub enum IpcError {
    #[error("message failed verification: {0:?}")]
    Unverified(VerificationResult),

    #[error("sender {sender:?} is not authorized to send {message_type}")]
    Unauthorized { sender: SubsystemId, message_type: &'static str },
}

/// Dispatches verified, authorized IPC requests to a `BloomIndexApi`.
pub struct BloomIndexHandler<S: BloomIndexApi, K: KeyProvider> {
    service: S,
    verifier: MessageVerifier<K>,
}

impl<S: BloomIndexApi, K: KeyProvider> BloomIndexHandler<S, K> {
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

    pub fn handle_bloom_test(
        &self,
        message: &AuthenticatedMessage<BloomTestRequest>,
        message_bytes: &[u8],
    ) -> Result<BloomTestResponse, IpcError> {
        self.authorize(message, message_bytes, "BloomTestRequest")?;
        let maybe_present = self.service.test(&message.payload.query);
        debug!(?maybe_present, "bloom test handled");
        Ok(BloomTestResponse { maybe_present })
    }

    pub fn handle_bloom_update(
        &self,
        message: &AuthenticatedMessage<BloomUpdateRequest>,
        message_bytes: &[u8],
    ) -> Result<BloomUpdateResponse, IpcError> {
        self.authorize(message, message_bytes, "BloomUpdateRequest")?;
        let request = &message.payload;
        if request.insert {
            self.service.insert(&request.query);
        } else {
            self.service.remove(&request.query);
        }
        Ok(BloomUpdateResponse { applied: true })
    }
}

/// Lifecycle wrapper registering the bloom index in the subsystem registry.
pub struct BloomIndexSubsystem<S: BloomIndexApi> {
    service: S,
}

impl<S: BloomIndexApi> BloomIndexSubsystem<S> {
    pub fn new(service: S) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &S {
        &self.service
    }
}

#[async_trait]
impl<S: BloomIndexApi> Subsystem for BloomIndexSubsystem<S> {
    fn id(&self) -> SubsystemId {
        SubsystemId::BloomIndex
    }

    fn name(&self) -> &'static str {
        "Bloom Index"
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
