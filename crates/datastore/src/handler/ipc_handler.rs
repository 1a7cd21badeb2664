//! IPC Handler for the datastore manager
//!
//! Enforces the sender/recipient authorization matrix before dispatching
//! to the service: the GAP router and the on-demand encoder may both
//! store content (`see shared_types::security::AuthorizationMatrix`), but
//! only the GAP router is allowed to issue a get.

use async_trait::async_trait;
use shared_types::entities::SubsystemId;
use shared_types::envelope::{AuthenticatedMessage, VerificationResult};
use shared_types::ipc::{DatastoreGetRequest, DatastoreGetResponse, DatastorePutRequest};
use shared_types::security::{KeyProvider, MessageVerifier};
use shared_types::subsystem_trait::{Subsystem, SubsystemError, SubsystemStatus};
use thiserror::Error;
use tracing::{debug, warn};

use crate::ports::inbound::DatastoreApi;

#[derive(Debug, Error)]
pub enum IpcError {
    #[error("message failed verification: {0:?}")]
    Unverified(VerificationResult),

    #[error("sender {sender:?} is not authorized to send {message_type}")]
    Unauthorized { sender: SubsystemId, message_type: &'static str },

    #[error("datastore rejected the request: {0}")]
    Store(#[from] crate::domain::DatastoreError),
}

/// Dispatches verified, authorized IPC requests to a `DatastoreApi`.
pub struct DatastoreHandler<S: DatastoreApi, K: KeyProvider> {
    service: S,
    verifier: MessageVerifier<K>,
}

impl<S: DatastoreApi, K: KeyProvider> DatastoreHandler<S, K> {
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

    pub async fn handle_put(
        &self,
        message: &AuthenticatedMessage<DatastorePutRequest>,
        message_bytes: &[u8],
    ) -> Result<(), IpcError> {
        self.authorize(message, message_bytes, "DatastorePutRequest")?;
        let request = &message.payload;
        self.service.put(request.query, request.value.clone()).await?;
        debug!(query = ?request.query, "block stored");
        Ok(())
    }

    pub async fn handle_get(
        &self,
        message: &AuthenticatedMessage<DatastoreGetRequest>,
        message_bytes: &[u8],
    ) -> Result<DatastoreGetResponse, IpcError> {
        self.authorize(message, message_bytes, "DatastoreGetRequest")?;
        let request = &message.payload;
        let matches = self.service.get(request.query, request.value_hash, request.block_type).await?;
        Ok(DatastoreGetResponse { matches })
    }
}

/// Lifecycle wrapper registering the datastore manager in the subsystem registry.
pub struct DatastoreSubsystem<S: DatastoreApi> {
    service: S,
}

impl<S: DatastoreApi> DatastoreSubsystem<S> {
    pub fn new(service: S) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &S {
        &self.service
    }
}

#[async_trait]
impl<S: DatastoreApi> Subsystem for DatastoreSubsystem<S> {
    fn id(&self) -> SubsystemId {
        SubsystemId::DatastoreManager
    }

    fn name(&self) -> &'static str {
        "Datastore Manager"
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
