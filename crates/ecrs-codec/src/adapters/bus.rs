//! # Event Bus Adapter
//!
//! Publishes codec outcomes so other subsystems can react without a direct
//! call: the datastore manager drops a block as soon as it sees
//! `BlockVerificationFailed` for its query, and the on-demand encoder's
//! caller learns a block's query via `BlockEncoded`.

use crate::ports::inbound::EcrsCodecApi;
use async_trait::async_trait;
use shared_bus::events::CoreEvent;
use shared_bus::publisher::EventPublisher;
use shared_types::entities::{BlockType, Query};
use std::sync::Arc;
use tracing::{debug, warn};

/// Verifies or encodes a block and publishes the outcome to the event bus.
#[async_trait]
pub trait CodecBusAdapter: Send + Sync {
    async fn verify_and_publish(&self, query: Query, block_type: BlockType, payload: &[u8]) -> bool;

    async fn encode_and_publish(&self, plaintext: &[u8]) -> Query;
}

/// Wires an `EcrsCodecApi` to a `shared-bus` publisher.
pub struct EventBusAdapter<S, P>
where
    S: EcrsCodecApi,
    P: EventPublisher,
{
    service: Arc<S>,
    publisher: Arc<P>,
}

impl<S, P> EventBusAdapter<S, P>
where
    S: EcrsCodecApi,
    P: EventPublisher,
{
    pub fn new(service: Arc<S>, publisher: Arc<P>) -> Self {
        Self { service, publisher }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn publisher(&self) -> &P {
        &self.publisher
    }
}

#[async_trait]
impl<S, P> CodecBusAdapter for EventBusAdapter<S, P>
where
    S: EcrsCodecApi + Send + Sync,
    P: EventPublisher + Send + Sync,
{
    async fn verify_and_publish(&self, query: Query, block_type: BlockType, payload: &[u8]) -> bool {
        match self.service.verify_block(&query, block_type, payload) {
            Ok(()) => {
                debug!(?block_type, "block verified");
                self.publisher
                    .publish(CoreEvent::BlockVerified { query, block_type })
                    .await;
                true
            }
            Err(e) => {
                warn!(?block_type, error = %e, "block verification failed");
                self.publisher
                    .publish(CoreEvent::BlockVerificationFailed {
                        query,
                        reason: e.to_string(),
                    })
                    .await;
                false
            }
        }
    }

    async fn encode_and_publish(&self, plaintext: &[u8]) -> Query {
        let encoded = self.service.encode_data_block(plaintext);
        self.publisher
            .publish(CoreEvent::BlockEncoded { query: encoded.query })
            .await;
        encoded.query
    }
}
