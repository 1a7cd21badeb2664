//! # Event Bus Adapter
//!
//! Publishes `BloomIndexRebuilt` once a rebuild completes so the node's
//! telemetry and any subsystem waiting on a cold-start rebuild learn the
//! new entry count without polling the bloom index directly.

use async_trait::async_trait;
use shared_bus::events::CoreEvent;
use shared_bus::publisher::EventPublisher;
use std::sync::Arc;
use tracing::debug;

use crate::error::BloomError;
use crate::ports::inbound::BloomIndexApi;
use crate::ports::outbound::DatastoreKeyProvider;

/// Rebuilds the index and publishes the outcome to the event bus.
#[async_trait]
pub trait BloomIndexBusAdapter: Send + Sync {
    async fn rebuild_and_publish(&self, source: &(dyn DatastoreKeyProvider + Sync)) -> Result<usize, BloomError>;
}

/// Wires a `BloomIndexApi` to a `shared-bus` publisher.
pub struct EventBusAdapter<S, P>
where
    S: BloomIndexApi,
    P: EventPublisher,
{
    service: Arc<S>,
    publisher: Arc<P>,
}

impl<S, P> EventBusAdapter<S, P>
where
    S: BloomIndexApi,
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
impl<S, P> BloomIndexBusAdapter for EventBusAdapter<S, P>
where
    S: BloomIndexApi + Send + Sync,
    P: EventPublisher + Send + Sync,
{
    async fn rebuild_and_publish(&self, source: &(dyn DatastoreKeyProvider + Sync)) -> Result<usize, BloomError> {
        let entry_count = self.service.rebuild(source).await?;
        debug!(entry_count, "bloom index rebuild complete");
        self.publisher
            .publish(CoreEvent::BloomIndexRebuilt { entry_count })
            .await;
        Ok(entry_count)
    }
}
