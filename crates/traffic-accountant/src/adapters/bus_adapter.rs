//! Publishes `CoreEvent::CoverTrafficInsufficient` whenever an admission
//! check the GAP router relies on actually fails, so the rest of the node
//! can see cover-traffic pressure without polling for it.

use async_trait::async_trait;
use shared_bus::events::CoreEvent;
use shared_bus::publisher::EventPublisher;
use std::sync::Arc;

use crate::ports::inbound::TrafficAccountantApi;

#[async_trait]
pub trait TrafficBusAdapter: Send + Sync {
    async fn check_cover_and_publish(&self, message_type: u16, level: u32) -> bool;
}

pub struct EventBusAdapter<A, P>
where
    A: TrafficAccountantApi,
    P: EventPublisher,
{
    accountant: Arc<A>,
    publisher: Arc<P>,
}

impl<A, P> EventBusAdapter<A, P>
where
    A: TrafficAccountantApi,
    P: EventPublisher,
{
    pub fn new(accountant: Arc<A>, publisher: Arc<P>) -> Self {
        Self { accountant, publisher }
    }

    pub fn accountant(&self) -> &A {
        &self.accountant
    }
}

#[async_trait]
impl<A, P> TrafficBusAdapter for EventBusAdapter<A, P>
where
    A: TrafficAccountantApi + Send + Sync,
    P: EventPublisher + Send + Sync,
{
    async fn check_cover_and_publish(&self, message_type: u16, level: u32) -> bool {
        let sufficient = self.accountant.cover_sufficient(message_type, level);
        if !sufficient {
            self.publisher.publish(CoreEvent::CoverTrafficInsufficient { level }).await;
        }
        sufficient
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MessageDirection;
    use crate::ports::outbound::SystemTimeSource;
    use crate::service::TrafficAccountantService;
    use shared_bus::publisher::InMemoryEventBus;
    use shared_types::entities::PeerId;

    fn adapter() -> EventBusAdapter<TrafficAccountantService<SystemTimeSource>, InMemoryEventBus> {
        EventBusAdapter::new(
            Arc::new(TrafficAccountantService::new(SystemTimeSource)),
            Arc::new(InMemoryEventBus::new()),
        )
    }

    #[tokio::test]
    async fn a_covered_send_publishes_nothing() {
        let adapter = adapter();
        adapter.accountant().record(17, MessageDirection::Received, PeerId::from_public_key(b"p"), 64);
        assert!(adapter.check_cover_and_publish(17, 1).await);
    }

    #[tokio::test]
    async fn an_uncovered_send_is_reported_insufficient() {
        let adapter = adapter();
        assert!(!adapter.check_cover_and_publish(17, 5).await);
    }
}
