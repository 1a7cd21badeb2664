//! Publishes routing outcomes to the event bus: every forward and every
//! drop-for-load is visible to subscribers (telemetry, the bootstrap
//! driver deciding whether this node looks overloaded, etc.).

use async_trait::async_trait;
use shared_bus::events::CoreEvent;
use shared_bus::publisher::EventPublisher;
use shared_types::entities::{PeerId, Query};
use std::sync::Arc;

use crate::domain::{GapError, Requester};
use crate::ports::inbound::{GapRouterApi, QueryOutcome};

#[async_trait]
pub trait GapRouterBusAdapter: Send + Sync {
    async fn route_query_and_publish(
        &self,
        query: Query,
        key_count: u32,
        ttl: i32,
        priority: u32,
        anonymity_level: u32,
        requester: Requester,
        already_seen: Vec<PeerId>,
    ) -> Result<QueryOutcome, GapError>;
}

pub struct EventBusAdapter<A: GapRouterApi, P: EventPublisher> {
    router: Arc<A>,
    publisher: Arc<P>,
}

impl<A: GapRouterApi, P: EventPublisher> EventBusAdapter<A, P> {
    pub fn new(router: Arc<A>, publisher: Arc<P>) -> Self {
        Self { router, publisher }
    }

    pub fn router(&self) -> &A {
        &self.router
    }
}

#[async_trait]
impl<A: GapRouterApi + Send + Sync, P: EventPublisher + Send + Sync> GapRouterBusAdapter
    for EventBusAdapter<A, P>
{
    async fn route_query_and_publish(
        &self,
        query: Query,
        key_count: u32,
        ttl: i32,
        priority: u32,
        anonymity_level: u32,
        requester: Requester,
        already_seen: Vec<PeerId>,
    ) -> Result<QueryOutcome, GapError> {
        let outcome =
            self.router.handle_query(query, key_count, ttl, priority, anonymity_level, requester, already_seen);
        match &outcome {
            Ok(QueryOutcome::Forwarded { .. }) | Ok(QueryOutcome::AnsweredLocally { .. }) => {
                self.publisher.publish(CoreEvent::QueryRouted { query, ttl: ttl.max(0) as u32 }).await;
            }
            Ok(QueryOutcome::Dropped) => {
                self.publisher
                    .publish(CoreEvent::QueryDropped { query, reason: "ttl exhausted, no local hit".into() })
                    .await;
            }
            Err(GapError::TableFull { .. }) => {
                self.publisher
                    .publish(CoreEvent::QueryDropped { query, reason: "query table at capacity".into() })
                    .await;
            }
            Err(_) => {}
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::GapConfig;
    use crate::ports::outbound::test_doubles::{FixedRandom, FixedTime, InMemoryLocalStore};
    use crate::service::GapRouterService;
    use shared_bus::publisher::InMemoryEventBus;
    use shared_types::entities::{BlockType, DatastoreBlock};
    use std::sync::atomic::AtomicU64;

    struct AllowAll;
    impl crate::ports::outbound::BlockVerifier for AllowAll {
        fn verify(&self, _q: Query, _t: BlockType, _p: &[u8]) -> bool {
            true
        }
    }
    #[derive(Default)]
    struct NoOpBloom;
    impl crate::ports::outbound::BloomIndex for NoOpBloom {
        fn maybe_present(&self, _q: Query) -> bool {
            true
        }
        fn update(&self, _q: Query, _insert: bool) {}
    }
    #[derive(Default)]
    struct EmptyDirectory;
    impl crate::ports::outbound::PeerDirectory for EmptyDirectory {
        fn forward_candidates(&self) -> Vec<crate::domain::ForwardCandidate> {
            vec![]
        }
        fn change_trust(&self, _peer: PeerId, delta: i64) -> i64 {
            delta
        }
    }
    struct AlwaysCover;
    impl crate::ports::outbound::CoverTrafficGate for AlwaysCover {
        fn cover_sufficient(&self, _t: u16, _l: u32) -> bool {
            true
        }
    }
    #[derive(Default)]
    struct NullTransport;
    impl crate::ports::outbound::PeerTransport for NullTransport {
        fn send_query(&self, _peer: PeerId, _bytes: &[u8]) {}
        fn send_reply(&self, _peer: PeerId, _block: &DatastoreBlock) {}
    }

    fn adapter() -> EventBusAdapter<
        GapRouterService<
            AllowAll,
            NoOpBloom,
            InMemoryLocalStore,
            EmptyDirectory,
            AlwaysCover,
            NullTransport,
            FixedTime,
            FixedRandom,
        >,
        InMemoryEventBus,
    > {
        let router = Arc::new(GapRouterService::new(
            GapConfig::default(),
            AllowAll,
            NoOpBloom,
            InMemoryLocalStore::default(),
            EmptyDirectory,
            AlwaysCover,
            NullTransport::default(),
            FixedTime(AtomicU64::new(1_000)),
            FixedRandom { range: 0, unit: 0.0 },
        ));
        let publisher = Arc::new(InMemoryEventBus::new());
        EventBusAdapter::new(router, publisher)
    }

    #[tokio::test]
    async fn a_dropped_query_still_runs_through_the_adapter_without_panicking() {
        let adapter = adapter();
        let outcome = adapter
            .route_query_and_publish(
                Query([1; 64]),
                1,
                0,
                10,
                0,
                Requester::LocalClient(uuid::Uuid::new_v4()),
                vec![],
            )
            .await
            .unwrap();
        assert_eq!(outcome, QueryOutcome::Dropped);
    }
}
