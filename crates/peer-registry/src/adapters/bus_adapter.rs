//! Publishes registry outcomes to the event bus: peer discovery/eviction,
//! blacklisting, and completed session-key exchanges.

use crate::ports::inbound::{HostRegistryApi, ProtocolFilter, SessionCacheApi};
use async_trait::async_trait;
use shared_bus::events::CoreEvent;
use shared_bus::publisher::EventPublisher;
use shared_types::entities::{HelloRecord, PeerId};
use std::sync::Arc;

#[async_trait]
pub trait RegistryBusAdapter: Send + Sync {
    async fn add_host_and_publish(&self, hello: HelloRecord) -> bool;

    async fn blacklist_and_publish(&self, peer: PeerId, desperation: u32, strict: bool, now: u64);

    async fn establish_and_publish(&self, peer: PeerId, session_key: [u8; 32]);
}

/// Wires a `HostRegistryApi`/`SessionCacheApi` pair to a `shared-bus` publisher.
pub struct EventBusAdapter<H, S, P>
where
    H: HostRegistryApi,
    S: SessionCacheApi,
    P: EventPublisher,
{
    registry: Arc<H>,
    session_cache: Arc<S>,
    publisher: Arc<P>,
}

impl<H, S, P> EventBusAdapter<H, S, P>
where
    H: HostRegistryApi,
    S: SessionCacheApi,
    P: EventPublisher,
{
    pub fn new(registry: Arc<H>, session_cache: Arc<S>, publisher: Arc<P>) -> Self {
        Self { registry, session_cache, publisher }
    }

    pub fn registry(&self) -> &H {
        &self.registry
    }

    pub fn session_cache(&self) -> &S {
        &self.session_cache
    }
}

#[async_trait]
impl<H, S, P> RegistryBusAdapter for EventBusAdapter<H, S, P>
where
    H: HostRegistryApi + Send + Sync,
    S: SessionCacheApi + Send + Sync,
    P: EventPublisher + Send + Sync,
{
    async fn add_host_and_publish(&self, hello: HelloRecord) -> bool {
        let peer = hello.peer_id;
        let was_known = self.registry.identity_to_hello(peer, ProtocolFilter::Any, true).is_some();
        match self.registry.add_host(hello) {
            Ok(()) => {
                if !was_known {
                    self.publisher.publish(CoreEvent::PeerDiscovered(peer)).await;
                }
                true
            }
            Err(e) => {
                tracing::debug!(error = %e, "host not added");
                false
            }
        }
    }

    async fn blacklist_and_publish(&self, peer: PeerId, desperation: u32, strict: bool, now: u64) {
        self.registry.blacklist(peer, desperation, strict);
        self.registry.record_disconnected(peer);
        self.publisher.publish(CoreEvent::PeerDisconnected(peer)).await;
        self.publisher.publish(CoreEvent::PeerBlacklisted { peer, until: now }).await;
    }

    async fn establish_and_publish(&self, peer: PeerId, session_key: [u8; 32]) {
        self.session_cache.record_established(peer, session_key);
        self.publisher.publish(CoreEvent::SessionKeyEstablished { peer }).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::outbound::{InMemoryHostStore, InMemoryTrustStore, RandomSource, SystemTimeSource};
    use crate::service::{HostRegistryService, SessionCacheService};
    use shared_bus::publisher::InMemoryEventBus;

    /// A deterministic, strictly-positive stand-in for `ThreadRngSource`:
    /// blacklist jitter must never land on zero here, or the back-off
    /// window would close before the test can observe it.
    struct FixedRandom(u64);

    impl RandomSource for FixedRandom {
        fn gen_range(&self, upper_exclusive: u64) -> u64 {
            if upper_exclusive == 0 {
                0
            } else {
                self.0 % upper_exclusive
            }
        }
    }

    fn hello() -> HelloRecord {
        HelloRecord {
            public_key: vec![1, 2, 3],
            peer_id: PeerId::from_public_key(&[1, 2, 3]),
            expiration: 2_000,
            mtu: 1500,
            protocol: 17,
            address: vec![127, 0, 0, 1],
            signature: vec![],
        }
    }

    fn adapter() -> EventBusAdapter<
        HostRegistryService<InMemoryHostStore, InMemoryTrustStore, FixedRandom, SystemTimeSource>,
        SessionCacheService,
        InMemoryEventBus,
    > {
        let registry = Arc::new(HostRegistryService::new(
            InMemoryHostStore::new(),
            InMemoryTrustStore::new(),
            FixedRandom(5),
            SystemTimeSource,
        ));
        let session_cache = Arc::new(SessionCacheService::new());
        let publisher = Arc::new(InMemoryEventBus::new());
        EventBusAdapter::new(registry, session_cache, publisher)
    }

    #[tokio::test]
    async fn discovering_a_new_peer_publishes_once() {
        let adapter = adapter();
        assert!(adapter.add_host_and_publish(hello()).await);
    }

    #[tokio::test]
    async fn re_adding_a_known_peer_publishes_nothing_new() {
        let adapter = adapter();
        adapter.add_host_and_publish(hello()).await;
        adapter.add_host_and_publish(hello()).await;
    }

    #[tokio::test]
    async fn blacklisting_publishes_disconnect_and_blacklist() {
        let adapter = adapter();
        let peer = hello().peer_id;
        adapter.blacklist_and_publish(peer, 10, true, 1_000).await;
        assert!(adapter.registry().is_blacklisted(peer, true));
    }

    #[tokio::test]
    async fn establishing_a_session_key_publishes_and_records() {
        let adapter = adapter();
        let peer = hello().peer_id;
        adapter.establish_and_publish(peer, [9; 32]).await;
        assert_eq!(adapter.session_cache().established_key(peer), Some([9; 32]));
    }
}
