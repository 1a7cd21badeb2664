//! Publishes datastore outcomes so other subsystems can react without a
//! direct call: the bloom index already heard about individual
//! inserts/removes through its own update path, but `BlockStored` and
//! `BlockEvicted` are what a telemetry consumer or the GAP router's
//! cache-warming logic actually watches for.

use crate::ports::inbound::DatastoreApi;
use crate::service::MaintenanceReport;
use async_trait::async_trait;
use shared_bus::events::CoreEvent;
use shared_bus::publisher::EventPublisher;
use shared_types::entities::{BlockType, DatastoreBlock, Query};
use std::sync::Arc;

#[async_trait]
pub trait DatastoreBusAdapter: Send + Sync {
    async fn put_and_publish(&self, query: Query, block: DatastoreBlock, block_type: BlockType) -> bool;

    async fn publish_maintenance_report(&self, report: MaintenanceReport);
}

/// Wires a `DatastoreApi` to a `shared-bus` publisher.
pub struct EventBusAdapter<S, P>
where
    S: DatastoreApi,
    P: EventPublisher,
{
    service: Arc<S>,
    publisher: Arc<P>,
}

impl<S, P> EventBusAdapter<S, P>
where
    S: DatastoreApi,
    P: EventPublisher,
{
    pub fn new(service: Arc<S>, publisher: Arc<P>) -> Self {
        Self { service, publisher }
    }

    pub fn service(&self) -> &S {
        &self.service
    }
}

#[async_trait]
impl<S, P> DatastoreBusAdapter for EventBusAdapter<S, P>
where
    S: DatastoreApi + Send + Sync,
    P: EventPublisher + Send + Sync,
{
    async fn put_and_publish(&self, query: Query, block: DatastoreBlock, block_type: BlockType) -> bool {
        match self.service.put(query, block).await {
            Ok(()) => {
                self.publisher.publish(CoreEvent::BlockStored { query, block_type }).await;
                true
            }
            Err(e) => {
                tracing::debug!(error = %e, "block not stored");
                false
            }
        }
    }

    async fn publish_maintenance_report(&self, report: MaintenanceReport) {
        for query in report.expired_evicted {
            self.publisher
                .publish(CoreEvent::BlockEvicted { query, reason: "expired".to_string() })
                .await;
        }
        for query in report.floor_evicted {
            self.publisher
                .publish(CoreEvent::BlockEvicted { query, reason: "quota free floor".to_string() })
                .await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DatastoreConfig;
    use crate::ports::outbound::InMemoryKVStore;
    use crate::service::{DatastoreManagerService, SqstoreService};
    use bloom_index::{BloomIndexConfig, BloomIndexService};
    use shared_bus::publisher::InMemoryEventBus;
    use shared_types::entities::{hash512, DatastoreBlockHeader};

    fn manager() -> DatastoreManagerService<SqstoreService<InMemoryKVStore>, BloomIndexService> {
        let sqstore = SqstoreService::new(InMemoryKVStore::new()).unwrap();
        let bloom = BloomIndexService::new(BloomIndexConfig::new(4096, 0.01, "/tmp/test-ds-bus.idx".into()).unwrap());
        DatastoreManagerService::new(sqstore, bloom, DatastoreConfig::new(1_000_000, 0, "/tmp/ondemand".into()))
    }

    #[tokio::test]
    async fn publishes_block_stored_on_success() {
        let service = Arc::new(manager());
        let publisher = Arc::new(InMemoryEventBus::new());
        let adapter = EventBusAdapter::new(service, publisher.clone());

        let query = Query(hash512(b"content"));
        let block = DatastoreBlock {
            header: DatastoreBlockHeader { size: 3, block_type: BlockType::Data, priority: 5, anonymity_level: 0, expiration_time: 0 },
            payload: vec![1, 2, 3],
        };
        let stored = adapter.put_and_publish(query, block, BlockType::Data).await;

        assert!(stored);
        assert_eq!(publisher.events_published(), 1);
    }

    #[tokio::test]
    async fn publishes_one_evicted_event_per_expired_row() {
        let service = Arc::new(manager());
        let publisher = Arc::new(InMemoryEventBus::new());
        let adapter = EventBusAdapter::new(service.clone(), publisher.clone());

        let report = MaintenanceReport { expired_evicted: vec![Query(hash512(b"a"))], floor_evicted: vec![] };
        adapter.publish_maintenance_report(report).await;

        assert_eq!(publisher.events_published(), 1);
    }
}
