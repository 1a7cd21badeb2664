//! Bloom Index Service
//!
//! Orchestrates the counting filter and the rebuild-from-datastore path.

use async_trait::async_trait;
use std::sync::RwLock;
use tracing::info;

use crate::domain::{parameters_from_quota, BloomIndexConfig, CountingBloomFilter};
use crate::error::BloomError;
use crate::ports::inbound::BloomIndexApi;
use crate::ports::outbound::DatastoreKeyProvider;
use shared_types::entities::Query;

pub struct BloomIndexService {
    filter: RwLock<CountingBloomFilter>,
    config: BloomIndexConfig,
}

impl BloomIndexService {
    /// Build an empty index sized from `config.quota_bytes`.
    pub fn new(config: BloomIndexConfig) -> Self {
        let params = parameters_from_quota(config.quota_bytes as usize, config.target_fpr);
        let filter = CountingBloomFilter::new(params.size_bits, params.hash_count);
        Self { filter: RwLock::new(filter), config }
    }

    /// Restore a previously persisted index instead of starting empty.
    pub fn from_persisted(config: BloomIndexConfig, bytes: &[u8]) -> Result<Self, BloomError> {
        let params = parameters_from_quota(config.quota_bytes as usize, config.target_fpr);
        let filter = CountingBloomFilter::from_bytes(bytes, params.size_bits, params.hash_count, 0)
            .ok_or_else(|| BloomError::Persistence("persisted index size mismatch with current quota".to_string()))?;
        Ok(Self { filter: RwLock::new(filter), config })
    }

    pub fn config(&self) -> &BloomIndexConfig {
        &self.config
    }

    /// Raw counter bytes suitable for writing to the index file.
    pub fn snapshot_bytes(&self) -> Vec<u8> {
        self.filter.read().expect("bloom filter lock poisoned").as_bytes().to_vec()
    }
}

#[async_trait]
impl BloomIndexApi for BloomIndexService {
    fn insert(&self, query: &Query) {
        self.filter.write().expect("bloom filter lock poisoned").insert(query);
    }

    fn remove(&self, query: &Query) {
        self.filter.write().expect("bloom filter lock poisoned").remove(query);
    }

    fn test(&self, query: &Query) -> bool {
        self.filter.read().expect("bloom filter lock poisoned").test(query)
    }

    async fn rebuild(&self, source: &(dyn DatastoreKeyProvider + Sync)) -> Result<usize, BloomError> {
        let queries = source.all_queries().await.map_err(BloomError::RebuildSource)?;
        let total = queries.len();

        let mut filter = self.filter.write().expect("bloom filter lock poisoned");
        filter.clear();

        let mut last_reported_percent = 0usize;
        for (i, query) in queries.iter().enumerate() {
            filter.insert(query);
            let percent = if total > 0 { (i + 1) * 100 / total } else { 100 };
            if percent >= last_reported_percent + 1 || i + 1 == total {
                info!(percent, inserted = i + 1, total, "bloom index rebuild progress");
                last_reported_percent = percent;
            }
        }

        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::entities::hash512;
    use std::sync::Mutex;

    fn q(s: &[u8]) -> Query {
        Query(hash512(s))
    }

    fn test_config() -> BloomIndexConfig {
        BloomIndexConfig { quota_bytes: 4096, target_fpr: 0.01, index_path: "/tmp/test-bloom.idx".into() }
    }

    struct FixedSource(Mutex<Vec<Query>>);

    #[async_trait]
    impl DatastoreKeyProvider for FixedSource {
        async fn all_queries(&self) -> Result<Vec<Query>, String> {
            Ok(self.0.lock().unwrap().clone())
        }
    }

    #[test]
    fn insert_then_test_is_maybe() {
        let service = BloomIndexService::new(test_config());
        let query = q(b"stored-block");
        service.insert(&query);
        assert!(service.test(&query));
    }

    #[test]
    fn remove_after_insert_is_no() {
        let service = BloomIndexService::new(test_config());
        let query = q(b"stored-block");
        service.insert(&query);
        service.remove(&query);
        assert!(!service.test(&query));
    }

    #[tokio::test]
    async fn rebuild_restores_every_key() {
        let service = BloomIndexService::new(test_config());
        let queries: Vec<Query> = (0..50).map(|i| q(format!("key-{i}").as_bytes())).collect();
        let source = FixedSource(Mutex::new(queries.clone()));

        let count = service.rebuild(&source).await.unwrap();

        assert_eq!(count, 50);
        for query in &queries {
            assert!(service.test(query));
        }
    }

    #[tokio::test]
    async fn rebuild_clears_stale_entries_first() {
        let service = BloomIndexService::new(test_config());
        service.insert(&q(b"stale-only"));

        let source = FixedSource(Mutex::new(vec![q(b"fresh")]));
        service.rebuild(&source).await.unwrap();

        assert!(service.test(&q(b"fresh")));
    }

    #[test]
    fn snapshot_bytes_has_fixed_size() {
        let service = BloomIndexService::new(test_config());
        let empty_len = service.snapshot_bytes().len();
        service.insert(&q(b"one-more"));
        assert_eq!(service.snapshot_bytes().len(), empty_len);
    }
}
