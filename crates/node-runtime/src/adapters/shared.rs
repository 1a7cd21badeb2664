//! `Shared<T>` lets one concrete service instance be held by more than one
//! owner at once: the subsystem registry's lifecycle wrapper (which takes
//! its service by value) and an outbound-port adapter that needs to keep
//! calling into the same instance. `T: XApi` trait bounds are generic
//! over the implementor, so a local, generic forwarding impl (`Shared<T>`
//! is a type this crate owns, satisfying the orphan rule) lets an
//! `Arc<T>` stand in anywhere a by-value `T: XApi` is expected, without
//! the sibling crates needing to know `Arc` exists.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use bloom_index::error::BloomError;
use bloom_index::ports::inbound::BloomIndexApi;
use bloom_index::ports::outbound::DatastoreKeyProvider;
use datastore::domain::DatastoreError;
use datastore::ports::inbound::DatastoreApi;
use ecrs_codec::domain::errors::CodecError;
use ecrs_codec::domain::entities::EncodedBlock;
use ecrs_codec::ports::inbound::EcrsCodecApi;
use peer_registry::domain::RegistryError;
use peer_registry::ports::inbound::{BootstrapDriverApi, HostRegistryApi, ProtocolFilter, SessionCacheApi};
use peer_registry::ports::outbound::ConnectedCountSource;
use shared_types::entities::{BlockType, DatastoreBlock, HelloRecord, PeerId, Query};
use traffic_accountant::domain::MessageDirection;
use traffic_accountant::ports::inbound::TrafficAccountantApi;

pub struct Shared<T>(pub Arc<T>);

impl<T> Shared<T> {
    pub fn new(inner: T) -> Self {
        Self(Arc::new(inner))
    }
}

impl<T> Clone for Shared<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

/// Runs a future to completion from sync code already inside a Tokio
/// runtime. Every sibling `*Handler::handle_*` body this bridges to is
/// `async fn` purely for IPC-handler shape consistency — none of them
/// actually await a pending future, so this never blocks a worker thread
/// on real I/O; it just pays for one extra poll.
pub fn block_on<F: Future>(fut: F) -> F::Output {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(fut))
}

impl<T: EcrsCodecApi> EcrsCodecApi for Shared<T> {
    fn encode_data_block(&self, plaintext: &[u8]) -> EncodedBlock {
        self.0.encode_data_block(plaintext)
    }

    fn decode_data_block(&self, ciphertext: &[u8], plaintext_hash: &[u8; 64]) -> Result<Vec<u8>, CodecError> {
        self.0.decode_data_block(ciphertext, plaintext_hash)
    }

    fn verify_block(&self, query: &Query, block_type: BlockType, payload: &[u8]) -> Result<(), CodecError> {
        self.0.verify_block(query, block_type, payload)
    }
}

#[async_trait]
impl<T: BloomIndexApi> BloomIndexApi for Shared<T> {
    fn insert(&self, query: &Query) {
        self.0.insert(query)
    }

    fn remove(&self, query: &Query) {
        self.0.remove(query)
    }

    fn test(&self, query: &Query) -> bool {
        self.0.test(query)
    }

    async fn rebuild(&self, source: &(dyn DatastoreKeyProvider + Sync)) -> Result<usize, BloomError> {
        self.0.rebuild(source).await
    }
}

#[async_trait]
impl<T: DatastoreApi> DatastoreApi for Shared<T> {
    async fn put(&self, query: Query, block: DatastoreBlock) -> Result<(), DatastoreError> {
        self.0.put(query, block).await
    }

    async fn get(&self, query: Query, value_hash: Option<[u8; 32]>, block_type: Option<BlockType>) -> Result<Vec<DatastoreBlock>, DatastoreError> {
        self.0.get(query, value_hash, block_type).await
    }

    async fn del(&self, query: Query, value_hash: [u8; 32]) -> Result<bool, DatastoreError> {
        self.0.del(query, value_hash).await
    }

    async fn fast_get(&self, query: Query) -> bool {
        self.0.fast_get(query).await
    }
}

impl<T: HostRegistryApi> HostRegistryApi for Shared<T> {
    fn add_host(&self, hello: HelloRecord) -> Result<(), RegistryError> {
        self.0.add_host(hello)
    }

    fn add_temporary(&self, hello: HelloRecord) {
        self.0.add_temporary(hello)
    }

    fn identity_to_hello(&self, peer: PeerId, protocol: ProtocolFilter, allow_temporary: bool) -> Option<HelloRecord> {
        self.0.identity_to_hello(peer, protocol, allow_temporary)
    }

    fn for_each_host(&self, now: u64, visit: &mut dyn FnMut(PeerId, &HelloRecord)) {
        self.0.for_each_host(now, visit)
    }

    fn change_trust(&self, peer: PeerId, delta: i64) -> i64 {
        self.0.change_trust(peer, delta)
    }

    fn current_trust(&self, peer: PeerId) -> u32 {
        self.0.current_trust(peer)
    }

    fn blacklist(&self, peer: PeerId, desperation: u32, strict: bool) {
        self.0.blacklist(peer, desperation, strict)
    }

    fn whitelist(&self, peer: PeerId) {
        self.0.whitelist(peer)
    }

    fn is_blacklisted(&self, peer: PeerId, strict_query: bool) -> bool {
        self.0.is_blacklisted(peer, strict_query)
    }

    fn verify_peer_signature(&self, peer: PeerId, message: &[u8], signature: &[u8]) -> bool {
        self.0.verify_peer_signature(peer, message, signature)
    }

    fn record_connected(&self, peer: PeerId) {
        self.0.record_connected(peer)
    }

    fn record_disconnected(&self, peer: PeerId) {
        self.0.record_disconnected(peer)
    }

    fn connected_count(&self) -> usize {
        self.0.connected_count()
    }

    fn flush_trust(&self) -> Result<usize, RegistryError> {
        self.0.flush_trust()
    }

    fn rescan_hosts(&self) -> Result<usize, RegistryError> {
        self.0.rescan_hosts()
    }

    fn prune_stale_hosts(&self, now: u64) -> Result<usize, RegistryError> {
        self.0.prune_stale_hosts(now)
    }
}

impl<T: ConnectedCountSource> ConnectedCountSource for Shared<T> {
    fn connected_count(&self) -> usize {
        self.0.connected_count()
    }

    fn add_temporary_hello(&self, hello: HelloRecord) {
        self.0.add_temporary_hello(hello)
    }
}

impl<T: SessionCacheApi> SessionCacheApi for Shared<T> {
    fn get(&self, peer: PeerId, session_key: [u8; 32], time_limit: u64, message_size: u32) -> Option<Vec<u8>> {
        self.0.get(peer, session_key, time_limit, message_size)
    }

    fn put(&self, peer: PeerId, session_key: [u8; 32], time_limit: u64, message_size: u32, message: Vec<u8>) {
        self.0.put(peer, session_key, time_limit, message_size, message)
    }

    fn established_key(&self, peer: PeerId) -> Option<[u8; 32]> {
        self.0.established_key(peer)
    }

    fn record_established(&self, peer: PeerId, session_key: [u8; 32]) {
        self.0.record_established(peer, session_key)
    }
}

#[async_trait]
impl<T: BootstrapDriverApi> BootstrapDriverApi for Shared<T> {
    async fn tick(&self, now: u64) -> bool {
        self.0.tick(now).await
    }

    fn is_settled(&self) -> bool {
        self.0.is_settled()
    }
}

impl<T: TrafficAccountantApi> TrafficAccountantApi for Shared<T> {
    fn record(&self, message_type: u16, direction: MessageDirection, peer: PeerId, size: u32) {
        self.0.record(message_type, direction, peer, size)
    }

    fn cover_sufficient(&self, message_type: u16, level: u32) -> bool {
        self.0.cover_sufficient(message_type, level)
    }
}
