//! S3 (two-peer forwarding): a query issued at peer B for content only
//! peer A holds must reach A within a few hops, and the reply must make
//! its way back into B's own store.
//!
//! `PeerTransport::send_query` only carries a peer id and the bare query
//! bytes (see `gap_router::ports::outbound::PeerTransport`) — ttl,
//! priority, and key count never cross the wire at this layer in the real
//! service, so a transport relaying straight into a sibling node's
//! `handle_query` has nothing to reconstruct them from. `RelayTransport`
//! below carries the hop's ttl/priority/key-count as fixed fields set up
//! by the test instead, standing in for whatever `handler::wire` would
//! have carried over a real connection.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use gap_router::{
    BlockVerifier, BloomIndex, CoverTrafficGate, ForwardCandidate, GapConfig, GapRouterApi,
    GapRouterService, LocalStore, PeerDirectory, PeerTransport, QueryOutcome, RandomSource,
    Requester, TimeSource,
};
use shared_types::entities::{hash512, BlockType, DatastoreBlock, DatastoreBlockHeader, PeerId, Query};

struct AllowAllVerifier;
impl BlockVerifier for AllowAllVerifier {
    fn verify(&self, _query: Query, _block_type: BlockType, _payload: &[u8]) -> bool {
        true
    }
}

#[derive(Default)]
struct NoOpBloom;
impl BloomIndex for NoOpBloom {
    fn maybe_present(&self, _query: Query) -> bool {
        true
    }
    fn update(&self, _query: Query, _insert: bool) {}
}

#[derive(Default)]
struct FixedLocalStore {
    rows: Mutex<HashMap<Query, Vec<DatastoreBlock>>>,
}
impl LocalStore for FixedLocalStore {
    fn get(&self, query: Query, block_type: Option<BlockType>) -> Vec<DatastoreBlock> {
        self.rows
            .lock()
            .unwrap()
            .get(&query)
            .map(|blocks| {
                blocks.iter().filter(|b| block_type.map_or(true, |t| b.header.block_type == t)).cloned().collect()
            })
            .unwrap_or_default()
    }
    fn put(&self, query: Query, block: DatastoreBlock) -> bool {
        let mut rows = self.rows.lock().unwrap();
        let entry = rows.entry(query).or_default();
        if entry.iter().any(|b| b.payload == block.payload) {
            return false;
        }
        entry.push(block);
        true
    }
}

/// Wraps `Arc<FixedLocalStore>` so it can satisfy `LocalStore` as a
/// generic parameter — the orphan rules forbid implementing a foreign
/// trait directly for `Arc<T>` even when `T` is local, since `Arc` is
/// not a fundamental type.
#[derive(Clone, Default)]
struct SharedLocalStore(Arc<FixedLocalStore>);
impl LocalStore for SharedLocalStore {
    fn get(&self, query: Query, block_type: Option<BlockType>) -> Vec<DatastoreBlock> {
        self.0.get(query, block_type)
    }
    fn put(&self, query: Query, block: DatastoreBlock) -> bool {
        self.0.put(query, block)
    }
}

struct FixedDirectory(Vec<ForwardCandidate>);
impl PeerDirectory for FixedDirectory {
    fn forward_candidates(&self) -> Vec<ForwardCandidate> {
        self.0.clone()
    }
    fn change_trust(&self, _peer: PeerId, _delta: i64) -> i64 {
        0
    }
}

struct AlwaysCover;
impl CoverTrafficGate for AlwaysCover {
    fn cover_sufficient(&self, _message_type: u16, _anonymity_level: u32) -> bool {
        true
    }
}

struct FixedTime(u64);
impl TimeSource for FixedTime {
    fn now(&self) -> u64 {
        self.0
    }
}

struct FixedRandom;
impl RandomSource for FixedRandom {
    fn gen_range(&self, _upper_exclusive: i32) -> i32 {
        0
    }
    fn gen_unit(&self) -> f64 {
        0.0
    }
}

/// Relays every `send_query`/`send_reply` straight into a sibling node's
/// router. Bound after both routers exist, via a clone of the `Arc` this
/// transport is wrapped in — `GapRouterService` owns its transport by
/// value, so the only way to keep a handle to it after construction is to
/// hand the service a clone of an `Arc` we kept for ourselves.
struct RelayTransport {
    peer: OnceLock<Arc<dyn GapRouterApi>>,
    self_id: PeerId,
    relay_key_count: u32,
    relay_ttl: i32,
    relay_priority: u32,
}

impl RelayTransport {
    fn new(self_id: PeerId) -> Self {
        Self { peer: OnceLock::new(), self_id, relay_key_count: 1, relay_ttl: 5, relay_priority: 50 }
    }

    fn bind(&self, target: Arc<dyn GapRouterApi>) {
        if self.peer.set(target).is_err() {
            panic!("bound twice");
        }
    }
}

/// Wraps `Arc<RelayTransport>` so it can satisfy `PeerTransport` as a
/// generic parameter — see `SharedLocalStore` above for why the orphan
/// rules require this instead of `impl PeerTransport for Arc<RelayTransport>`.
#[derive(Clone)]
struct SharedTransport(Arc<RelayTransport>);
impl SharedTransport {
    fn new(self_id: PeerId) -> Self {
        Self(Arc::new(RelayTransport::new(self_id)))
    }

    fn bind(&self, target: Arc<dyn GapRouterApi>) {
        self.0.bind(target)
    }
}

impl PeerTransport for SharedTransport {
    fn send_query(&self, peer: PeerId, fingerprint_bytes: &[u8]) {
        self.0.send_query(peer, fingerprint_bytes)
    }

    fn send_reply(&self, peer: PeerId, block: &DatastoreBlock) {
        self.0.send_reply(peer, block)
    }
}

impl PeerTransport for RelayTransport {
    fn send_query(&self, _peer: PeerId, fingerprint_bytes: &[u8]) {
        let bytes: [u8; 64] = fingerprint_bytes.try_into().expect("query is always 64 bytes");
        let query = Query(bytes);
        let target = self.peer.get().expect("relay target not bound");
        let _ = target.handle_query(
            query,
            self.relay_key_count,
            self.relay_ttl,
            self.relay_priority,
            0,
            Requester::Peer(self.self_id),
            vec![],
        );
    }

    fn send_reply(&self, _peer: PeerId, block: &DatastoreBlock) {
        let target = self.peer.get().expect("relay target not bound");
        // The block's own payload hashes back to its query, same as a
        // real wire-decoded GAP_RESULT would.
        let query = Query(hash512(&block.payload));
        let _ = target.handle_reply(query, block.clone(), self.self_id);
    }
}

fn block(payload: Vec<u8>) -> DatastoreBlock {
    DatastoreBlock {
        header: DatastoreBlockHeader {
            size: payload.len() as u32,
            block_type: BlockType::Data,
            priority: 10,
            anonymity_level: 0,
            expiration_time: 0,
        },
        payload,
    }
}

#[allow(clippy::type_complexity)]
type Node = GapRouterService<
    AllowAllVerifier,
    NoOpBloom,
    SharedLocalStore,
    FixedDirectory,
    AlwaysCover,
    SharedTransport,
    FixedTime,
    FixedRandom,
>;

fn node(store: SharedLocalStore, directory: FixedDirectory, transport: SharedTransport) -> Arc<Node> {
    Arc::new(GapRouterService::new(
        GapConfig { max_table_entries: 64, forward_peer_count: 1, ..GapConfig::default() },
        AllowAllVerifier,
        NoOpBloom,
        store,
        directory,
        AlwaysCover,
        transport,
        FixedTime(1_000),
        FixedRandom,
    ))
}

#[test]
fn s3_a_query_at_b_reaches_a_and_the_reply_lands_back_in_bs_store() {
    let a_id = PeerId::from_public_key(b"peer-a");
    let b_id = PeerId::from_public_key(b"peer-b");

    let payload = b"content only A holds".to_vec();
    let query = Query(hash512(&payload));

    // A is seeded with the block up front; its directory has no further
    // candidates, so it never tries to forward past itself.
    let a_store = SharedLocalStore::default();
    a_store.put(query, block(payload.clone()));
    let a_transport = SharedTransport::new(a_id);
    let a = node(a_store, FixedDirectory(vec![]), a_transport.clone());

    let b_store = SharedLocalStore::default();
    let b_transport = SharedTransport::new(b_id);
    let b = node(
        b_store.clone(),
        FixedDirectory(vec![ForwardCandidate { peer: a_id, trust: 10, bandwidth_share: 1.0 }]),
        b_transport.clone(),
    );

    let a_as_api: Arc<dyn GapRouterApi> = a.clone();
    let b_as_api: Arc<dyn GapRouterApi> = b.clone();
    b_transport.bind(a_as_api);
    a_transport.bind(b_as_api);

    let outcome = b
        .handle_query(query, 1, 10, 100, 0, Requester::LocalClient(uuid::Uuid::new_v4()), vec![])
        .unwrap();

    match outcome {
        QueryOutcome::Forwarded { forwarded_to, .. } => assert_eq!(forwarded_to, vec![a_id]),
        other => panic!("expected B to forward to A, got {other:?}"),
    }

    // The forward to A, A's local answer, and the reply relayed back to B
    // all happen synchronously inside `handle_query` above — by the time
    // it returns, B's own store must already hold the block A sent back.
    assert_eq!(b.table_len(), 1, "B's table entry for this query should still be outstanding");

    let in_b_store = b_store.get(query, None);
    assert_eq!(in_b_store.len(), 1);
    assert_eq!(in_b_store[0].payload, payload);
}
