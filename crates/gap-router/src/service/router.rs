//! GAP router service (C10): one query table guarded by a single lock.
//! Replies are matched and queued for send while the lock is held, then
//! the actual sends happen after release — the table lock is never held
//! while calling out to a peer transport or another subsystem, keeping the
//! `C10 -> C4 -> C3` acquisition order intact (this service never holds its
//! own lock across a call into the datastore's lock).

use std::sync::Mutex;

use shared_types::entities::{BlockType, DatastoreBlock, PeerId, Query};

use crate::domain::{
    decrement_priority, decrement_ttl, select_forward_peers, Fingerprint, GapConfig, GapError,
    QueryTable, QueryTableEntry, Requester,
};
use crate::ports::inbound::{GapRouterApi, QueryOutcome, ReplyOutcome};
use crate::ports::outbound::{
    BlockVerifier, BloomIndex, CoverTrafficGate, LocalStore, PeerDirectory, PeerTransport,
    RandomSource, TimeSource,
};

/// GAP reply/query wire message type, used when asking the traffic
/// accountant whether cover traffic justifies a send.
const GAP_RESULT_MESSAGE_TYPE: u16 = 0x0604;

#[allow(clippy::too_many_arguments)]
pub struct GapRouterService<V, B, S, D, C, X, T, R>
where
    V: BlockVerifier,
    B: BloomIndex,
    S: LocalStore,
    D: PeerDirectory,
    C: CoverTrafficGate,
    X: PeerTransport,
    T: TimeSource,
    R: RandomSource,
{
    table: Mutex<QueryTable>,
    config: GapConfig,
    verifier: V,
    bloom: B,
    store: S,
    directory: D,
    cover: C,
    transport: X,
    time: T,
    random: R,
}

impl<V, B, S, D, C, X, T, R> GapRouterService<V, B, S, D, C, X, T, R>
where
    V: BlockVerifier,
    B: BloomIndex,
    S: LocalStore,
    D: PeerDirectory,
    C: CoverTrafficGate,
    X: PeerTransport,
    T: TimeSource,
    R: RandomSource,
{
    pub fn new(
        config: GapConfig,
        verifier: V,
        bloom: B,
        store: S,
        directory: D,
        cover: C,
        transport: X,
        time: T,
        random: R,
    ) -> Self {
        Self {
            table: Mutex::new(QueryTable::new(config.max_table_entries)),
            config,
            verifier,
            bloom,
            store,
            directory,
            cover,
            transport,
            time,
            random,
        }
    }

    fn table_expiry(&self, now: u64, ttl: i32) -> u64 {
        now + (ttl.max(0) as u64 * self.config.ttl_unit_secs) + self.config.table_entry_slack_secs
    }
}

impl<V, B, S, D, C, X, T, R> GapRouterApi for GapRouterService<V, B, S, D, C, X, T, R>
where
    V: BlockVerifier,
    B: BloomIndex,
    S: LocalStore,
    D: PeerDirectory,
    C: CoverTrafficGate,
    X: PeerTransport,
    T: TimeSource,
    R: RandomSource,
{
    fn handle_query(
        &self,
        query: Query,
        key_count: u32,
        ttl: i32,
        priority: u32,
        anonymity_level: u32,
        requester: Requester,
        already_seen: Vec<PeerId>,
    ) -> Result<QueryOutcome, GapError> {
        let now = self.time.now();
        let fingerprint = Fingerprint::new(query, key_count);

        let local_hits = if self.bloom.maybe_present(query) {
            self.store.get(query, None)
        } else {
            Vec::new()
        };

        let mut replies_sent = 0usize;
        let reply_requester_peer = match requester {
            Requester::Peer(peer) => Some(peer),
            Requester::LocalClient(_) => None,
        };
        for block in &local_hits {
            let admitted = match reply_requester_peer {
                Some(_) => self.cover.cover_sufficient(GAP_RESULT_MESSAGE_TYPE, anonymity_level),
                None => true,
            };
            if !admitted {
                continue;
            }
            if let Some(peer) = reply_requester_peer {
                self.transport.send_reply(peer, block);
            }
            replies_sent += 1;
        }

        if ttl <= 0 {
            return if local_hits.is_empty() {
                Ok(QueryOutcome::Dropped)
            } else {
                Ok(QueryOutcome::AnsweredLocally { replies_sent })
            };
        }

        let candidates = self.directory.forward_candidates();
        let new_ttl = decrement_ttl(
            ttl,
            self.config.ttl_decrement_base,
            self.config.ttl_decrement_jitter_max,
            |max| self.random.gen_range(max),
        );
        let new_priority = decrement_priority(priority, ttl, new_ttl);
        let forwarded_to = select_forward_peers(
            &candidates,
            &already_seen,
            self.config.forward_peer_count,
            &mut || self.random.gen_unit(),
        );

        {
            let mut table = self.table.lock().unwrap();
            let mut entry = QueryTableEntry::new(
                fingerprint,
                new_ttl,
                new_priority,
                anonymity_level,
                requester,
                now,
                self.table_expiry(now, new_ttl),
            );
            for peer in already_seen.iter().chain(forwarded_to.iter()) {
                entry.mark_seen(*peer);
            }
            table.insert_or_refresh(entry)?;
        }

        for peer in &forwarded_to {
            self.transport.send_query(*peer, query.as_bytes());
        }

        if forwarded_to.is_empty() {
            if local_hits.is_empty() {
                return Ok(QueryOutcome::Dropped);
            }
            return Ok(QueryOutcome::AnsweredLocally { replies_sent });
        }

        Ok(QueryOutcome::Forwarded { replies_sent, forwarded_to })
    }

    fn handle_reply(
        &self,
        query: Query,
        block: DatastoreBlock,
        delivered_by: PeerId,
    ) -> Result<ReplyOutcome, GapError> {
        let valid = self.verifier.verify(query, block.header.block_type, &block.payload);
        if !valid {
            return Ok(ReplyOutcome::RejectedInvalid);
        }

        let newly_stored = self.store.put(query, block.clone());
        if newly_stored && block.header.block_type != BlockType::OnDemand {
            self.bloom.update(query, true);
        }

        let payload_hash = shared_types::entities::hash512(&block.payload);
        let matching = {
            let mut table = self.table.lock().unwrap();
            table.matching_entries(query)
        };

        if matching.is_empty() {
            return Ok(ReplyOutcome::NoMatchingRequester);
        }

        let mut forwarded_to = 0usize;
        let mut total_priority_budget = 0u32;
        for fingerprint in matching {
            let (requester, should_send, priority, anonymity_level) = {
                let mut table = self.table.lock().unwrap();
                match table.get_mut(&fingerprint) {
                    Some(entry) => {
                        let fresh = entry.record_delivery(truncate_to_32(&payload_hash));
                        (Some(entry.requester), fresh, entry.priority, entry.anonymity_level)
                    }
                    None => (None, false, 0, 0),
                }
            };
            let Some(requester) = requester else { continue };
            if !should_send {
                continue;
            }
            total_priority_budget = total_priority_budget.saturating_add(priority);
            let admitted = match requester {
                Requester::Peer(_) => self.cover.cover_sufficient(GAP_RESULT_MESSAGE_TYPE, anonymity_level),
                Requester::LocalClient(_) => true,
            };
            if !admitted {
                continue;
            }
            if let Requester::Peer(peer) = requester {
                self.transport.send_reply(peer, &block);
            }
            forwarded_to += 1;
        }

        if total_priority_budget > 0 {
            self.directory.change_trust(delivered_by, i64::from(total_priority_budget));
        }

        Ok(ReplyOutcome::Routed { forwarded_to })
    }

    fn expire_stale(&self, now: u64) -> usize {
        self.table.lock().unwrap().sweep_expired(now)
    }

    fn dropped_for_load(&self) -> u64 {
        self.table.lock().unwrap().dropped_for_load()
    }

    fn table_len(&self) -> usize {
        self.table.lock().unwrap().len()
    }
}

fn truncate_to_32(hash512: &[u8; 64]) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&hash512[..32]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ForwardCandidate;
    use crate::ports::outbound::test_doubles::{FixedRandom, FixedTime, InMemoryLocalStore};
    use shared_types::entities::{DatastoreBlockHeader, SubsystemId};
    use std::sync::atomic::AtomicU64;
    use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};

    struct AllowAllVerifier(AtomicBool);
    impl BlockVerifier for AllowAllVerifier {
        fn verify(&self, _query: Query, _block_type: BlockType, _payload: &[u8]) -> bool {
            self.0.load(Ordering::Relaxed)
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

    struct FixedDirectory {
        candidates: Vec<ForwardCandidate>,
        trust_delta: AtomicI64,
    }
    impl PeerDirectory for FixedDirectory {
        fn forward_candidates(&self) -> Vec<ForwardCandidate> {
            self.candidates.clone()
        }
        fn change_trust(&self, _peer: PeerId, delta: i64) -> i64 {
            self.trust_delta.fetch_add(delta, Ordering::Relaxed);
            delta
        }
    }

    struct AlwaysCover;
    impl CoverTrafficGate for AlwaysCover {
        fn cover_sufficient(&self, _message_type: u16, _anonymity_level: u32) -> bool {
            true
        }
    }

    #[derive(Default)]
    struct RecordingTransport {
        queries_sent: AtomicUsize,
        replies_sent: AtomicUsize,
    }
    impl PeerTransport for RecordingTransport {
        fn send_query(&self, _peer: PeerId, _fingerprint_bytes: &[u8]) {
            self.queries_sent.fetch_add(1, Ordering::Relaxed);
        }
        fn send_reply(&self, _peer: PeerId, _block: &DatastoreBlock) {
            self.replies_sent.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn query(byte: u8) -> Query {
        Query([byte; 64])
    }

    fn block(payload: Vec<u8>) -> DatastoreBlock {
        DatastoreBlock {
            header: DatastoreBlockHeader {
                size: 0,
                block_type: BlockType::Data,
                priority: 10,
                anonymity_level: 0,
                expiration_time: 10_000,
            },
            payload,
        }
    }

    #[allow(clippy::type_complexity)]
    fn service(
        candidates: Vec<ForwardCandidate>,
    ) -> GapRouterService<
        AllowAllVerifier,
        NoOpBloom,
        InMemoryLocalStore,
        FixedDirectory,
        AlwaysCover,
        RecordingTransport,
        FixedTime,
        FixedRandom,
    > {
        GapRouterService::new(
            GapConfig { max_table_entries: 8, forward_peer_count: 2, ..GapConfig::default() },
            AllowAllVerifier(AtomicBool::new(true)),
            NoOpBloom,
            InMemoryLocalStore::default(),
            FixedDirectory { candidates, trust_delta: AtomicI64::new(0) },
            AlwaysCover,
            RecordingTransport::default(),
            FixedTime(AtomicU64::new(1_000)),
            FixedRandom { range: 0, unit: 0.0 },
        )
    }

    fn candidate(byte: u8) -> ForwardCandidate {
        ForwardCandidate { peer: PeerId::from_public_key(&[byte]), trust: 10, bandwidth_share: 1.0 }
    }

    #[test]
    fn a_query_with_no_local_hit_and_live_ttl_is_forwarded() {
        let svc = service(vec![candidate(1), candidate(2), candidate(3)]);
        let outcome = svc
            .handle_query(
                query(9),
                1,
                10,
                100,
                0,
                Requester::Peer(PeerId::from_public_key(b"asker")),
                vec![],
            )
            .unwrap();
        match outcome {
            QueryOutcome::Forwarded { forwarded_to, .. } => assert_eq!(forwarded_to.len(), 2),
            other => panic!("expected Forwarded, got {other:?}"),
        }
        assert_eq!(svc.table_len(), 1);
    }

    #[test]
    fn a_query_never_forwards_to_a_peer_already_in_its_hop_set() {
        let asker = PeerId::from_public_key(b"asker");
        let svc = service(vec![candidate(1)]);
        let outcome = svc
            .handle_query(query(9), 1, 10, 100, 0, Requester::Peer(asker), vec![candidate(1).peer])
            .unwrap();
        assert_eq!(outcome, QueryOutcome::Dropped);
    }

    #[test]
    fn a_zero_ttl_query_with_no_local_hit_is_dropped() {
        let svc = service(vec![candidate(1)]);
        let outcome = svc
            .handle_query(query(9), 1, 0, 100, 0, Requester::LocalClient(uuid::Uuid::new_v4()), vec![])
            .unwrap();
        assert_eq!(outcome, QueryOutcome::Dropped);
        assert_eq!(svc.table_len(), 0);
    }

    #[test]
    fn a_reply_with_no_outstanding_query_is_stored_but_not_routed() {
        let svc = service(vec![]);
        let outcome =
            svc.handle_reply(query(9), block(vec![1, 2, 3]), PeerId::from_public_key(b"deliverer")).unwrap();
        assert_eq!(outcome, ReplyOutcome::NoMatchingRequester);
    }

    #[test]
    fn a_reply_matching_an_outstanding_query_is_routed_to_its_requester() {
        let asker = PeerId::from_public_key(b"asker");
        let svc = service(vec![]);
        svc.handle_query(query(9), 1, 5, 100, 0, Requester::Peer(asker), vec![]).unwrap();

        let outcome =
            svc.handle_reply(query(9), block(vec![1, 2, 3]), PeerId::from_public_key(b"deliverer")).unwrap();
        assert_eq!(outcome, ReplyOutcome::Routed { forwarded_to: 1 });
    }

    #[test]
    fn a_duplicate_reply_for_the_same_payload_is_not_routed_twice() {
        let asker = PeerId::from_public_key(b"asker");
        let svc = service(vec![]);
        svc.handle_query(query(9), 1, 5, 100, 0, Requester::Peer(asker), vec![]).unwrap();

        svc.handle_reply(query(9), block(vec![1, 2, 3]), PeerId::from_public_key(b"deliverer")).unwrap();
        let second =
            svc.handle_reply(query(9), block(vec![1, 2, 3]), PeerId::from_public_key(b"deliverer")).unwrap();
        assert_eq!(second, ReplyOutcome::Routed { forwarded_to: 0 });
    }

    #[test]
    fn sweeping_removes_only_entries_past_their_deadline() {
        let svc = service(vec![candidate(1)]);
        svc.handle_query(query(9), 1, 1, 100, 0, Requester::LocalClient(uuid::Uuid::new_v4()), vec![])
            .unwrap();
        assert_eq!(svc.table_len(), 1);
        assert_eq!(svc.expire_stale(100_000), 1);
        assert_eq!(svc.table_len(), 0);
    }

    #[test]
    fn subsystem_id_for_gap_router_is_ten() {
        assert_eq!(SubsystemId::GapRouter.as_u8(), 10);
    }
}
