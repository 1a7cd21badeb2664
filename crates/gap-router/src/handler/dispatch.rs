//! Dispatches decoded wire messages from a peer into the router service and
//! publishes the resulting routing decision to the event bus.

use shared_types::entities::PeerId;

use crate::domain::{GapError, Requester};
use crate::handler::wire::{GapQueryMessage, GapResultMessage};
use crate::ports::inbound::{GapRouterApi, QueryOutcome, ReplyOutcome};

/// Handles one inbound `GAP_QUERY` frame from `from`.
pub fn dispatch_query<A: GapRouterApi>(
    api: &A,
    from: PeerId,
    message: GapQueryMessage,
) -> Result<QueryOutcome, GapError> {
    // GAP queries carry exactly one routing key per the simplified protocol
    // this substrate speaks; multi-keyword AND search, if present, is
    // collapsed by the caller into the single fingerprint key count.
    let query = *message.keys.first().ok_or(GapError::Rejected { reason: "empty key list".into() })?;
    api.handle_query(
        query,
        message.key_count(),
        message.ttl,
        message.priority,
        0,
        Requester::Peer(from),
        vec![from],
    )
}

/// Handles one inbound `GAP_RESULT` frame from `delivered_by`.
pub fn dispatch_reply<A: GapRouterApi>(
    api: &A,
    delivered_by: PeerId,
    query: shared_types::entities::Query,
    message: GapResultMessage,
) -> Result<ReplyOutcome, GapError> {
    api.handle_reply(query, message.block, delivered_by)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::GapConfig;
    use crate::ports::outbound::test_doubles::{FixedRandom, FixedTime, InMemoryLocalStore};
    use crate::service::GapRouterService;
    use shared_types::entities::{BlockType, DatastoreBlock, DatastoreBlockHeader, Query, SubsystemId};
    use std::sync::atomic::AtomicU64;
    use std::sync::atomic::AtomicI64;

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
    struct EmptyDirectory(AtomicI64);
    impl crate::ports::outbound::PeerDirectory for EmptyDirectory {
        fn forward_candidates(&self) -> Vec<crate::domain::ForwardCandidate> {
            vec![]
        }
        fn change_trust(&self, _peer: PeerId, delta: i64) -> i64 {
            self.0.fetch_add(delta, std::sync::atomic::Ordering::Relaxed);
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

    fn router() -> impl GapRouterApi {
        GapRouterService::new(
            GapConfig::default(),
            AllowAll,
            NoOpBloom,
            InMemoryLocalStore::default(),
            EmptyDirectory(AtomicI64::new(0)),
            AlwaysCover,
            NullTransport::default(),
            FixedTime(AtomicU64::new(1_000)),
            FixedRandom { range: 0, unit: 0.0 },
        )
    }

    #[test]
    fn a_decoded_query_frame_without_any_keys_is_rejected_before_reaching_the_service() {
        let api = router();
        let from = PeerId::from_public_key(b"peer");
        let msg = crate::handler::wire::GapQueryMessage { priority: 1, ttl: 1, keys: vec![], reply_to: from };
        assert!(matches!(dispatch_query(&api, from, msg), Err(GapError::Rejected { .. })));
    }

    #[test]
    fn a_decoded_query_frame_reaches_the_service_and_is_dropped_with_no_peers() {
        let api = router();
        let from = PeerId::from_public_key(b"peer");
        let msg = crate::handler::wire::GapQueryMessage {
            priority: 1,
            ttl: 1,
            keys: vec![Query([3; 64])],
            reply_to: from,
        };
        let outcome = dispatch_query(&api, from, msg).unwrap();
        assert_eq!(outcome, QueryOutcome::Dropped);
    }

    #[test]
    fn subsystem_registry_knows_the_gap_router() {
        assert_eq!(SubsystemId::from_u8(10), Some(SubsystemId::GapRouter));
    }

    #[test]
    fn block_header_round_trips_into_a_reply_dispatch() {
        let api = router();
        let query = Query([4; 64]);
        api.handle_query(query, 1, 5, 10, 0, Requester::LocalClient(uuid::Uuid::new_v4()), vec![]).unwrap();
        let msg = crate::handler::wire::GapResultMessage {
            block: DatastoreBlock {
                header: DatastoreBlockHeader {
                    size: 0,
                    block_type: BlockType::Data,
                    priority: 1,
                    anonymity_level: 0,
                    expiration_time: 0,
                },
                payload: vec![1],
            },
        };
        let outcome = dispatch_reply(&api, PeerId::from_public_key(b"d"), query, msg).unwrap();
        assert_eq!(outcome, ReplyOutcome::Routed { forwarded_to: 1 });
    }
}
