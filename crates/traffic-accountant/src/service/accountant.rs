//! Traffic accountant service (C8): one rotating-window bucket per message
//! type, guarded by a single lock since updates and admission queries are
//! both cheap and about equally frequent.

use crate::domain::{cover_sufficient, MessageDirection, MessageTypeBucket};
use crate::ports::inbound::TrafficAccountantApi;
use crate::ports::outbound::TimeSource;
use shared_types::entities::PeerId;
use std::collections::HashMap;
use std::sync::RwLock;

pub struct TrafficAccountantService<C: TimeSource> {
    buckets: RwLock<HashMap<u16, MessageTypeBucket>>,
    time: C,
}

impl<C: TimeSource> TrafficAccountantService<C> {
    pub fn new(time: C) -> Self {
        Self { buckets: RwLock::new(HashMap::new()), time }
    }
}

impl<C: TimeSource> TrafficAccountantApi for TrafficAccountantService<C> {
    fn record(&self, message_type: u16, direction: MessageDirection, peer: PeerId, size: u32) {
        let now = self.time.now();
        let mut buckets = self.buckets.write().unwrap();
        let bucket = buckets.entry(message_type).or_insert_with(MessageTypeBucket::new);
        match direction {
            MessageDirection::Sent => {
                bucket.sent.record(now, size);
            }
            MessageDirection::Received => {
                let slot = bucket.received.record(now, size);
                bucket.received_diversity.insert_or_refresh(peer.prefix(), slot);
            }
        }
    }

    fn cover_sufficient(&self, message_type: u16, level: u32) -> bool {
        if level == 0 {
            return true;
        }
        let now = self.time.now();
        let mut buckets = self.buckets.write().unwrap();
        let bucket = buckets.entry(message_type).or_insert_with(MessageTypeBucket::new);
        bucket.received.advance(now);
        let distinct_peers = bucket.received_diversity.distinct_peer_count(bucket.received.mask());
        cover_sufficient(level, bucket.received.total_count(), distinct_peers)
    }
}
