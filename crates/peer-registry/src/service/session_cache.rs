//! Session-key cache service (C7): a thin, lockable wrapper around the
//! domain-level LRU-by-time-limit cache.

use crate::domain::session_cache::{SessionCacheKey, SessionKeyCache};
use crate::ports::inbound::SessionCacheApi;
use shared_types::entities::PeerId;
use std::collections::HashMap;
use std::sync::{Mutex, RwLock};

pub struct SessionCacheService {
    cache: Mutex<SessionKeyCache>,
    established: RwLock<HashMap<PeerId, [u8; 32]>>,
}

impl Default for SessionCacheService {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionCacheService {
    pub fn new() -> Self {
        Self { cache: Mutex::new(SessionKeyCache::new()), established: RwLock::new(HashMap::new()) }
    }
}

impl SessionCacheApi for SessionCacheService {
    fn get(&self, peer: PeerId, session_key: [u8; 32], time_limit: u64, message_size: u32) -> Option<Vec<u8>> {
        let key = SessionCacheKey { peer, session_key, time_limit, message_size };
        self.cache.lock().unwrap().get(&key).map(<[u8]>::to_vec)
    }

    fn put(&self, peer: PeerId, session_key: [u8; 32], time_limit: u64, message_size: u32, message: Vec<u8>) {
        let key = SessionCacheKey { peer, session_key, time_limit, message_size };
        self.cache.lock().unwrap().put(key, message);
    }

    fn established_key(&self, peer: PeerId) -> Option<[u8; 32]> {
        self.established.read().unwrap().get(&peer).copied()
    }

    fn record_established(&self, peer: PeerId, session_key: [u8; 32]) {
        self.established.write().unwrap().insert(peer, session_key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_get_through_the_api() {
        let service = SessionCacheService::new();
        let peer = PeerId::from_public_key(b"peer");
        service.put(peer, [1; 32], 100, 64, b"the message".to_vec());
        assert_eq!(service.get(peer, [1; 32], 100, 64), Some(b"the message".to_vec()));
    }

    #[test]
    fn miss_on_unrelated_key() {
        let service = SessionCacheService::new();
        let peer = PeerId::from_public_key(b"peer");
        assert_eq!(service.get(peer, [1; 32], 100, 64), None);
    }

    #[test]
    fn established_key_is_separate_from_the_dedup_cache() {
        let service = SessionCacheService::new();
        let peer = PeerId::from_public_key(b"peer");
        assert_eq!(service.established_key(peer), None);
        service.record_established(peer, [7; 32]);
        assert_eq!(service.established_key(peer), Some([7; 32]));
    }
}
