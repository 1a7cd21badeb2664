//! Pure logic for the session-key cache (C7): a small cache that lets two
//! independent subsystems initiating a key exchange to the same peer at
//! nearly the same time reuse one another's in-flight message instead of
//! constructing two.

use shared_types::entities::PeerId;

/// Bound on the number of cached entries; the smallest `time_limit` is
/// evicted once a `put` would exceed it.
pub const SESSION_CACHE_CAPACITY: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionCacheKey {
    pub peer: PeerId,
    pub session_key: [u8; 32],
    pub time_limit: u64,
    pub message_size: u32,
}

#[derive(Debug, Default)]
pub struct SessionKeyCache {
    entries: Vec<(SessionCacheKey, Vec<u8>)>,
}

impl SessionKeyCache {
    pub fn new() -> Self {
        Self { entries: Vec::with_capacity(SESSION_CACHE_CAPACITY) }
    }

    #[must_use]
    pub fn get(&self, key: &SessionCacheKey) -> Option<&[u8]> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, msg)| msg.as_slice())
    }

    pub fn put(&mut self, key: SessionCacheKey, message: Vec<u8>) {
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = message;
            return;
        }
        self.entries.push((key, message));
        if self.entries.len() > SESSION_CACHE_CAPACITY {
            if let Some((idx, _)) = self
                .entries
                .iter()
                .enumerate()
                .min_by_key(|(_, (k, _))| k.time_limit)
            {
                self.entries.remove(idx);
            }
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
