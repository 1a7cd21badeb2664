//! Host registry (C6): durable peer directory plus the temporary ring of
//! unconfirmed HELLOs, backed by whatever `HostFileStore`/`TrustStore` the
//! host application provides.

use crate::domain::{
    newer_hello_wins, next_blacklist_entry, BlacklistEntry, RegistryError, TemporaryRing,
    TrustEntry, HOST_FILE_MAX_AGE_SECS,
};
use crate::ports::inbound::{HostRegistryApi, ProtocolFilter};
use crate::ports::outbound::{ConnectedCountSource, HostFileStore, RandomSource, TimeSource, TrustStore};
use shared_crypto::ecdsa::{Secp256k1PublicKey, Secp256k1Signature};
use shared_types::entities::{HelloRecord, PeerId, MAX_TRUST};
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

pub struct HostRegistryService<H: HostFileStore, T: TrustStore, R: RandomSource, C: TimeSource> {
    host_store: H,
    trust_store: T,
    random: R,
    time: C,
    temp_ring: RwLock<TemporaryRing>,
    trust_cache: RwLock<HashMap<PeerId, TrustEntry>>,
    blacklist: RwLock<HashMap<PeerId, BlacklistEntry>>,
    connected: RwLock<HashSet<PeerId>>,
}

impl<H: HostFileStore, T: TrustStore, R: RandomSource, C: TimeSource> HostRegistryService<H, T, R, C> {
    pub fn new(host_store: H, trust_store: T, random: R, time: C) -> Self {
        Self {
            host_store,
            trust_store,
            random,
            time,
            temp_ring: RwLock::new(TemporaryRing::new()),
            trust_cache: RwLock::new(HashMap::new()),
            blacklist: RwLock::new(HashMap::new()),
            connected: RwLock::new(HashSet::new()),
        }
    }

    fn candidates(&self, peer: PeerId, protocol: ProtocolFilter, allow_temporary: bool) -> Vec<HelloRecord> {
        let mut candidates = Vec::new();
        match protocol {
            ProtocolFilter::Only(p) => {
                if let Ok(Some(hello)) = self.host_store.get(peer, p) {
                    candidates.push(hello);
                }
            }
            ProtocolFilter::Any => {
                if let Ok(all) = self.host_store.all() {
                    candidates.extend(all.into_iter().filter(|((pid, _), _)| *pid == peer).map(|(_, h)| h));
                }
            }
        }
        if allow_temporary {
            let ring = self.temp_ring.read().unwrap();
            for slot in ring.get(peer) {
                match protocol {
                    ProtocolFilter::Only(p) if slot.hello.protocol != p => {}
                    _ => candidates.push(slot.hello.clone()),
                }
            }
        }
        candidates
    }
}

impl<H: HostFileStore, T: TrustStore, R: RandomSource, C: TimeSource> ConnectedCountSource
    for HostRegistryService<H, T, R, C>
{
    fn connected_count(&self) -> usize {
        self.connected.read().unwrap().len()
    }

    fn add_temporary_hello(&self, hello: HelloRecord) {
        HostRegistryApi::add_temporary(self, hello);
    }
}

impl<H: HostFileStore, T: TrustStore, R: RandomSource, C: TimeSource> HostRegistryApi
    for HostRegistryService<H, T, R, C>
{
    fn add_host(&self, hello: HelloRecord) -> Result<(), RegistryError> {
        if !hello.identity_consistent() {
            return Err(RegistryError::IdentityMismatch);
        }
        let existing = self.host_store.get(hello.peer_id, hello.protocol)?;
        if newer_hello_wins(existing.as_ref(), &hello) {
            self.host_store.put(hello.peer_id, hello.protocol, hello)?;
        }
        Ok(())
    }

    fn add_temporary(&self, hello: HelloRecord) {
        self.temp_ring.write().unwrap().insert(hello.peer_id, hello);
    }

    fn identity_to_hello(
        &self,
        peer: PeerId,
        protocol: ProtocolFilter,
        allow_temporary: bool,
    ) -> Option<HelloRecord> {
        let mut candidates = self.candidates(peer, protocol, allow_temporary);
        match candidates.len() {
            0 => None,
            1 => Some(candidates.remove(0)),
            n => {
                let idx = self.random.gen_range(n as u64) as usize;
                Some(candidates.swap_remove(idx))
            }
        }
    }

    fn for_each_host(&self, now: u64, visit: &mut dyn FnMut(PeerId, &HelloRecord)) {
        if let Ok(all) = self.host_store.all() {
            for ((peer, _protocol), hello) in &all {
                visit(*peer, hello);
            }
        }
        let ring = self.temp_ring.read().unwrap();
        for slot in ring.iter() {
            if now == 0 || !self.is_blacklisted(slot.peer, false) {
                visit(slot.peer, &slot.hello);
            }
        }
    }

    fn change_trust(&self, peer: PeerId, delta: i64) -> i64 {
        let mut cache = self.trust_cache.write().unwrap();
        let entry = cache.entry(peer).or_insert_with(|| {
            let persisted = self.trust_store.get(peer).ok().flatten().unwrap_or(0);
            TrustEntry { value: persisted, dirty: false }
        });
        let old = i64::from(entry.value);
        let new = (old + delta).clamp(0, i64::from(MAX_TRUST));
        entry.value = new as u32;
        entry.dirty = true;
        new - old
    }

    fn current_trust(&self, peer: PeerId) -> u32 {
        let mut cache = self.trust_cache.write().unwrap();
        let entry = cache.entry(peer).or_insert_with(|| {
            let persisted = self.trust_store.get(peer).ok().flatten().unwrap_or(0);
            TrustEntry { value: persisted, dirty: false }
        });
        entry.value
    }

    fn blacklist(&self, peer: PeerId, desperation: u32, strict: bool) {
        let now = self.time.now();
        let jitter = self.random.gen_range(u64::from(desperation) + 1);
        let mut list = self.blacklist.write().unwrap();
        let existing = list.get(&peer).copied();
        list.insert(peer, next_blacklist_entry(existing, now, jitter, strict));
    }

    fn whitelist(&self, peer: PeerId) {
        self.blacklist.write().unwrap().remove(&peer);
    }

    fn is_blacklisted(&self, peer: PeerId, strict_query: bool) -> bool {
        let now = self.time.now();
        self.blacklist.read().unwrap().get(&peer).is_some_and(|entry| entry.covers(now, strict_query))
    }

    fn verify_peer_signature(&self, peer: PeerId, message: &[u8], signature: &[u8]) -> bool {
        let Some(hello) = self.identity_to_hello(peer, ProtocolFilter::Any, true) else {
            return false;
        };
        let Ok(key_bytes) = <[u8; 33]>::try_from(hello.public_key.as_slice()) else { return false };
        let Ok(sig_bytes) = <[u8; 64]>::try_from(signature) else { return false };
        let Ok(public_key) = Secp256k1PublicKey::from_bytes(key_bytes) else { return false };
        public_key.verify(message, &Secp256k1Signature::from_bytes(sig_bytes)).is_ok()
    }

    fn record_connected(&self, peer: PeerId) {
        self.connected.write().unwrap().insert(peer);
    }

    fn record_disconnected(&self, peer: PeerId) {
        self.connected.write().unwrap().remove(&peer);
    }

    fn connected_count(&self) -> usize {
        self.connected.read().unwrap().len()
    }

    fn flush_trust(&self) -> Result<usize, RegistryError> {
        let mut cache = self.trust_cache.write().unwrap();
        let mut flushed = 0;
        for (peer, entry) in cache.iter_mut() {
            if entry.dirty {
                self.trust_store.set(*peer, entry.value)?;
                entry.dirty = false;
                flushed += 1;
            }
        }
        Ok(flushed)
    }

    fn rescan_hosts(&self) -> Result<usize, RegistryError> {
        self.host_store.prune_malformed()
    }

    fn prune_stale_hosts(&self, now: u64) -> Result<usize, RegistryError> {
        let mut removed = 0;
        for ((peer, protocol), age) in self.host_store.ages(now)? {
            if age > HOST_FILE_MAX_AGE_SECS {
                self.host_store.remove(peer, protocol)?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}
