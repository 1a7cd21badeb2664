//! Driven ports (SPI): everything the host application must supply for
//! persistence, time, randomness, and the external bootstrap service.

use crate::domain::RegistryError;
use shared_types::entities::{HelloRecord, PeerId};
use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use std::sync::RwLock;

/// Durable storage for HELLOs, keyed by `(peer, protocol)`.
pub trait HostFileStore: Send + Sync {
    fn get(&self, peer: PeerId, protocol: u16) -> Result<Option<HelloRecord>, RegistryError>;
    fn put(&self, peer: PeerId, protocol: u16, hello: HelloRecord) -> Result<(), RegistryError>;
    fn all(&self) -> Result<Vec<((PeerId, u16), HelloRecord)>, RegistryError>;
    fn remove(&self, peer: PeerId, protocol: u16) -> Result<(), RegistryError>;
    /// Seconds since each entry was last written, for the 90-day sweep.
    fn ages(&self, now: u64) -> Result<Vec<((PeerId, u16), u64)>, RegistryError>;
    /// Drop anything that doesn't look like a `(peer, protocol)` pair this
    /// store itself produced. A no-op for backends with no loose files.
    fn prune_malformed(&self) -> Result<usize, RegistryError>;
}

/// Durable storage for one 32-bit trust value per peer.
pub trait TrustStore: Send + Sync {
    fn get(&self, peer: PeerId) -> Result<Option<u32>, RegistryError>;
    fn set(&self, peer: PeerId, value: u32) -> Result<(), RegistryError>;
}

/// Durable storage for the single "this machine has bootstrapped before"
/// flag the bootstrap driver persists on first success.
pub trait StateFlagStore: Send + Sync {
    fn get_bootstrapped(&self) -> Result<bool, RegistryError>;
    fn set_bootstrapped(&self, value: bool) -> Result<(), RegistryError>;
}

/// The external bootstrap service (out of scope for this implementation):
/// asked for a batch of HELLOs to try when the peer count drops too low.
#[async_trait::async_trait]
pub trait BootstrapService: Send + Sync {
    async fn fetch_hellos(&self) -> Result<Vec<HelloRecord>, RegistryError>;
}

/// Reports `max(cpu%, upload_bw%, download_bw%)` in `0..=100`, feeding the
/// bootstrap driver's adaptive HELLO-injection sleep.
pub trait ResourceLoadProvider: Send + Sync {
    fn load_percent(&self) -> u8;
}

/// The bootstrap driver's sole dependency on the host registry: how many
/// peers are currently connected (to decide whether it should stay quiet)
/// and where to deposit HELLOs fetched from a bootstrap round.
pub trait ConnectedCountSource: Send + Sync {
    fn connected_count(&self) -> usize;
    fn add_temporary_hello(&self, hello: HelloRecord);
}

pub trait TimeSource: Send + Sync {
    fn now(&self) -> u64;
}

pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

/// Uniform random draws, used for ring-slot reuse jitter, blacklist
/// back-off jitter, HELLO-injection shuffling, and the adaptive sleep.
pub trait RandomSource: Send + Sync {
    /// A value in `0..upper_exclusive`, or `0` if `upper_exclusive == 0`.
    fn gen_range(&self, upper_exclusive: u64) -> u64;
}

pub struct ThreadRngSource;

impl RandomSource for ThreadRngSource {
    fn gen_range(&self, upper_exclusive: u64) -> u64 {
        if upper_exclusive == 0 {
            return 0;
        }
        rand::Rng::gen_range(&mut rand::thread_rng(), 0..upper_exclusive)
    }
}

/// A fixed load figure, useful before real telemetry wiring exists.
pub struct StaticLoadProvider(pub u8);

impl ResourceLoadProvider for StaticLoadProvider {
    fn load_percent(&self) -> u8 {
        self.0
    }
}

// ---------------------------------------------------------------------------
// In-memory backends (tests, or a node that opts out of persistence).
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct InMemoryHostStore {
    entries: RwLock<HashMap<(PeerId, u16), (HelloRecord, u64)>>,
}

impl InMemoryHostStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HostFileStore for InMemoryHostStore {
    fn get(&self, peer: PeerId, protocol: u16) -> Result<Option<HelloRecord>, RegistryError> {
        Ok(self.entries.read().unwrap().get(&(peer, protocol)).map(|(h, _)| h.clone()))
    }

    fn put(&self, peer: PeerId, protocol: u16, hello: HelloRecord) -> Result<(), RegistryError> {
        self.entries.write().unwrap().insert((peer, protocol), (hello, 0));
        Ok(())
    }

    fn all(&self) -> Result<Vec<((PeerId, u16), HelloRecord)>, RegistryError> {
        Ok(self.entries.read().unwrap().iter().map(|(k, (h, _))| (*k, h.clone())).collect())
    }

    fn remove(&self, peer: PeerId, protocol: u16) -> Result<(), RegistryError> {
        self.entries.write().unwrap().remove(&(peer, protocol));
        Ok(())
    }

    fn ages(&self, now: u64) -> Result<Vec<((PeerId, u16), u64)>, RegistryError> {
        Ok(self
            .entries
            .read()
            .unwrap()
            .iter()
            .map(|(k, (_, written_at))| (*k, now.saturating_sub(*written_at)))
            .collect())
    }

    fn prune_malformed(&self) -> Result<usize, RegistryError> {
        Ok(0)
    }
}

#[derive(Default)]
pub struct InMemoryTrustStore {
    values: RwLock<HashMap<PeerId, u32>>,
}

impl InMemoryTrustStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TrustStore for InMemoryTrustStore {
    fn get(&self, peer: PeerId) -> Result<Option<u32>, RegistryError> {
        Ok(self.values.read().unwrap().get(&peer).copied())
    }

    fn set(&self, peer: PeerId, value: u32) -> Result<(), RegistryError> {
        self.values.write().unwrap().insert(peer, value);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryStateFlagStore {
    bootstrapped: RwLock<bool>,
}

impl InMemoryStateFlagStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateFlagStore for InMemoryStateFlagStore {
    fn get_bootstrapped(&self) -> Result<bool, RegistryError> {
        Ok(*self.bootstrapped.read().unwrap())
    }

    fn set_bootstrapped(&self, value: bool) -> Result<(), RegistryError> {
        *self.bootstrapped.write().unwrap() = value;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// File-backed host store: `<dir>/<base32(peer_id)>.<protocol>` holds one
// bincode-serialized HelloRecord, written via a temp-file-then-rename so a
// crash mid-write never leaves a torn file.
// ---------------------------------------------------------------------------

pub struct FileBackedHostStore {
    dir: PathBuf,
}

impl FileBackedHostStore {
    pub fn new(dir: PathBuf) -> Result<Self, RegistryError> {
        std::fs::create_dir_all(&dir).map_err(|e| RegistryError::Storage(e.to_string()))?;
        Ok(Self { dir })
    }

    fn file_name(peer: PeerId, protocol: u16) -> String {
        format!("{}.{}", shared_types::base32::encode(peer.as_bytes()), protocol)
    }

    fn parse_file_name(name: &str) -> Option<(PeerId, u16)> {
        let (encoded, protocol) = name.rsplit_once('.')?;
        let protocol: u16 = protocol.parse().ok()?;
        let bytes = shared_types::base32::decode(encoded).ok()?;
        let array: [u8; 64] = bytes.try_into().ok()?;
        Some((PeerId(array), protocol))
    }

    fn path_for(&self, peer: PeerId, protocol: u16) -> PathBuf {
        self.dir.join(Self::file_name(peer, protocol))
    }
}

impl HostFileStore for FileBackedHostStore {
    fn get(&self, peer: PeerId, protocol: u16) -> Result<Option<HelloRecord>, RegistryError> {
        let path = self.path_for(peer, protocol);
        match std::fs::read(&path) {
            Ok(bytes) => bincode::deserialize(&bytes)
                .map(Some)
                .map_err(|e| RegistryError::Storage(e.to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(RegistryError::Storage(e.to_string())),
        }
    }

    fn put(&self, peer: PeerId, protocol: u16, hello: HelloRecord) -> Result<(), RegistryError> {
        let bytes = bincode::serialize(&hello).map_err(|e| RegistryError::Storage(e.to_string()))?;
        let final_path = self.path_for(peer, protocol);
        let tmp_path = final_path.with_extension(format!("{protocol}.tmp"));
        let mut file = std::fs::File::create(&tmp_path).map_err(|e| RegistryError::Storage(e.to_string()))?;
        file.write_all(&bytes).map_err(|e| RegistryError::Storage(e.to_string()))?;
        std::fs::rename(&tmp_path, &final_path).map_err(|e| RegistryError::Storage(e.to_string()))
    }

    fn all(&self) -> Result<Vec<((PeerId, u16), HelloRecord)>, RegistryError> {
        let mut out = Vec::new();
        for entry in std::fs::read_dir(&self.dir).map_err(|e| RegistryError::Storage(e.to_string()))? {
            let entry = entry.map_err(|e| RegistryError::Storage(e.to_string()))?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            let Some((peer, protocol)) = Self::parse_file_name(name) else { continue };
            if let Some(hello) = self.get(peer, protocol)? {
                out.push(((peer, protocol), hello));
            }
        }
        Ok(out)
    }

    fn remove(&self, peer: PeerId, protocol: u16) -> Result<(), RegistryError> {
        match std::fs::remove_file(self.path_for(peer, protocol)) {
            Ok(()) | Err(_) => Ok(()),
        }
    }

    fn ages(&self, now: u64) -> Result<Vec<((PeerId, u16), u64)>, RegistryError> {
        let mut out = Vec::new();
        for entry in std::fs::read_dir(&self.dir).map_err(|e| RegistryError::Storage(e.to_string()))? {
            let entry = entry.map_err(|e| RegistryError::Storage(e.to_string()))?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            let Some(key) = Self::parse_file_name(name) else { continue };
            let modified = entry
                .metadata()
                .and_then(|m| m.modified())
                .ok()
                .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
                .map(|d| d.as_secs())
                .unwrap_or(now);
            out.push((key, now.saturating_sub(modified)));
        }
        Ok(out)
    }

    fn prune_malformed(&self) -> Result<usize, RegistryError> {
        let mut removed = 0;
        for entry in std::fs::read_dir(&self.dir).map_err(|e| RegistryError::Storage(e.to_string()))? {
            let entry = entry.map_err(|e| RegistryError::Storage(e.to_string()))?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if name.ends_with(".tmp") || Self::parse_file_name(name).is_none() {
                if std::fs::remove_file(entry.path()).is_ok() {
                    removed += 1;
                }
            }
        }
        Ok(removed)
    }
}

/// `<dir>/<base32(peer_id)>` holds one 32-bit trust value, network byte
/// order, written via temp-file-then-rename.
pub struct FileBackedTrustStore {
    dir: PathBuf,
}

impl FileBackedTrustStore {
    pub fn new(dir: PathBuf) -> Result<Self, RegistryError> {
        std::fs::create_dir_all(&dir).map_err(|e| RegistryError::Storage(e.to_string()))?;
        Ok(Self { dir })
    }

    fn path_for(&self, peer: PeerId) -> PathBuf {
        self.dir.join(shared_types::base32::encode(peer.as_bytes()))
    }
}

impl TrustStore for FileBackedTrustStore {
    fn get(&self, peer: PeerId) -> Result<Option<u32>, RegistryError> {
        match std::fs::read(self.path_for(peer)) {
            Ok(bytes) if bytes.len() == 4 => {
                Ok(Some(u32::from_be_bytes(bytes.try_into().unwrap())))
            }
            Ok(_) => Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(RegistryError::Storage(e.to_string())),
        }
    }

    fn set(&self, peer: PeerId, value: u32) -> Result<(), RegistryError> {
        let final_path = self.path_for(peer);
        let tmp_path = final_path.with_extension("tmp");
        std::fs::write(&tmp_path, value.to_be_bytes()).map_err(|e| RegistryError::Storage(e.to_string()))?;
        std::fs::rename(&tmp_path, &final_path).map_err(|e| RegistryError::Storage(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hello(protocol: u16) -> HelloRecord {
        HelloRecord {
            public_key: vec![9, 9, 9],
            peer_id: PeerId::from_public_key(&[9, 9, 9]),
            expiration: 1_000,
            mtu: 1500,
            protocol,
            address: vec![10, 0, 0, 1],
            signature: vec![],
        }
    }

    #[test]
    fn in_memory_host_store_roundtrips() {
        let store = InMemoryHostStore::new();
        let peer = PeerId::from_public_key(&[9, 9, 9]);
        store.put(peer, 17, hello(17)).unwrap();
        assert_eq!(store.get(peer, 17).unwrap().unwrap().protocol, 17);
        assert!(store.get(peer, 18).unwrap().is_none());
    }

    #[test]
    fn in_memory_trust_store_roundtrips() {
        let store = InMemoryTrustStore::new();
        let peer = PeerId::from_public_key(&[1]);
        assert_eq!(store.get(peer).unwrap(), None);
        store.set(peer, 42).unwrap();
        assert_eq!(store.get(peer).unwrap(), Some(42));
    }

    fn temp_dir(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!("peer-registry-{label}-{}-{}", std::process::id(), rand::random::<u64>()))
    }

    #[test]
    fn file_backed_host_store_persists_across_instances() {
        let dir = temp_dir("hosts");
        let peer = PeerId::from_public_key(&[9, 9, 9]);
        {
            let store = FileBackedHostStore::new(dir.clone()).unwrap();
            store.put(peer, 17, hello(17)).unwrap();
        }
        let store = FileBackedHostStore::new(dir.clone()).unwrap();
        assert_eq!(store.get(peer, 17).unwrap().unwrap().protocol, 17);
        assert_eq!(store.all().unwrap().len(), 1);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn file_backed_host_store_prunes_files_not_matching_convention() {
        let dir = temp_dir("prune");
        let store = FileBackedHostStore::new(dir.clone()).unwrap();
        std::fs::write(dir.join("not-a-valid-name"), b"junk").unwrap();
        let removed = store.prune_malformed().unwrap();
        assert_eq!(removed, 1);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn file_backed_trust_store_persists_across_instances() {
        let dir = temp_dir("trust");
        let peer = PeerId::from_public_key(&[7]);
        {
            let store = FileBackedTrustStore::new(dir.clone()).unwrap();
            store.set(peer, 99).unwrap();
        }
        let store = FileBackedTrustStore::new(dir.clone()).unwrap();
        assert_eq!(store.get(peer).unwrap(), Some(99));
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn thread_rng_source_respects_upper_bound() {
        let source = ThreadRngSource;
        for _ in 0..50 {
            assert!(source.gen_range(10) < 10);
        }
        assert_eq!(source.gen_range(0), 0);
    }
}
