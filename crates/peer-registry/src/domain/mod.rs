//! Domain layer: pure logic for the host registry (C6), session cache
//! (C7), and bootstrap driver (C9), with no I/O.

pub mod bootstrap;
pub mod entities;
pub mod errors;
pub mod host_registry;
pub mod session_cache;

pub use bootstrap::{adaptive_sleep_ms, tick as bootstrap_tick, BootstrapConfig, BootstrapState};
pub use entities::{
    BlacklistEntry, TemporaryRing, TemporarySlot, TrustEntry, HOST_FILE_MAX_AGE_SECS,
    HOST_PRUNE_INTERVAL_SECS, HOST_RESCAN_INTERVAL_SECS, MAX_BLACKLIST_DELTA_SECS,
    TEMPORARY_RING_CAPACITY, TRUST_FLUSH_INTERVAL_SECS,
};
pub use errors::RegistryError;
pub use host_registry::{newer_hello_wins, next_blacklist_entry};
pub use session_cache::{SessionCacheKey, SessionKeyCache, SESSION_CACHE_CAPACITY};
