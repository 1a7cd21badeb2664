//! # Peer Registry (C6/C7/C9)
//!
//! The node's view of the rest of the network, covering three closely
//! related components:
//!
//! - **Host Registry** (C6): a durable directory of every peer ever seen
//!   (persisted HELLOs plus a fixed-capacity ring of unconfirmed
//!   "temporary" peers), trust accounting, and blacklisting back-off.
//! - **Session Key Cache** (C7): a small bounded cache so two subsystems
//!   racing to establish a session with the same peer reuse one
//!   another's in-flight message instead of building two.
//! - **Bootstrap Driver** (C9): a back-off state machine that asks an
//!   external bootstrap service for more HELLOs whenever the connection
//!   count drops below target, injecting them with an adaptive,
//!   load-aware delay between each.
//!
//! ## Architecture (Hexagonal)
//!
//! - `domain/` — pure logic: entities, errors, host/blacklist rules,
//!   the session cache's eviction policy, the bootstrap state machine
//! - `ports/` — `HostRegistryApi` / `SessionCacheApi` / `BootstrapDriverApi`
//!   (driving), `HostFileStore` / `TrustStore` / `BootstrapService` / ...
//!   (driven)
//! - `service/` — `HostRegistryService`, `SessionCacheService`,
//!   `BootstrapDriverService`
//! - `handler/` — IPC security boundary (`HostRegistryHandler`,
//!   `SessionCacheHandler`)
//! - `adapters/` — `EventBusAdapter` publishing peer discovery,
//!   disconnection, blacklisting, and session-establishment events
//!
//! ## Security
//!
//! `VerifyPeerSignatureRequest` is accepted from the GAP router and the
//! bootstrap driver; `ChangeTrustRequest` from the GAP router only;
//! `SessionLookupRequest` from the host registry only (see
//! `shared_types::security::AuthorizationMatrix`).

pub mod adapters;
pub mod domain;
pub mod handler;
pub mod ports;
pub mod service;

pub use domain::RegistryError;
pub use handler::{
    BootstrapDriverSubsystem, HostRegistryHandler, IpcError, PeerRegistrySubsystem,
    SessionCacheHandler, SessionCacheSubsystem,
};
pub use ports::{
    BootstrapDriverApi, BootstrapService, ConnectedCountSource, FileBackedHostStore,
    FileBackedTrustStore, HostFileStore, HostRegistryApi, InMemoryHostStore,
    InMemoryStateFlagStore, InMemoryTrustStore, ProtocolFilter, RandomSource,
    ResourceLoadProvider, SessionCacheApi, StateFlagStore, StaticLoadProvider, SystemTimeSource,
    ThreadRngSource, TimeSource, TrustStore,
};
pub use service::{BootstrapDriverService, HostRegistryService, SessionCacheService};

pub use adapters::{EventBusAdapter, RegistryBusAdapter};
