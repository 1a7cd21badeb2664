//! # Datastore (C3/C4/C5)
//!
//! The node's sole persistence layer for anonymized content, covering
//! three closely related components:
//!
//! - **SQstore** (C3): an ordered, file-backed block store keyed by a
//!   monotonic row id, with secondary indices for every iteration order
//!   the quota-maintenance loop and migration protocol need.
//! - **Datastore Manager** (C4): the client-facing entry point every
//!   other subsystem calls through. Probes the bloom index before ever
//!   touching SQstore, enforces the byte quota on insert, and evicts
//!   low-priority content to keep a free floor available.
//! - **On-Demand Encoder** (C5): indexes a local file by symlinking it
//!   into an index directory instead of copying its blocks, encoding
//!   each block lazily when it's actually requested.
//!
//! ## Architecture (Hexagonal)
//!
//! - `domain/` — pure logic: row/file entities, admission policy, errors
//! - `ports/` — `SqstoreApi` / `DatastoreApi` / `OnDemandApi` (driving),
//!   `KeyValueStore` / `TimeSource` (driven)
//! - `service/` — `SqstoreService`, `DatastoreManagerService`, `OnDemandService`
//! - `handler/` — IPC security boundary (`DatastoreHandler`)
//! - `adapters/` — `EventBusAdapter` publishing `BlockStored`/`BlockEvicted`
//!
//! ## Security
//!
//! `DatastorePutRequest` is accepted from the GAP router and the
//! on-demand encoder; `DatastoreGetRequest` from the GAP router only
//! (see `shared_types::security::AuthorizationMatrix`).

pub mod adapters;
pub mod domain;
pub mod handler;
pub mod ports;
pub mod service;

pub use domain::{DatastoreConfig, DatastoreError, KVStoreError, OnDemandFileState, StoredRow};
pub use handler::{DatastoreHandler, DatastoreSubsystem, IpcError};
pub use ports::{
    BatchOperation, DatastoreApi, FileBackedKVStore, InMemoryKVStore, IterControl, KeyValueStore,
    OnDemandApi, SqstoreApi, SystemTimeSource, TimeSource,
};
pub use service::{DatastoreManagerService, MaintenanceReport, OnDemandService, SqstoreService};

pub use adapters::{DatastoreBusAdapter, EventBusAdapter};
