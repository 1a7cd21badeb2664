//! # Bloom Index (C2)
//!
//! Counting Bloom filter mirroring the datastore's key set so the GAP
//! router can reject a query locally instead of paying a store lookup
//! (or a network hop) on every miss.
//!
//! ## Architecture
//!
//! This crate follows Hexagonal Architecture (Ports & Adapters):
//!
//! - **Domain Layer** (`domain/`): Pure business logic, no I/O
//!   - `CountingBloomFilter`: 4-bit-counter filter supporting accurate removal
//!   - `BloomIndexConfig`: Quota-derived sizing, validated
//!   - `parameters_from_quota`: Solves `(m, k)` from a byte budget
//!
//! - **Ports Layer** (`ports/`): Trait definitions
//!   - `BloomIndexApi`: Driving port (insert/remove/test/rebuild)
//!   - `DatastoreKeyProvider`: Driven port, supplies keys for a rebuild
//!
//! - **Service Layer** (`service/`): Orchestration
//!   - `BloomIndexService`: Implements `BloomIndexApi`
//!
//! - **Handler Layer** (`handler/`): IPC security
//!   - `BloomIndexHandler`: Verifies and authorizes incoming requests
//!
//! - **Adapters Layer** (`adapters/`): External connections
//!   - `EventBusAdapter`: Publishes `BloomIndexRebuilt` after a rebuild
//!   - `FileIndexStore`: Persists the filter's raw bytes to a fixed-size file
//!
//! ## Security
//!
//! - `BloomTestRequest` accepted from the GAP router only
//! - `BloomUpdateRequest` accepted from the datastore manager only
//!
//! ## Invariants
//!
//! - No false negatives: after `insert(k)`, `test(k)` is always `true`
//! - After `remove(k)` (assuming exactly one prior `insert(k)`), `test(k)` is `false`
//! - The persisted index file is always `config.index_file_bytes()` long

pub mod adapters;
pub mod domain;
pub mod error;
pub mod handler;
pub mod metrics;
pub mod ports;
pub mod service;

pub use domain::{BloomIndexConfig, CountingBloomFilter};
pub use error::BloomError;
pub use handler::{BloomIndexHandler, BloomIndexSubsystem, IpcError};
pub use metrics::{Metrics, MetricsRecorder, MetricsSnapshot, NoOpMetrics};
pub use ports::{BloomIndexApi, DatastoreKeyProvider};
pub use service::BloomIndexService;

pub use adapters::{BloomIndexBusAdapter, EventBusAdapter, FileIndexStore};
