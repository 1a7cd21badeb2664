//! # Traffic Accountant (C8)
//!
//! Per-message-type, per-direction traffic accounting: a rotating window
//! of fixed-duration slots (count and average size per slot) plus a small
//! ring of recently-seen peers on the received side, feeding the sole
//! admission decision for anonymity-constrained outgoing content —
//! whether there has been enough genuine received traffic, from enough
//! distinct peers, to justify a send at a given anonymity level.
//!
//! ## Architecture (Hexagonal)
//!
//! - `domain/` — pure logic: the rotating window, the diversity ring, the
//!   `cover_sufficient` admission rule
//! - `ports/` — `TrafficAccountantApi` (driving), `TimeSource` (driven)
//! - `service/` — `TrafficAccountantService`
//! - `handler/` — IPC security boundary (`TrafficAccountantHandler`)
//! - `adapters/` — `EventBusAdapter` publishing `CoverTrafficInsufficient`
//!
//! ## Security
//!
//! `CoverSufficientRequest` is accepted from the GAP router only (see
//! `shared_types::security::AuthorizationMatrix`).

pub mod adapters;
pub mod domain;
pub mod handler;
pub mod ports;
pub mod service;

pub use domain::MessageDirection;
pub use handler::{IpcError, TrafficAccountantHandler, TrafficAccountantSubsystem};
pub use ports::{SystemTimeSource, TimeSource, TrafficAccountantApi};
pub use service::TrafficAccountantService;

pub use adapters::{EventBusAdapter, TrafficBusAdapter};
