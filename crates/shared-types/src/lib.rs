//! # Shared Types Crate
//!
//! Domain entities, wire-adjacent value types, and the `OK`/`NO`/`SYSERR`/`FATAL`
//! result taxonomy shared by every subsystem in the core.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: cross-subsystem types are defined here once.
//! - **Envelope Integrity**: `AuthenticatedMessage<T>` is the sole wrapper for
//!   inter-subsystem IPC; wire structs for on-network protocol messages live
//!   in the subsystem crates that own those protocols (ecrs-codec, peer-registry).
//! - **Outcome over exceptions**: `NO` is a normal answer, not an error; only
//!   `SYSERR`/`FATAL` carry diagnostic information.

pub mod base32;
pub mod entities;
pub mod envelope;
pub mod errors;
pub mod ipc;
pub mod rate_limiter;
pub mod security;
pub mod subsystem_registry;
pub mod subsystem_trait;

pub use entities::*;
pub use envelope::AuthenticatedMessage;
pub use errors::*;
pub use ipc::*;
