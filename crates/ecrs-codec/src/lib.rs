//! # ECRS Block Codec (C1)
//!
//! Content-hash-keyed encryption for DATA blocks and query-consistency
//! verification for every block type the network carries.
//!
//! ## Architecture
//!
//! Hexagonal, as throughout this workspace:
//! - **Domain Layer** (`domain/`): pure encode/verify logic, no I/O
//! - **Ports Layer** (`ports/`): the `EcrsCodecApi` driving port
//! - **Service Layer** (`service.rs`): wires domain logic to the port
//! - **Adapters** (`adapters/`): IPC and event-bus entry points
//!
//! ## Security Notes
//!
//! - ONDEMAND blocks never leave storage; `verify_block` always rejects them.
//! - Every other block type's query must be independently re-derivable from
//!   its payload — this is what lets any peer, not just the original
//!   publisher, confirm a block wasn't corrupted or substituted in transit.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use domain::codec::{decode_data_block, encode_data_block, verify_block};
pub use domain::entities::{
    EncodedBlock, KeywordBlockPayload, KeywordForNamespaceBlockPayload, SignedBlockPayload,
};
pub use domain::errors::CodecError;
pub use ports::inbound::EcrsCodecApi;
pub use service::EcrsCodecService;
