//! Service Layer
//!
//! Orchestrates the domain's counting filter and the rebuild-from-datastore
//! path behind the `BloomIndexApi` port.

pub mod bloom_index_service;

pub use bloom_index_service::BloomIndexService;
