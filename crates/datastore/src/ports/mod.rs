pub mod inbound;
pub mod outbound;

pub use inbound::{DatastoreApi, IterControl, OnDemandApi, SqstoreApi};
pub use outbound::{BatchOperation, FileBackedKVStore, InMemoryKVStore, KeyValueStore, ScanResult, SystemTimeSource, TimeSource};
