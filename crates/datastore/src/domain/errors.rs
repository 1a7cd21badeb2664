//! Error types shared across the SQstore, Datastore Manager, and On-Demand
//! Encoder layers.

use thiserror::Error;

/// Errors surfaced by a `KeyValueStore` adapter.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KVStoreError {
    #[error("i/o error: {message}")]
    IOError { message: String },
    #[error("serialization error: {message}")]
    SerializationError { message: String },
}

/// Errors surfaced by the SQstore, Datastore Manager, and On-Demand Encoder.
#[derive(Debug, Error)]
pub enum DatastoreError {
    #[error("storage backend error: {0}")]
    Backend(#[from] KVStoreError),

    #[error("block failed admission: {reason}")]
    Rejected { reason: String },

    #[error("row {0} not found")]
    RowNotFound(u64),

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("on-demand content unavailable for file {file_id}")]
    ContentUnavailable { file_id: String },

    #[error("on-demand content changed for file {file_id}: hash mismatch")]
    ContentChanged { file_id: String },

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}
