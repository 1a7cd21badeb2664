//! Composition-root error taxonomy.
//!
//! Every sibling crate already collapses its own `OK`/`NO`/`SYSERR` domain
//! into a `thiserror` enum (`DatastoreError`, `GapError`, `RegistryError`,
//! ...). `CoreError` is the same collapse one layer up, for failures that
//! belong to wiring itself rather than to any one subsystem: a missing
//! config value is `FATAL` (process exits before `start_all` runs), a
//! sibling's own error surfaces through `Dependency`, and an IPC rejection
//! (unverified or unauthorized) surfaces through `Ipc`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("{subsystem} failed to start: {source}")]
    SubsystemStart { subsystem: &'static str, source: shared_types::subsystem_trait::SubsystemError },

    #[error("dependency {subsystem} rejected the request: {detail}")]
    Dependency { subsystem: &'static str, detail: String },

    #[error("IPC request rejected: {0}")]
    Ipc(String),
}

/// The `OK`/`NO`/`SYSERR`/`FATAL` taxonomy collapsed into one sum type, per
/// the design note that the distinction between a normal negative answer
/// and a transient failure is load-bearing and must survive the rewrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    /// `OK`.
    Ok(T),
    /// `NO` — a normal negative answer (duplicate, cache miss, no route).
    /// Never logged, never propagated past the component that produced it.
    NotFound,
    /// `NO` with a reason worth surfacing to the caller (e.g. "datastore
    /// full, priority too low").
    Rejected(String),
    /// `SYSERR` — recoverable; logged with source location one layer up.
    TransientFailure(String),
    /// `FATAL` — unrecoverable; only raised during initialization.
    Fatal(String),
}

impl<T> Outcome<T> {
    pub fn is_ok(&self) -> bool {
        matches!(self, Outcome::Ok(_))
    }

    pub fn ok(self) -> Option<T> {
        match self {
            Outcome::Ok(v) => Some(v),
            _ => None,
        }
    }
}
