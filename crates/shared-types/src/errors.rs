//! # Error Taxonomy
//!
//! The core distinguishes four outcomes, collapsed here into a sum type
//! rather than the original `OK`/`NO`/`SYSERR`/`FATAL` integer convention:
//!
//! - `Ok(T)`: the operation produced a value.
//! - `NotFound`: a normal negative answer (`NO`) — cache miss, no match.
//! - `Rejected(reason)`: a normal negative answer with a reason a caller may
//!   want to log or surface (`NO`) — e.g. "datastore full, priority too low".
//! - `TransientFailure(_)`: a recoverable failure (`SYSERR`) — malformed
//!   input, storage busy, I/O error. Bubbles up exactly one layer for
//!   logging; the caller decides whether to continue.
//! - `Fatal(_)`: unrecoverable (`FATAL`) — aborts the process, only at
//!   initialization.
//!
//! `NotFound`/`Rejected` must never be logged as errors; only
//! `TransientFailure` is logged by default, and only `Fatal` aborts.

use std::fmt;
use thiserror::Error;

/// Recoverable-failure source, preserved so callers can decide whether to
/// retry, abandon, or propagate further.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransientKind {
    #[error("malformed input: {0}")]
    Malformed(String),
    #[error("storage busy")]
    StorageBusy,
    #[error("I/O error: {0}")]
    Io(String),
    #[error("signature verification failed")]
    BadSignature,
    #[error("unknown block type")]
    UnknownType,
    #[error("query does not match block content")]
    MismatchedQuery,
}

/// The core's four-way result type. See module docs for the mapping back to
/// the original `OK`/`NO`/`SYSERR`/`FATAL` convention.
#[derive(Debug, Clone)]
pub enum Outcome<T> {
    Ok(T),
    NotFound,
    Rejected(String),
    TransientFailure(TransientKind),
    Fatal(String),
}

impl<T> Outcome<T> {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        matches!(self, Outcome::Ok(_))
    }

    #[must_use]
    pub fn is_no(&self) -> bool {
        matches!(self, Outcome::NotFound | Outcome::Rejected(_))
    }

    #[must_use]
    pub fn is_syserr(&self) -> bool {
        matches!(self, Outcome::TransientFailure(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Ok(v) => Outcome::Ok(f(v)),
            Outcome::NotFound => Outcome::NotFound,
            Outcome::Rejected(r) => Outcome::Rejected(r),
            Outcome::TransientFailure(k) => Outcome::TransientFailure(k),
            Outcome::Fatal(m) => Outcome::Fatal(m),
        }
    }

    /// Converts a transient failure or fatal error into a Rust `Result`,
    /// treating `NotFound`/`Rejected` as an `Ok(None)`-style absence that the
    /// caller must handle explicitly via the enum (never silently dropped).
    pub fn into_result(self) -> Result<Option<T>, CoreError> {
        match self {
            Outcome::Ok(v) => Ok(Some(v)),
            Outcome::NotFound | Outcome::Rejected(_) => Ok(None),
            Outcome::TransientFailure(k) => Err(CoreError::Transient(k)),
            Outcome::Fatal(m) => Err(CoreError::Fatal(m)),
        }
    }
}

impl<T> fmt::Display for Outcome<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Ok(_) => write!(f, "OK"),
            Outcome::NotFound => write!(f, "NO (not found)"),
            Outcome::Rejected(reason) => write!(f, "NO ({reason})"),
            Outcome::TransientFailure(k) => write!(f, "SYSERR ({k})"),
            Outcome::Fatal(m) => write!(f, "FATAL ({m})"),
        }
    }
}

/// Rust-idiomatic error type for call sites that prefer `?` propagation over
/// matching on `Outcome`. `NotFound`/`Rejected` are deliberately excluded —
/// they are not errors and must be handled via `Outcome` at the producing
/// layer.
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    #[error(transparent)]
    Transient(#[from] TransientKind),
    #[error("fatal: {0}")]
    Fatal(String),
}

/// Node operational states, surfaced by the node runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    Running,
    Bootstrapping,
    HaltedAwaitingIntervention,
}
