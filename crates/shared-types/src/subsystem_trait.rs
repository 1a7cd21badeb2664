//! # Subsystem Trait
//!
//! Defines the contract every long-lived component (C1-C10) implements to
//! participate in the node's event-driven architecture.
//!
//! ## Design Philosophy
//!
//! - **No compile-time coupling**: components are wired by `SubsystemId`, not
//!   by concrete type, via the compile-time registry in `subsystem_registry`
//!   (this replaces the original's dynamic-symbol `provide_module_<name>`
//!   plugin loading).
//! - **Event-only communication**: subsystems talk to each other over the
//!   bus, never by reaching into one another's internals.
//! - **Graceful degradation**: a missing optional subsystem does not crash
//!   the node.
//!
//! ## Example Implementation
//!
//! ```rust,ignore
//! use shared_types::{Subsystem, SubsystemId, SubsystemStatus};
//! use async_trait::async_trait;
//!
//! pub struct MySubsystem { /* ... */ }
//!
//! #[async_trait]
//! impl Subsystem for MySubsystem {
//!     fn id(&self) -> SubsystemId { SubsystemId::BloomIndex }
//!     fn name(&self) -> &'static str { "Bloom Index" }
//!     async fn start(&self) -> Result<(), SubsystemError> { Ok(()) }
//!     async fn stop(&self) -> Result<(), SubsystemError> { Ok(()) }
//!     async fn health_check(&self) -> SubsystemStatus { SubsystemStatus::Healthy }
//! }
//! ```

use crate::entities::SubsystemId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Error type for subsystem lifecycle operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubsystemError {
    pub subsystem_id: SubsystemId,
    pub kind: SubsystemErrorKind,
    pub message: String,
}

impl fmt::Display for SubsystemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}: {}", self.subsystem_id, self.kind, self.message)
    }
}

impl std::error::Error for SubsystemError {}

/// Categories of subsystem errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubsystemErrorKind {
    InitializationFailed,
    NotAvailable,
    RuntimeError,
    ShutdownFailed,
    MissingDependency,
    ConfigurationError,
}

impl fmt::Display for SubsystemErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InitializationFailed => write!(f, "InitializationFailed"),
            Self::NotAvailable => write!(f, "NotAvailable"),
            Self::RuntimeError => write!(f, "RuntimeError"),
            Self::ShutdownFailed => write!(f, "ShutdownFailed"),
            Self::MissingDependency => write!(f, "MissingDependency"),
            Self::ConfigurationError => write!(f, "ConfigurationError"),
        }
    }
}

/// Health status of a subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubsystemStatus {
    Healthy,
    Degraded,
    Stopped,
    Error,
    Starting,
    ShuttingDown,
    Disabled,
}

/// Metadata about a subsystem for discovery and monitoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubsystemInfo {
    pub id: SubsystemId,
    pub name: String,
    pub version: String,
    pub description: String,
    pub dependencies: Vec<SubsystemId>,
    pub publishes: Vec<String>,
    pub subscribes: Vec<String>,
    pub required: bool,
}

impl SubsystemInfo {
    pub fn new(id: SubsystemId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            version: "0.1.0".to_string(),
            description: String::new(),
            dependencies: Vec::new(),
            publishes: Vec::new(),
            subscribes: Vec::new(),
            required: false,
        }
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub fn depends_on(mut self, deps: Vec<SubsystemId>) -> Self {
        self.dependencies = deps;
        self
    }

    #[must_use]
    pub fn publishes_events(mut self, events: Vec<&str>) -> Self {
        self.publishes = events.into_iter().map(String::from).collect();
        self
    }

    #[must_use]
    pub fn subscribes_to(mut self, events: Vec<&str>) -> Self {
        self.subscribes = events.into_iter().map(String::from).collect();
        self
    }
}

/// The lifecycle contract every subsystem implements.
#[async_trait]
pub trait Subsystem: Send + Sync {
    fn id(&self) -> SubsystemId;

    fn name(&self) -> &'static str;

    fn info(&self) -> SubsystemInfo {
        SubsystemInfo::new(self.id(), self.name())
    }

    /// Validate configuration, connect to the bus, subscribe to relevant
    /// events, and start any background tasks.
    async fn start(&self) -> Result<(), SubsystemError>;

    /// Stop accepting new work, complete in-flight operations with a
    /// timeout, persist state, and unsubscribe.
    async fn stop(&self) -> Result<(), SubsystemError>;

    async fn health_check(&self) -> SubsystemStatus;

    /// Handle a configuration reload triggered by the operator.
    async fn reload_config(&self) -> Result<(), SubsystemError> {
        Ok(())
    }

    /// Subsystem-specific metrics as a JSON value.
    fn metrics(&self) -> serde_json::Value {
        serde_json::json!({
            "subsystem_id": self.id().as_u8(),
            "status": "no_metrics"
        })
    }
}

/// A type-erased subsystem handle for the registry.
pub type DynSubsystem = Box<dyn Subsystem>;

/// Factory function type for lazily instantiating a subsystem.
pub type SubsystemFactory = Box<dyn Fn() -> Result<DynSubsystem, SubsystemError> + Send + Sync>;
