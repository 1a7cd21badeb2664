//! # Ports Layer
//!
//! Trait definitions for the hexagonal architecture.
//! This subsystem is a leaf: it has no outbound dependencies, only an
//! inbound API that other subsystems call through IPC.

pub mod inbound;
