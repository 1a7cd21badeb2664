//! Adapters owned by the composition root itself, rather than by any one
//! subsystem crate: the GAP router's outbound ports (its siblings already
//! ship their own inbound IPC handlers and event-bus adapters, but
//! something has to hold the wires between them), the signed-message
//! builder those adapters share, and the `Shared<T>` wrapper that lets a
//! service instance be owned by both a subsystem registry entry and an
//! adapter at once.

pub mod gap_router_ports;
pub mod ipc_client;
pub mod shared;
