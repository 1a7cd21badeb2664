pub mod ipc_handler;

pub use ipc_handler::{IpcError, TrafficAccountantHandler, TrafficAccountantSubsystem};
