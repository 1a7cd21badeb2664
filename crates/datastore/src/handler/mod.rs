pub mod ipc_handler;

pub use ipc_handler::{DatastoreHandler, DatastoreSubsystem, IpcError};
