pub mod ipc_handler;

pub use ipc_handler::{
    BootstrapDriverSubsystem, HostRegistryHandler, IpcError, PeerRegistrySubsystem,
    SessionCacheHandler, SessionCacheSubsystem,
};
