pub mod bootstrap_driver;
pub mod registry;
pub mod session_cache;

pub use bootstrap_driver::BootstrapDriverService;
pub use registry::HostRegistryService;
pub use session_cache::SessionCacheService;
