pub mod inbound;
pub mod outbound;

pub use inbound::{BootstrapDriverApi, HostRegistryApi, ProtocolFilter, SessionCacheApi};
pub use outbound::{
    BootstrapService, ConnectedCountSource, FileBackedHostStore, FileBackedTrustStore,
    HostFileStore, InMemoryHostStore, InMemoryStateFlagStore, InMemoryTrustStore,
    RandomSource, ResourceLoadProvider, StateFlagStore, StaticLoadProvider,
    SystemTimeSource, ThreadRngSource, TimeSource, TrustStore,
};
