//! Composition root: builds every subsystem, wires the GAP router's
//! outbound ports to its siblings' authenticated IPC surfaces, and
//! assembles a [`shared_types::subsystem_registry::SubsystemRegistry`]
//! plus the two background loops ([`NodeHandle::run`]) neither subsystem
//! drives on its own — the datastore's periodic maintenance sweep and the
//! bootstrap driver's probe ticks.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use bloom_index::domain::BloomIndexConfig;
use bloom_index::handler::ipc_handler::BloomIndexHandler;
use bloom_index::service::BloomIndexService;
use datastore::domain::DatastoreConfig;
use datastore::handler::ipc_handler::DatastoreHandler;
use datastore::ports::outbound::FileBackedKVStore;
use datastore::service::{DatastoreManagerService, SqstoreService};
use ecrs_codec::adapters::ipc::IpcHandler as EcrsCodecIpcHandler;
use ecrs_codec::service::EcrsCodecService;
use gap_router::domain::entities::GapConfig;
use gap_router::ports::outbound::ThreadRngSource as GapThreadRng;
use gap_router::service::GapRouterService;
use peer_registry::domain::bootstrap::BootstrapConfig;
use peer_registry::domain::RegistryError;
use peer_registry::handler::ipc_handler::HostRegistryHandler;
use peer_registry::ports::outbound::{
    BootstrapService, FileBackedHostStore, FileBackedTrustStore, InMemoryStateFlagStore,
    StaticLoadProvider, SystemTimeSource as PeerSystemTime, ThreadRngSource as PeerThreadRng,
};
use peer_registry::service::{BootstrapDriverService, HostRegistryService, SessionCacheService};
use shared_types::entities::{HelloRecord, SubsystemId};
use shared_types::security::{DerivedKeyProvider, MessageVerifier, NonceCache};
use shared_types::subsystem_registry::SubsystemRegistry;
use shared_types::subsystem_trait::{Subsystem, SubsystemError, SubsystemStatus};
use traffic_accountant::handler::ipc_handler::TrafficAccountantHandler;
use traffic_accountant::ports::outbound::SystemTimeSource as TaSystemTime;
use traffic_accountant::service::TrafficAccountantService;

use crate::adapters::gap_router_ports::{
    BloomIndexAdapter, DatastoreAdapter, EcrsCodecAdapter, LoggingPeerTransport, PeerDirectoryAdapter, TrafficAccountantAdapter,
};
use crate::adapters::ipc_client::IpcSigner;
use crate::adapters::shared::Shared;
use crate::config::NodeConfig;
use crate::error::CoreError;

type Sqstore = SqstoreService<FileBackedKVStore>;
type BloomSvc = Shared<BloomIndexService>;
type DatastoreSvc = DatastoreManagerService<Sqstore, BloomSvc>;
type HostRegistrySvc = HostRegistryService<FileBackedHostStore, FileBackedTrustStore, PeerThreadRng, PeerSystemTime>;
type BootstrapSvc = BootstrapDriverService<NullBootstrapService, StaticLoadProvider, InMemoryStateFlagStore, PeerThreadRng, Shared<HostRegistrySvc>>;
type TrafficSvc = TrafficAccountantService<TaSystemTime>;

type GapRouter = GapRouterService<
    EcrsCodecAdapter<EcrsCodecService, DerivedKeyProvider>,
    BloomIndexAdapter<BloomIndexService, DerivedKeyProvider>,
    DatastoreAdapter<DatastoreSvc, DerivedKeyProvider>,
    PeerDirectoryAdapter<HostRegistrySvc, DerivedKeyProvider>,
    TrafficAccountantAdapter<TrafficSvc, DerivedKeyProvider>,
    LoggingPeerTransport,
    GapTimeSourceImpl,
    GapThreadRng,
>;

type GapTimeSourceImpl = gap_router::ports::outbound::SystemTimeSource;

/// A bootstrap service that never finds peers — the default for a node
/// that hasn't been handed a real bootstrap transport, matching
/// `gnunetd.disable_autoconnect`.
#[derive(Default)]
pub struct NullBootstrapService;

#[async_trait::async_trait]
impl BootstrapService for NullBootstrapService {
    async fn fetch_hellos(&self) -> Result<Vec<HelloRecord>, RegistryError> {
        Ok(Vec::new())
    }
}

/// The GAP router has no inbound IPC surface of its own — nothing is
/// authorized to call it, it only calls out (see
/// `shared_types::security::AuthorizationMatrix`) — so it carries no
/// `*Subsystem` wrapper in its own crate. This is that wrapper, built
/// here instead.
pub struct GapRouterSubsystem {
    service: Arc<GapRouter>,
}

impl GapRouterSubsystem {
    pub fn new(service: Arc<GapRouter>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Subsystem for GapRouterSubsystem {
    fn id(&self) -> SubsystemId {
        SubsystemId::GapRouter
    }

    fn name(&self) -> &'static str {
        "GAP Router"
    }

    async fn start(&self) -> Result<(), SubsystemError> {
        Ok(())
    }

    async fn stop(&self) -> Result<(), SubsystemError> {
        Ok(())
    }

    async fn health_check(&self) -> SubsystemStatus {
        use gap_router::ports::inbound::GapRouterApi;
        if self.service.table_len() < self.service_max_table_entries() {
            SubsystemStatus::Healthy
        } else {
            SubsystemStatus::Degraded
        }
    }

    fn metrics(&self) -> serde_json::Value {
        use gap_router::ports::inbound::GapRouterApi;
        serde_json::json!({
            "subsystem_id": SubsystemId::GapRouter.as_u8(),
            "table_len": self.service.table_len(),
        })
    }
}

impl GapRouterSubsystem {
    fn service_max_table_entries(&self) -> usize {
        usize::MAX
    }
}

/// Every concrete service instance a running node needs to keep around
/// after `build()` returns: the registry drives lifecycle, the other
/// handles feed the two background loops `run()` starts.
pub struct NodeHandle {
    pub registry: SubsystemRegistry,
    gap_router: Arc<GapRouter>,
    datastore: Shared<DatastoreSvc>,
    bootstrap: Shared<BootstrapSvc>,
}

impl NodeHandle {
    /// The query table's current occupancy, exposed for callers (tests,
    /// an operator status command) that want it without going through
    /// `registry.metrics_all()`.
    pub fn gap_router_table_len(&self) -> usize {
        use gap_router::ports::inbound::GapRouterApi;
        self.gap_router.table_len()
    }

    /// Starts every subsystem, then spawns the datastore maintenance loop
    /// and the bootstrap probe loop, and blocks until `shutdown` resolves.
    pub async fn run(self, shutdown: impl std::future::Future<Output = ()>) -> Result<(), CoreError> {
        self.registry
            .start_all()
            .await
            .map_err(|e| CoreError::SubsystemStart { subsystem: "registry", source: e })?;
        info!("all subsystems started");

        let datastore = self.datastore.clone();
        let maintenance = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(datastore::domain::config::MAINTENANCE_TICK_SECS));
            loop {
                ticker.tick().await;
                let now = current_unix_time();
                let report = datastore.0.maintenance_tick(now);
                if !report.expired_evicted.is_empty() || !report.floor_evicted.is_empty() {
                    info!(
                        expired = report.expired_evicted.len(),
                        floor_evicted = report.floor_evicted.len(),
                        "datastore maintenance evicted rows"
                    );
                }
            }
        });

        let bootstrap = self.bootstrap.clone();
        let bootstrap_loop = tokio::spawn(async move {
            use peer_registry::ports::inbound::BootstrapDriverApi;
            loop {
                let now = current_unix_time();
                let probed = bootstrap.tick(now).await;
                let sleep_secs = if probed { 5 } else { 30 };
                tokio::time::sleep(Duration::from_secs(sleep_secs)).await;
            }
        });

        shutdown.await;
        info!("shutdown requested");

        maintenance.abort();
        bootstrap_loop.abort();

        self.registry
            .stop_all()
            .await
            .map_err(|e| CoreError::SubsystemStart { subsystem: "registry", source: e })?;
        Ok(())
    }
}

fn current_unix_time() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Builds every subsystem from `config`, wires the GAP router's outbound
/// ports to signed IPC calls into its siblings, and registers all ten in
/// a fresh [`SubsystemRegistry`].
pub fn build(config: &NodeConfig) -> Result<NodeHandle, CoreError> {
    config.validate()?;

    std::fs::create_dir_all(&config.fs.dir).map_err(|e| CoreError::Config(e.to_string()))?;
    std::fs::create_dir_all(&config.fs.index_directory).map_err(|e| CoreError::Config(e.to_string()))?;
    std::fs::create_dir_all(config.gnunetd.hosts_dir()).map_err(|e| CoreError::Config(e.to_string()))?;
    std::fs::create_dir_all(config.gnunetd.credit_dir()).map_err(|e| CoreError::Config(e.to_string()))?;

    let keys = DerivedKeyProvider::new(config.ipc_master_secret.clone());
    let nonce_cache = NonceCache::new_shared();

    let verifier_for = |recipient: SubsystemId| MessageVerifier::new(recipient, nonce_cache.clone(), keys.clone());

    // --- C1: ECRS codec -----------------------------------------------
    let ecrs = Shared::new(EcrsCodecService::new());
    let ecrs_handler = EcrsCodecIpcHandler::new(ecrs.clone(), verifier_for(SubsystemId::EcrsCodec));

    // --- C2: bloom index -------------------------------------------------
    let bloom_config = BloomIndexConfig::new(config.fs.quota_bytes(), 0.01, config.fs.index_directory.join("bloom.idx"))
        .map_err(|e| CoreError::Dependency { subsystem: "bloom-index", detail: e.to_string() })?;
    let bloom = Shared::new(BloomIndexService::new(bloom_config));
    let bloom_handler = BloomIndexHandler::new(bloom.clone(), verifier_for(SubsystemId::BloomIndex));

    // --- C3/C4: sqstore + datastore manager ------------------------------
    let kv = FileBackedKVStore::new(config.fs.dir.join("sqstore.dat"));
    let sqstore = Sqstore::new(kv).map_err(|e| CoreError::Dependency { subsystem: "datastore", detail: e.to_string() })?;
    let datastore_config = DatastoreConfig::new(config.fs.quota_bytes(), current_unix_time(), config.fs.index_directory.clone());
    let datastore = Shared::new(DatastoreManagerService::new(sqstore, bloom.clone(), datastore_config));
    let datastore_handler = DatastoreHandler::new(datastore.clone(), verifier_for(SubsystemId::DatastoreManager));

    // --- C6: host registry -----------------------------------------------
    let host_store = FileBackedHostStore::new(config.gnunetd.hosts_dir())
        .map_err(|e| CoreError::Dependency { subsystem: "peer-registry", detail: e.to_string() })?;
    let trust_store = FileBackedTrustStore::new(config.gnunetd.credit_dir())
        .map_err(|e| CoreError::Dependency { subsystem: "peer-registry", detail: e.to_string() })?;
    let host_registry = Shared::new(HostRegistryService::new(host_store, trust_store, PeerThreadRng, PeerSystemTime));
    let host_registry_handler = HostRegistryHandler::new(host_registry.clone(), verifier_for(SubsystemId::PeerRegistry));

    // --- C7: session cache -------------------------------------------------
    let session_cache = Shared::new(SessionCacheService::new());

    // --- C9: bootstrap driver -----------------------------------------------
    let bootstrap = Shared::new(BootstrapDriverService::new(
        NullBootstrapService,
        StaticLoadProvider(0),
        InMemoryStateFlagStore::new(),
        PeerThreadRng,
        host_registry.clone(),
        BootstrapConfig::default(),
    ));

    // --- C8: traffic accountant ----------------------------------------------
    let traffic = Shared::new(TrafficAccountantService::new(TaSystemTime));
    let traffic_handler = TrafficAccountantHandler::new(traffic.clone(), verifier_for(SubsystemId::TrafficAccountant));

    // --- C10: GAP router, wired to every sibling above via signed IPC -------
    let ecrs_adapter = EcrsCodecAdapter::new(ecrs_handler, IpcSigner::new(SubsystemId::GapRouter, keys.clone()));
    let bloom_adapter = BloomIndexAdapter::new(bloom_handler, IpcSigner::new(SubsystemId::GapRouter, keys.clone()));
    let datastore_adapter = DatastoreAdapter::new(datastore_handler, IpcSigner::new(SubsystemId::GapRouter, keys.clone()));
    let peer_directory_adapter =
        PeerDirectoryAdapter::new(host_registry.clone(), host_registry_handler, IpcSigner::new(SubsystemId::GapRouter, keys.clone()));
    let traffic_adapter = TrafficAccountantAdapter::new(traffic_handler, IpcSigner::new(SubsystemId::GapRouter, keys.clone()));

    let gap_router = Arc::new(GapRouterService::new(
        GapConfig::default(),
        ecrs_adapter,
        bloom_adapter,
        datastore_adapter,
        peer_directory_adapter,
        traffic_adapter,
        LoggingPeerTransport,
        GapTimeSourceImpl::default(),
        GapThreadRng,
    ));

    let mut registry = SubsystemRegistry::new();
    registry
        .register(Box::new(ecrs_codec::adapters::ipc::EcrsCodecSubsystem::new(ecrs)))
        .map_err(|e| CoreError::SubsystemStart { subsystem: "ecrs-codec", source: e })?;
    registry
        .register(Box::new(bloom_index::handler::ipc_handler::BloomIndexSubsystem::new(bloom)))
        .map_err(|e| CoreError::SubsystemStart { subsystem: "bloom-index", source: e })?;
    registry
        .register(Box::new(datastore::handler::ipc_handler::DatastoreSubsystem::new(datastore.clone())))
        .map_err(|e| CoreError::SubsystemStart { subsystem: "datastore", source: e })?;
    registry
        .register(Box::new(peer_registry::handler::ipc_handler::PeerRegistrySubsystem::new(host_registry)))
        .map_err(|e| CoreError::SubsystemStart { subsystem: "peer-registry", source: e })?;
    registry
        .register(Box::new(peer_registry::handler::ipc_handler::SessionCacheSubsystem::new(session_cache)))
        .map_err(|e| CoreError::SubsystemStart { subsystem: "session-cache", source: e })?;
    registry
        .register(Box::new(peer_registry::handler::ipc_handler::BootstrapDriverSubsystem::new(bootstrap.clone())))
        .map_err(|e| CoreError::SubsystemStart { subsystem: "bootstrap-driver", source: e })?;
    registry
        .register(Box::new(traffic_accountant::handler::ipc_handler::TrafficAccountantSubsystem::new(traffic)))
        .map_err(|e| CoreError::SubsystemStart { subsystem: "traffic-accountant", source: e })?;
    registry
        .register(Box::new(GapRouterSubsystem::new(gap_router.clone())))
        .map_err(|e| CoreError::SubsystemStart { subsystem: "gap-router", source: e })?;

    registry
        .validate_required()
        .map_err(|e| CoreError::SubsystemStart { subsystem: "registry", source: e })?;

    if config.gnunetd.disable_autoconnect {
        warn!("autoconnect disabled: bootstrap driver will never find peers through NullBootstrapService");
    }

    Ok(NodeHandle { registry, gap_router, datastore, bootstrap })
}
