//! Adapters binding the GAP router's outbound ports
//! (`gap_router::ports::outbound`) to its siblings' authenticated IPC
//! surfaces. Each `send_*`/`*_sufficient`/... call builds a signed
//! `AuthenticatedMessage<T>` with [`IpcSigner`] and hands it directly to
//! the recipient's `*Handler::handle_*` method — an in-process call, not
//! a bus publish, per the separation documented on `shared_bus`.
//!
//! Two asymmetries in the wire contracts force two deliberate departures
//! from "always go through signed IPC":
//!
//! - `BloomIndexAdapter::update` is a no-op. The authorization matrix
//!   grants `BloomUpdateRequest` to the datastore manager only, never to
//!   the GAP router, and `DatastoreManagerService::put`/`del` already
//!   insert/remove the bloom entry themselves as part of storing the
//!   block — a second, unauthorized update from here would both fail
//!   authorization and be redundant.
//! - `PeerDirectoryAdapter::forward_candidates` reads the host registry
//!   directly through `Shared<HostRegistryService<..>>` rather than over
//!   IPC: there is no `ipc.rs` payload for "enumerate hosts" or "read a
//!   peer's current trust", only for the signed `ChangeTrustRequest` this
//!   adapter's `change_trust` does use. The composition root holding the
//!   same `Arc` the registry's handler holds is the most-trusted caller
//!   in-process, not a simulated cross-subsystem actor that needs to
//!   prove its identity to itself.

use tracing::debug;

use bloom_index::handler::ipc_handler::BloomIndexHandler;
use bloom_index::ports::inbound::BloomIndexApi;
use datastore::handler::ipc_handler::DatastoreHandler;
use datastore::ports::inbound::DatastoreApi;
use ecrs_codec::adapters::ipc::IpcHandler as EcrsCodecIpcHandler;
use ecrs_codec::ports::inbound::EcrsCodecApi;
use gap_router::domain::forwarding::ForwardCandidate;
use gap_router::ports::outbound::{BlockVerifier, BloomIndex, CoverTrafficGate, LocalStore, PeerDirectory, PeerTransport};
use peer_registry::handler::ipc_handler::HostRegistryHandler;
use peer_registry::ports::inbound::HostRegistryApi;
use shared_types::entities::{BlockType, DatastoreBlock, PeerId, Query, SubsystemId};
use shared_types::ipc::{
    BloomTestRequest, ChangeTrustRequest, CoverSufficientRequest, DatastoreGetRequest, DatastorePutRequest,
    VerifyBlockRequest,
};
use shared_types::security::KeyProvider;
use traffic_accountant::handler::ipc_handler::TrafficAccountantHandler;
use traffic_accountant::ports::inbound::TrafficAccountantApi;

use super::ipc_client::IpcSigner;
use super::shared::{block_on, Shared};

pub struct EcrsCodecAdapter<S: EcrsCodecApi, K: KeyProvider> {
    handler: EcrsCodecIpcHandler<Shared<S>, K>,
    signer: IpcSigner,
}

impl<S: EcrsCodecApi, K: KeyProvider> EcrsCodecAdapter<S, K> {
    pub fn new(handler: EcrsCodecIpcHandler<Shared<S>, K>, signer: IpcSigner) -> Self {
        Self { handler, signer }
    }
}

impl<S: EcrsCodecApi, K: KeyProvider> BlockVerifier for EcrsCodecAdapter<S, K> {
    fn verify(&self, query: Query, block_type: BlockType, payload: &[u8]) -> bool {
        let (message, bytes) = self.signer.sign(
            SubsystemId::EcrsCodec,
            VerifyBlockRequest { query, block_type, payload: payload.to_vec() },
        );
        match self.handler.handle_verify_block(&message, &bytes) {
            Ok(response) => response.valid,
            Err(e) => {
                debug!(error = %e, "VerifyBlockRequest rejected");
                false
            }
        }
    }
}

pub struct BloomIndexAdapter<S: BloomIndexApi, K: KeyProvider> {
    handler: BloomIndexHandler<Shared<S>, K>,
    signer: IpcSigner,
}

impl<S: BloomIndexApi, K: KeyProvider> BloomIndexAdapter<S, K> {
    pub fn new(handler: BloomIndexHandler<Shared<S>, K>, signer: IpcSigner) -> Self {
        Self { handler, signer }
    }
}

impl<S: BloomIndexApi, K: KeyProvider> BloomIndex for BloomIndexAdapter<S, K> {
    fn maybe_present(&self, query: Query) -> bool {
        let (message, bytes) = self.signer.sign(SubsystemId::BloomIndex, BloomTestRequest { query });
        match self.handler.handle_bloom_test(&message, &bytes) {
            Ok(response) => response.maybe_present,
            Err(e) => {
                debug!(error = %e, "BloomTestRequest rejected, treating as maybe-present");
                true
            }
        }
    }

    /// No-op: see module doc. The datastore manager's `put`/`del` already
    /// keep the index in sync with what this node actually stores.
    fn update(&self, _query: Query, _insert: bool) {}
}

pub struct DatastoreAdapter<S: DatastoreApi, K: KeyProvider> {
    handler: DatastoreHandler<Shared<S>, K>,
    signer: IpcSigner,
}

impl<S: DatastoreApi, K: KeyProvider> DatastoreAdapter<S, K> {
    pub fn new(handler: DatastoreHandler<Shared<S>, K>, signer: IpcSigner) -> Self {
        Self { handler, signer }
    }
}

impl<S: DatastoreApi, K: KeyProvider> LocalStore for DatastoreAdapter<S, K> {
    fn get(&self, query: Query, block_type: Option<BlockType>) -> Vec<DatastoreBlock> {
        let (message, bytes) = self.signer.sign(
            SubsystemId::DatastoreManager,
            DatastoreGetRequest { query, value_hash: None, block_type },
        );
        match block_on(self.handler.handle_get(&message, &bytes)) {
            Ok(response) => response.matches,
            Err(e) => {
                debug!(error = %e, "DatastoreGetRequest rejected");
                Vec::new()
            }
        }
    }

    /// Always reports "newly stored": the real `DatastoreApi::put` return
    /// type no longer distinguishes a fresh insert from a silently-ignored
    /// duplicate, and this port's only caller (the now-no-op bloom update)
    /// never acts on the distinction either way.
    fn put(&self, query: Query, block: DatastoreBlock) -> bool {
        let (message, bytes) =
            self.signer.sign(SubsystemId::DatastoreManager, DatastorePutRequest { query, value: block });
        if let Err(e) = block_on(self.handler.handle_put(&message, &bytes)) {
            debug!(error = %e, "DatastorePutRequest rejected");
        }
        true
    }
}

pub struct PeerDirectoryAdapter<H: HostRegistryApi, K: KeyProvider> {
    registry: Shared<H>,
    handler: HostRegistryHandler<Shared<H>, K>,
    signer: IpcSigner,
}

impl<H: HostRegistryApi, K: KeyProvider> PeerDirectoryAdapter<H, K> {
    pub fn new(registry: Shared<H>, handler: HostRegistryHandler<Shared<H>, K>, signer: IpcSigner) -> Self {
        Self { registry, handler, signer }
    }
}

impl<H: HostRegistryApi, K: KeyProvider> PeerDirectory for PeerDirectoryAdapter<H, K> {
    fn forward_candidates(&self) -> Vec<ForwardCandidate> {
        let mut candidates = Vec::new();
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        self.registry.for_each_host(now, &mut |peer, _hello| {
            let trust = self.registry.current_trust(peer);
            // No subsystem tracks per-peer bandwidth, so every known host
            // is weighted equally; trust alone drives the selection.
            candidates.push(ForwardCandidate { peer, trust, bandwidth_share: 1.0 });
        });
        candidates
    }

    fn change_trust(&self, peer: PeerId, delta: i64) -> i64 {
        let (message, bytes) = self.signer.sign(SubsystemId::PeerRegistry, ChangeTrustRequest { peer, delta });
        match block_on(self.handler.handle_change_trust(&message, &bytes)) {
            Ok(response) => response.applied_delta,
            Err(e) => {
                debug!(error = %e, "ChangeTrustRequest rejected");
                0
            }
        }
    }
}

pub struct TrafficAccountantAdapter<A: TrafficAccountantApi, K: KeyProvider> {
    handler: TrafficAccountantHandler<Shared<A>, K>,
    signer: IpcSigner,
}

impl<A: TrafficAccountantApi, K: KeyProvider> TrafficAccountantAdapter<A, K> {
    pub fn new(handler: TrafficAccountantHandler<Shared<A>, K>, signer: IpcSigner) -> Self {
        Self { handler, signer }
    }
}

impl<A: TrafficAccountantApi, K: KeyProvider> CoverTrafficGate for TrafficAccountantAdapter<A, K> {
    fn cover_sufficient(&self, message_type: u16, anonymity_level: u32) -> bool {
        let (message, bytes) =
            self.signer.sign(SubsystemId::TrafficAccountant, CoverSufficientRequest { message_type, level: anonymity_level });
        match block_on(self.handler.handle_cover_sufficient(&message, &bytes)) {
            Ok(response) => response.sufficient,
            Err(e) => {
                debug!(error = %e, "CoverSufficientRequest rejected, denying send");
                false
            }
        }
    }
}

/// Logs the wire send instead of performing one. A real transport is the
/// one piece of this node genuinely out of scope: GAP routes queries and
/// files replies, but who carries bytes to a peer's socket is a separate
/// concern this crate does not own.
#[derive(Default)]
pub struct LoggingPeerTransport;

impl PeerTransport for LoggingPeerTransport {
    fn send_query(&self, peer: PeerId, fingerprint_bytes: &[u8]) {
        debug!(?peer, bytes = fingerprint_bytes.len(), "would send query");
    }

    fn send_reply(&self, peer: PeerId, block: &DatastoreBlock) {
        debug!(?peer, block_type = ?block.header.block_type, "would send reply");
    }
}

