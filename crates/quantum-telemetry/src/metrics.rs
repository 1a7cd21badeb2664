//! Prometheus metrics for the node's subsystems.
//!
//! All metrics follow the naming convention: `gnet_<subsystem>_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Counter**: Monotonically increasing value (e.g., blocks_verified_total)
//! - **Gauge**: Value that can go up or down (e.g., datastore_bytes_used)
//! - **Histogram**: Distribution of values (e.g., query_route_duration_seconds)

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, Gauge, GaugeVec, Histogram, HistogramVec,
    Opts, Registry, TextEncoder,
};
use std::sync::Arc;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // ECRS CODEC METRICS (C1)
    // =========================================================================

    /// Blocks that passed query-consistency verification.
    pub static ref BLOCKS_VERIFIED: Counter = Counter::new(
        "gnet_ecrs_blocks_verified_total",
        "Total number of blocks that passed query-consistency verification"
    ).expect("metric creation failed");

    /// Blocks that failed query-consistency verification.
    pub static ref BLOCKS_VERIFICATION_FAILED: CounterVec = CounterVec::new(
        Opts::new("gnet_ecrs_blocks_verification_failed_total", "Blocks that failed query-consistency verification"),
        &["reason"]
    ).expect("metric creation failed");

    /// Block encode duration histogram.
    pub static ref BLOCK_ENCODE_DURATION: Histogram = Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "gnet_ecrs_block_encode_duration_seconds",
            "Time spent content-hash-key-encoding a plaintext into a DATA block"
        ).buckets(exponential_buckets(0.0001, 2.0, 15).unwrap())
    ).expect("metric creation failed");

    // =========================================================================
    // BLOOM INDEX METRICS (C2)
    // =========================================================================

    /// Bloom index rebuilds (e.g. after a resize).
    pub static ref BLOOM_INDEX_REBUILDS: Counter = Counter::new(
        "gnet_bloom_rebuilds_total",
        "Total number of bloom index rebuilds"
    ).expect("metric creation failed");

    /// Current bloom index entry count.
    pub static ref BLOOM_INDEX_ENTRIES: Gauge = Gauge::new(
        "gnet_bloom_entries",
        "Current number of entries tracked by the bloom index"
    ).expect("metric creation failed");

    // =========================================================================
    // DATASTORE METRICS (C3/C4/C5)
    // =========================================================================

    /// Blocks admitted and persisted to the store.
    pub static ref BLOCKS_STORED: CounterVec = CounterVec::new(
        Opts::new("gnet_datastore_blocks_stored_total", "Total number of blocks written to the datastore"),
        &["block_type"]
    ).expect("metric creation failed");

    /// Blocks evicted under quota pressure.
    pub static ref BLOCKS_EVICTED: CounterVec = CounterVec::new(
        Opts::new("gnet_datastore_blocks_evicted_total", "Total number of blocks evicted by the quota manager"),
        &["reason"]
    ).expect("metric creation failed");

    /// Current bytes used by the datastore against its quota.
    pub static ref DATASTORE_BYTES_USED: Gauge = Gauge::new(
        "gnet_datastore_bytes_used",
        "Current bytes used by the SQstore against its configured quota"
    ).expect("metric creation failed");

    /// Datastore write duration.
    pub static ref DATASTORE_WRITE_DURATION: Histogram = Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "gnet_datastore_write_duration_seconds",
            "Time spent writing a block to the datastore"
        ).buckets(exponential_buckets(0.0001, 2.0, 12).unwrap())
    ).expect("metric creation failed");

    // =========================================================================
    // PEER REGISTRY / SESSION CACHE / BOOTSTRAP METRICS (C6/C7/C9)
    // =========================================================================

    /// Peers currently held in the registry (connected + known).
    pub static ref PEERS_KNOWN: Gauge = Gauge::new(
        "gnet_peers_known",
        "Number of peers currently held in the identity registry"
    ).expect("metric creation failed");

    /// Peers newly discovered via HELLO.
    pub static ref PEERS_DISCOVERED: Counter = Counter::new(
        "gnet_peers_discovered_total",
        "Total number of peers discovered via accepted HELLO"
    ).expect("metric creation failed");

    /// Peers disconnected (HELLO expired or explicitly dropped).
    pub static ref PEERS_DISCONNECTED: Counter = Counter::new(
        "gnet_peers_disconnected_total",
        "Total number of peers evicted from the registry"
    ).expect("metric creation failed");

    /// Peers blacklisted after repeated failures.
    pub static ref PEERS_BLACKLISTED: Counter = Counter::new(
        "gnet_peers_blacklisted_total",
        "Total number of peers blacklisted after repeated failures"
    ).expect("metric creation failed");

    /// Session keys established or refreshed.
    pub static ref SESSION_KEYS_ESTABLISHED: Counter = Counter::new(
        "gnet_sessions_established_total",
        "Total number of session keys established or refreshed"
    ).expect("metric creation failed");

    /// Bootstrap probe attempts.
    pub static ref BOOTSTRAP_PROBES: CounterVec = CounterVec::new(
        Opts::new("gnet_bootstrap_probes_total", "Bootstrap/advertising probe attempts"),
        &["outcome"]  // outcome: success/failed/timeout
    ).expect("metric creation failed");

    // =========================================================================
    // TRAFFIC ACCOUNTANT METRICS (C8)
    // =========================================================================

    /// Cover-sufficiency admission checks, by outcome.
    pub static ref COVER_SUFFICIENCY_CHECKS: CounterVec = CounterVec::new(
        Opts::new("gnet_traffic_cover_checks_total", "Cover-traffic admission checks"),
        &["sufficient"]  // sufficient: true/false
    ).expect("metric creation failed");

    /// Distinct peers currently tracked in the received-traffic diversity ring, by message type.
    pub static ref TRAFFIC_DIVERSITY_PEERS: GaugeVec = GaugeVec::new(
        Opts::new("gnet_traffic_diversity_peers", "Distinct peers in the received-traffic diversity ring"),
        &["message_type"]
    ).expect("metric creation failed");

    // =========================================================================
    // GAP ROUTER METRICS (C10)
    // =========================================================================

    /// Queries forwarded to one or more peers.
    pub static ref QUERIES_ROUTED: Counter = Counter::new(
        "gnet_gap_queries_routed_total",
        "Total number of queries forwarded to one or more peers"
    ).expect("metric creation failed");

    /// Queries dropped, by reason.
    pub static ref QUERIES_DROPPED: CounterVec = CounterVec::new(
        Opts::new("gnet_gap_queries_dropped_total", "Queries dropped before being routed"),
        &["reason"]  // reason: backpressure/no_route/ttl_exhausted
    ).expect("metric creation failed");

    /// Query routing duration (priority computation through dispatch).
    pub static ref QUERY_ROUTE_DURATION: Histogram = Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "gnet_gap_query_route_duration_seconds",
            "Time spent routing one query to its next hops"
        ).buckets(exponential_buckets(0.0001, 2.0, 15).unwrap())
    ).expect("metric creation failed");

    /// Current indirection table occupancy.
    pub static ref INDIRECTION_TABLE_SIZE: Gauge = Gauge::new(
        "gnet_gap_indirection_table_size",
        "Current number of pending queries tracked for reply indirection"
    ).expect("metric creation failed");

    // =========================================================================
    // EVENT BUS METRICS (IPC)
    // =========================================================================

    /// Messages sent via event bus
    pub static ref EVENT_BUS_MESSAGES_SENT: CounterVec = CounterVec::new(
        Opts::new("gnet_eventbus_messages_sent_total", "Messages sent via event bus"),
        &["event_type", "source_subsystem"]
    ).expect("metric creation failed");

    /// Messages received via event bus
    pub static ref EVENT_BUS_MESSAGES_RECEIVED: CounterVec = CounterVec::new(
        Opts::new("gnet_eventbus_messages_received_total", "Messages received from event bus"),
        &["event_type", "target_subsystem"]
    ).expect("metric creation failed");

    /// Event bus delivery latency.
    pub static ref EVENT_BUS_LATENCY: Histogram = Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "gnet_eventbus_delivery_latency_seconds",
            "Time for event delivery via bus"
        ).buckets(exponential_buckets(0.0001, 2.0, 12).unwrap())
    ).expect("metric creation failed");

    // =========================================================================
    // ERROR METRICS
    // =========================================================================

    /// Subsystem errors by type
    pub static ref SUBSYSTEM_ERRORS: CounterVec = CounterVec::new(
        Opts::new("gnet_subsystem_errors_total", "Errors by subsystem and type"),
        &["subsystem", "error_type"]
    ).expect("metric creation failed");
}

/// Handle for the metrics server
pub struct MetricsHandle {
    _registry: Arc<Registry>,
}

/// Register all metrics with the global registry.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // ECRS codec
        Box::new(BLOCKS_VERIFIED.clone()),
        Box::new(BLOCKS_VERIFICATION_FAILED.clone()),
        Box::new(BLOCK_ENCODE_DURATION.clone()),
        // Bloom index
        Box::new(BLOOM_INDEX_REBUILDS.clone()),
        Box::new(BLOOM_INDEX_ENTRIES.clone()),
        // Datastore
        Box::new(BLOCKS_STORED.clone()),
        Box::new(BLOCKS_EVICTED.clone()),
        Box::new(DATASTORE_BYTES_USED.clone()),
        Box::new(DATASTORE_WRITE_DURATION.clone()),
        // Peers / sessions / bootstrap
        Box::new(PEERS_KNOWN.clone()),
        Box::new(PEERS_DISCOVERED.clone()),
        Box::new(PEERS_DISCONNECTED.clone()),
        Box::new(PEERS_BLACKLISTED.clone()),
        Box::new(SESSION_KEYS_ESTABLISHED.clone()),
        Box::new(BOOTSTRAP_PROBES.clone()),
        // Traffic accountant
        Box::new(COVER_SUFFICIENCY_CHECKS.clone()),
        Box::new(TRAFFIC_DIVERSITY_PEERS.clone()),
        // GAP router
        Box::new(QUERIES_ROUTED.clone()),
        Box::new(QUERIES_DROPPED.clone()),
        Box::new(QUERY_ROUTE_DURATION.clone()),
        Box::new(INDIRECTION_TABLE_SIZE.clone()),
        // Event bus
        Box::new(EVENT_BUS_MESSAGES_SENT.clone()),
        Box::new(EVENT_BUS_MESSAGES_RECEIVED.clone()),
        Box::new(EVENT_BUS_LATENCY.clone()),
        // Errors
        Box::new(SUBSYSTEM_ERRORS.clone()),
    ];

    for metric in metrics {
        REGISTRY
            .register(metric)
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    }

    Ok(MetricsHandle {
        _registry: Arc::new(REGISTRY.clone()),
    })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for the given histogram.
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        self.histogram.observe(duration);
    }
}

/// Start timing for a histogram. Observation happens on drop.
#[macro_export]
macro_rules! time_histogram {
    ($histogram:expr) => {
        $crate::metrics::HistogramTimer::new(&$histogram)
    };
}
