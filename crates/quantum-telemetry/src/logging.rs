//! Structured logging for Loki integration.
//!
//! Logs are formatted as JSON with consistent fields that Loki can parse:
//! - `timestamp`: ISO 8601 timestamp
//! - `level`: Log level (trace, debug, info, warn, error)
//! - `subsystem`: Subsystem identifier (gap-router, datastore, etc.)
//! - `message`: Log message
//! - `trace_id`: OpenTelemetry trace ID (for correlation with Tempo)
//! - Additional context fields

use crate::{TelemetryConfig, TelemetryError};

/// Structured logger handle
pub struct StructuredLogger {
    _initialized: bool,
}

/// Initialize Loki logging.
///
/// Note: Loki integration is handled via the tracing-subscriber JSON layer.
/// Logs are sent to Loki via a log shipping agent (Promtail) or direct push.
/// This function configures structured logging that's Loki-compatible.
pub fn init_logging(config: &TelemetryConfig) -> Result<StructuredLogger, TelemetryError> {
    tracing::debug!(
        loki_endpoint = %config.loki_endpoint,
        json_logs = config.json_logs,
        "Structured logging configured for Loki compatibility"
    );

    Ok(StructuredLogger { _initialized: true })
}

/// Helper to create structured log entries with consistent formatting.
#[macro_export]
macro_rules! log_event {
    // Info level with subsystem
    (info, $subsystem:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::info!(
            subsystem = $subsystem,
            $($($field)*,)?
            $msg
        )
    };

    // Warn level with subsystem
    (warn, $subsystem:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::warn!(
            subsystem = $subsystem,
            $($($field)*,)?
            $msg
        )
    };

    // Error level with subsystem
    (error, $subsystem:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::error!(
            subsystem = $subsystem,
            $($($field)*,)?
            $msg
        )
    };

    // Debug level with subsystem
    (debug, $subsystem:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::debug!(
            subsystem = $subsystem,
            $($($field)*,)?
            $msg
        )
    };
}

/// Log a content-block event with standard fields.
#[macro_export]
macro_rules! log_block_event {
    ($level:ident, $subsystem:expr, $msg:expr, $query:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            subsystem = $subsystem,
            query = %$query,
            $($($field)*,)?
            $msg
        )
    };
}

/// Log a GAP query-routing event with standard fields.
#[macro_export]
macro_rules! log_query_event {
    ($level:ident, $subsystem:expr, $msg:expr, $query:expr, $ttl:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            subsystem = $subsystem,
            query = %$query,
            ttl = $ttl,
            $($($field)*,)?
            $msg
        )
    };
}

/// Log a peer-related event with standard fields.
#[macro_export]
macro_rules! log_peer_event {
    ($level:ident, $subsystem:expr, $msg:expr, $peer_id:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            subsystem = $subsystem,
            peer_id = %$peer_id,
            $($($field)*,)?
            $msg
        )
    };
}
