//! Prometheus metrics for the event server.
//!
//! Metrics are exposed in Prometheus text format for scraping by monitoring
//! systems once [`init_metrics`] has installed the exporter. Without an
//! exporter the recording functions are no-ops.
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use nest_server::metrics;
//! use std::net::SocketAddr;
//!
//! let addr: SocketAddr = "127.0.0.1:9090".parse().unwrap();
//! metrics::init_metrics(addr).unwrap();
//!
//! metrics::http_requests_total("POST", "/api/v1/guilds/{guild_id}/events", 201);
//! metrics::events_created_total("swiss");
//! ```

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize Prometheus metrics exporter.
///
/// Metrics will be available at `http://<addr>/metrics`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

// ============================================================================
// HTTP Metrics
// ============================================================================

/// Record HTTP request.
///
/// `path` should be the route template, not the concrete URI.
pub fn http_requests_total(method: &str, path: &str, status: u16) {
    metrics::counter!("http_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

// ============================================================================
// Event Metrics
// ============================================================================

/// Increment events created counter.
pub fn events_created_total(format: &str) {
    metrics::counter!("events_created_total",
        "format" => format.to_string()
    )
    .increment(1);
}

/// Increment rounds paired counter.
pub fn pairings_generated_total() {
    metrics::counter!("pairings_generated_total").increment(1);
}

/// Increment match results recorded counter.
pub fn results_recorded_total() {
    metrics::counter!("results_recorded_total").increment(1);
}

/// Increment tournaments completed counter.
///
/// `via` is `results` for a decided final or `finish` for the override.
pub fn tournaments_completed_total(via: &str) {
    metrics::counter!("tournaments_completed_total",
        "via" => via.to_string()
    )
    .increment(1);
}

/// Increment rejected commands counter, labelled by error kind.
pub fn commands_rejected_total(code: &str) {
    metrics::counter!("commands_rejected_total",
        "code" => code.to_string()
    )
    .increment(1);
}

// ============================================================================
// Payout Metrics
// ============================================================================

/// Record credited prize amount.
pub fn payout_credited(amount: i64) {
    metrics::counter!("payouts_credited_total").increment(1);
    metrics::histogram!("payout_amount").record(amount as f64);
}

/// Increment failed payouts counter.
pub fn payout_failures_total() {
    metrics::counter!("payout_failures_total").increment(1);
}
