//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define gateway metrics (security events, verdicts, rule table builds, listener failures)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `gateway_security_events_total` (counter): by event kind, resolved mode
//! - `gateway_policy_verdicts_total` (counter): by verdict, access decision
//! - `gateway_rule_table_builds_total` (counter): by outcome
//! - `gateway_rule_table_build_seconds` (histogram): build duration
//! - `gateway_listener_failures_total` (counter): by listener, reason
//!
//! # Design Decisions
//! - Recording without an installed exporter is a no-op, so tests need no setup
//! - Labels are static strings or low-cardinality names

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with an HTTP listener on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_security_event(kind: &'static str, mode: &'static str) {
    counter!("gateway_security_events_total", "kind" => kind, "mode" => mode).increment(1);
}

pub fn record_verdict(verdict: &'static str, access: &'static str) {
    counter!("gateway_policy_verdicts_total", "verdict" => verdict, "access" => access).increment(1);
}

pub fn record_rule_table_build(outcome: &'static str, start: Instant) {
    counter!("gateway_rule_table_builds_total", "outcome" => outcome).increment(1);
    histogram!("gateway_rule_table_build_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_listener_failure(listener: &str, reason: &'static str) {
    counter!(
        "gateway_listener_failures_total",
        "listener" => listener.to_string(),
        "reason" => reason
    )
    .increment(1);
}
