//! Metrics collection and exposition.
//!
//! # Metrics
//! - `pool_cycle_alerts_total` (counter): alerts raised
//! - `pool_cycle_restart_attempts_total` (counter): restart attempts by outcome
//! - `pool_cycle_members_cycled_total` (counter): members restarted and re-enabled
//! - `pool_cycle_phase_polls_total` (counter): status polls by phase
//! - `pool_cycle_drain_residual_connections` (gauge): connections left when a drain timed out
//!
//! # Design Decisions
//! - A run is short-lived, so metrics go to a node-exporter textfile instead of an endpoint
//! - The textfile is replaced atomically (write temp, rename)

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::path::Path;

/// Install the Prometheus recorder and return a handle for rendering.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Render current metrics to `path`.
pub fn write_textfile(handle: &PrometheusHandle, path: &Path) -> std::io::Result<()> {
    let tmp = path.with_extension("prom.tmp");
    std::fs::write(&tmp, handle.render())?;
    std::fs::rename(&tmp, path)
}

pub fn record_alert() {
    metrics::counter!("pool_cycle_alerts_total").increment(1);
}

pub fn record_restart_attempt(outcome: &'static str) {
    metrics::counter!("pool_cycle_restart_attempts_total", "outcome" => outcome).increment(1);
}

pub fn record_member_cycled() {
    metrics::counter!("pool_cycle_members_cycled_total").increment(1);
}

pub fn record_phase_poll(phase: &'static str) {
    metrics::counter!("pool_cycle_phase_polls_total", "phase" => phase).increment(1);
}

pub fn record_drain_residual(member: &str, connections: u64) {
    metrics::gauge!("pool_cycle_drain_residual_connections", "member" => member.to_string())
        .set(connections as f64);
}
