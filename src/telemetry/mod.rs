//! Telemetry module
//!
//! Logging and run metrics

mod logging;
mod metrics;

pub use self::logging::{init_logging, LogFormat};
pub use self::metrics::{increment, record_latency, set_gauge, CounterMetric, GaugeMetric, LatencyMetric};

use crate::config::TelemetryConfig;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::path::PathBuf;

/// Guard that flushes telemetry on drop
///
/// When a metrics file is configured, the Prometheus text rendering of
/// everything recorded during the run is written there on drop.
pub struct TelemetryGuard {
    metrics: Option<(PrometheusHandle, PathBuf)>,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        let Some((handle, path)) = self.metrics.take() else {
            return;
        };
        match std::fs::write(&path, handle.render()) {
            Ok(()) => tracing::debug!(path = ?path, "Wrote metrics file"),
            Err(e) => tracing::warn!(path = ?path, error = %e, "Failed to write metrics file"),
        }
    }
}

/// Initialize all telemetry subsystems
pub fn init_telemetry(config: &TelemetryConfig) -> anyhow::Result<TelemetryGuard> {
    init_logging(&config.log_level, config.log_format)?;

    let metrics = match &config.metrics_file {
        Some(path) => {
            let handle = PrometheusBuilder::new()
                .install_recorder()
                .map_err(|e| anyhow::anyhow!("Failed to install metrics recorder: {}", e))?;
            Some((handle, path.clone()))
        }
        None => None,
    };

    Ok(TelemetryGuard { metrics })
}
