//! Run metrics
//!
//! Recorded through the `metrics` facade; they go nowhere unless a recorder
//! is installed (see `init_telemetry`).

use std::time::Duration;

/// Latency metric types
#[derive(Debug, Clone, Copy)]
pub enum LatencyMetric {
    /// One page render
    PageRender,
    /// One notification delivery
    NotificationSend,
}

/// Counter metric types
#[derive(Debug, Clone, Copy)]
pub enum CounterMetric {
    /// Probe that produced a price
    ProbeSucceeded,
    /// Probe that failed or found no price
    ProbeFailed,
    /// Notification delivered
    NotificationSent,
    /// Notification delivery failed
    NotificationFailed,
}

/// Gauge metric types
#[derive(Debug, Clone, Copy)]
pub enum GaugeMetric {
    /// Dates with a price in the latest snapshot
    DatesPriced,
    /// Cheapest price in the latest snapshot
    MinPrice,
    /// Changes reported by the latest run
    ChangesDetected,
}

/// Record a latency measurement
pub fn record_latency(metric: LatencyMetric, duration: Duration) {
    let metric_name = match metric {
        LatencyMetric::PageRender => "farewatch_page_render_latency_ms",
        LatencyMetric::NotificationSend => "farewatch_notification_latency_ms",
    };

    metrics::histogram!(metric_name).record(duration.as_secs_f64() * 1_000.0);
    tracing::debug!(
        metric = metric_name,
        value_ms = duration.as_millis(),
        "Recording latency"
    );
}

/// Increment a counter
pub fn increment(metric: CounterMetric) {
    let metric_name = match metric {
        CounterMetric::ProbeSucceeded => "farewatch_probes_succeeded_total",
        CounterMetric::ProbeFailed => "farewatch_probes_failed_total",
        CounterMetric::NotificationSent => "farewatch_notifications_sent_total",
        CounterMetric::NotificationFailed => "farewatch_notifications_failed_total",
    };

    metrics::counter!(metric_name).increment(1);
}

/// Set a gauge value
pub fn set_gauge(metric: GaugeMetric, value: f64) {
    let metric_name = match metric {
        GaugeMetric::DatesPriced => "farewatch_dates_priced",
        GaugeMetric::MinPrice => "farewatch_min_price",
        GaugeMetric::ChangesDetected => "farewatch_changes_detected",
    };

    metrics::gauge!(metric_name).set(value);
    tracing::debug!(metric = metric_name, value = value, "Setting gauge");
}
