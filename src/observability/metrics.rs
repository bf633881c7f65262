//! # Metrics Collection
//!
//! Counters for rendering and error classification, recorded through the
//! `metrics` facade. Without an installed recorder every call is a no-op.

use crate::config::ObservabilityConfig;
use crate::errors::Result;
use metrics::{counter, describe_counter};

/// Metrics recorder for the configuration layer
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsRecorder;

impl MetricsRecorder {
    /// Create a new metrics recorder instance
    pub fn new() -> Self {
        Self
    }

    /// Record a render through the engine bridge
    pub fn record_render(&self, target: &'static str, success: bool) {
        let labels = [("target", target), ("status", if success { "success" } else { "error" })];
        counter!("bootstrap_renders_total", &labels).increment(1);
    }

    /// Record a configuration rejected for an unresolved template key
    pub fn record_unresolved_key(&self) {
        counter!("unresolved_template_keys_total").increment(1);
    }

    /// Record a retry classification
    pub fn record_classification(&self, kind: &'static str, retryable: bool) {
        let labels = [("kind", kind), ("retryable", if retryable { "true" } else { "false" })];
        counter!("network_error_classifications_total", &labels).increment(1);
    }

    /// Record a transient internal code seen under a specific public category
    pub fn record_invariant_violation(&self, internal_code: i32) {
        let labels = [("internal_code", internal_code.to_string())];
        counter!("network_error_invariant_violations_total", &labels).increment(1);
    }
}

/// Register metric descriptions with the installed recorder
pub fn describe_metrics() {
    describe_counter!("bootstrap_renders_total", "Engine configuration renders by target and outcome");
    describe_counter!(
        "unresolved_template_keys_total",
        "Configurations rejected for unresolved template keys"
    );
    describe_counter!(
        "network_error_classifications_total",
        "Network errors classified for immediate retry"
    );
    describe_counter!(
        "network_error_invariant_violations_total",
        "Transient internal codes reported under a specific public category"
    );
}

/// Handle to the installed metrics recorder
#[derive(Clone, Default)]
pub struct MetricsHandle {
    #[cfg(feature = "prometheus")]
    prometheus: Option<metrics_exporter_prometheus::PrometheusHandle>,
}

impl MetricsHandle {
    /// Current metrics in Prometheus exposition format, when a recorder is installed
    pub fn render(&self) -> Option<String> {
        #[cfg(feature = "prometheus")]
        {
            self.prometheus.as_ref().map(|handle| handle.render())
        }
        #[cfg(not(feature = "prometheus"))]
        {
            None
        }
    }
}

/// Install the Prometheus recorder when metrics are enabled.
#[cfg(feature = "prometheus")]
pub fn init_metrics(config: &ObservabilityConfig) -> Result<MetricsHandle> {
    use metrics_exporter_prometheus::PrometheusBuilder;

    if !config.enable_metrics {
        return Ok(MetricsHandle::default());
    }

    let handle = PrometheusBuilder::new()
        .add_global_label("service", &config.service_name)
        .install_recorder()
        .map_err(|e| {
            crate::errors::Error::config(format!("Failed to initialize metrics recorder: {}", e))
        })?;

    describe_metrics();
    tracing::info!(service = %config.service_name, "Prometheus metrics recorder installed");
    Ok(MetricsHandle { prometheus: Some(handle) })
}

/// Metrics stay on the no-op recorder unless the host installs its own.
#[cfg(not(feature = "prometheus"))]
pub fn init_metrics(config: &ObservabilityConfig) -> Result<MetricsHandle> {
    if config.enable_metrics {
        tracing::warn!("metrics requested but the prometheus feature is disabled");
    }
    Ok(MetricsHandle::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_recorder_is_noop() {
        let recorder = MetricsRecorder::new();
        recorder.record_render("yaml", true);
        recorder.record_unresolved_key();
        recorder.record_classification("stream", true);
        recorder.record_invariant_violation(-352);
    }

    #[test]
    fn test_disabled_metrics_have_no_output() {
        let config = ObservabilityConfig { enable_metrics: false, ..Default::default() };
        let handle = init_metrics(&config).unwrap();
        assert!(handle.render().is_none());
    }
}
