//! # Observability Infrastructure
//!
//! Structured logging and metrics for the configuration layer.

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, log_config_info};
pub use metrics::{describe_metrics, init_metrics, MetricsHandle, MetricsRecorder};

use crate::config::ObservabilityConfig;
use crate::errors::Result;
use validator::Validate;

/// Initialize logging and, when enabled, metrics.
///
/// Safe to call when a subscriber is already installed; logging setup is then
/// skipped.
pub fn init_observability(config: &ObservabilityConfig) -> Result<MetricsHandle> {
    config.validate()?;

    let logging_installed = init_logging(config)?;
    let handle = init_metrics(config)?;

    tracing::info!(
        service_name = %config.service_name,
        log_level = %config.log_level,
        metrics_enabled = config.enable_metrics,
        logging_installed,
        "Observability initialized"
    );

    Ok(handle)
}
