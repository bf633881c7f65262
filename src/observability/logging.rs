//! # Structured Logging
//!
//! Subscriber setup and span helpers built on the tracing ecosystem.
//!
//! Plain-text output is the default; JSON output is enabled through
//! [`ObservabilityConfig::json_logging`]. `RUST_LOG` takes precedence over the
//! configured level.

use crate::config::{EngineSettings, ObservabilityConfig};
use crate::errors::{Error, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Create a tracing span for a render operation.
///
/// Every span carries a fresh `operation_id` so the bridge call and its
/// outcome can be correlated in the logs.
///
/// ```rust,ignore
/// let span = render_span!("create_yaml", app_id = %settings.app_id);
/// ```
#[macro_export]
macro_rules! render_span {
    ($operation:expr) => {
        tracing::debug_span!(
            "engine_render",
            operation = %$operation,
            operation_id = %uuid::Uuid::new_v4()
        )
    };
    ($operation:expr, $($field:tt)*) => {
        tracing::debug_span!(
            "engine_render",
            operation = %$operation,
            operation_id = %uuid::Uuid::new_v4(),
            $($field)*
        )
    };
}

/// Install the global tracing subscriber, writing to stderr.
///
/// Returns `Ok(false)` when a subscriber was already installed (e.g. by a test
/// harness or the host application), which is not treated as an error.
pub fn init_logging(config: &ObservabilityConfig) -> Result<bool> {
    let filter = match std::env::var("RUST_LOG") {
        Ok(directives) => EnvFilter::try_new(directives),
        Err(_) => EnvFilter::try_new(&config.log_level),
    }
    .map_err(|e| Error::config(format!("Invalid log level '{}': {}", config.log_level, e)))?;

    let registry = tracing_subscriber::registry().with(filter);
    let installed = if config.json_logging {
        registry
            .with(fmt::layer().json().with_target(true).with_writer(std::io::stderr))
            .try_init()
            .is_ok()
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init()
            .is_ok()
    };

    Ok(installed)
}

/// Log the effective engine settings at startup
pub fn log_config_info(settings: &EngineSettings) {
    tracing::info!(
        app_id = %settings.app_id,
        app_version = %settings.app_version,
        http3_enabled = %settings.enable_http3,
        dns_cache_enabled = %settings.enable_dns_cache,
        trust_chain_verification = %settings.trust_chain_verification,
        native_filters = settings.native_filters.len(),
        platform_filters = settings.platform_filters.len(),
        "Engine configuration"
    );
}
