//! # Configuration Settings
//!
//! Plain-data settings for the engine and for the tool's own observability.
//! Engine settings can be loaded from a TOML, YAML or JSON file and overridden
//! through `ENVOY_MOBILE_*` environment variables.

use crate::engine::{NativeFilterConfig, TrustChainVerification};
use crate::errors::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use validator::Validate;

/// Prefix for environment overrides (`ENVOY_MOBILE_APP_ID`, ...)
pub const ENV_PREFIX: &str = "ENVOY_MOBILE";

/// Engine tuning parameters without platform capabilities.
///
/// Platform filters are listed by name only; the host registers the matching
/// factories, string accessors and key/value stores on the builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub admin_interface_enabled: bool,
    pub grpc_stats_domain: Option<String>,
    pub connect_timeout_seconds: u32,
    pub dns_refresh_seconds: u32,
    pub dns_failure_refresh_seconds_base: u32,
    pub dns_failure_refresh_seconds_max: u32,
    pub dns_query_timeout_seconds: u32,
    pub dns_min_refresh_seconds: u32,
    pub dns_preresolve_hostnames: Vec<String>,
    pub enable_dns_cache: bool,
    pub dns_cache_save_interval_seconds: u32,
    pub enable_drain_post_dns_refresh: bool,
    pub enable_http3: bool,
    pub enable_gzip_decompression: bool,
    pub enable_brotli_decompression: bool,
    pub enable_socket_tagging: bool,
    pub enable_happy_eyeballs: bool,
    pub enable_interface_binding: bool,
    pub h2_connection_keepalive_idle_interval_milliseconds: u32,
    pub h2_connection_keepalive_timeout_seconds: u32,
    pub max_connections_per_host: u32,
    pub stats_flush_seconds: u32,
    pub stream_idle_timeout_seconds: u32,
    pub per_try_idle_timeout_seconds: u32,
    pub app_version: String,
    pub app_id: String,
    pub trust_chain_verification: TrustChainVerification,
    pub virtual_clusters: Vec<String>,
    pub native_filters: Vec<NativeFilterConfig>,
    /// Names of platform filters, bridged in ahead of `native_filters`
    pub platform_filters: Vec<String>,
    pub stat_sinks: Vec<String>,
    pub enable_skip_dns_lookup_for_proxied_requests: bool,
    pub enable_platform_certificates_validation: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            admin_interface_enabled: false,
            grpc_stats_domain: None,
            connect_timeout_seconds: 30,
            dns_refresh_seconds: 60,
            dns_failure_refresh_seconds_base: 2,
            dns_failure_refresh_seconds_max: 10,
            dns_query_timeout_seconds: 25,
            dns_min_refresh_seconds: 60,
            dns_preresolve_hostnames: vec![],
            enable_dns_cache: false,
            dns_cache_save_interval_seconds: 1,
            enable_drain_post_dns_refresh: false,
            enable_http3: true,
            enable_gzip_decompression: true,
            enable_brotli_decompression: false,
            enable_socket_tagging: false,
            enable_happy_eyeballs: true,
            enable_interface_binding: false,
            h2_connection_keepalive_idle_interval_milliseconds: 1,
            h2_connection_keepalive_timeout_seconds: 10,
            max_connections_per_host: 7,
            stats_flush_seconds: 60,
            stream_idle_timeout_seconds: 15,
            per_try_idle_timeout_seconds: 15,
            app_version: "unspecified".to_string(),
            app_id: "unspecified".to_string(),
            trust_chain_verification: TrustChainVerification::VerifyTrustChain,
            virtual_clusters: vec![],
            native_filters: vec![],
            platform_filters: vec![],
            stat_sinks: vec![],
            enable_skip_dns_lookup_for_proxied_requests: false,
            enable_platform_certificates_validation: false,
        }
    }
}

impl EngineSettings {
    /// Load settings from an optional file, then apply environment overrides.
    ///
    /// The file format is picked from the extension (`.toml`, `.yaml`, `.json`).
    /// Only scalar fields can be overridden from the environment. Override
    /// values stay strings until deserialization, so string fields keep their
    /// exact text and numeric or boolean fields are converted by type.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            tracing::debug!(path = %path.display(), "loading engine settings file");
            builder = builder.add_source(config::File::from(path));
        }

        let settings = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX))
            .build()?
            .try_deserialize()?;

        Ok(settings)
    }

    /// Connect timeout as Duration
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(u64::from(self.connect_timeout_seconds))
    }

    /// Stream idle timeout as Duration
    pub fn stream_idle_timeout(&self) -> Duration {
        Duration::from_secs(u64::from(self.stream_idle_timeout_seconds))
    }

    /// H2 keepalive ping interval as Duration
    pub fn h2_keepalive_idle_interval(&self) -> Duration {
        Duration::from_millis(u64::from(self.h2_connection_keepalive_idle_interval_milliseconds))
    }
}

/// Observability configuration for logging and metrics
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ObservabilityConfig {
    /// Enable metrics collection
    pub enable_metrics: bool,

    /// Service name attached to metrics
    #[validate(length(min = 1, message = "Service name cannot be empty"))]
    pub service_name: String,

    /// Log level (trace, debug, info, warn, error)
    #[validate(length(min = 1, message = "Log level cannot be empty"))]
    pub log_level: String,

    /// Enable JSON structured logging
    pub json_logging: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            enable_metrics: false,
            service_name: crate::APP_NAME.to_string(),
            log_level: "info".to_string(),
            json_logging: false,
        }
    }
}

impl ObservabilityConfig {
    /// Create ObservabilityConfig from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let log_level = std::env::var("ENVOY_MOBILE_LOG_LEVEL").unwrap_or(defaults.log_level);

        let json_logging = std::env::var("ENVOY_MOBILE_JSON_LOGS")
            .map(|s| s.to_lowercase() == "true" || s == "1")
            .unwrap_or(defaults.json_logging);

        let enable_metrics = std::env::var("ENVOY_MOBILE_METRICS")
            .map(|s| s.to_lowercase() == "true" || s == "1")
            .unwrap_or(defaults.enable_metrics);

        let service_name =
            std::env::var("ENVOY_MOBILE_SERVICE_NAME").unwrap_or(defaults.service_name);

        Self { enable_metrics, service_name, log_level, json_logging }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_engine_defaults() {
        let settings = EngineSettings::default();
        assert_eq!(settings.connect_timeout_seconds, 30);
        assert_eq!(settings.dns_refresh_seconds, 60);
        assert_eq!(settings.dns_failure_refresh_seconds_base, 2);
        assert_eq!(settings.dns_failure_refresh_seconds_max, 10);
        assert_eq!(settings.max_connections_per_host, 7);
        assert!(settings.enable_http3);
        assert!(settings.enable_gzip_decompression);
        assert!(!settings.enable_brotli_decompression);
        assert_eq!(settings.app_id, "unspecified");
        assert_eq!(settings.trust_chain_verification, TrustChainVerification::VerifyTrustChain);
    }

    #[test]
    fn test_durations() {
        let settings = EngineSettings {
            connect_timeout_seconds: 45,
            h2_connection_keepalive_idle_interval_milliseconds: 1500,
            ..Default::default()
        };
        assert_eq!(settings.connect_timeout(), Duration::from_secs(45));
        assert_eq!(settings.stream_idle_timeout(), Duration::from_secs(15));
        assert_eq!(settings.h2_keepalive_idle_interval(), Duration::from_millis(1500));
    }

    #[test]
    fn test_load_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
app_id = "com.example.client"
enable_http3 = false
trust_chain_verification = "ACCEPT_UNTRUSTED"
dns_preresolve_hostnames = ["z.example.com", "a.example.com"]
platform_filters = ["auth"]

[[native_filters]]
name = "envoy.filters.http.buffer"
typed_config = "{{'@type': type.googleapis.com/envoy.extensions.filters.http.buffer.v3.Buffer, max_request_bytes: 5242880}}"
"#
        )
        .unwrap();

        let settings = EngineSettings::load(Some(file.path())).unwrap();
        assert_eq!(settings.app_id, "com.example.client");
        assert!(!settings.enable_http3);
        assert_eq!(settings.trust_chain_verification, TrustChainVerification::AcceptUntrusted);
        assert_eq!(settings.dns_preresolve_hostnames, vec!["z.example.com", "a.example.com"]);
        assert_eq!(settings.platform_filters, vec!["auth"]);
        assert_eq!(settings.native_filters.len(), 1);
        assert!(settings.native_filters[0].typed_config.starts_with("{'@type'"));
        // untouched fields keep their defaults
        assert_eq!(settings.connect_timeout_seconds, 30);
    }

    #[test]
    fn test_observability_defaults_validate() {
        let config = ObservabilityConfig::default();
        assert!(config.validate().is_ok());

        let invalid = ObservabilityConfig { log_level: String::new(), ..Default::default() };
        assert!(invalid.validate().is_err());
    }
}
