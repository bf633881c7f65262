//! The engine boundary.
//!
//! Rendering never talks to the engine directly. It builds a [`BootstrapParams`]
//! value, the ordered parameter set the engine's config loader accepts, and
//! hands it to an [`EngineBridge`]. String sequences cross the boundary as one
//! independent byte string per element, in caller order.

use crate::errors::{Error, Result};

/// A filter chain entry in wire form
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WireFilter {
    pub name: Vec<u8>,
    pub typed_config: Vec<u8>,
}

/// Ordered parameter set passed to both bridge operations.
///
/// Field order follows the engine's render signature. `filter_chain` is already
/// reversed into the order the engine builds its pipeline in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapParams {
    pub grpc_stats_domain: Option<String>,
    pub admin_interface_enabled: bool,
    pub connect_timeout_seconds: u32,
    pub dns_refresh_seconds: u32,
    pub dns_failure_refresh_seconds_base: u32,
    pub dns_failure_refresh_seconds_max: u32,
    pub dns_query_timeout_seconds: u32,
    pub dns_min_refresh_seconds: u32,
    pub dns_preresolve_hostnames: Vec<Vec<u8>>,
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
    pub enforce_trust_chain_verification: bool,
    pub virtual_clusters: Vec<Vec<u8>>,
    pub filter_chain: Vec<WireFilter>,
    pub stat_sinks: Vec<Vec<u8>>,
    pub enable_platform_certificates_validation: bool,
    pub enable_skip_dns_lookup_for_proxied_requests: bool,
}

/// The two operations the native engine exposes for loading configuration.
///
/// Implementations own all schema and range validation; failures are reported as
/// [`Error::Engine`] and propagated by callers without interpretation.
pub trait EngineBridge: Send + Sync {
    /// Opaque handle to an already-parsed engine configuration
    type Handle;

    /// Renders the parameters into the engine's textual config format.
    fn render_yaml(&self, params: &BootstrapParams) -> Result<String>;

    /// Renders the parameters directly into a native bootstrap handle.
    fn render_bootstrap(&self, params: &BootstrapParams) -> Result<Self::Handle>;
}

/// Encodes strings as one byte string per element, order preserved.
pub fn strings_to_wire(values: &[String]) -> Vec<Vec<u8>> {
    values.iter().map(|value| value.as_bytes().to_vec()).collect()
}

/// Decodes a wire byte string back into UTF-8 text.
pub fn wire_to_string(bytes: &[u8]) -> Result<String> {
    String::from_utf8(bytes.to_vec())
        .map_err(|e| Error::engine(format!("Parameter is not valid UTF-8: {}", e)))
}

/// Decodes a sequence of wire byte strings, order preserved.
pub fn wire_to_strings(values: &[Vec<u8>]) -> Result<Vec<String>> {
    values.iter().map(|value| wire_to_string(value)).collect()
}
