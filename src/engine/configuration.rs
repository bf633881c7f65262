//! Typed engine configuration and its translation into bootstrap parameters.

use crate::config::EngineSettings;
use crate::engine::bridge::{strings_to_wire, BootstrapParams, EngineBridge, WireFilter};
use crate::engine::filters::{
    with_platform_bridges, HttpFilterFactory, KeyValueStore, NamedFilterFactory,
    NativeFilterConfig, StringAccessor,
};
use crate::engine::template;
use crate::errors::Result;
use crate::observability::MetricsRecorder;
use crate::render_span;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Peer certificate verification mode.
///
/// Names match the engine's `CertificateValidationContext.TrustChainVerification`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrustChainVerification {
    /// Verify against the CA and verification lists
    #[default]
    VerifyTrustChain,
    /// Permit connections whose certificate fails verification; the result is
    /// still available for route matching. Intended for tests.
    AcceptUntrusted,
}

impl TrustChainVerification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VerifyTrustChain => "VERIFY_TRUST_CHAIN",
            Self::AcceptUntrusted => "ACCEPT_UNTRUSTED",
        }
    }
}

impl fmt::Display for TrustChainVerification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable engine configuration.
///
/// Built once through [`EngineConfigurationBuilder`]. Platform filter bridges
/// are synthesised at build time; every render derives the reversed chain and
/// wire encoding fresh, so rendering is repeatable and safe from any thread.
#[derive(Clone)]
pub struct EngineConfiguration {
    settings: EngineSettings,
    native_filter_chain: Vec<NativeFilterConfig>,
    http_platform_filter_factories: Vec<Arc<dyn HttpFilterFactory>>,
    string_accessors: BTreeMap<String, Arc<dyn StringAccessor>>,
    key_value_stores: BTreeMap<String, Arc<dyn KeyValueStore>>,
}

impl fmt::Debug for EngineConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfiguration")
            .field("settings", &self.settings)
            .field("native_filter_chain", &self.native_filter_chain)
            .field("platform_filters", &self.platform_filter_names())
            .field("string_accessors", &self.string_accessors.keys().collect::<Vec<_>>())
            .field("key_value_stores", &self.key_value_stores.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl EngineConfiguration {
    pub fn builder() -> EngineConfigurationBuilder {
        EngineConfigurationBuilder::default()
    }

    /// Scalar and list settings this configuration was built from
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Stored chain: platform bridges in factory order, then native filters
    pub fn native_filter_chain(&self) -> &[NativeFilterConfig] {
        &self.native_filter_chain
    }

    pub fn http_platform_filter_factories(&self) -> &[Arc<dyn HttpFilterFactory>] {
        &self.http_platform_filter_factories
    }

    pub fn platform_filter_names(&self) -> Vec<&str> {
        self.http_platform_filter_factories.iter().map(|f| f.filter_name()).collect()
    }

    pub fn string_accessor(&self, name: &str) -> Option<&Arc<dyn StringAccessor>> {
        self.string_accessors.get(name)
    }

    pub fn string_accessors(&self) -> &BTreeMap<String, Arc<dyn StringAccessor>> {
        &self.string_accessors
    }

    pub fn key_value_store(&self, name: &str) -> Option<&Arc<dyn KeyValueStore>> {
        self.key_value_stores.get(name)
    }

    pub fn key_value_stores(&self) -> &BTreeMap<String, Arc<dyn KeyValueStore>> {
        &self.key_value_stores
    }

    pub fn enforce_trust_chain_verification(&self) -> bool {
        self.settings.trust_chain_verification == TrustChainVerification::VerifyTrustChain
    }

    /// The chain in the order the engine consumes it (stored chain reversed)
    pub fn reversed_filter_chain(&self) -> Vec<NativeFilterConfig> {
        self.native_filter_chain.iter().rev().cloned().collect()
    }

    /// Fails on the first string field still holding a `{{ key }}` placeholder.
    pub fn check_unresolved_keys(&self) -> Result<()> {
        let settings = &self.settings;
        let scalars = settings
            .grpc_stats_domain
            .iter()
            .chain([&settings.app_version, &settings.app_id]);
        let lists = settings
            .dns_preresolve_hostnames
            .iter()
            .chain(&settings.virtual_clusters)
            .chain(&settings.stat_sinks);
        let filters =
            self.native_filter_chain.iter().flat_map(|f| [&f.name, &f.typed_config]);

        for value in scalars.chain(lists).chain(filters) {
            if let Err(err) = template::ensure_resolved(value) {
                MetricsRecorder::new().record_unresolved_key();
                return Err(err);
            }
        }
        Ok(())
    }

    /// Derives the ordered parameter set handed to the engine bridge.
    pub fn bootstrap_params(&self) -> Result<BootstrapParams> {
        self.check_unresolved_keys()?;

        let s = &self.settings;
        let filter_chain = self
            .reversed_filter_chain()
            .into_iter()
            .map(|f| WireFilter {
                name: f.name.into_bytes(),
                typed_config: f.typed_config.into_bytes(),
            })
            .collect();

        Ok(BootstrapParams {
            grpc_stats_domain: s.grpc_stats_domain.clone(),
            admin_interface_enabled: s.admin_interface_enabled,
            connect_timeout_seconds: s.connect_timeout_seconds,
            dns_refresh_seconds: s.dns_refresh_seconds,
            dns_failure_refresh_seconds_base: s.dns_failure_refresh_seconds_base,
            dns_failure_refresh_seconds_max: s.dns_failure_refresh_seconds_max,
            dns_query_timeout_seconds: s.dns_query_timeout_seconds,
            dns_min_refresh_seconds: s.dns_min_refresh_seconds,
            dns_preresolve_hostnames: strings_to_wire(&s.dns_preresolve_hostnames),
            enable_dns_cache: s.enable_dns_cache,
            dns_cache_save_interval_seconds: s.dns_cache_save_interval_seconds,
            enable_drain_post_dns_refresh: s.enable_drain_post_dns_refresh,
            enable_http3: s.enable_http3,
            enable_gzip_decompression: s.enable_gzip_decompression,
            enable_brotli_decompression: s.enable_brotli_decompression,
            enable_socket_tagging: s.enable_socket_tagging,
            enable_happy_eyeballs: s.enable_happy_eyeballs,
            enable_interface_binding: s.enable_interface_binding,
            h2_connection_keepalive_idle_interval_milliseconds: s
                .h2_connection_keepalive_idle_interval_milliseconds,
            h2_connection_keepalive_timeout_seconds: s.h2_connection_keepalive_timeout_seconds,
            max_connections_per_host: s.max_connections_per_host,
            stats_flush_seconds: s.stats_flush_seconds,
            stream_idle_timeout_seconds: s.stream_idle_timeout_seconds,
            per_try_idle_timeout_seconds: s.per_try_idle_timeout_seconds,
            app_version: s.app_version.clone(),
            app_id: s.app_id.clone(),
            enforce_trust_chain_verification: self.enforce_trust_chain_verification(),
            virtual_clusters: strings_to_wire(&s.virtual_clusters),
            filter_chain,
            stat_sinks: strings_to_wire(&s.stat_sinks),
            enable_platform_certificates_validation: s.enable_platform_certificates_validation,
            enable_skip_dns_lookup_for_proxied_requests: s
                .enable_skip_dns_lookup_for_proxied_requests,
        })
    }

    /// Renders the configuration into the engine's YAML form.
    ///
    /// The rendered text is checked for leftover placeholders before it is
    /// returned.
    pub fn create_yaml<B>(&self, bridge: &B) -> Result<String>
    where
        B: EngineBridge + ?Sized,
    {
        let span = render_span!("create_yaml", app_id = %self.settings.app_id);
        let _guard = span.enter();

        let params = self.bootstrap_params()?;
        let result =
            bridge.render_yaml(&params).and_then(|yaml| template::ensure_resolved(&yaml).map(|_| yaml));

        MetricsRecorder::new().record_render("yaml", result.is_ok());
        match &result {
            Ok(yaml) => tracing::debug!(bytes = yaml.len(), "rendered engine yaml"),
            Err(e) => tracing::warn!(error = %e, "engine yaml rendering failed"),
        }
        result
    }

    /// Renders the configuration straight into a native bootstrap handle.
    pub fn create_bootstrap<B>(&self, bridge: &B) -> Result<B::Handle>
    where
        B: EngineBridge + ?Sized,
    {
        let span = render_span!("create_bootstrap", app_id = %self.settings.app_id);
        let _guard = span.enter();

        let params = self.bootstrap_params()?;
        let result = bridge.render_bootstrap(&params);

        MetricsRecorder::new().record_render("bootstrap", result.is_ok());
        if let Err(e) = &result {
            tracing::warn!(error = %e, "engine bootstrap rendering failed");
        }
        result
    }
}

macro_rules! setters {
    ($($field:ident: $ty:ty),* $(,)?) => {
        $(
            pub fn $field(mut self, value: $ty) -> Self {
                self.settings.$field = value;
                self
            }
        )*
    };
}

/// Builder for [`EngineConfiguration`]; starts from [`EngineSettings::default`].
#[derive(Default)]
pub struct EngineConfigurationBuilder {
    settings: EngineSettings,
    http_platform_filter_factories: Vec<Arc<dyn HttpFilterFactory>>,
    string_accessors: BTreeMap<String, Arc<dyn StringAccessor>>,
    key_value_stores: BTreeMap<String, Arc<dyn KeyValueStore>>,
}

impl EngineConfigurationBuilder {
    /// Start from loaded settings. Each platform filter listed by name is
    /// registered as a [`NamedFilterFactory`], in listed order.
    pub fn from_settings(settings: EngineSettings) -> Self {
        let http_platform_filter_factories = settings
            .platform_filters
            .iter()
            .map(|name| Arc::new(NamedFilterFactory::new(name.as_str())) as Arc<dyn HttpFilterFactory>)
            .collect();
        Self { settings, http_platform_filter_factories, ..Default::default() }
    }

    setters! {
        admin_interface_enabled: bool,
        connect_timeout_seconds: u32,
        dns_refresh_seconds: u32,
        dns_failure_refresh_seconds_base: u32,
        dns_failure_refresh_seconds_max: u32,
        dns_query_timeout_seconds: u32,
        dns_min_refresh_seconds: u32,
        enable_dns_cache: bool,
        dns_cache_save_interval_seconds: u32,
        enable_drain_post_dns_refresh: bool,
        enable_http3: bool,
        enable_gzip_decompression: bool,
        enable_brotli_decompression: bool,
        enable_socket_tagging: bool,
        enable_happy_eyeballs: bool,
        enable_interface_binding: bool,
        h2_connection_keepalive_idle_interval_milliseconds: u32,
        h2_connection_keepalive_timeout_seconds: u32,
        max_connections_per_host: u32,
        stats_flush_seconds: u32,
        stream_idle_timeout_seconds: u32,
        per_try_idle_timeout_seconds: u32,
        trust_chain_verification: TrustChainVerification,
        enable_skip_dns_lookup_for_proxied_requests: bool,
        enable_platform_certificates_validation: bool,
    }

    pub fn grpc_stats_domain(mut self, domain: impl Into<String>) -> Self {
        self.settings.grpc_stats_domain = Some(domain.into());
        self
    }

    pub fn app_version(mut self, version: impl Into<String>) -> Self {
        self.settings.app_version = version.into();
        self
    }

    pub fn app_id(mut self, id: impl Into<String>) -> Self {
        self.settings.app_id = id.into();
        self
    }

    pub fn add_dns_preresolve_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.settings.dns_preresolve_hostnames.push(hostname.into());
        self
    }

    pub fn add_virtual_cluster(mut self, cluster: impl Into<String>) -> Self {
        self.settings.virtual_clusters.push(cluster.into());
        self
    }

    pub fn add_stat_sink(mut self, sink: impl Into<String>) -> Self {
        self.settings.stat_sinks.push(sink.into());
        self
    }

    pub fn add_native_filter(
        mut self,
        name: impl Into<String>,
        typed_config: impl Into<String>,
    ) -> Self {
        self.settings.native_filters.push(NativeFilterConfig::new(name, typed_config));
        self
    }

    pub fn add_platform_filter(mut self, factory: Arc<dyn HttpFilterFactory>) -> Self {
        self.http_platform_filter_factories.push(factory);
        self
    }

    pub fn add_string_accessor(
        mut self,
        name: impl Into<String>,
        accessor: Arc<dyn StringAccessor>,
    ) -> Self {
        self.string_accessors.insert(name.into(), accessor);
        self
    }

    pub fn add_key_value_store(
        mut self,
        name: impl Into<String>,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        self.key_value_stores.insert(name.into(), store);
        self
    }

    pub fn build(self) -> EngineConfiguration {
        let Self { mut settings, http_platform_filter_factories, string_accessors, key_value_stores } =
            self;

        settings.platform_filters =
            http_platform_filter_factories.iter().map(|f| f.filter_name().to_string()).collect();
        let native_filter_chain = with_platform_bridges(
            settings.platform_filters.iter().map(String::as_str),
            settings.native_filters.clone(),
        );

        tracing::debug!(
            app_id = %settings.app_id,
            platform_filters = http_platform_filter_factories.len(),
            native_filters = settings.native_filters.len(),
            "built engine configuration"
        );

        EngineConfiguration {
            settings,
            native_filter_chain,
            http_platform_filter_factories,
            string_accessors,
            key_value_stores,
        }
    }
}
