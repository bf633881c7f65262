//! # Bootstrap Rendering
//!
//! An in-process [`EngineBridge`] that turns [`BootstrapParams`] into the
//! engine's bootstrap document. The document is assembled as JSON and emitted as
//! YAML, or handed back as a parsed [`Bootstrap`] handle.
//!
//! Filter configs, virtual clusters and stat sinks arrive as YAML flow mappings
//! and are embedded as structured values; a string that does not parse is a
//! [`Error::Serialization`].

use crate::engine::bridge::{wire_to_string, wire_to_strings, BootstrapParams, EngineBridge};
use crate::engine::library::EngineLibrary;
use crate::engine::TrustChainVerification;
use crate::errors::{Error, Result};
use serde_json::{json, Value};
use uuid::Uuid;

const API_LISTENER_NAME: &str = "base_api_listener";
const BASE_CLUSTER: &str = "base";
const BASE_H3_CLUSTER: &str = "base_h3";
const STATS_CLUSTER: &str = "stats";
const DNS_CACHE_NAME: &str = "base_dns_cache";
const PRERESOLVE_PORT: u16 = 443;
const DNS_CACHE_MAX_ENTRIES: u32 = 100;

/// A rendered bootstrap document
#[derive(Debug, Clone, PartialEq)]
pub struct Bootstrap {
    id: Uuid,
    document: Value,
}

impl Bootstrap {
    /// Identifier assigned when the bootstrap was rendered
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn document(&self) -> &Value {
        &self.document
    }

    pub fn into_document(self) -> Value {
        self.document
    }

    pub fn to_yaml(&self) -> Result<String> {
        to_yaml(&self.document)
    }
}

/// Renders bootstrap documents on behalf of the engine library.
#[derive(Debug, Clone, Copy)]
pub struct YamlBootstrapRenderer {
    library: &'static EngineLibrary,
}

impl YamlBootstrapRenderer {
    pub fn new(library: &'static EngineLibrary) -> Self {
        Self { library }
    }

    /// Assemble the bootstrap document for a parameter set.
    pub fn document(&self, params: &BootstrapParams) -> Result<Value> {
        let app_id = &params.app_id;
        let dns_cache = dns_cache_config(params)?;
        let virtual_clusters =
            parse_each("virtual cluster", &wire_to_strings(&params.virtual_clusters)?)?;
        let http_filters = http_filters(params, &dns_cache)?;
        let clusters = clusters(params, &dns_cache)?;
        let stats_sinks = stats_sinks(params)?;

        let hcm = json!({
            "@type": "type.googleapis.com/envoy.extensions.filters.network.http_connection_manager.v3.HttpConnectionManager",
            "stat_prefix": "hcm",
            "stream_idle_timeout": seconds(params.stream_idle_timeout_seconds),
            "route_config": {
                "name": "api_router",
                "virtual_hosts": [{
                    "name": "api",
                    "domains": ["*"],
                    "virtual_clusters": virtual_clusters,
                    "routes": [{
                        "match": { "prefix": "/" },
                        "route": {
                            "cluster_header": "x-envoy-mobile-cluster",
                            "timeout": "0s",
                            "retry_policy": {
                                "per_try_idle_timeout": seconds(params.per_try_idle_timeout_seconds)
                            }
                        }
                    }]
                }]
            },
            "http_filters": http_filters
        });

        let listener = json!({
            "name": API_LISTENER_NAME,
            "address": {
                "socket_address": { "protocol": "TCP", "address": "0.0.0.0", "port_value": 10000 }
            },
            "api_listener": { "api_listener": hcm }
        });

        let mut document = json!({
            "node": {
                "id": app_id,
                "cluster": "envoy-mobile",
                "metadata": {
                    "app_id": app_id,
                    "app_version": params.app_version,
                    "engine_version": self.library.version()
                }
            },
            "static_resources": {
                "listeners": [listener],
                "clusters": clusters
            },
            "stats_flush_interval": seconds(params.stats_flush_seconds),
            "stats_sinks": stats_sinks,
            "stats_config": {
                "stats_tags": [
                    { "tag_name": "app_id", "fixed_value": app_id },
                    { "tag_name": "app_version", "fixed_value": params.app_version }
                ]
            },
            "layered_runtime": {
                "layers": [{
                    "name": "static_layer_0",
                    "static_layer": {
                        "envoy": {
                            "reloadable_features": {
                                "skip_dns_lookup_for_proxied_requests":
                                    params.enable_skip_dns_lookup_for_proxied_requests
                            }
                        }
                    }
                }]
            }
        });

        if params.admin_interface_enabled {
            let root = document
                .as_object_mut()
                .ok_or_else(|| Error::internal("bootstrap document is not an object"))?;
            root.insert(
                "admin".to_string(),
                json!({
                    "address": {
                        "socket_address": { "address": "127.0.0.1", "port_value": 9901 }
                    }
                }),
            );
        }

        Ok(document)
    }
}

impl EngineBridge for YamlBootstrapRenderer {
    type Handle = Bootstrap;

    fn render_yaml(&self, params: &BootstrapParams) -> Result<String> {
        to_yaml(&self.document(params)?)
    }

    fn render_bootstrap(&self, params: &BootstrapParams) -> Result<Bootstrap> {
        let document = self.document(params)?;
        let bootstrap = Bootstrap { id: Uuid::new_v4(), document };
        tracing::debug!(bootstrap_id = %bootstrap.id, "rendered bootstrap handle");
        Ok(bootstrap)
    }
}

fn to_yaml(document: &Value) -> Result<String> {
    serde_yaml::to_string(document)
        .map_err(|e| Error::serialization("Failed to serialize bootstrap document", e))
}

fn seconds(value: u32) -> String {
    format!("{}s", value)
}

fn milliseconds(value: u32) -> String {
    format!("{}.{:03}s", value / 1000, value % 1000)
}

fn parse_flow(what: &str, text: &str) -> Result<Value> {
    serde_yaml::from_str(text)
        .map_err(|e| Error::serialization(format!("Invalid {} config '{}'", what, text), e))
}

fn parse_each(what: &str, texts: &[String]) -> Result<Vec<Value>> {
    texts.iter().map(|text| parse_flow(what, text)).collect()
}

fn typed_filter(name: &str, type_url: &str) -> Value {
    json!({ "name": name, "typed_config": { "@type": type_url } })
}

fn decompressor(library: &str, type_url: &str) -> Value {
    json!({
        "name": "envoy.filters.http.decompressor",
        "typed_config": {
            "@type": "type.googleapis.com/envoy.extensions.filters.http.decompressor.v3.Decompressor",
            "decompressor_library": {
                "name": library,
                "typed_config": { "@type": type_url }
            },
            "request_direction_config": {
                "common_config": {
                    "enabled": { "default_value": false, "runtime_key": "request_decompressor_enabled" }
                }
            },
            "response_direction_config": {
                "common_config": { "ignore_no_transform_header": true }
            }
        }
    })
}

/// The caller's chain as received, then the engine's fixed filters; the router
/// is always last.
fn http_filters(params: &BootstrapParams, dns_cache: &Value) -> Result<Vec<Value>> {
    let mut filters = Vec::with_capacity(params.filter_chain.len() + 6);

    for filter in &params.filter_chain {
        let name = wire_to_string(&filter.name)?;
        let typed_config = parse_flow("filter", &wire_to_string(&filter.typed_config)?)?;
        filters.push(json!({ "name": name, "typed_config": typed_config }));
    }

    filters.push(json!({
        "name": "envoy.filters.http.network_configuration",
        "typed_config": {
            "@type": "type.googleapis.com/envoymobile.extensions.filters.http.network_configuration.NetworkConfiguration",
            "enable_drain_post_dns_refresh": params.enable_drain_post_dns_refresh,
            "enable_interface_binding": params.enable_interface_binding
        }
    }));
    filters.push(typed_filter(
        "envoy.filters.http.local_error",
        "type.googleapis.com/envoymobile.extensions.filters.http.local_error.LocalError",
    ));
    if params.enable_socket_tagging {
        filters.push(typed_filter(
            "envoy.filters.http.socket_tag",
            "type.googleapis.com/envoymobile.extensions.filters.http.socket_tag.SocketTag",
        ));
    }
    if params.enable_gzip_decompression {
        filters.push(decompressor(
            "gzip",
            "type.googleapis.com/envoy.extensions.compression.gzip.decompressor.v3.Gzip",
        ));
    }
    if params.enable_brotli_decompression {
        filters.push(decompressor(
            "brotli",
            "type.googleapis.com/envoy.extensions.compression.brotli.decompressor.v3.Brotli",
        ));
    }
    filters.push(json!({
        "name": "envoy.filters.http.dynamic_forward_proxy",
        "typed_config": {
            "@type": "type.googleapis.com/envoy.extensions.filters.http.dynamic_forward_proxy.v3.FilterConfig",
            "dns_cache_config": dns_cache
        }
    }));
    filters.push(typed_filter(
        "envoy.router",
        "type.googleapis.com/envoy.extensions.filters.http.router.v3.Router",
    ));

    Ok(filters)
}

fn dns_cache_config(params: &BootstrapParams) -> Result<Value> {
    let preresolve: Vec<Value> = wire_to_strings(&params.dns_preresolve_hostnames)?
        .into_iter()
        .map(|host| json!({ "address": host, "port_value": PRERESOLVE_PORT }))
        .collect();

    let lookup_family = if params.enable_happy_eyeballs { "ALL" } else { "V4_PREFERRED" };
    let mut cache = json!({
        "name": DNS_CACHE_NAME,
        "dns_lookup_family": lookup_family,
        "host_ttl": "86400s",
        "dns_min_refresh_rate": seconds(params.dns_min_refresh_seconds),
        "dns_refresh_rate": seconds(params.dns_refresh_seconds),
        "dns_failure_refresh_rate": {
            "base_interval": seconds(params.dns_failure_refresh_seconds_base),
            "max_interval": seconds(params.dns_failure_refresh_seconds_max)
        },
        "dns_query_timeout": seconds(params.dns_query_timeout_seconds),
        "preresolve_hostnames": preresolve
    });

    if params.enable_dns_cache {
        let cache_obj = cache
            .as_object_mut()
            .ok_or_else(|| Error::internal("DNS cache config is not an object"))?;
        cache_obj.insert(
            "key_value_config".to_string(),
            json!({
                "config": {
                    "name": "envoy.key_value.platform",
                    "typed_config": {
                        "@type": "type.googleapis.com/envoymobile.extensions.key_value.platform.PlatformKeyValueStoreConfig",
                        "key": "dns_persistent_cache",
                        "save_interval": seconds(params.dns_cache_save_interval_seconds),
                        "max_entries": DNS_CACHE_MAX_ENTRIES
                    }
                }
            }),
        );
    }

    Ok(cache)
}

fn trust_chain_verification(params: &BootstrapParams) -> TrustChainVerification {
    if params.enforce_trust_chain_verification {
        TrustChainVerification::VerifyTrustChain
    } else {
        TrustChainVerification::AcceptUntrusted
    }
}

fn upstream_tls_context(params: &BootstrapParams, alpn: &[&str]) -> Value {
    let mut validation = json!({
        "trust_chain_verification": trust_chain_verification(params).as_str()
    });
    if params.enable_platform_certificates_validation {
        validation["custom_validator_config"] = json!({
            "name": "envoy_mobile.cert_validator.platform_bridge_cert_validator",
            "typed_config": {
                "@type": "type.googleapis.com/envoy_mobile.extensions.cert_validator.platform_bridge.PlatformBridgeCertValidator"
            }
        });
    }

    json!({
        "@type": "type.googleapis.com/envoy.extensions.transport_sockets.tls.v3.UpstreamTlsContext",
        "common_tls_context": {
            "tls_params": { "tls_maximum_protocol_version": "TLSv1_3" },
            "alpn_protocols": alpn,
            "validation_context": validation
        }
    })
}

fn protocol_options(params: &BootstrapParams, http3: bool) -> Value {
    let mut auto_config = json!({
        "http2_protocol_options": {
            "connection_keepalive": {
                "connection_idle_interval":
                    milliseconds(params.h2_connection_keepalive_idle_interval_milliseconds),
                "timeout": seconds(params.h2_connection_keepalive_timeout_seconds)
            },
            "max_concurrent_streams": 100
        },
        "http_protocol_options": {}
    });
    if http3 {
        auto_config["http3_protocol_options"] = json!({});
    }

    json!({
        "envoy.extensions.upstreams.http.v3.HttpProtocolOptions": {
            "@type": "type.googleapis.com/envoy.extensions.upstreams.http.v3.HttpProtocolOptions",
            "upstream_http_protocol_options": { "auto_sni": true, "auto_san_validation": true },
            "auto_config": auto_config
        }
    })
}

fn forward_proxy_cluster(
    params: &BootstrapParams,
    dns_cache: &Value,
    name: &str,
    transport_socket: Value,
    http3: bool,
) -> Value {
    json!({
        "name": name,
        "connect_timeout": seconds(params.connect_timeout_seconds),
        "lb_policy": "CLUSTER_PROVIDED",
        "cluster_type": {
            "name": "envoy.clusters.dynamic_forward_proxy",
            "typed_config": {
                "@type": "type.googleapis.com/envoy.extensions.clusters.dynamic_forward_proxy.v3.ClusterConfig",
                "dns_cache_config": dns_cache
            }
        },
        "transport_socket": transport_socket,
        "circuit_breakers": {
            "thresholds": [{
                "priority": "DEFAULT",
                "max_connections": params.max_connections_per_host
            }]
        },
        "typed_extension_protocol_options": protocol_options(params, http3)
    })
}

fn clusters(params: &BootstrapParams, dns_cache: &Value) -> Result<Vec<Value>> {
    let mut clusters = vec![forward_proxy_cluster(
        params,
        dns_cache,
        BASE_CLUSTER,
        json!({
            "name": "envoy.transport_sockets.tls",
            "typed_config": upstream_tls_context(params, &["h2", "http/1.1"])
        }),
        false,
    )];

    if params.enable_http3 {
        clusters.push(forward_proxy_cluster(
            params,
            dns_cache,
            BASE_H3_CLUSTER,
            json!({
                "name": "envoy.transport_sockets.quic",
                "typed_config": {
                    "@type": "type.googleapis.com/envoy.extensions.transport_sockets.quic.v3.QuicUpstreamTransport",
                    "upstream_tls_context": upstream_tls_context(params, &["h3"])
                }
            }),
            true,
        ));
    }

    if let Some(domain) = &params.grpc_stats_domain {
        clusters.push(json!({
            "name": STATS_CLUSTER,
            "type": "LOGICAL_DNS",
            "connect_timeout": seconds(params.connect_timeout_seconds),
            "dns_refresh_rate": seconds(params.dns_refresh_seconds),
            "http2_protocol_options": {},
            "load_assignment": {
                "cluster_name": STATS_CLUSTER,
                "endpoints": [{
                    "lb_endpoints": [{
                        "endpoint": {
                            "address": {
                                "socket_address": { "address": domain, "port_value": 443 }
                            }
                        }
                    }]
                }]
            },
            "transport_socket": {
                "name": "envoy.transport_sockets.tls",
                "typed_config": upstream_tls_context(params, &["h2"])
            }
        }));
    }

    Ok(clusters)
}

fn stats_sinks(params: &BootstrapParams) -> Result<Vec<Value>> {
    let mut sinks = parse_each("stat sink", &wire_to_strings(&params.stat_sinks)?)?;

    if params.grpc_stats_domain.is_some() {
        sinks.push(json!({
            "name": "envoy.metrics_service",
            "typed_config": {
                "@type": "type.googleapis.com/envoy.config.metrics.v3.MetricsServiceConfig",
                "transport_api_version": "V3",
                "report_counters_as_deltas": true,
                "emit_tags_as_labels": true,
                "grpc_service": { "envoy_grpc": { "cluster_name": STATS_CLUSTER } }
            }
        }));
    }

    Ok(sinks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{library, EngineConfiguration, NamedFilterFactory};
    use std::sync::Arc;

    fn renderer() -> YamlBootstrapRenderer {
        YamlBootstrapRenderer::new(library::load())
    }

    fn filter_names(document: &Value) -> Vec<String> {
        document["static_resources"]["listeners"][0]["api_listener"]["api_listener"]["http_filters"]
            .as_array()
            .map(|filters| {
                filters
                    .iter()
                    .filter_map(|f| f["name"].as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn cluster_names(document: &Value) -> Vec<String> {
        document["static_resources"]["clusters"]
            .as_array()
            .map(|c| c.iter().filter_map(|c| c["name"].as_str().map(str::to_string)).collect())
            .unwrap_or_default()
    }

    #[test]
    fn default_document_shape() {
        let params = EngineConfiguration::builder().app_id("com.example").build().bootstrap_params().unwrap();
        let document = renderer().document(&params).unwrap();

        assert_eq!(document["node"]["id"], "com.example");
        assert_eq!(document["node"]["metadata"]["engine_version"], crate::VERSION);
        assert!(document.get("admin").is_none());
        assert_eq!(cluster_names(&document), vec!["base", "base_h3"]);
        assert_eq!(document["stats_flush_interval"], "60s");

        let names = filter_names(&document);
        assert_eq!(names.last().map(String::as_str), Some("envoy.router"));
        assert!(names.contains(&"envoy.filters.http.decompressor".to_string()));
        assert!(!names.contains(&"envoy.filters.http.socket_tag".to_string()));
    }

    #[test]
    fn api_listener_is_a_typed_connection_manager() {
        let params = EngineConfiguration::builder().build().bootstrap_params().unwrap();
        let document = renderer().document(&params).unwrap();
        let api_listener = &document["static_resources"]["listeners"][0]["api_listener"]["api_listener"];

        assert_eq!(
            api_listener["@type"],
            "type.googleapis.com/envoy.extensions.filters.network.http_connection_manager.v3.HttpConnectionManager"
        );
        assert_eq!(api_listener["stat_prefix"], "hcm");
        assert!(api_listener.get("name").is_none());
        assert!(api_listener.get("typed_config").is_none());
        assert!(api_listener["http_filters"].is_array());
    }

    #[test]
    fn caller_chain_leads_the_filter_list() {
        let params = EngineConfiguration::builder()
            .add_native_filter(
                "envoy.filters.http.buffer",
                "{'@type': type.googleapis.com/envoy.extensions.filters.http.buffer.v3.Buffer, max_request_bytes: 5242880}",
            )
            .add_platform_filter(Arc::new(NamedFilterFactory::new("auth")))
            .build()
            .bootstrap_params()
            .unwrap();
        let document = renderer().document(&params).unwrap();
        let filters =
            &document["static_resources"]["listeners"][0]["api_listener"]["api_listener"]["http_filters"];

        assert_eq!(filters[0]["name"], "envoy.filters.http.buffer");
        assert_eq!(filters[0]["typed_config"]["max_request_bytes"], 5242880);
        assert_eq!(filters[1]["name"], "envoy.filters.http.platform_bridge");
        assert_eq!(filters[1]["typed_config"]["platform_filter_name"], "auth");
    }

    #[test]
    fn http3_and_admin_toggles() {
        let params = EngineConfiguration::builder()
            .enable_http3(false)
            .admin_interface_enabled(true)
            .trust_chain_verification(TrustChainVerification::AcceptUntrusted)
            .build()
            .bootstrap_params()
            .unwrap();
        let document = renderer().document(&params).unwrap();

        assert_eq!(cluster_names(&document), vec!["base"]);
        assert_eq!(document["admin"]["address"]["socket_address"]["port_value"], 9901);
        assert_eq!(
            document["static_resources"]["clusters"][0]["transport_socket"]["typed_config"]
                ["common_tls_context"]["validation_context"]["trust_chain_verification"],
            "ACCEPT_UNTRUSTED"
        );
    }

    #[test]
    fn dns_settings_flow_into_the_cache_config() {
        let params = EngineConfiguration::builder()
            .enable_dns_cache(true)
            .dns_cache_save_interval_seconds(5)
            .add_dns_preresolve_hostname("b.example.com")
            .add_dns_preresolve_hostname("a.example.com")
            .build()
            .bootstrap_params()
            .unwrap();
        let cache = dns_cache_config(&params).unwrap();

        assert_eq!(cache["preresolve_hostnames"][0]["address"], "b.example.com");
        assert_eq!(cache["preresolve_hostnames"][1]["address"], "a.example.com");
        assert_eq!(cache["preresolve_hostnames"][1]["port_value"], 443);
        assert_eq!(cache["dns_failure_refresh_rate"]["max_interval"], "10s");
        assert_eq!(cache["key_value_config"]["config"]["typed_config"]["save_interval"], "5s");
    }

    #[test]
    fn grpc_stats_domain_adds_sink_and_cluster() {
        let params = EngineConfiguration::builder()
            .grpc_stats_domain("stats.example.com")
            .add_stat_sink("{name: envoy.stat_sinks.statsd, typed_config: {'@type': type.googleapis.com/envoy.config.metrics.v3.StatsdSink}}")
            .build()
            .bootstrap_params()
            .unwrap();
        let document = renderer().document(&params).unwrap();

        assert_eq!(document["stats_sinks"][0]["name"], "envoy.stat_sinks.statsd");
        assert_eq!(document["stats_sinks"][1]["name"], "envoy.metrics_service");
        assert!(cluster_names(&document).contains(&"stats".to_string()));
    }

    #[test]
    fn malformed_filter_config_is_a_serialization_error() {
        let params = EngineConfiguration::builder()
            .add_native_filter("broken", "{unterminated: [")
            .build()
            .bootstrap_params()
            .unwrap();
        let err = renderer().document(&params).unwrap_err();
        assert!(matches!(err, Error::Serialization { .. }));
    }

    #[test]
    fn keepalive_interval_is_rendered_in_milliseconds() {
        assert_eq!(milliseconds(1), "0.001s");
        assert_eq!(milliseconds(1500), "1.500s");
        assert_eq!(seconds(30), "30s");
    }

    #[test]
    fn yaml_and_handle_agree() {
        let params = EngineConfiguration::builder().build().bootstrap_params().unwrap();
        let renderer = renderer();
        let yaml = renderer.render_yaml(&params).unwrap();
        let handle = renderer.render_bootstrap(&params).unwrap();

        assert_eq!(handle.to_yaml().unwrap(), yaml);
        let reparsed: Value = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(&reparsed, handle.document());
    }
}
