//! HTTP filter chain entries and platform capabilities
//!
//! The engine consumes filters as `(name, typed_config)` string pairs. Filters
//! implemented by the host platform are not visible to the engine directly; each
//! one is bridged in through a fixed platform bridge filter that carries the
//! platform filter's name.

use serde::{Deserialize, Serialize};

/// Engine filter name of the adapter that forwards into platform filters
pub const PLATFORM_BRIDGE_FILTER_NAME: &str = "envoy.filters.http.platform_bridge";

/// Type URL of the platform bridge filter configuration
pub const PLATFORM_BRIDGE_TYPE_URL: &str =
    "type.googleapis.com/envoymobile.extensions.filters.http.platform_bridge.PlatformBridge";

/// A native HTTP filter entry as handed to the engine
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NativeFilterConfig {
    /// Filter name used in the engine's filter registry
    pub name: String,
    /// Filter configuration, a YAML flow mapping carrying an `@type` key
    pub typed_config: String,
}

impl NativeFilterConfig {
    pub fn new(name: impl Into<String>, typed_config: impl Into<String>) -> Self {
        Self { name: name.into(), typed_config: typed_config.into() }
    }

    /// Builds the bridge entry that routes the engine into a platform filter.
    pub fn platform_bridge(platform_filter_name: &str) -> Self {
        Self::new(
            PLATFORM_BRIDGE_FILTER_NAME,
            format!(
                "{{'@type': {}, platform_filter_name: {}}}",
                PLATFORM_BRIDGE_TYPE_URL, platform_filter_name
            ),
        )
    }

    /// Whether this entry bridges into a platform filter
    pub fn is_platform_bridge(&self) -> bool {
        self.name == PLATFORM_BRIDGE_FILTER_NAME
    }
}

/// Factory for an HTTP filter implemented by the host platform.
///
/// The configuration only needs the factory's name; instantiation happens on
/// the engine side through the bridge filter.
pub trait HttpFilterFactory: Send + Sync {
    /// Name under which the platform filter is registered
    fn filter_name(&self) -> &str;
}

/// Platform callback returning a string on demand (e.g. the current network type)
pub trait StringAccessor: Send + Sync {
    fn get_string(&self) -> String;
}

/// Platform-backed persistent key/value storage used by the engine
pub trait KeyValueStore: Send + Sync {
    fn read(&self, key: &str) -> Option<String>;
    fn save(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// Factory identified only by a fixed name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedFilterFactory {
    name: String,
}

impl NamedFilterFactory {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl HttpFilterFactory for NamedFilterFactory {
    fn filter_name(&self) -> &str {
        &self.name
    }
}

/// Returns the effective stored chain: one bridge entry per platform factory, in
/// factory order, ahead of the native filters in caller order.
pub(crate) fn with_platform_bridges<'a, I>(
    factory_names: I,
    native: Vec<NativeFilterConfig>,
) -> Vec<NativeFilterConfig>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut chain: Vec<NativeFilterConfig> =
        factory_names.into_iter().map(NativeFilterConfig::platform_bridge).collect();
    chain.extend(native);
    chain
}
