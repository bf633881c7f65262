//! # Engine Configuration
//!
//! Typed configuration for the native engine and its translation into the
//! forms the engine loads: YAML text or an opaque bootstrap handle.
//!
//! ```rust,ignore
//! use envoy_mobile_config::bootstrap::YamlBootstrapRenderer;
//! use envoy_mobile_config::engine::{library, EngineConfiguration};
//!
//! let renderer = YamlBootstrapRenderer::new(library::load());
//! let config = EngineConfiguration::builder()
//!     .app_id("com.example.app")
//!     .add_dns_preresolve_hostname("api.example.com")
//!     .build();
//! let yaml = config.create_yaml(&renderer)?;
//! ```

pub mod bridge;
pub mod configuration;
pub mod filters;
pub mod library;
pub mod template;

pub use bridge::{BootstrapParams, EngineBridge, WireFilter};
pub use configuration::{EngineConfiguration, EngineConfigurationBuilder, TrustChainVerification};
pub use filters::{
    HttpFilterFactory, KeyValueStore, NamedFilterFactory, NativeFilterConfig, StringAccessor,
    PLATFORM_BRIDGE_FILTER_NAME, PLATFORM_BRIDGE_TYPE_URL,
};
pub use template::{ensure_resolved, find_unresolved_key};
