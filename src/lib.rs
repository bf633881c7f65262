//! # Envoy Mobile Config
//!
//! Typed configuration for the Envoy Mobile engine and the policy deciding
//! whether a failed network operation may be retried immediately.
//!
//! ## Architecture
//!
//! ```text
//! EngineSettings → EngineConfiguration → BootstrapParams → EngineBridge
//!   (file/env)       (builder, chain)      (wire form)     (YAML / handle)
//! ```
//!
//! ## Core Components
//!
//! - **Engine configuration**: immutable settings plus platform capabilities,
//!   with platform filters bridged into the native filter chain
//! - **Bootstrap rendering**: an in-process [`EngineBridge`] producing the
//!   engine's bootstrap document
//! - **Network error classification**: retry-without-backoff decisions for
//!   network, stream and QUIC failures
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use envoy_mobile_config::bootstrap::YamlBootstrapRenderer;
//! use envoy_mobile_config::engine::{library, EngineConfiguration};
//! use envoy_mobile_config::Result;
//!
//! fn main() -> Result<()> {
//!     let renderer = YamlBootstrapRenderer::new(library::load());
//!     let config = EngineConfiguration::builder().app_id("com.example.app").build();
//!     println!("{}", config.create_yaml(&renderer)?);
//!     Ok(())
//! }
//! ```

pub mod bootstrap;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod network_error;
pub mod observability;

// Re-export commonly used types and traits
pub use config::{EngineSettings, ObservabilityConfig};
pub use engine::{EngineBridge, EngineConfiguration, TrustChainVerification};
pub use errors::{Error, Result};
pub use network_error::{NetError, NetworkError, PublicErrorCode};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
