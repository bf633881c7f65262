//! # Configuration Management
//!
//! Settings for the engine configuration bridge: engine tuning parameters
//! loaded from files and the environment, plus the tool's observability
//! configuration.

pub mod settings;

pub use settings::{EngineSettings, ObservabilityConfig, ENV_PREFIX};

/// Load a `.env` file if one exists.
///
/// Must run before any settings are read from the environment. A missing file
/// is not an error.
pub fn load_dotenv() {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Warning: Error loading .env file: {}", e);
        }
    }
}
