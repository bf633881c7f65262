//! # Error Handling
//!
//! Error types for the engine configuration layer, defined with `thiserror`.
//! Failures reported by the engine bridge are carried through unchanged in
//! [`Error::Engine`].

/// Custom result type for configuration and rendering operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the engine configuration layer
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// A `{{ key }}` placeholder survived template substitution
    #[error("Unresolved template key: {key}")]
    UnresolvedTemplateKey { key: String },

    /// Opaque failure reported by the engine bridge
    #[error("Engine error: {0}")]
    Engine(String),

    /// YAML serialization/deserialization errors
    #[error("Serialization error: {context}")]
    Serialization {
        context: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// Settings failed field validation
    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Create a new engine bridge error
    pub fn engine<S: Into<String>>(message: S) -> Self {
        Self::Engine(message.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    /// Create an unresolved template key error
    pub fn unresolved_key<S: Into<String>>(key: S) -> Self {
        Self::UnresolvedTemplateKey { key: key.into() }
    }

    /// Wrap a YAML error with context
    pub fn serialization<S: Into<String>>(context: S, source: serde_yaml::Error) -> Self {
        Self::Serialization { context: context.into(), source }
    }

    /// Whether this error is a startup-fatal configuration problem
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, Self::Config(_) | Self::UnresolvedTemplateKey { .. } | Self::Validation(_))
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}
