//! # Command Line Interface
//!
//! Renders engine configurations from settings files, checks them for
//! unresolved placeholders, and classifies network errors for retry.

pub mod output;

use crate::bootstrap::YamlBootstrapRenderer;
use crate::config::{EngineSettings, ObservabilityConfig};
use crate::engine::{library, EngineConfiguration, EngineConfigurationBuilder, NativeFilterConfig};
use crate::network_error::{NetError, NetworkError, NetworkErrorKind, PublicErrorCode};
use crate::observability::{init_observability, log_config_info};
use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use output::{print_output, OutputFormat};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "envoy-mobile-config")]
#[command(about = "Engine configuration rendering and network error classification")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render the engine bootstrap for a settings file
    Render {
        /// Settings file (TOML, YAML or JSON); defaults apply when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output format (yaml or json)
        #[arg(short, long, default_value = "yaml")]
        format: OutputFormat,
    },

    /// Check a settings file for unresolved placeholders
    Check {
        /// Settings file (TOML, YAML or JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Report format (yaml or json)
        #[arg(short, long, default_value = "yaml")]
        format: OutputFormat,
    },

    /// Decide whether a network error may be retried immediately
    Classify {
        /// Error variant
        #[arg(long, value_enum, default_value = "stream")]
        kind: ErrorKindArg,

        /// Internal engine error code, e.g. -352
        #[arg(long, allow_negative_numbers = true)]
        code: i32,

        /// Public error category; derived from the internal code when omitted
        #[arg(long)]
        category: Option<PublicErrorCode>,

        /// Detailed QUIC error code, for `--kind quic`
        #[arg(long, default_value_t = 0)]
        quic_code: i32,

        /// Output format (yaml or json)
        #[arg(short, long, default_value = "yaml")]
        format: OutputFormat,
    },

    /// Print the default engine settings
    Defaults {
        /// Output format (yaml, json or toml)
        #[arg(short, long, default_value = "yaml")]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ErrorKindArg {
    Network,
    Stream,
    Quic,
}

impl From<ErrorKindArg> for NetworkErrorKind {
    fn from(kind: ErrorKindArg) -> Self {
        match kind {
            ErrorKindArg::Network => NetworkErrorKind::Network,
            ErrorKindArg::Stream => NetworkErrorKind::Stream,
            ErrorKindArg::Quic => NetworkErrorKind::Quic,
        }
    }
}

#[derive(Debug, Serialize)]
struct CheckReport {
    app_id: String,
    app_version: String,
    platform_filters: Vec<String>,
    platform_bridge_count: usize,
    /// Chain in the order handed to the engine
    filter_chain: Vec<NativeFilterConfig>,
    enforce_trust_chain_verification: bool,
}

#[derive(Debug, Serialize)]
struct ClassifyReport {
    kind: NetworkErrorKind,
    error_code: PublicErrorCode,
    internal_code: i32,
    internal_name: Option<&'static str>,
    immediately_retryable: bool,
}

/// Run CLI commands
pub fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut observability = ObservabilityConfig::from_env();
    if cli.verbose {
        observability.log_level = "debug".to_string();
    }
    if cli.json_logs {
        observability.json_logging = true;
    }
    let metrics = init_observability(&observability).context("Failed to initialize observability")?;

    library::load();

    match cli.command {
        Commands::Render { config, format } => handle_render(config.as_deref(), format)?,
        Commands::Check { config, format } => handle_check(&config, format)?,
        Commands::Classify { kind, code, category, quic_code, format } => {
            handle_classify(kind.into(), NetError::from(code), category, quic_code, format)?
        }
        Commands::Defaults { format } => print_output(&EngineSettings::default(), format)?,
    }

    if let Some(snapshot) = metrics.render() {
        tracing::debug!(metrics = %snapshot, "metrics snapshot");
    }

    Ok(())
}

fn load_configuration(path: Option<&Path>) -> anyhow::Result<EngineConfiguration> {
    let settings = EngineSettings::load(path).with_context(|| match path {
        Some(path) => format!("Failed to load settings from {}", path.display()),
        None => "Failed to load settings from the environment".to_string(),
    })?;
    log_config_info(&settings);
    Ok(EngineConfigurationBuilder::from_settings(settings).build())
}

fn handle_render(path: Option<&Path>, format: OutputFormat) -> anyhow::Result<()> {
    let configuration = load_configuration(path)?;
    let renderer = YamlBootstrapRenderer::new(library::load());

    match format {
        OutputFormat::Yaml => {
            let yaml = configuration.create_yaml(&renderer).context("Failed to render YAML")?;
            println!("{}", yaml.trim_end());
        }
        OutputFormat::Json => {
            let bootstrap =
                configuration.create_bootstrap(&renderer).context("Failed to render bootstrap")?;
            print_output(bootstrap.document(), OutputFormat::Json)?;
        }
        OutputFormat::Toml => anyhow::bail!("Bootstrap rendering supports 'yaml' or 'json' output"),
    }
    Ok(())
}

fn handle_check(path: &Path, format: OutputFormat) -> anyhow::Result<()> {
    let configuration = load_configuration(Some(path))?;
    configuration
        .check_unresolved_keys()
        .with_context(|| format!("{} is not fully resolved", path.display()))?;

    print_output(&check_report(&configuration), format)
}

fn check_report(configuration: &EngineConfiguration) -> CheckReport {
    let settings = configuration.settings();
    let filter_chain = configuration.reversed_filter_chain();
    CheckReport {
        app_id: settings.app_id.clone(),
        app_version: settings.app_version.clone(),
        platform_filters: settings.platform_filters.clone(),
        platform_bridge_count: filter_chain.iter().filter(|f| f.is_platform_bridge()).count(),
        filter_chain,
        enforce_trust_chain_verification: configuration.enforce_trust_chain_verification(),
    }
}

fn handle_classify(
    kind: NetworkErrorKind,
    internal_code: NetError,
    category: Option<PublicErrorCode>,
    quic_code: i32,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let message = "classified from command line";
    let error_code = category.unwrap_or_else(|| internal_code.public_code());
    let error = match kind {
        NetworkErrorKind::Network => NetworkError::network(message, error_code, internal_code),
        NetworkErrorKind::Stream => NetworkError::stream(message, error_code, internal_code),
        NetworkErrorKind::Quic => NetworkError::quic(message, error_code, internal_code, quic_code),
    };

    if !error.has_consistent_category() {
        anyhow::bail!(
            "internal code {} is only reported under the 'other' category, not '{}'",
            internal_code,
            error_code
        );
    }

    let report = ClassifyReport {
        kind,
        error_code,
        internal_code: internal_code.code(),
        internal_name: internal_code.name(),
        immediately_retryable: error.immediately_retryable(),
    };
    print_output(&report, format)
}
