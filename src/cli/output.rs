//! Shared output formatting utilities for CLI commands
//!
//! Rendered documents and reports are printed as YAML, JSON or TOML on stdout.

use anyhow::{Context, Result};
use serde::Serialize;
use std::str::FromStr;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
    Toml,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            "json" => Ok(OutputFormat::Json),
            "toml" => Ok(OutputFormat::Toml),
            _ => anyhow::bail!("Unsupported output format: '{}'. Use 'yaml', 'json' or 'toml'.", s),
        }
    }
}

/// Serialize data in the given format
pub fn format_output<T: Serialize>(data: &T, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Yaml => serde_yaml::to_string(data).context("Failed to serialize to YAML"),
        OutputFormat::Json => {
            serde_json::to_string_pretty(data).context("Failed to serialize to JSON")
        }
        OutputFormat::Toml => toml::to_string_pretty(data).context("Failed to serialize to TOML"),
    }
}

/// Print data in the given format
pub fn print_output<T: Serialize>(data: &T, format: OutputFormat) -> Result<()> {
    let text = format_output(data, format)?;
    println!("{}", text.trim_end());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct TestData {
        name: String,
        value: i32,
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("yaml".parse::<OutputFormat>().unwrap(), OutputFormat::Yaml);
        assert_eq!("YML".parse::<OutputFormat>().unwrap(), OutputFormat::Yaml);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("toml".parse::<OutputFormat>().unwrap(), OutputFormat::Toml);
        assert!("table".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_formats_parse_back() {
        let data = TestData { name: "test".to_string(), value: 42 };

        let json = format_output(&data, OutputFormat::Json).unwrap();
        assert_eq!(serde_json::from_str::<TestData>(&json).unwrap(), data);

        let yaml = format_output(&data, OutputFormat::Yaml).unwrap();
        assert_eq!(serde_yaml::from_str::<TestData>(&yaml).unwrap(), data);

        let toml_text = format_output(&data, OutputFormat::Toml).unwrap();
        assert_eq!(toml::from_str::<TestData>(&toml_text).unwrap(), data);
    }
}
