//! Run configuration files (YAML/TOML).

use driveby_core::{ConfigError, RunConfig};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while reading a configuration file.
#[derive(Debug, Error)]
pub enum ParserError {
    /// YAML parsing or deserialization failed
    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml_ng::Error),

    /// TOML parsing or deserialization failed
    #[error("Failed to parse TOML: {0}")]
    TomlError(String),

    /// File I/O error
    #[error("File I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Unsupported file format
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// Invalid file extension
    #[error("Invalid or missing file extension")]
    InvalidExtension,

    /// Values parsed but are out of range
    #[error(transparent)]
    Invalid(#[from] ConfigError),
}

/// Result type alias for config parsing.
pub type Result<T> = std::result::Result<T, ParserError>;

/// Supported configuration file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// YAML format (.yml, .yaml)
    Yaml,
    /// TOML format (.toml)
    Toml,
}

/// Parse a run configuration from a YAML string.
///
/// # Example
///
/// ```rust
/// use driveby_parser::parse_config_yaml;
///
/// let yaml = r#"
/// timeout: 2s
/// load:
///   rate: 25
///   duration: 1m
/// "#;
///
/// let config = parse_config_yaml(yaml).unwrap();
/// assert_eq!(config.load.rate, 25);
/// ```
pub fn parse_config_yaml(content: &str) -> Result<RunConfig> {
    let config: RunConfig = serde_yaml_ng::from_str(content)?;
    config.validate()?;
    Ok(config)
}

/// Parse a run configuration from a TOML string.
///
/// # Example
///
/// ```rust
/// use driveby_parser::parse_config_toml;
///
/// let toml = r#"
/// concurrency = 4
///
/// [thresholds]
/// max_latency_p95 = "500ms"
/// min_success_rate = 0.95
/// "#;
///
/// let config = parse_config_toml(toml).unwrap();
/// assert_eq!(config.concurrency, 4);
/// ```
pub fn parse_config_toml(content: &str) -> Result<RunConfig> {
    let config: RunConfig =
        toml::from_str(content).map_err(|e| ParserError::TomlError(e.to_string()))?;
    config.validate()?;
    Ok(config)
}

/// Detect the configuration format from a file path based on its extension.
///
/// # Supported Extensions
///
/// * `.yaml`, `.yml` → `ConfigFormat::Yaml`
/// * `.toml` → `ConfigFormat::Toml`
///
/// # Errors
///
/// Returns `ParserError::InvalidExtension` if the file has no extension.
/// Returns `ParserError::UnsupportedFormat` if the extension is not recognized.
pub fn detect_format(path: &Path) -> Result<ConfigFormat> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .ok_or(ParserError::InvalidExtension)?;

    match extension.to_lowercase().as_str() {
        "yaml" | "yml" => Ok(ConfigFormat::Yaml),
        "toml" => Ok(ConfigFormat::Toml),
        other => Err(ParserError::UnsupportedFormat(other.to_string())),
    }
}

/// Load a run configuration from a file with automatic format detection.
///
/// ```no_run
/// use driveby_parser::load_config_file;
/// use std::path::Path;
///
/// let config = load_config_file(Path::new("driveby.yaml")).unwrap();
/// println!("Rate: {} req/s", config.load.rate);
/// ```
pub fn load_config_file(path: &Path) -> Result<RunConfig> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;

    match format {
        ConfigFormat::Yaml => parse_config_yaml(&content),
        ConfigFormat::Toml => parse_config_toml(&content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use driveby_core::{AuthConfig, HttpMethod, TestMode};
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use std::time::Duration;

    #[test]
    fn test_parse_yaml_config() {
        let yaml = r#"
timeout: 250ms
concurrency: 2
auth:
  type: api_key
  key: abc
test_mode: functional
load:
  rate: 5
  duration: 10s
  exclude_methods: [DELETE]
"#;
        let config = parse_config_yaml(yaml).unwrap();
        assert_eq!(config.timeout, Duration::from_millis(250));
        assert_eq!(config.concurrency, 2);
        assert_eq!(config.auth, Some(AuthConfig::api_key("abc")));
        assert_eq!(config.test_mode, TestMode::Functional);
        assert_eq!(config.load.exclude_methods, vec![HttpMethod::Delete]);
    }

    #[test]
    fn test_parse_toml_config() {
        let toml = r#"
auto_fix = true

[auth]
type = "basic"
username = "u"
password = "p"

[load]
rate = 100
workers = 16
"#;
        let config = parse_config_toml(toml).unwrap();
        assert!(config.auto_fix);
        assert_eq!(config.auth, Some(AuthConfig::basic("u", "p")));
        assert_eq!(config.load.workers, Some(16));
        assert_eq!(config.load.duration, Duration::from_secs(30));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = parse_config_yaml("load:\n  rate: 0\n").unwrap_err();
        assert!(matches!(err, ParserError::Invalid(_)));

        let err = parse_config_yaml("timeout: soon\n").unwrap_err();
        assert!(matches!(err, ParserError::YamlError(_)));
    }

    #[test]
    fn test_detect_format() {
        assert_eq!(
            detect_format(Path::new("driveby.yml")).unwrap(),
            ConfigFormat::Yaml
        );
        assert_eq!(
            detect_format(Path::new("driveby.TOML")).unwrap(),
            ConfigFormat::Toml
        );
        assert!(matches!(
            detect_format(Path::new("driveby")),
            Err(ParserError::InvalidExtension)
        ));
        assert!(matches!(
            detect_format(Path::new("driveby.json")),
            Err(ParserError::UnsupportedFormat(ext)) if ext == "json"
        ));
    }

    #[test]
    fn test_load_config_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "concurrency: 3").unwrap();
        let config = load_config_file(file.path()).unwrap();
        assert_eq!(config.concurrency, 3);
    }
}
