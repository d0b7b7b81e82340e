//! Loader for OpenAPI contracts (JSON/YAML) and run configuration files.
//!
//! Loading runs in four steps: fetch the bytes, parse them into a generic
//! tree, normalize known contract quirks, then resolve references and convert
//! the tree into a [`ContractModel`]. Any failure along the way is a
//! [`ContractLoadError`], the only error that aborts a run.
//!
//! # Example
//!
//! ```rust
//! use driveby_parser::parse_contract;
//!
//! let yaml = r#"
//! openapi: 3.0.3
//! info:
//!   title: Widgets
//!   version: 1.0.0
//! paths:
//!   /widgets:
//!     get:
//!       responses:
//!         200:
//!           description: OK
//! "#;
//!
//! let loaded = parse_contract(yaml.as_bytes(), "widgets.yaml").expect("Failed to parse contract");
//! assert_eq!(loaded.model.info.title, "Widgets");
//! ```

pub mod config;
pub mod convert;
pub mod normalize;
pub mod resolve;
pub mod source;

pub use config::{
    ConfigFormat, ParserError, detect_format, load_config_file, parse_config_toml,
    parse_config_yaml,
};
pub use source::ContractSource;

use driveby_core::{ContractLoadError, ContractModel};
use serde_json::Value;
use tracing::{debug, info};

/// A loaded contract together with what normalization changed.
#[derive(Debug, Clone)]
pub struct LoadedContract {
    /// The resolved contract model
    pub model: ContractModel,
    /// Normalization changes and warnings
    pub notes: Vec<String>,
}

/// Load, normalize and resolve a contract from a file path or URL.
///
/// # Errors
///
/// Returns `ContractLoadError` when the source is unreachable, the bytes are
/// not JSON or YAML, or the document is not a structurally valid contract.
///
/// # Example
///
/// ```no_run
/// # async fn run() -> Result<(), driveby_core::ContractLoadError> {
/// use driveby_parser::load_contract;
///
/// let loaded = load_contract("https://api.example.com/openapi.json").await?;
/// println!("Loaded {} operations", loaded.model.operation_count());
/// # Ok(())
/// # }
/// ```
pub async fn load_contract(source: &str) -> Result<LoadedContract, ContractLoadError> {
    let source = ContractSource::parse(source);
    let bytes = source.fetch().await?;
    parse_contract(&bytes, &source.to_string())
}

/// Parse contract bytes that were already fetched.
///
/// JSON is detected when the first non-blank byte is `{`; anything else is
/// parsed as YAML.
pub fn parse_contract(bytes: &[u8], descriptor: &str) -> Result<LoadedContract, ContractLoadError> {
    let mut doc = parse_document(bytes)?;

    let notes = normalize::normalize(&mut doc);
    for note in &notes {
        debug!(note = %note, "Normalized contract");
    }

    let resolved = resolve::resolve_references(&doc)?;
    let model = convert::convert_document(&resolved, descriptor)?;

    info!(
        source = %descriptor,
        title = %model.info.title,
        operations = model.operation_count(),
        "Contract loaded"
    );
    Ok(LoadedContract { model, notes })
}

fn parse_document(bytes: &[u8]) -> Result<Value, ContractLoadError> {
    let first = bytes.iter().find(|b| !b.is_ascii_whitespace());
    if first == Some(&b'{') {
        return serde_json::from_slice(bytes).map_err(|e| ContractLoadError::parse(e.to_string()));
    }

    let text = std::str::from_utf8(bytes).map_err(|e| ContractLoadError::parse(e.to_string()))?;
    let yaml: serde_yaml_ng::Value =
        serde_yaml_ng::from_str(text).map_err(|e| ContractLoadError::parse(e.to_string()))?;
    if yaml.is_null() {
        return Err(ContractLoadError::parse("document is empty"));
    }
    Ok(yaml_to_json(yaml))
}

/// Converts a YAML tree into JSON, stringifying non-string mapping keys
/// (e.g. unquoted status codes like `200`).
fn yaml_to_json(value: serde_yaml_ng::Value) -> Value {
    use serde_yaml_ng::Value as Yaml;

    match value {
        Yaml::Null => Value::Null,
        Yaml::Bool(b) => Value::Bool(b),
        Yaml::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                n.as_f64().map(Value::from).unwrap_or(Value::Null)
            }
        }
        Yaml::String(s) => Value::String(s),
        Yaml::Sequence(items) => Value::Array(items.into_iter().map(yaml_to_json).collect()),
        Yaml::Mapping(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (yaml_key(key), yaml_to_json(value)))
                .collect(),
        ),
        Yaml::Tagged(tagged) => yaml_to_json(tagged.value),
    }
}

fn yaml_key(key: serde_yaml_ng::Value) -> String {
    use serde_yaml_ng::Value as Yaml;

    match key {
        Yaml::String(s) => s,
        Yaml::Bool(b) => b.to_string(),
        Yaml::Number(n) => n.to_string(),
        Yaml::Null => "null".to_string(),
        other => serde_json::to_string(&yaml_to_json(other)).unwrap_or_default(),
    }
}

/// Picks the base URL live requests are sent to.
///
/// An explicit base URL wins. Otherwise a contract fetched from a URL ending
/// in `.json`, `.yaml` or `.yml` yields that URL's directory, and finally the
/// first absolute `servers` entry is used.
pub fn resolve_base_url(
    explicit: Option<&str>,
    source: &ContractSource,
    model: &ContractModel,
) -> Option<String> {
    if let Some(url) = explicit.map(str::trim).filter(|url| !url.is_empty()) {
        return Some(url.trim_end_matches('/').to_string());
    }

    if let ContractSource::Url(url) = source {
        let lower = url.to_ascii_lowercase();
        if [".json", ".yaml", ".yml"].iter().any(|ext| lower.ends_with(ext)) {
            if let Some(index) = url.rfind('/') {
                let dir = &url[..index];
                if dir.contains("://") && !dir.ends_with(':') && !dir.ends_with('/') {
                    return Some(dir.to_string());
                }
            }
        }
    }

    model
        .servers
        .iter()
        .find(|server| server.starts_with("http://") || server.starts_with("https://"))
        .map(|server| server.trim_end_matches('/').to_string())
}
