//! Configuration layering for the binary.
//!
//! Values are resolved as config file, then environment, then flags. Flags
//! are applied by each command after [`load_run_config`] returns.

use anyhow::{Context, Result, anyhow};
use driveby_core::{AuthConfig, ContractModel, RunConfig};
use driveby_parser::{ContractSource, load_config_file, resolve_base_url};
use std::path::Path;

pub const ENV_BASE_URL: &str = "DRIVEBY_BASE_URL";
pub const ENV_TOKEN: &str = "DRIVEBY_TOKEN";
pub const ENV_API_KEY: &str = "DRIVEBY_API_KEY";

/// Reads the config file (if any) and layers environment credentials on top.
pub fn load_run_config(path: Option<&str>) -> Result<RunConfig> {
    let mut config = match path {
        Some(path) => load_config_file(Path::new(path))
            .with_context(|| format!("Failed to load config file: {}", path))?,
        None => RunConfig::default(),
    };
    apply_env(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

/// Applies credentials from the environment. A token wins over an API key.
pub fn apply_env(config: &mut RunConfig, lookup: impl Fn(&str) -> Option<String>) {
    let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    if let Some(token) = non_empty(ENV_TOKEN) {
        config.auth = Some(AuthConfig::bearer(token));
    } else if let Some(key) = non_empty(ENV_API_KEY) {
        config.auth = Some(AuthConfig::api_key(key));
    }
}

/// Resolves the base URL: flag, then `DRIVEBY_BASE_URL`, then the contract.
pub fn base_url(flag: Option<&str>, contract: &str, model: &ContractModel) -> Result<String> {
    let env = std::env::var(ENV_BASE_URL).ok();
    let explicit = flag.or(env.as_deref());

    resolve_base_url(explicit, &ContractSource::parse(contract), model).ok_or_else(|| {
        anyhow!(
            "No base URL to test against: pass --base-url, set {} or declare an absolute server URL in the contract",
            ENV_BASE_URL
        )
    })
}

/// Rejects out-of-range values after every layer has been applied.
pub fn validate(config: &RunConfig) -> Result<()> {
    config.validate().context("Invalid run configuration")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_token_overrides_config_auth() {
        let mut config = RunConfig {
            auth: Some(AuthConfig::basic("user", "pass")),
            ..RunConfig::default()
        };
        apply_env(&mut config, env(&[(ENV_TOKEN, "secret")]));
        assert_eq!(config.auth, Some(AuthConfig::bearer("secret")));
    }

    #[test]
    fn test_token_wins_over_api_key() {
        let mut config = RunConfig::default();
        apply_env(
            &mut config,
            env(&[(ENV_TOKEN, "secret"), (ENV_API_KEY, "key")]),
        );
        assert_eq!(config.auth, Some(AuthConfig::bearer("secret")));

        let mut config = RunConfig::default();
        apply_env(&mut config, env(&[(ENV_TOKEN, "  "), (ENV_API_KEY, "key")]));
        assert_eq!(config.auth, Some(AuthConfig::api_key("key")));
    }

    #[test]
    fn test_no_env_keeps_config() {
        let mut config = RunConfig::default();
        apply_env(&mut config, env(&[]));
        assert_eq!(config, RunConfig::default());
    }
}
