//! Run configuration.
//!
//! A [`RunConfig`] is built once by the caller and threaded explicitly into
//! each executor. Every field has a default so partial config files work.

use crate::HttpMethod;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Invalid configuration value.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Invalid configuration field '{field}': {message}")]
pub struct ConfigError {
    /// Offending field
    pub field: String,
    /// Description of the problem
    pub message: String,
}

impl ConfigError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Configuration for a validation run.
///
/// # Example
///
/// ```rust
/// use driveby_core::{RunConfig, TestMode};
///
/// let config: RunConfig = serde_json::from_str(r#"{"timeout": "2s", "test_mode": "functional"}"#).unwrap();
/// assert_eq!(config.timeout.as_secs(), 2);
/// assert_eq!(config.test_mode, TestMode::Functional);
/// assert_eq!(config.load.rate, 10);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Per-request timeout for both executors
    #[serde(with = "crate::duration::human")]
    pub timeout: Duration,

    /// Maximum concurrent functional requests
    pub concurrency: usize,

    /// Attempt auto-fixes for failing fixable rules
    pub auto_fix: bool,

    /// Credentials applied to every outbound request
    pub auth: Option<AuthConfig>,

    /// Which live phases to run
    pub test_mode: TestMode,

    /// Load profile for the performance phase
    pub load: LoadProfile,

    /// Pass/fail thresholds for the performance phase
    pub thresholds: PerformanceThresholds,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            concurrency: 8,
            auto_fix: false,
            auth: None,
            test_mode: TestMode::All,
            load: LoadProfile::default(),
            thresholds: PerformanceThresholds::default(),
        }
    }
}

impl RunConfig {
    /// Creates a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks value ranges.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.timeout.is_zero() {
            return Err(ConfigError::new("timeout", "must be greater than zero"));
        }
        if self.concurrency == 0 {
            return Err(ConfigError::new("concurrency", "must be at least 1"));
        }
        if self.load.rate == 0 {
            return Err(ConfigError::new("load.rate", "must be at least 1 request/s"));
        }
        if self.load.workers == Some(0) {
            return Err(ConfigError::new("load.workers", "must be at least 1"));
        }
        let rate = self.thresholds.min_success_rate;
        if !(0.0..=1.0).contains(&rate) || rate.is_nan() {
            return Err(ConfigError::new(
                "thresholds.min_success_rate",
                format!("must be a fraction between 0 and 1, got {}", rate),
            ));
        }
        Ok(())
    }
}

/// Which live phases run after rule validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestMode {
    /// Rules only
    None,
    /// Rules and functional testing
    Functional,
    /// Rules and performance testing
    Performance,
    /// Every phase
    #[default]
    All,
}

impl TestMode {
    /// Whether the functional phase is requested.
    pub fn runs_functional(&self) -> bool {
        matches!(self, TestMode::Functional | TestMode::All)
    }

    /// Whether the performance phase is requested.
    pub fn runs_performance(&self) -> bool {
        matches!(self, TestMode::Performance | TestMode::All)
    }
}

/// Credentials applied uniformly to all outbound calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthConfig {
    /// Bearer-style token in a header
    Bearer {
        token: String,
        #[serde(default = "default_bearer_scheme")]
        scheme: String,
        #[serde(default = "default_bearer_header")]
        header: String,
    },
    /// Raw API key in a header
    ApiKey {
        key: String,
        #[serde(default = "default_api_key_header")]
        header: String,
    },
    /// HTTP basic authentication
    Basic { username: String, password: String },
}

fn default_bearer_scheme() -> String {
    "Bearer".to_string()
}

fn default_bearer_header() -> String {
    "Authorization".to_string()
}

fn default_api_key_header() -> String {
    "X-API-Key".to_string()
}

impl AuthConfig {
    /// Bearer token in the `Authorization` header.
    pub fn bearer(token: impl Into<String>) -> Self {
        AuthConfig::Bearer {
            token: token.into(),
            scheme: default_bearer_scheme(),
            header: default_bearer_header(),
        }
    }

    /// API key in the `X-API-Key` header.
    pub fn api_key(key: impl Into<String>) -> Self {
        AuthConfig::ApiKey {
            key: key.into(),
            header: default_api_key_header(),
        }
    }

    /// HTTP basic credentials.
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        AuthConfig::Basic {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Load profile for the performance phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadProfile {
    /// Requests per second
    pub rate: u32,

    /// Wall-clock duration of the attack
    #[serde(with = "crate::duration::human")]
    pub duration: Duration,

    /// In-flight request bound; derived from rate and timeout when unset
    pub workers: Option<usize>,

    /// Methods never targeted by the load generator
    pub exclude_methods: Vec<HttpMethod>,

    /// Attach synthesized JSON bodies to load targets
    pub synthesize_bodies: bool,
}

impl Default for LoadProfile {
    fn default() -> Self {
        Self {
            rate: 10,
            duration: Duration::from_secs(30),
            workers: None,
            exclude_methods: vec![HttpMethod::Delete, HttpMethod::Patch],
            synthesize_bodies: false,
        }
    }
}

impl LoadProfile {
    /// Worker count: explicit, or enough to sustain `rate` when every
    /// request takes the full `timeout`.
    pub fn effective_workers(&self, timeout: Duration) -> usize {
        if let Some(workers) = self.workers {
            return workers.max(1);
        }
        let needed = (self.rate as f64 * timeout.as_secs_f64()).ceil() as usize;
        needed.max(1)
    }
}

/// Performance thresholds. A zero value disables the check.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceThresholds {
    /// Maximum acceptable p95 latency
    #[serde(with = "crate::duration::human")]
    pub max_latency_p95: Duration,

    /// Minimum success rate as a fraction (0.95 = 95%)
    pub min_success_rate: f64,
}
