//! Live testing and run orchestration for Driveby.
//!
//! This crate exposes the core operations invoked by collaborators (the CLI,
//! a server or a queue worker):
//!
//! - [`load_contract`]: fetch, normalize and resolve a contract
//! - [`run_rules`]: evaluate the rule catalog, no network
//! - [`run_functional`]: one live request per operation, classified
//! - [`run_performance`]: fixed-rate load test with threshold evaluation
//! - [`run_all`]: every phase, folded into a [`ValidationReport`]
//!
//! # Example
//!
//! ```no_run
//! use driveby_core::RunConfig;
//! use driveby_runner::{CancellationToken, load_contract, run_all};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let loaded = load_contract("http://localhost:8080/openapi.json").await?;
//! let report = run_all(
//!     &loaded.model,
//!     "http://localhost:8080",
//!     &RunConfig::default(),
//!     &CancellationToken::new(),
//! )
//! .await;
//!
//! if report.is_failure() {
//!     println!("{} critical issue(s)", report.summary.critical_issues);
//! }
//! # Ok(())
//! # }
//! ```

mod cancel;
mod client;
mod functional;
mod histogram;
mod orchestrator;
mod performance;
mod request;

pub use cancel::CancellationToken;
pub use client::{ApiClient, Exchange};
pub use functional::{FunctionalExecutor, classify};
pub use histogram::LatencyHistogram;
pub use orchestrator::{Orchestrator, should_skip_performance};
pub use performance::{LoadTarget, PerformanceExecutor, evaluate_thresholds};
pub use request::{RequestPlan, build_request_plan, parse_base_url};

pub use driveby_parser::{LoadedContract, load_contract};

use driveby_core::{
    AuthConfig, ContractModel, EndpointOutcome, LoadProfile, PerformancePhase,
    PerformanceThresholds, RuleResult, RunConfig, TransportError, ValidationReport,
};
use driveby_validator::RuleEngine;
use std::time::Duration;

/// Evaluates the default rule catalog. Pure, no network.
pub fn run_rules(model: &ContractModel) -> Vec<RuleResult> {
    RuleEngine::with_default_rules().evaluate(model)
}

/// Tests every non-deprecated operation live with default timeouts.
///
/// # Errors
///
/// Returns `TransportError::InvalidUrl` when `base_url` is unusable. Failures
/// of individual requests are outcomes, not errors.
pub async fn run_functional(
    model: &ContractModel,
    base_url: &str,
    auth: Option<AuthConfig>,
) -> Result<Vec<EndpointOutcome>, TransportError> {
    let config = RunConfig {
        auth,
        ..RunConfig::default()
    };
    let executor = FunctionalExecutor::new(base_url, &config)?;
    Ok(executor.execute(model, &CancellationToken::new()).await)
}

/// Load-tests the contract's operations at `rate` requests per second for
/// `duration` and evaluates `thresholds`.
///
/// # Errors
///
/// Returns `TransportError::InvalidUrl` when `base_url` is unusable.
pub async fn run_performance(
    model: &ContractModel,
    base_url: &str,
    rate: u32,
    duration: Duration,
    thresholds: PerformanceThresholds,
) -> Result<PerformancePhase, TransportError> {
    let config = RunConfig {
        load: LoadProfile {
            rate,
            duration,
            ..LoadProfile::default()
        },
        thresholds,
        ..RunConfig::default()
    };
    let executor = PerformanceExecutor::new(base_url, &config)?;
    Ok(executor.execute(model, &CancellationToken::new()).await)
}

/// Runs every phase and returns the unified report.
pub async fn run_all(
    model: &ContractModel,
    base_url: &str,
    config: &RunConfig,
    cancel: &CancellationToken,
) -> ValidationReport {
    Orchestrator::new(config.clone())
        .run(model, base_url, cancel)
        .await
}
