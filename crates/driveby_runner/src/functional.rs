//! Functional test executor.
//!
//! Sends one synthesized request per non-deprecated operation and
//! classifies each live response.

use crate::cancel::CancellationToken;
use crate::client::ApiClient;
use crate::request::{build_request_plan, parse_base_url};
use driveby_core::{
    ContractModel, EndpointOutcome, Operation, Outcome, RunConfig, TransportError,
};
use futures::{StreamExt, stream};
use reqwest::Url;
use std::time::Duration;
use tracing::{debug, info};

/// Classifies one response. The first matching rule wins:
///
/// 1. transport failure: `failed`
/// 2. 401 or 403: `auth_failed`
/// 3. 5xx: `server_error`
/// 4. 4xx: `client_error`
/// 5. status documented by the operation: `success`
/// 6. anything else: `undocumented`
pub fn classify(status: Result<u16, &TransportError>, operation: &Operation) -> Outcome {
    match status {
        Err(_) => Outcome::Failed,
        Ok(401) | Ok(403) => Outcome::AuthFailed,
        Ok(code) if (500..600).contains(&code) => Outcome::ServerError,
        Ok(code) if (400..500).contains(&code) => Outcome::ClientError,
        Ok(code) if operation.documents_status(code) => Outcome::Success,
        Ok(_) => Outcome::Undocumented,
    }
}

/// Runs the functional phase against a live base URL.
///
/// # Example
///
/// ```no_run
/// # async fn run(model: driveby_core::ContractModel) -> Result<(), driveby_core::TransportError> {
/// use driveby_core::RunConfig;
/// use driveby_runner::{CancellationToken, FunctionalExecutor};
///
/// let executor = FunctionalExecutor::new("http://localhost:8080", &RunConfig::default())?;
/// let outcomes = executor.execute(&model, &CancellationToken::new()).await;
/// println!("Tested {} operations", outcomes.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct FunctionalExecutor {
    client: ApiClient,
    base_url: Url,
    concurrency: usize,
}

impl FunctionalExecutor {
    /// Creates an executor from the run configuration.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::InvalidUrl` for an unusable base URL.
    pub fn new(base_url: &str, config: &RunConfig) -> Result<Self, TransportError> {
        Ok(Self {
            client: ApiClient::new(config.timeout, config.auth.clone())?,
            base_url: parse_base_url(base_url)?,
            concurrency: config.concurrency.max(1),
        })
    }

    /// Tests every non-deprecated operation, at most `concurrency` at a time.
    ///
    /// Outcomes are returned in contract order. Once `cancel` is observed no
    /// further request is dispatched, so a cancelled run returns a prefix.
    pub async fn execute(
        &self,
        model: &ContractModel,
        cancel: &CancellationToken,
    ) -> Vec<EndpointOutcome> {
        let operations: Vec<&Operation> = model
            .operations()
            .filter(|op| {
                if op.deprecated {
                    debug!(endpoint = %op.endpoint_id(), "Skipping deprecated operation");
                }
                !op.deprecated
            })
            .collect();

        info!(
            operations = operations.len(),
            concurrency = self.concurrency,
            base_url = %self.base_url,
            "Starting functional tests"
        );

        let outcomes: Vec<EndpointOutcome> = stream::iter(operations)
            .map(|op| async move {
                if cancel.is_cancelled() {
                    return None;
                }
                Some(self.test_operation(op).await)
            })
            .buffered(self.concurrency)
            .filter_map(|outcome| async move { outcome })
            .collect()
            .await;

        info!(tested = outcomes.len(), "Functional tests finished");
        outcomes
    }

    async fn test_operation(&self, op: &Operation) -> EndpointOutcome {
        let plan = match build_request_plan(&self.base_url, op, true) {
            Ok(plan) => plan,
            Err(err) => {
                return EndpointOutcome {
                    method: op.method,
                    path: op.path.clone(),
                    url: format!("{}{}", self.base_url.as_str().trim_end_matches('/'), op.path),
                    outcome: Outcome::Failed,
                    status_code: None,
                    latency: Duration::ZERO,
                    errors: vec![err.to_string()],
                };
            }
        };

        let exchange = self.client.send(&plan).await;
        let outcome = classify(exchange.status.as_ref().copied(), op);
        let errors = match (&exchange.status, outcome) {
            (Err(err), _) => vec![err.to_string()],
            (Ok(_), Outcome::Success) => Vec::new(),
            (Ok(status), Outcome::Undocumented) => {
                vec![format!("Status {} is not documented", status)]
            }
            (Ok(status), other) => vec![format!("Unexpected status {} ({})", status, other)],
        };

        debug!(
            endpoint = %op.endpoint_id(),
            outcome = %outcome,
            latency_ms = exchange.latency.as_millis() as u64,
            "Tested operation"
        );

        EndpointOutcome {
            method: op.method,
            path: op.path.clone(),
            url: plan.url.to_string(),
            outcome,
            status_code: exchange.status.as_ref().ok().copied(),
            latency: exchange.latency,
            errors,
        }
    }
}
