//! Performance test executor.
//!
//! Open-loop load generation: requests are released at a fixed rate for a
//! fixed duration, round-robin across targets, with a bounded worker pool.
//! Completed requests are folded into counters and a histogram by a single
//! aggregation task fed over a channel.

use crate::cancel::CancellationToken;
use crate::client::ApiClient;
use crate::histogram::LatencyHistogram;
use crate::request::{RequestPlan, build_request_plan, parse_base_url};
use chrono::Utc;
use driveby_core::{
    ContractModel, HttpMethod, LoadProfile, PerformanceMetrics, PerformancePhase,
    PerformanceResult, PerformanceThresholds, RunConfig, SkippedReason, ThresholdEvaluation,
    ThresholdViolation, TransportError,
};
use reqwest::Url;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Semaphore, mpsc};
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

/// One (method, path) pair attacked by the load generator.
#[derive(Debug, Clone)]
pub struct LoadTarget {
    pub method: HttpMethod,
    pub path: String,
    pub plan: RequestPlan,
}

/// A completed request as seen by the aggregator.
#[derive(Debug, Clone, Copy)]
struct Sample {
    latency: Duration,
    success: bool,
}

#[derive(Debug, Default)]
struct Aggregate {
    histogram: LatencyHistogram,
    success: u64,
}

impl Aggregate {
    fn record(&mut self, sample: Sample) {
        self.histogram.record(sample.latency);
        if sample.success {
            self.success += 1;
        }
    }
}

/// Whether a load-test response counts as successful.
fn is_success(status: &Result<u16, TransportError>) -> bool {
    matches!(status, Ok(code) if (200..400).contains(code))
}

/// Compares metrics against thresholds. A zero threshold is disabled.
///
/// # Example
///
/// ```rust
/// # use chrono::Utc;
/// # use std::time::Duration;
/// use driveby_core::{PerformanceMetrics, PerformanceThresholds};
/// use driveby_runner::evaluate_thresholds;
///
/// # let metrics = PerformanceMetrics {
/// #     total_requests: 100, success_count: 100, error_count: 0, error_rate: 0.0,
/// #     latency_p50: Duration::from_millis(900), latency_p95: Duration::from_secs(2),
/// #     latency_p99: Duration::from_secs(3), latency_mean: Duration::from_secs(1),
/// #     latency_max: Duration::from_secs(3), throughput: 10.0,
/// #     started_at: Utc::now(), finished_at: Utc::now(), cancelled: false,
/// # };
/// let disabled = PerformanceThresholds::default();
/// assert!(evaluate_thresholds(&metrics, &disabled).passed);
/// ```
pub fn evaluate_thresholds(
    metrics: &PerformanceMetrics,
    thresholds: &PerformanceThresholds,
) -> ThresholdEvaluation {
    let mut violations = Vec::new();

    if !thresholds.max_latency_p95.is_zero() && metrics.latency_p95 > thresholds.max_latency_p95 {
        violations.push(ThresholdViolation::LatencyP95 {
            observed: metrics.latency_p95,
            limit: thresholds.max_latency_p95,
        });
    }

    let success_rate = metrics.success_rate();
    if thresholds.min_success_rate > 0.0 && success_rate < thresholds.min_success_rate {
        violations.push(ThresholdViolation::SuccessRate {
            observed: success_rate,
            minimum: thresholds.min_success_rate,
        });
    }

    ThresholdEvaluation::from_violations(violations)
}

/// Runs the performance phase against a live base URL.
#[derive(Debug, Clone)]
pub struct PerformanceExecutor {
    client: ApiClient,
    base_url: Url,
    profile: LoadProfile,
    thresholds: PerformanceThresholds,
    workers: usize,
}

impl PerformanceExecutor {
    /// Creates an executor from the run configuration.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::InvalidUrl` for an unusable base URL.
    pub fn new(base_url: &str, config: &RunConfig) -> Result<Self, TransportError> {
        Ok(Self {
            client: ApiClient::new(config.timeout, config.auth.clone())?,
            base_url: parse_base_url(base_url)?,
            profile: config.load.clone(),
            thresholds: config.thresholds.clone(),
            workers: config.load.effective_workers(config.timeout),
        })
    }

    /// Builds one target per non-deprecated operation whose method is not
    /// excluded by the load profile.
    pub fn targets(&self, model: &ContractModel) -> Vec<LoadTarget> {
        model
            .operations()
            .filter(|op| !op.deprecated && !self.profile.exclude_methods.contains(&op.method))
            .filter_map(|op| {
                match build_request_plan(&self.base_url, op, self.profile.synthesize_bodies) {
                    Ok(plan) => Some(LoadTarget {
                        method: op.method,
                        path: op.path.clone(),
                        plan,
                    }),
                    Err(err) => {
                        warn!(endpoint = %op.endpoint_id(), error = %err, "Skipping load target");
                        None
                    }
                }
            })
            .collect()
    }

    /// Attacks every target and evaluates the thresholds.
    ///
    /// Returns [`PerformancePhase::Skipped`] when no operation qualifies.
    pub async fn execute(
        &self,
        model: &ContractModel,
        cancel: &CancellationToken,
    ) -> PerformancePhase {
        let targets = self.targets(model);
        if targets.is_empty() {
            info!("No load targets, skipping performance tests");
            return PerformancePhase::Skipped {
                reason: SkippedReason::NoTargets,
            };
        }

        let metrics = self.attack(&targets, cancel).await;
        let evaluation = evaluate_thresholds(&metrics, &self.thresholds);
        for violation in &evaluation.violations {
            warn!(violation = %violation, "Performance threshold violated");
        }

        PerformancePhase::Ran(PerformanceResult {
            targets: targets.len(),
            metrics,
            evaluation,
        })
    }

    /// Sends requests at the profile rate for the profile duration.
    ///
    /// Stops dispatching as soon as `cancel` is observed; requests in flight
    /// are still awaited and counted.
    pub async fn attack(&self, targets: &[LoadTarget], cancel: &CancellationToken) -> PerformanceMetrics {
        let rate = self.profile.rate.max(1);
        let period = Duration::from_secs_f64(1.0 / f64::from(rate));

        info!(
            targets = targets.len(),
            rate = rate,
            duration_ms = self.profile.duration.as_millis() as u64,
            workers = self.workers,
            "Starting load test"
        );

        let (sender, mut receiver) = mpsc::unbounded_channel::<Sample>();
        let aggregator = tokio::spawn(async move {
            let mut aggregate = Aggregate::default();
            while let Some(sample) = receiver.recv().await {
                aggregate.record(sample);
            }
            aggregate
        });

        let workers = Arc::new(Semaphore::new(self.workers));
        let started_at = Utc::now();
        let started = Instant::now();
        let deadline = time::Instant::now() + self.profile.duration;
        let mut ticker = time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);

        let mut dispatched = 0usize;
        let mut cancelled = false;

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = time::sleep_until(deadline) => break,
            }
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }

            let permit = tokio::select! {
                permit = Arc::clone(&workers).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
                _ = time::sleep_until(deadline) => break,
            };
            // The permit wait can outlast a cancellation.
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }

            let target = &targets[dispatched % targets.len()];
            let plan = target.plan.clone();
            let client = self.client.clone();
            let sender = sender.clone();
            tokio::spawn(async move {
                let exchange = client.send(&plan).await;
                let sample = Sample {
                    latency: exchange.latency,
                    success: is_success(&exchange.status),
                };
                // The aggregator outlives every sender.
                let _ = sender.send(sample);
                drop(permit);
            });
            dispatched += 1;
        }

        drop(sender);
        debug!(dispatched = dispatched, "Waiting for in-flight requests");
        let aggregate = aggregator.await.unwrap_or_else(|e| {
            warn!(error = %e, "Load aggregator failed");
            Aggregate::default()
        });

        let elapsed = started.elapsed().as_secs_f64();
        let total = aggregate.histogram.count();
        let errors = total - aggregate.success;
        let histogram = &aggregate.histogram;

        let metrics = PerformanceMetrics {
            total_requests: total,
            success_count: aggregate.success,
            error_count: errors,
            error_rate: if total == 0 { 0.0 } else { errors as f64 / total as f64 },
            latency_p50: histogram.percentile(0.50),
            latency_p95: histogram.percentile(0.95),
            latency_p99: histogram.percentile(0.99),
            latency_mean: histogram.mean(),
            latency_max: histogram.max(),
            throughput: if elapsed > 0.0 { total as f64 / elapsed } else { 0.0 },
            started_at,
            finished_at: Utc::now(),
            cancelled,
        };

        info!(
            total = metrics.total_requests,
            success = metrics.success_count,
            p95_ms = metrics.latency_p95.as_millis() as u64,
            cancelled = cancelled,
            "Load test finished"
        );
        metrics
    }
}
