//! Report types produced by a validation run.
//!
//! Rule results, functional outcomes, performance metrics and the unified
//! [`ValidationReport`] with its derived [`ReportSummary`]. These are plain
//! data: every failure other than a contract-load error ends up here.

use crate::HttpMethod;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::time::Duration;

/// Severity of a failing check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Critical => "critical",
            Severity::Warning => "warning",
            Severity::Info => "info",
        };
        f.write_str(name)
    }
}

/// Identity and metadata of a check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckInfo {
    /// Stable identifier (e.g., "P001")
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Category used for summary grouping
    pub category: String,
    /// Severity when the check fails
    pub severity: Severity,
    /// Tags used for summary grouping
    #[serde(default)]
    pub tags: Vec<String>,
    /// Whether a mechanical fix exists
    #[serde(default)]
    pub auto_fixable: bool,
}

impl CheckInfo {
    /// Creates check metadata.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: impl Into<String>,
        severity: Severity,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: category.into(),
            severity,
            tags: Vec::new(),
            auto_fixable: false,
        }
    }

    /// Sets the tags.
    pub fn tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|tag| tag.to_string()).collect();
        self
    }

    /// Marks the check as auto-fixable.
    pub fn auto_fixable(mut self) -> Self {
        self.auto_fixable = true;
        self
    }

    /// Pseudo-check carrying the functional phase verdict.
    pub fn contract_testing() -> Self {
        Self::new("P006", "API Contract Testing", "Testing", Severity::Critical)
            .tags(&["testing", "contract", "implementation"])
    }

    /// Pseudo-check carrying the performance phase verdict.
    pub fn performance_requirements() -> Self {
        Self::new(
            "P007",
            "Performance Requirements",
            "Performance",
            Severity::Warning,
        )
        .tags(&["performance", "sla", "load-testing"])
    }
}

/// What part of the contract an offender points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum OffenderTarget {
    Document,
    Info(String),
    Operation,
    Parameter(String),
    RequestBody,
    Response(String),
}

/// One offending location found by a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offender {
    /// Method of the offending operation, if any
    #[serde(default)]
    pub method: Option<HttpMethod>,
    /// Path of the offending operation, if any
    #[serde(default)]
    pub path: Option<String>,
    /// Offending element
    pub target: OffenderTarget,
    /// What is wrong
    pub message: String,
}

impl Offender {
    /// Offender at document level.
    pub fn document(target: OffenderTarget, message: impl Into<String>) -> Self {
        Self {
            method: None,
            path: None,
            target,
            message: message.into(),
        }
    }

    /// Offender inside an operation.
    pub fn at(
        method: HttpMethod,
        path: impl Into<String>,
        target: OffenderTarget,
        message: impl Into<String>,
    ) -> Self {
        Self {
            method: Some(method),
            path: Some(path.into()),
            target,
            message: message.into(),
        }
    }
}

impl fmt::Display for Offender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.method, &self.path) {
            (Some(method), Some(path)) => write!(f, "{} {}", method, path)?,
            (None, Some(path)) => write!(f, "{}", path)?,
            _ => f.write_str("document")?,
        }
        match &self.target {
            OffenderTarget::Document | OffenderTarget::Operation => {}
            OffenderTarget::Info(field) => write!(f, " info.{}", field)?,
            OffenderTarget::Parameter(name) => write!(f, " parameter '{}'", name)?,
            OffenderTarget::RequestBody => f.write_str(" request body")?,
            OffenderTarget::Response(code) => write!(f, " response {}", code)?,
        }
        write!(f, ": {}", self.message)
    }
}

/// Rule-specific structured detail.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum RuleDetail {
    #[default]
    None,
    Offenders(Vec<Offender>),
    Metrics(BTreeMap<String, Value>),
    Error(String),
}

impl RuleDetail {
    /// Offenders, or an empty slice.
    pub fn offenders(&self) -> &[Offender] {
        match self {
            RuleDetail::Offenders(offenders) => offenders,
            _ => &[],
        }
    }
}

/// Verdict of one check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleResult {
    /// Check metadata
    pub check: CheckInfo,
    /// Whether the check passed
    pub passed: bool,
    /// Short verdict message
    pub message: String,
    /// Structured detail
    #[serde(default)]
    pub detail: RuleDetail,
    /// Description of a suggested fix
    #[serde(default)]
    pub suggested_fix: Option<String>,
    /// Advisory notes that do not affect the verdict
    #[serde(default)]
    pub notes: Vec<String>,
    /// Whether this verdict comes from re-evaluation after an auto-fix
    #[serde(default)]
    pub fixed: bool,
}

impl RuleResult {
    /// Passing result.
    pub fn pass(check: CheckInfo, message: impl Into<String>) -> Self {
        Self {
            check,
            passed: true,
            message: message.into(),
            detail: RuleDetail::None,
            suggested_fix: None,
            notes: Vec::new(),
            fixed: false,
        }
    }

    /// Failing result.
    pub fn fail(check: CheckInfo, message: impl Into<String>, detail: RuleDetail) -> Self {
        Self {
            check,
            passed: false,
            message: message.into(),
            detail,
            suggested_fix: None,
            notes: Vec::new(),
            fixed: false,
        }
    }

    /// Pass when there are no offenders, fail otherwise.
    pub fn from_offenders(
        check: CheckInfo,
        offenders: Vec<Offender>,
        pass_message: impl Into<String>,
        fail_message: impl FnOnce(usize) -> String,
    ) -> Self {
        if offenders.is_empty() {
            Self::pass(check, pass_message)
        } else {
            let message = fail_message(offenders.len());
            Self::fail(check, message, RuleDetail::Offenders(offenders))
        }
    }

    /// Sets the suggested fix.
    pub fn with_suggested_fix(mut self, fix: impl Into<String>) -> Self {
        self.suggested_fix = Some(fix.into());
        self
    }

    /// Sets advisory notes.
    pub fn with_notes(mut self, notes: Vec<String>) -> Self {
        self.notes = notes;
        self
    }
}

/// Record of one auto-fix attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixResult {
    pub rule_id: String,
    pub timestamp: DateTime<Utc>,
    pub success: bool,
    pub message: String,
    #[serde(default)]
    pub changes: Vec<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Classification of one live functional request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    ClientError,
    ServerError,
    AuthFailed,
    Undocumented,
    Failed,
}

impl Outcome {
    /// Every outcome, in report order.
    pub const ALL: [Outcome; 6] = [
        Outcome::Success,
        Outcome::ClientError,
        Outcome::ServerError,
        Outcome::AuthFailed,
        Outcome::Undocumented,
        Outcome::Failed,
    ];

    /// Snake-case label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::ClientError => "client_error",
            Outcome::ServerError => "server_error",
            Outcome::AuthFailed => "auth_failed",
            Outcome::Undocumented => "undocumented",
            Outcome::Failed => "failed",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of testing one operation live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointOutcome {
    pub method: HttpMethod,
    pub path: String,
    /// Concrete URL that was requested
    pub url: String,
    pub outcome: Outcome,
    /// Observed status; `None` on transport failure
    pub status_code: Option<u16>,
    #[serde(with = "crate::duration::millis", rename = "latency_ms")]
    pub latency: Duration,
    #[serde(default)]
    pub errors: Vec<String>,
}

/// Aggregates over a functional run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FunctionalStats {
    pub tested: usize,
    pub counts: BTreeMap<Outcome, usize>,
    #[serde(with = "crate::duration::millis", rename = "min_latency_ms")]
    pub min_latency: Duration,
    #[serde(with = "crate::duration::millis", rename = "avg_latency_ms")]
    pub avg_latency: Duration,
    #[serde(with = "crate::duration::millis", rename = "max_latency_ms")]
    pub max_latency: Duration,
}

impl FunctionalStats {
    /// Computes stats over a set of outcomes.
    pub fn from_outcomes(outcomes: &[EndpointOutcome]) -> Self {
        let mut counts = BTreeMap::new();
        for outcome in outcomes {
            *counts.entry(outcome.outcome).or_insert(0) += 1;
        }

        let latencies = outcomes.iter().map(|o| o.latency);
        let total: Duration = latencies.clone().sum();
        let avg_latency = if outcomes.is_empty() {
            Duration::ZERO
        } else {
            total / outcomes.len() as u32
        };

        Self {
            tested: outcomes.len(),
            counts,
            min_latency: latencies.clone().min().unwrap_or_default(),
            avg_latency,
            max_latency: latencies.max().unwrap_or_default(),
        }
    }

    /// Number of operations with the given outcome.
    pub fn count(&self, outcome: Outcome) -> usize {
        self.counts.get(&outcome).copied().unwrap_or(0)
    }
}

/// Aggregate metrics over a load-test run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub total_requests: u64,
    pub success_count: u64,
    pub error_count: u64,
    /// Errors over total, 0..=1
    pub error_rate: f64,
    #[serde(with = "crate::duration::millis", rename = "latency_p50_ms")]
    pub latency_p50: Duration,
    #[serde(with = "crate::duration::millis", rename = "latency_p95_ms")]
    pub latency_p95: Duration,
    #[serde(with = "crate::duration::millis", rename = "latency_p99_ms")]
    pub latency_p99: Duration,
    #[serde(with = "crate::duration::millis", rename = "latency_mean_ms")]
    pub latency_mean: Duration,
    #[serde(with = "crate::duration::millis", rename = "latency_max_ms")]
    pub latency_max: Duration,
    /// Completed requests per second of wall-clock time
    pub throughput: f64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Whether the attack was cut short by cancellation
    #[serde(default)]
    pub cancelled: bool,
}

impl PerformanceMetrics {
    /// Successes over total, 0..=1. An empty run has a rate of zero.
    pub fn success_rate(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.success_count as f64 / self.total_requests as f64
        }
    }
}

/// One violated performance threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ThresholdViolation {
    LatencyP95 {
        #[serde(with = "crate::duration::millis", rename = "observed_ms")]
        observed: Duration,
        #[serde(with = "crate::duration::millis", rename = "limit_ms")]
        limit: Duration,
    },
    SuccessRate { observed: f64, minimum: f64 },
}

impl fmt::Display for ThresholdViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThresholdViolation::LatencyP95 { observed, limit } => write!(
                f,
                "p95 latency {:.1}ms exceeds limit {:.1}ms",
                observed.as_secs_f64() * 1000.0,
                limit.as_secs_f64() * 1000.0
            ),
            ThresholdViolation::SuccessRate { observed, minimum } => write!(
                f,
                "success rate {:.2}% is below minimum {:.2}%",
                observed * 100.0,
                minimum * 100.0
            ),
        }
    }
}

/// Threshold verdict.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThresholdEvaluation {
    pub passed: bool,
    pub violations: Vec<ThresholdViolation>,
}

impl ThresholdEvaluation {
    /// Builds the verdict from the violations found.
    pub fn from_violations(violations: Vec<ThresholdViolation>) -> Self {
        Self {
            passed: violations.is_empty(),
            violations,
        }
    }
}

/// Output of a performance run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceResult {
    /// Number of load targets attacked
    pub targets: usize,
    pub metrics: PerformanceMetrics,
    pub evaluation: ThresholdEvaluation,
}

/// Why a live phase produced no results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkippedReason {
    /// Too many functional requests failed authentication or transport
    SystemicFunctionalFailure {
        tested: usize,
        auth_failed: usize,
        failed: usize,
    },
    /// No operation qualified as a target
    NoTargets,
    /// The phase was not requested by the test mode
    NotRequested,
    /// The run was cancelled before the phase started
    Cancelled,
    /// The base URL live requests would be sent to is unusable
    InvalidBaseUrl { message: String },
}

impl fmt::Display for SkippedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkippedReason::SystemicFunctionalFailure {
                tested,
                auth_failed,
                failed,
            } => {
                let pct = |n: usize| n as f64 * 100.0 / (*tested).max(1) as f64;
                if auth_failed >= failed {
                    write!(
                        f,
                        "performance metrics would be unreliable: {} of {} tested operations ({:.0}%) failed authentication",
                        auth_failed,
                        tested,
                        pct(*auth_failed)
                    )?;
                    if *failed > 0 {
                        write!(f, " and {} could not be reached", failed)?;
                    }
                } else {
                    write!(
                        f,
                        "performance metrics would be unreliable: {} of {} tested operations ({:.0}%) could not be reached",
                        failed,
                        tested,
                        pct(*failed)
                    )?;
                    if *auth_failed > 0 {
                        write!(f, " and {} failed authentication", auth_failed)?;
                    }
                }
                Ok(())
            }
            SkippedReason::NoTargets => f.write_str("no operations qualified as load targets"),
            SkippedReason::NotRequested => f.write_str("phase not requested"),
            SkippedReason::Cancelled => f.write_str("run was cancelled"),
            SkippedReason::InvalidBaseUrl { message } => write!(f, "base URL is unusable: {}", message),
        }
    }
}

/// Functional phase output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FunctionalPhase {
    Ran {
        outcomes: Vec<EndpointOutcome>,
        stats: FunctionalStats,
    },
    NotRun {
        reason: SkippedReason,
    },
}

impl FunctionalPhase {
    /// Wraps outcomes and derives stats.
    pub fn ran(outcomes: Vec<EndpointOutcome>) -> Self {
        let stats = FunctionalStats::from_outcomes(&outcomes);
        FunctionalPhase::Ran { outcomes, stats }
    }

    /// Outcomes, or an empty slice when the phase did not run.
    pub fn outcomes(&self) -> &[EndpointOutcome] {
        match self {
            FunctionalPhase::Ran { outcomes, .. } => outcomes,
            FunctionalPhase::NotRun { .. } => &[],
        }
    }

    /// Verdict check for the phase, when it ran.
    pub fn check_result(&self) -> Option<RuleResult> {
        let FunctionalPhase::Ran { outcomes, stats } = self else {
            return None;
        };
        let offenders: Vec<Offender> = outcomes
            .iter()
            .filter(|o| o.outcome != Outcome::Success)
            .map(|o| {
                let message = match o.status_code {
                    Some(status) => format!("{} (HTTP {})", o.outcome, status),
                    None => o.outcome.to_string(),
                };
                Offender::at(o.method, o.path.clone(), OffenderTarget::Operation, message)
            })
            .collect();
        let passed = stats.count(Outcome::Success);
        let tested = stats.tested;
        Some(RuleResult::from_offenders(
            CheckInfo::contract_testing(),
            offenders,
            format!("All {} tested operations behaved as documented", tested),
            |failing| {
                format!(
                    "{} of {} tested operations did not behave as documented ({} passed)",
                    failing, tested, passed
                )
            },
        ))
    }
}

/// Performance phase output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PerformancePhase {
    Ran(PerformanceResult),
    Skipped { reason: SkippedReason },
}

impl PerformancePhase {
    /// Whether the phase ran and violated a threshold.
    pub fn failed(&self) -> bool {
        matches!(self, PerformancePhase::Ran(result) if !result.evaluation.passed)
    }

    /// Verdict check for the phase, when it ran.
    pub fn check_result(&self) -> Option<RuleResult> {
        let PerformancePhase::Ran(result) = self else {
            return None;
        };
        let metrics = &result.metrics;
        let mut data = BTreeMap::new();
        data.insert("total_requests".to_string(), Value::from(metrics.total_requests));
        data.insert("error_rate".to_string(), Value::from(metrics.error_rate));
        data.insert(
            "latency_p95_ms".to_string(),
            Value::from(metrics.latency_p95.as_secs_f64() * 1000.0),
        );
        data.insert("throughput".to_string(), Value::from(metrics.throughput));

        if result.evaluation.passed {
            let mut check = RuleResult::pass(
                CheckInfo::performance_requirements(),
                "All performance thresholds met",
            );
            check.detail = RuleDetail::Metrics(data);
            Some(check)
        } else {
            let violations: Vec<String> = result
                .evaluation
                .violations
                .iter()
                .map(ToString::to_string)
                .collect();
            Some(
                RuleResult::fail(
                    CheckInfo::performance_requirements(),
                    format!("Performance thresholds violated: {}", violations.join("; ")),
                    RuleDetail::Metrics(data),
                )
                .with_notes(violations),
            )
        }
    }
}

/// Orchestrator states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Idle,
    SpecValidating,
    FunctionalTesting,
    PerformanceTesting,
    PerformanceSkipped,
    Done,
    Cancelled,
}

impl RunState {
    /// Whether no further transition is possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Done | RunState::Cancelled)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Idle => "idle",
            RunState::SpecValidating => "spec_validating",
            RunState::FunctionalTesting => "functional_testing",
            RunState::PerformanceTesting => "performance_testing",
            RunState::PerformanceSkipped => "performance_skipped",
            RunState::Done => "done",
            RunState::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// A recorded state change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateTransition {
    pub from: RunState,
    pub to: RunState,
    pub at: DateTime<Utc>,
}

/// Passed/failed counts for a category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub passed: usize,
    pub failed: usize,
}

/// Derived summary counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total_checks: usize,
    pub passed_checks: usize,
    pub failed_checks: usize,
    /// Failing checks with critical severity
    pub critical_issues: usize,
    /// Failing checks with warning severity
    pub warnings: usize,
    /// Failing checks with info severity
    pub info: usize,
    pub categories: BTreeMap<String, CategoryCount>,
    /// Categories with at least one failing check
    pub failing_categories: Vec<String>,
    /// Tags of failing checks, sorted and deduplicated
    pub failing_tags: Vec<String>,
    /// Functional outcome counts
    pub outcomes: BTreeMap<Outcome, usize>,
    /// Successful auto-fixes
    pub fixes_applied: usize,
}

impl ReportSummary {
    /// Computes the summary over every check, including phase verdicts.
    pub fn compute(checks: &[RuleResult], functional: &FunctionalPhase, fixes: &[FixResult]) -> Self {
        let mut summary = ReportSummary {
            total_checks: checks.len(),
            ..Default::default()
        };
        let mut failing_categories = BTreeSet::new();
        let mut failing_tags = BTreeSet::new();

        for result in checks {
            let entry = summary
                .categories
                .entry(result.check.category.clone())
                .or_default();
            if result.passed {
                entry.passed += 1;
                summary.passed_checks += 1;
                continue;
            }
            entry.failed += 1;
            summary.failed_checks += 1;
            match result.check.severity {
                Severity::Critical => summary.critical_issues += 1,
                Severity::Warning => summary.warnings += 1,
                Severity::Info => summary.info += 1,
            }
            failing_categories.insert(result.check.category.clone());
            failing_tags.extend(result.check.tags.iter().cloned());
        }

        if let FunctionalPhase::Ran { stats, .. } = functional {
            summary.outcomes = stats.counts.clone();
        }
        summary.failing_categories = failing_categories.into_iter().collect();
        summary.failing_tags = failing_tags.into_iter().collect();
        summary.fixes_applied = fixes.iter().filter(|fix| fix.success).count();
        summary
    }
}

/// Unified output of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub title: String,
    pub version: String,
    pub source: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub final_state: RunState,
    pub transitions: Vec<StateTransition>,
    pub rule_results: Vec<RuleResult>,
    #[serde(default)]
    pub auto_fixes: Vec<FixResult>,
    pub functional: FunctionalPhase,
    pub performance: PerformancePhase,
    pub summary: ReportSummary,
}

impl ValidationReport {
    /// Rule results followed by the phase verdict checks.
    pub fn all_checks(&self) -> Vec<RuleResult> {
        let mut checks = self.rule_results.clone();
        checks.extend(self.functional.check_result());
        checks.extend(self.performance.check_result());
        checks
    }

    /// Recomputes the summary from the current contents.
    pub fn refresh_summary(&mut self) {
        self.summary = ReportSummary::compute(&self.all_checks(), &self.functional, &self.auto_fixes);
    }

    /// Whether the run ended by cancellation.
    pub fn is_cancelled(&self) -> bool {
        self.final_state == RunState::Cancelled
    }

    /// Whether any critical check failed.
    pub fn has_critical_failures(&self) -> bool {
        self.summary.critical_issues > 0
    }

    /// Whether the run should be reported as failing to the caller.
    pub fn is_failure(&self) -> bool {
        self.is_cancelled() || self.has_critical_failures() || self.performance.failed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn outcome(path: &str, outcome: Outcome, status: Option<u16>, ms: u64) -> EndpointOutcome {
        EndpointOutcome {
            method: HttpMethod::Get,
            path: path.to_string(),
            url: format!("http://localhost{}", path),
            outcome,
            status_code: status,
            latency: Duration::from_millis(ms),
            errors: Vec::new(),
        }
    }

    #[test]
    fn test_functional_stats() {
        let outcomes = vec![
            outcome("/a", Outcome::Success, Some(200), 10),
            outcome("/b", Outcome::AuthFailed, Some(401), 30),
            outcome("/c", Outcome::Success, Some(201), 20),
        ];
        let stats = FunctionalStats::from_outcomes(&outcomes);
        assert_eq!(stats.tested, 3);
        assert_eq!(stats.count(Outcome::Success), 2);
        assert_eq!(stats.count(Outcome::AuthFailed), 1);
        assert_eq!(stats.count(Outcome::Failed), 0);
        assert_eq!(stats.min_latency, Duration::from_millis(10));
        assert_eq!(stats.avg_latency, Duration::from_millis(20));
        assert_eq!(stats.max_latency, Duration::from_millis(30));
    }

    #[test]
    fn test_functional_check_result() {
        let phase = FunctionalPhase::ran(vec![
            outcome("/a", Outcome::Success, Some(200), 1),
            outcome("/b", Outcome::ServerError, Some(500), 1),
        ]);
        let check = phase.check_result().unwrap();
        assert!(!check.passed);
        assert_eq!(check.check.id, "P006");
        let offenders = check.detail.offenders();
        assert_eq!(offenders.len(), 1);
        assert_eq!(offenders[0].to_string(), "GET /b: server_error (HTTP 500)");

        let not_run = FunctionalPhase::NotRun {
            reason: SkippedReason::NotRequested,
        };
        assert!(not_run.check_result().is_none());
    }

    #[test]
    fn test_summary_counts() {
        let checks = vec![
            RuleResult::pass(
                CheckInfo::new("P001", "Spec", "Specification", Severity::Critical),
                "ok",
            ),
            RuleResult::fail(
                CheckInfo::new("P003", "Errors", "Error Handling", Severity::Warning)
                    .tags(&["errors", "responses"]),
                "missing",
                RuleDetail::None,
            ),
            RuleResult::fail(
                CheckInfo::new("P005", "Security", "Security", Severity::Critical)
                    .tags(&["security", "auth"]),
                "missing",
                RuleDetail::None,
            ),
        ];
        let summary = ReportSummary::compute(
            &checks,
            &FunctionalPhase::NotRun {
                reason: SkippedReason::NotRequested,
            },
            &[],
        );
        assert_eq!(summary.total_checks, 3);
        assert_eq!(summary.passed_checks, 1);
        assert_eq!(summary.critical_issues, 1);
        assert_eq!(summary.warnings, 1);
        assert_eq!(summary.failing_categories, vec!["Error Handling", "Security"]);
        assert_eq!(
            summary.failing_tags,
            vec!["auth", "errors", "responses", "security"]
        );
        assert_eq!(
            summary.categories.get("Specification"),
            Some(&CategoryCount {
                passed: 1,
                failed: 0
            })
        );
    }

    #[test]
    fn test_skip_reason_mentions_auth_ratio() {
        let reason = SkippedReason::SystemicFunctionalFailure {
            tested: 10,
            auth_failed: 6,
            failed: 0,
        };
        let text = reason.to_string();
        assert!(text.contains("6 of 10"));
        assert!(text.contains("60%"));
        assert!(text.contains("authentication"));
    }

    #[test]
    fn test_threshold_violation_display() {
        let violation = ThresholdViolation::LatencyP95 {
            observed: Duration::from_millis(600),
            limit: Duration::from_millis(500),
        };
        assert_eq!(
            violation.to_string(),
            "p95 latency 600.0ms exceeds limit 500.0ms"
        );
    }

    #[test]
    fn test_outcome_serializes_snake_case() {
        let json = serde_json::to_string(&Outcome::AuthFailed).unwrap();
        assert_eq!(json, "\"auth_failed\"");
    }
}
