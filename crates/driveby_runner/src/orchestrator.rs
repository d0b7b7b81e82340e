//! Run orchestration.
//!
//! Sequences rule validation, functional testing and performance testing,
//! and folds their outputs into one [`ValidationReport`]. Phases never
//! overlap; each starts only after the previous one has finished.

use crate::cancel::CancellationToken;
use crate::functional::FunctionalExecutor;
use crate::performance::PerformanceExecutor;
use chrono::Utc;
use driveby_core::{
    ContractModel, FunctionalPhase, FunctionalStats, Outcome, PerformancePhase, ReportSummary,
    RunConfig, RunState, SkippedReason, StateTransition, ValidationReport,
};
use driveby_validator::RuleEngine;
use tracing::{info, warn};

/// Decides whether functional results make load testing meaningless.
///
/// Performance is skipped when more than half of the tested operations
/// ended in `auth_failed` or `failed` combined. Exactly half still runs,
/// and a run with nothing tested never skips.
pub fn should_skip_performance(stats: &FunctionalStats) -> Option<SkippedReason> {
    let auth_failed = stats.count(Outcome::AuthFailed);
    let failed = stats.count(Outcome::Failed);
    if stats.tested > 0 && (auth_failed + failed) * 2 > stats.tested {
        Some(SkippedReason::SystemicFunctionalFailure {
            tested: stats.tested,
            auth_failed,
            failed,
        })
    } else {
        None
    }
}

/// Records state transitions.
struct StateMachine {
    state: RunState,
    transitions: Vec<StateTransition>,
}

impl StateMachine {
    fn new() -> Self {
        Self {
            state: RunState::Idle,
            transitions: Vec::new(),
        }
    }

    fn transition(&mut self, to: RunState) {
        if self.state.is_terminal() {
            return;
        }
        info!(from = %self.state, to = %to, "Run state changed");
        self.transitions.push(StateTransition {
            from: self.state,
            to,
            at: Utc::now(),
        });
        self.state = to;
    }
}

/// Runs every phase against a contract.
///
/// # Example
///
/// ```no_run
/// # async fn run(model: driveby_core::ContractModel) {
/// use driveby_core::RunConfig;
/// use driveby_runner::{CancellationToken, Orchestrator};
///
/// let orchestrator = Orchestrator::new(RunConfig::default());
/// let report = orchestrator
///     .run(&model, "http://localhost:8080", &CancellationToken::new())
///     .await;
///
/// println!(
///     "{} of {} checks passed",
///     report.summary.passed_checks, report.summary.total_checks
/// );
/// # }
/// ```
pub struct Orchestrator {
    config: RunConfig,
    engine: RuleEngine,
}

impl Orchestrator {
    /// Creates an orchestrator using the default rule catalog.
    pub fn new(config: RunConfig) -> Self {
        Self {
            config,
            engine: RuleEngine::with_default_rules(),
        }
    }

    /// Replaces the rule engine.
    pub fn with_engine(mut self, engine: RuleEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Runs the phases and builds the report.
    ///
    /// Never fails: every problem found along the way is recorded in the
    /// report. Cancellation ends the run in [`RunState::Cancelled`] with
    /// whatever results were gathered so far.
    pub async fn run(
        &self,
        model: &ContractModel,
        base_url: &str,
        cancel: &CancellationToken,
    ) -> ValidationReport {
        let started_at = Utc::now();
        let mut machine = StateMachine::new();

        machine.transition(RunState::SpecValidating);
        let rules = self.engine.run(model, self.config.auto_fix);

        let mut functional = FunctionalPhase::NotRun {
            reason: SkippedReason::Cancelled,
        };
        let mut performance = PerformancePhase::Skipped {
            reason: SkippedReason::Cancelled,
        };

        if !cancel.is_cancelled() {
            machine.transition(RunState::FunctionalTesting);
            functional = self.functional_phase(model, base_url, cancel).await;
        }

        if cancel.is_cancelled() {
            machine.transition(RunState::Cancelled);
        } else {
            match self.performance_gate(&functional) {
                Some(reason) => {
                    warn!(reason = %reason, "Skipping performance tests");
                    machine.transition(RunState::PerformanceSkipped);
                    performance = PerformancePhase::Skipped { reason };
                }
                None => {
                    machine.transition(RunState::PerformanceTesting);
                    performance = self.performance_phase(model, base_url, cancel).await;
                }
            }
            if cancel.is_cancelled() {
                machine.transition(RunState::Cancelled);
            } else {
                machine.transition(RunState::Done);
            }
        }

        let mut report = ValidationReport {
            title: model.info.title.clone(),
            version: model.info.version.clone(),
            source: model.source.clone(),
            started_at,
            finished_at: Utc::now(),
            final_state: machine.state,
            transitions: machine.transitions,
            rule_results: rules.results,
            auto_fixes: rules.fixes,
            functional,
            performance,
            summary: ReportSummary::default(),
        };
        report.refresh_summary();

        info!(
            state = %report.final_state,
            passed = report.summary.passed_checks,
            failed = report.summary.failed_checks,
            critical = report.summary.critical_issues,
            "Run finished"
        );
        report
    }

    async fn functional_phase(
        &self,
        model: &ContractModel,
        base_url: &str,
        cancel: &CancellationToken,
    ) -> FunctionalPhase {
        if !self.config.test_mode.runs_functional() {
            return FunctionalPhase::NotRun {
                reason: SkippedReason::NotRequested,
            };
        }
        match FunctionalExecutor::new(base_url, &self.config) {
            Ok(executor) => FunctionalPhase::ran(executor.execute(model, cancel).await),
            Err(err) => FunctionalPhase::NotRun {
                reason: SkippedReason::InvalidBaseUrl {
                    message: err.to_string(),
                },
            },
        }
    }

    /// Reason to skip the performance phase, if any.
    fn performance_gate(&self, functional: &FunctionalPhase) -> Option<SkippedReason> {
        if !self.config.test_mode.runs_performance() {
            return Some(SkippedReason::NotRequested);
        }
        match functional {
            FunctionalPhase::Ran { stats, .. } => should_skip_performance(stats),
            FunctionalPhase::NotRun {
                reason: reason @ SkippedReason::InvalidBaseUrl { .. },
            } => Some(reason.clone()),
            FunctionalPhase::NotRun { .. } => None,
        }
    }

    async fn performance_phase(
        &self,
        model: &ContractModel,
        base_url: &str,
        cancel: &CancellationToken,
    ) -> PerformancePhase {
        match PerformanceExecutor::new(base_url, &self.config) {
            Ok(executor) => executor.execute(model, cancel).await,
            Err(err) => PerformancePhase::Skipped {
                reason: SkippedReason::InvalidBaseUrl {
                    message: err.to_string(),
                },
            },
        }
    }
}
