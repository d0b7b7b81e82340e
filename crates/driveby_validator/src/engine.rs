//! Rule engine.
//!
//! Evaluates the rule catalog against a contract and, on request, attempts
//! each failing rule's mechanical fix exactly once.

use crate::rules::{Rule, default_rules};
use chrono::Utc;
use driveby_core::{
    CheckInfo, ContractModel, FixResult, RuleDetail, RuleEvaluationError, RuleResult,
};
use std::any::Any;
use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, info, warn};

/// Output of a rule run.
#[derive(Debug, Clone)]
pub struct RuleRun {
    /// One result per rule, in catalog order
    pub results: Vec<RuleResult>,
    /// Every fix attempt, successful or not
    pub fixes: Vec<FixResult>,
    /// Working copy with every successful fix applied, if any succeeded
    pub fixed_model: Option<ContractModel>,
}

/// Rule engine holding an ordered rule catalog.
///
/// # Example
///
/// ```rust
/// use driveby_core::{ContractBuilder, HttpMethod, OperationBuilder};
/// use driveby_validator::RuleEngine;
///
/// let model = ContractBuilder::new("Widgets", "1.0.0")
///     .operation(
///         OperationBuilder::new(HttpMethod::Get, "/widgets")
///             .response("200", "OK")
///             .build(),
///     )
///     .build();
///
/// let engine = RuleEngine::with_default_rules();
/// let run = engine.run(&model, true);
///
/// for result in &run.results {
///     println!("{} {}: {}", result.check.id, result.passed, result.message);
/// }
/// assert!(run.fixed_model.is_some());
/// ```
pub struct RuleEngine {
    rules: Vec<Box<dyn Rule>>,
}

impl RuleEngine {
    /// Creates an engine with no rules.
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Creates an engine with the default catalog.
    pub fn with_default_rules() -> Self {
        Self {
            rules: default_rules(),
        }
    }

    /// Appends a rule to the catalog.
    pub fn with_rule(mut self, rule: impl Rule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Metadata of every rule, in catalog order.
    pub fn catalog(&self) -> Vec<CheckInfo> {
        self.rules.iter().map(|rule| rule.info()).collect()
    }

    /// Evaluates every rule. Never fails: rule errors and panics become
    /// failing results carrying the error as detail.
    pub fn evaluate(&self, model: &ContractModel) -> Vec<RuleResult> {
        self.rules
            .iter()
            .map(|rule| evaluate_rule(rule.as_ref(), model))
            .collect()
    }

    /// Evaluates every rule and, when `auto_fix` is set, attempts fixes.
    ///
    /// Each fix runs on a fresh copy of `model`, and only the fixed rule is
    /// re-evaluated on it. Other rules keep their verdicts on the original
    /// contract. Successful fixes are also accumulated into
    /// [`RuleRun::fixed_model`]; `model` itself is never touched.
    pub fn run(&self, model: &ContractModel, auto_fix: bool) -> RuleRun {
        let mut results = self.evaluate(model);
        let mut fixes = Vec::new();
        let mut fixed_model = None;

        if auto_fix {
            let mut working = model.clone();
            let mut attempted = HashSet::new();
            let mut any_applied = false;

            for (index, rule) in self.rules.iter().enumerate() {
                let check = rule.info();
                if results[index].passed || !check.auto_fixable {
                    continue;
                }
                if !attempted.insert(check.id.clone()) {
                    debug!(rule = %check.id, "Fix already attempted, skipping");
                    continue;
                }

                let mut candidate = model.clone();
                match apply_fix(rule.as_ref(), &results[index], &mut candidate) {
                    Ok(changes) => {
                        let mut reevaluated = evaluate_rule(rule.as_ref(), &candidate);
                        reevaluated.fixed = true;
                        info!(
                            rule = %check.id,
                            changes = changes.len(),
                            passed = reevaluated.passed,
                            "Applied auto-fix"
                        );

                        if let Err(err) = apply_fix(rule.as_ref(), &results[index], &mut working) {
                            warn!(rule = %check.id, error = %err, "Fix did not apply to working copy");
                        }
                        any_applied = true;

                        fixes.push(FixResult {
                            rule_id: check.id.clone(),
                            timestamp: Utc::now(),
                            success: true,
                            message: format!("Applied {} change(s)", changes.len()),
                            changes,
                            error: None,
                        });
                        results[index] = reevaluated;
                    }
                    Err(err) => {
                        warn!(rule = %check.id, error = %err, "Auto-fix failed");
                        fixes.push(FixResult {
                            rule_id: check.id.clone(),
                            timestamp: Utc::now(),
                            success: false,
                            message: "Auto-fix failed".to_string(),
                            changes: Vec::new(),
                            error: Some(err.to_string()),
                        });
                    }
                }
            }

            if any_applied {
                fixed_model = Some(working);
            }
        }

        RuleRun {
            results,
            fixes,
            fixed_model,
        }
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::with_default_rules()
    }
}

fn evaluate_rule(rule: &dyn Rule, model: &ContractModel) -> RuleResult {
    let check = rule.info();
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| rule.evaluate(model)))
        .unwrap_or_else(|payload| {
            Err(RuleEvaluationError::Panicked {
                rule: check.id.clone(),
                message: panic_message(payload.as_ref()),
            })
        });

    match outcome {
        Ok(result) => {
            debug!(rule = %check.id, passed = result.passed, "Evaluated rule");
            result
        }
        Err(err) => {
            warn!(rule = %check.id, error = %err, "Rule evaluation failed");
            RuleResult::fail(
                check,
                "Rule could not be evaluated",
                RuleDetail::Error(err.to_string()),
            )
        }
    }
}

/// Runs a rule's fix; an empty change list counts as a failed fix.
fn apply_fix(
    rule: &dyn Rule,
    result: &RuleResult,
    model: &mut ContractModel,
) -> Result<Vec<String>, RuleEvaluationError> {
    let id = rule.info().id;
    let changes = panic::catch_unwind(AssertUnwindSafe(|| rule.fix(result, model)))
        .unwrap_or_else(|payload| {
            Err(RuleEvaluationError::Panicked {
                rule: id.clone(),
                message: panic_message(payload.as_ref()),
            })
        })?;

    if changes.is_empty() {
        return Err(RuleEvaluationError::failed(id, "no mechanical fix available"));
    }
    Ok(changes)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
