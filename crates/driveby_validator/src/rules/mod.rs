//! Compliance rule catalog.
//!
//! Each rule is an independent value: its [`CheckInfo`], a pure evaluation
//! over a [`ContractModel`], and optionally a mechanical fix. Rules never
//! share state, so adding one is a pure addition to the catalog.

mod documentation;
mod errors;
mod schema;
mod security;
mod specification;
mod versioning;

pub use documentation::DocumentationRule;
pub use errors::ErrorHandlingRule;
pub use schema::SchemaRule;
pub use security::SecurityRule;
pub use specification::SpecificationRule;
pub use versioning::VersioningRule;

use driveby_core::{CheckInfo, ContractModel, RuleEvaluationError, RuleResult};
use regex::Regex;

/// A named compliance rule.
pub trait Rule: Send + Sync {
    /// Identity and metadata of the rule.
    fn info(&self) -> CheckInfo;

    /// Evaluates the rule against a contract.
    fn evaluate(&self, model: &ContractModel) -> Result<RuleResult, RuleEvaluationError>;

    /// Applies the rule's mechanical fix to a working copy of the contract.
    ///
    /// Returns a description of every change made. Only called after a
    /// failing evaluation of a rule whose [`CheckInfo::auto_fixable`] is set.
    fn fix(
        &self,
        _result: &RuleResult,
        _model: &mut ContractModel,
    ) -> Result<Vec<String>, RuleEvaluationError> {
        Err(RuleEvaluationError::NotFixable(self.info().id))
    }
}

/// The default catalog, in report order.
pub fn default_rules() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(SpecificationRule::new()),
        Box::new(DocumentationRule::new()),
        Box::new(ErrorHandlingRule::new()),
        Box::new(SchemaRule::new()),
        Box::new(SecurityRule::new()),
        Box::new(VersioningRule::new()),
    ]
}

/// Compiles a rule-owned pattern, reporting failures against the rule.
fn compile(rule: &str, pattern: &str) -> Result<Regex, RuleEvaluationError> {
    Regex::new(pattern).map_err(|e| RuleEvaluationError::failed(rule, e.to_string()))
}

/// Placeholder names in a path template, in order (`/a/{id}/b/{x}` gives `id`, `x`).
fn path_placeholders(path: &str) -> Vec<&str> {
    let mut names = Vec::new();
    let mut rest = path;
    while let Some(start) = rest.find('{') {
        let after = &rest[start + 1..];
        match after.find('}') {
            Some(end) => {
                names.push(&after[..end]);
                rest = &after[end + 1..];
            }
            None => break,
        }
    }
    names
}

fn is_blank(text: Option<&str>) -> bool {
    text.is_none_or(|text| text.trim().is_empty())
}
