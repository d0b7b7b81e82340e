//! Versioning presence (P008).

use super::{Rule, compile};
use driveby_core::{
    CheckInfo, ContractModel, Offender, OffenderTarget, RuleEvaluationError, RuleResult, Severity,
};

const ID: &str = "P008";
const SEMVER: &str = r"^v?\d+\.\d+\.\d+(-[0-9A-Za-z.-]+)?(\+[0-9A-Za-z.-]+)?$";
const DEFAULT_VERSION: &str = "1.0.0";

/// Checks that the contract declares a version string.
///
/// A version that is not semantic versioning only produces a note.
#[derive(Debug, Clone, Default)]
pub struct VersioningRule;

impl VersioningRule {
    pub fn new() -> Self {
        Self
    }
}

impl Rule for VersioningRule {
    fn info(&self) -> CheckInfo {
        CheckInfo::new(ID, "API Versioning Strategy", "Versioning", Severity::Warning)
            .tags(&["versioning", "compatibility", "lifecycle"])
            .auto_fixable()
    }

    fn evaluate(&self, model: &ContractModel) -> Result<RuleResult, RuleEvaluationError> {
        let version = model.info.version.trim();
        let mut offenders = Vec::new();
        let mut notes = Vec::new();

        if version.is_empty() {
            offenders.push(Offender::document(
                OffenderTarget::Info("version".to_string()),
                "no version declared",
            ));
        } else if !compile(ID, SEMVER)?.is_match(version) {
            notes.push(format!("Version '{}' does not follow semantic versioning", version));
        }

        Ok(RuleResult::from_offenders(
            self.info(),
            offenders,
            format!("Contract declares version {}", version),
            |_| "Contract declares no version".to_string(),
        )
        .with_suggested_fix("Declare info.version using semantic versioning (e.g., 1.0.0)")
        .with_notes(notes))
    }

    fn fix(
        &self,
        _result: &RuleResult,
        model: &mut ContractModel,
    ) -> Result<Vec<String>, RuleEvaluationError> {
        if !model.info.version.trim().is_empty() {
            return Ok(Vec::new());
        }
        model.info.version = DEFAULT_VERSION.to_string();
        Ok(vec![format!("Set info.version to '{}'", DEFAULT_VERSION)])
    }
}
