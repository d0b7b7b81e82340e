//! Security-scheme presence (P005).

use super::Rule;
use driveby_core::{
    CheckInfo, ContractModel, Offender, OffenderTarget, RuleDetail, RuleEvaluationError,
    RuleResult, SecurityRequirement, Severity,
};

const ID: &str = "P005";

/// Checks that security schemes are declared and applied.
///
/// Every operation needs an effective requirement, either its own (an
/// explicit empty list opts the operation out) or a non-empty global one.
/// Requirements may only name declared schemes. This rule has no fix.
#[derive(Debug, Clone, Default)]
pub struct SecurityRule;

impl SecurityRule {
    pub fn new() -> Self {
        Self
    }
}

fn undeclared<'a>(
    model: &'a ContractModel,
    requirements: &'a [SecurityRequirement],
) -> impl Iterator<Item = &'a String> {
    requirements
        .iter()
        .flat_map(|requirement| requirement.keys())
        .filter(|name| !model.security_schemes.contains_key(*name))
}

impl Rule for SecurityRule {
    fn info(&self) -> CheckInfo {
        CheckInfo::new(ID, "Security Standards", "Security", Severity::Critical)
            .tags(&["security", "authentication", "authorization"])
    }

    fn evaluate(&self, model: &ContractModel) -> Result<RuleResult, RuleEvaluationError> {
        if model.security_schemes.is_empty() {
            let offender = Offender::document(
                OffenderTarget::Document,
                "no security schemes are declared",
            );
            return Ok(RuleResult::fail(
                self.info(),
                "No security schemes are declared",
                RuleDetail::Offenders(vec![offender]),
            )
            .with_suggested_fix("Declare security schemes under components.securitySchemes and apply them"));
        }

        let mut offenders = Vec::new();
        let global = model.security.as_deref().unwrap_or_default();
        for name in undeclared(model, global) {
            offenders.push(Offender::document(
                OffenderTarget::Document,
                format!("global security references undeclared scheme '{}'", name),
            ));
        }

        for op in model.operations() {
            match op.security.as_deref() {
                Some(requirements) => {
                    for name in undeclared(model, requirements) {
                        offenders.push(Offender::at(
                            op.method,
                            op.path.clone(),
                            OffenderTarget::Operation,
                            format!("security references undeclared scheme '{}'", name),
                        ));
                    }
                }
                None if !model.has_global_security() => offenders.push(Offender::at(
                    op.method,
                    op.path.clone(),
                    OffenderTarget::Operation,
                    "no security requirement applies",
                )),
                None => {}
            }
        }

        Ok(RuleResult::from_offenders(
            self.info(),
            offenders,
            "Security requirements cover every operation",
            |count| format!("Found {} security issue(s)", count),
        )
        .with_suggested_fix(
            "Apply a security requirement globally or per operation, referencing declared schemes only",
        ))
    }
}
