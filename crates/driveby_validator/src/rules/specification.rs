//! Specification well-formedness (P001).

use super::{Rule, compile, path_placeholders};
use driveby_core::{
    CheckInfo, ContractModel, Offender, OffenderTarget, ParameterLocation, RuleEvaluationError,
    RuleResult, Severity,
};
use std::collections::{BTreeSet, HashMap};

const ID: &str = "P001";
const SUPPORTED_VERSION: &str = r"^3\.(0|1)(\.\d+)?$";

/// Title injected when the contract has none.
pub const PLACEHOLDER_TITLE: &str = "Untitled API";

/// Version injected when the contract has none.
pub const PLACEHOLDER_VERSION: &str = "1.0.0";

/// Checks that the contract is a well-formed OpenAPI 3.0/3.1 document.
///
/// Flags an unsupported `openapi` version, empty info title or version,
/// duplicate operationIds, path placeholders without a matching path
/// parameter (and the reverse), and optional path parameters.
#[derive(Debug, Clone, Default)]
pub struct SpecificationRule;

impl SpecificationRule {
    pub fn new() -> Self {
        Self
    }
}

impl Rule for SpecificationRule {
    fn info(&self) -> CheckInfo {
        CheckInfo::new(
            ID,
            "OpenAPI Specification Compliance",
            "Specification",
            Severity::Critical,
        )
        .tags(&["openapi", "specification", "compliance"])
        .auto_fixable()
    }

    fn evaluate(&self, model: &ContractModel) -> Result<RuleResult, RuleEvaluationError> {
        let version_pattern = compile(ID, SUPPORTED_VERSION)?;
        let mut offenders = Vec::new();

        if !version_pattern.is_match(model.openapi.trim()) {
            offenders.push(Offender::document(
                OffenderTarget::Document,
                format!("unsupported OpenAPI version '{}'", model.openapi),
            ));
        }
        if model.info.title.trim().is_empty() {
            offenders.push(Offender::document(
                OffenderTarget::Info("title".to_string()),
                "title is empty",
            ));
        }
        if model.info.version.trim().is_empty() {
            offenders.push(Offender::document(
                OffenderTarget::Info("version".to_string()),
                "version is empty",
            ));
        }

        let mut operation_ids: HashMap<&str, String> = HashMap::new();
        for op in model.operations() {
            if let Some(id) = op.operation_id.as_deref().filter(|id| !id.trim().is_empty()) {
                match operation_ids.get(id) {
                    Some(first) => offenders.push(Offender::at(
                        op.method,
                        op.path.clone(),
                        OffenderTarget::Operation,
                        format!("duplicate operationId '{}' (also used by {})", id, first),
                    )),
                    None => {
                        operation_ids.insert(id, op.endpoint_id());
                    }
                }
            }

            let placeholders: BTreeSet<&str> = path_placeholders(&op.path).into_iter().collect();
            let declared: BTreeSet<&str> = op
                .parameters_in(ParameterLocation::Path)
                .map(|param| param.name.as_str())
                .collect();

            for missing in placeholders.difference(&declared) {
                offenders.push(Offender::at(
                    op.method,
                    op.path.clone(),
                    OffenderTarget::Parameter(missing.to_string()),
                    "path placeholder is not declared as a path parameter",
                ));
            }
            for param in op.parameters_in(ParameterLocation::Path) {
                if !placeholders.contains(param.name.as_str()) {
                    offenders.push(Offender::at(
                        op.method,
                        op.path.clone(),
                        OffenderTarget::Parameter(param.name.clone()),
                        "path parameter does not appear in the path template",
                    ));
                } else if !param.required {
                    offenders.push(Offender::at(
                        op.method,
                        op.path.clone(),
                        OffenderTarget::Parameter(param.name.clone()),
                        "path parameter must be required",
                    ));
                }
            }
        }

        Ok(RuleResult::from_offenders(
            self.info(),
            offenders,
            "Contract is a well-formed OpenAPI document",
            |count| format!("Found {} specification issue(s)", count),
        )
        .with_suggested_fix(
            "Declare openapi 3.0.x or 3.1.x, fill info.title and info.version, \
             keep operationIds unique and declare every path placeholder as a required path parameter",
        ))
    }

    fn fix(
        &self,
        _result: &RuleResult,
        model: &mut ContractModel,
    ) -> Result<Vec<String>, RuleEvaluationError> {
        let mut changes = Vec::new();

        if model.info.title.trim().is_empty() {
            model.info.title = PLACEHOLDER_TITLE.to_string();
            changes.push(format!("Set info.title to '{}'", PLACEHOLDER_TITLE));
        }
        if model.info.version.trim().is_empty() {
            model.info.version = PLACEHOLDER_VERSION.to_string();
            changes.push(format!("Set info.version to '{}'", PLACEHOLDER_VERSION));
        }

        for op in model.operations_mut() {
            let endpoint = op.endpoint_id();
            for param in op
                .parameters
                .iter_mut()
                .filter(|param| param.location == ParameterLocation::Path && !param.required)
            {
                param.required = true;
                changes.push(format!("Marked path parameter '{}' of {} as required", param.name, endpoint));
            }
        }

        Ok(changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use driveby_core::{ContractBuilder, HttpMethod, OperationBuilder, ParameterBuilder};
    use pretty_assertions::assert_eq;

    fn widget_contract() -> ContractBuilder {
        ContractBuilder::new("Widgets", "1.0.0").operation(
            OperationBuilder::new(HttpMethod::Get, "/widgets/{id}")
                .operation_id("getWidget")
                .parameter(ParameterBuilder::path("id").build())
                .response("200", "OK")
                .build(),
        )
    }

    #[test]
    fn test_well_formed_contract_passes() {
        let result = SpecificationRule::new().evaluate(&widget_contract().build()).unwrap();
        assert!(result.passed, "{:?}", result.detail);
    }

    #[test]
    fn test_unsupported_openapi_version() {
        let model = widget_contract().openapi("2.0").build();
        let result = SpecificationRule::new().evaluate(&model).unwrap();
        assert!(!result.passed);
        assert!(result.detail.offenders()[0].message.contains("'2.0'"));

        for version in ["3.0", "3.0.3", "3.1.0"] {
            let model = widget_contract().openapi(version).build();
            assert!(SpecificationRule::new().evaluate(&model).unwrap().passed, "{}", version);
        }
    }

    #[test]
    fn test_duplicate_operation_ids() {
        let model = widget_contract()
            .operation(
                OperationBuilder::new(HttpMethod::Delete, "/widgets")
                    .operation_id("getWidget")
                    .response("204", "Deleted")
                    .build(),
            )
            .build();
        let result = SpecificationRule::new().evaluate(&model).unwrap();
        let offenders = result.detail.offenders();
        assert_eq!(offenders.len(), 1);
        assert_eq!(
            offenders[0].message,
            "duplicate operationId 'getWidget' (also used by GET /widgets/{id})"
        );
    }

    #[test]
    fn test_path_parameter_mismatches() {
        let model = ContractBuilder::new("Widgets", "1.0.0")
            .operation(
                OperationBuilder::new(HttpMethod::Get, "/widgets/{id}")
                    .parameter(ParameterBuilder::path("widgetId").build())
                    .response("200", "OK")
                    .build(),
            )
            .operation(
                OperationBuilder::new(HttpMethod::Get, "/parts/{partId}")
                    .parameter(ParameterBuilder::path("partId").required(false).build())
                    .response("200", "OK")
                    .build(),
            )
            .build();

        let result = SpecificationRule::new().evaluate(&model).unwrap();
        let messages: Vec<String> = result
            .detail
            .offenders()
            .iter()
            .map(|offender| offender.to_string())
            .collect();
        assert_eq!(
            messages,
            vec![
                "GET /widgets/{id} parameter 'id': path placeholder is not declared as a path parameter",
                "GET /widgets/{id} parameter 'widgetId': path parameter does not appear in the path template",
                "GET /parts/{partId} parameter 'partId': path parameter must be required",
            ]
        );
    }

    #[test]
    fn test_fix_fills_info_and_requires_path_parameters() {
        let mut model = ContractBuilder::new("", "")
            .operation(
                OperationBuilder::new(HttpMethod::Get, "/parts/{partId}")
                    .parameter(ParameterBuilder::path("partId").required(false).build())
                    .response("200", "OK")
                    .build(),
            )
            .build();
        let rule = SpecificationRule::new();
        let result = rule.evaluate(&model).unwrap();
        assert!(!result.passed);

        let changes = rule.fix(&result, &mut model).unwrap();
        assert_eq!(changes.len(), 3);
        assert_eq!(model.info.title, PLACEHOLDER_TITLE);
        assert_eq!(model.info.version, PLACEHOLDER_VERSION);
        assert!(rule.evaluate(&model).unwrap().passed);
    }
}
