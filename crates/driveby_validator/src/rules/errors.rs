//! Error-response documentation (P003).

use super::Rule;
use driveby_core::{
    CheckInfo, ContractModel, Offender, OffenderTarget, Response, RuleEvaluationError,
    RuleResult, Severity, is_error_status_key,
};

const ID: &str = "P003";

/// Generic error responses injected by the fix.
const GENERIC_ERRORS: [(&str, &str); 3] = [
    ("400", "Bad Request"),
    ("401", "Unauthorized"),
    ("500", "Internal Server Error"),
];

/// Checks that every operation documents at least one 4xx/5xx response and
/// that every documented error response has a description.
#[derive(Debug, Clone, Default)]
pub struct ErrorHandlingRule;

impl ErrorHandlingRule {
    pub fn new() -> Self {
        Self
    }
}

fn reason_phrase(code: &str) -> &'static str {
    match code {
        "400" => "Bad Request",
        "401" => "Unauthorized",
        "403" => "Forbidden",
        "404" => "Not Found",
        "405" => "Method Not Allowed",
        "409" => "Conflict",
        "422" => "Unprocessable Entity",
        "429" => "Too Many Requests",
        "500" => "Internal Server Error",
        "502" => "Bad Gateway",
        "503" => "Service Unavailable",
        "504" => "Gateway Timeout",
        _ if code.starts_with('4') => "Client Error",
        _ => "Server Error",
    }
}

impl Rule for ErrorHandlingRule {
    fn info(&self) -> CheckInfo {
        CheckInfo::new(ID, "Error Handling Standards", "Error Handling", Severity::Warning)
            .tags(&["errors", "responses", "standards"])
            .auto_fixable()
    }

    fn evaluate(&self, model: &ContractModel) -> Result<RuleResult, RuleEvaluationError> {
        let mut offenders = Vec::new();

        for op in model.operations() {
            if !op.has_error_response() {
                offenders.push(Offender::at(
                    op.method,
                    op.path.clone(),
                    OffenderTarget::Operation,
                    "no 4xx or 5xx response documented",
                ));
            }
            for (code, response) in &op.responses {
                if is_error_status_key(code) && !response.has_description() {
                    offenders.push(Offender::at(
                        op.method,
                        op.path.clone(),
                        OffenderTarget::Response(code.clone()),
                        "error response has an empty description",
                    ));
                }
            }
        }

        Ok(RuleResult::from_offenders(
            self.info(),
            offenders,
            "Every operation documents its error responses",
            |count| format!("Found {} error-handling gap(s)", count),
        )
        .with_suggested_fix(
            "Document 400, 401 and 500 responses (or the ranges 4XX/5XX) with descriptions for every operation",
        ))
    }

    fn fix(
        &self,
        _result: &RuleResult,
        model: &mut ContractModel,
    ) -> Result<Vec<String>, RuleEvaluationError> {
        let mut changes = Vec::new();

        for op in model.operations_mut() {
            let endpoint = op.endpoint_id();

            if !op.has_error_response() {
                for (code, phrase) in GENERIC_ERRORS {
                    if !op.responses.contains_key(code) {
                        op.responses.insert(code.to_string(), Response::described(phrase));
                        changes.push(format!("Added {} response to {}", code, endpoint));
                    }
                }
            }
            for (code, response) in op.responses.iter_mut() {
                if is_error_status_key(code) && !response.has_description() {
                    response.description = Some(reason_phrase(code).to_string());
                    changes.push(format!("Described {} response of {}", code, endpoint));
                }
            }
        }

        Ok(changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use driveby_core::{ContractBuilder, HttpMethod, OperationBuilder};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_missing_error_responses() {
        let model = ContractBuilder::new("Widgets", "1.0.0")
            .operation(
                OperationBuilder::new(HttpMethod::Get, "/widgets")
                    .response("200", "OK")
                    .response("default", "Unexpected")
                    .build(),
            )
            .operation(
                OperationBuilder::new(HttpMethod::Get, "/parts")
                    .response("200", "OK")
                    .response("4XX", "Client failure")
                    .build(),
            )
            .build();

        let result = ErrorHandlingRule::new().evaluate(&model).unwrap();
        let offenders = result.detail.offenders();
        assert_eq!(offenders.len(), 1);
        assert_eq!(offenders[0].path.as_deref(), Some("/widgets"));
    }

    #[test]
    fn test_empty_error_description() {
        let model = ContractBuilder::new("Widgets", "1.0.0")
            .operation(
                OperationBuilder::new(HttpMethod::Get, "/widgets")
                    .response("200", "OK")
                    .response("404", " ")
                    .build(),
            )
            .build();
        let result = ErrorHandlingRule::new().evaluate(&model).unwrap();
        assert_eq!(
            result.detail.offenders()[0].to_string(),
            "GET /widgets response 404: error response has an empty description"
        );
    }

    #[test]
    fn test_fix_injects_generic_errors() {
        let rule = ErrorHandlingRule::new();
        let mut model = ContractBuilder::new("Widgets", "1.0.0")
            .operation(
                OperationBuilder::new(HttpMethod::Post, "/widgets")
                    .response("201", "Created")
                    .build(),
            )
            .operation(
                OperationBuilder::new(HttpMethod::Get, "/widgets")
                    .response("200", "OK")
                    .response("404", "")
                    .build(),
            )
            .build();
        let result = rule.evaluate(&model).unwrap();
        assert!(!result.passed);

        let changes = rule.fix(&result, &mut model).unwrap();
        assert_eq!(changes.len(), 4);

        let create = model.find_operation(HttpMethod::Post, "/widgets").unwrap();
        let codes: Vec<&str> = create.responses.keys().map(String::as_str).collect();
        assert_eq!(codes, vec!["201", "400", "401", "500"]);

        let get = model.find_operation(HttpMethod::Get, "/widgets").unwrap();
        assert_eq!(get.responses["404"].description.as_deref(), Some("Not Found"));

        assert!(rule.evaluate(&model).unwrap().passed);
    }
}
