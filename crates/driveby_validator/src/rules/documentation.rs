//! Documentation completeness (P002).

use super::{Rule, is_blank};
use crate::synthesizer::synthesize;
use driveby_core::{
    CheckInfo, ContractModel, Offender, OffenderTarget, Operation, RuleEvaluationError,
    RuleResult, Severity,
};

const ID: &str = "P002";

/// Checks that every operation, parameter and payload is documented.
///
/// Operations need a summary and a description, parameters a description,
/// and every request or response media type with a schema an example.
/// Missing API-level description, contact and license are advisory notes.
#[derive(Debug, Clone, Default)]
pub struct DocumentationRule;

impl DocumentationRule {
    pub fn new() -> Self {
        Self
    }
}

fn operation_offenders(op: &Operation, offenders: &mut Vec<Offender>) {
    let at = |target: OffenderTarget, message: &str| {
        Offender::at(op.method, op.path.clone(), target, message)
    };

    if is_blank(op.summary.as_deref()) {
        offenders.push(at(OffenderTarget::Operation, "missing summary"));
    }
    if is_blank(op.description.as_deref()) {
        offenders.push(at(OffenderTarget::Operation, "missing description"));
    }
    for param in &op.parameters {
        if is_blank(param.description.as_deref()) {
            offenders.push(at(
                OffenderTarget::Parameter(param.name.clone()),
                "missing description",
            ));
        }
    }
    if let Some(body) = &op.request_body {
        for (media_type, media) in &body.content {
            if media.schema.is_some() && !media.has_example() {
                offenders.push(at(
                    OffenderTarget::RequestBody,
                    &format!("no example for {}", media_type),
                ));
            }
        }
    }
    for (code, response) in &op.responses {
        for (media_type, media) in &response.content {
            if media.schema.is_some() && !media.has_example() {
                offenders.push(at(
                    OffenderTarget::Response(code.clone()),
                    &format!("no example for {}", media_type),
                ));
            }
        }
    }
}

impl Rule for DocumentationRule {
    fn info(&self) -> CheckInfo {
        CheckInfo::new(
            ID,
            "API Documentation Quality",
            "Documentation",
            Severity::Warning,
        )
        .tags(&["documentation", "quality", "usability"])
        .auto_fixable()
    }

    fn evaluate(&self, model: &ContractModel) -> Result<RuleResult, RuleEvaluationError> {
        let mut offenders = Vec::new();
        for op in model.operations() {
            operation_offenders(op, &mut offenders);
        }

        let mut notes = Vec::new();
        if is_blank(model.info.description.as_deref()) {
            notes.push("API description is missing".to_string());
        }
        if is_blank(model.info.contact.as_deref()) {
            notes.push("API contact information is missing".to_string());
        }
        if is_blank(model.info.license.as_deref()) {
            notes.push("API license is missing".to_string());
        }

        Ok(RuleResult::from_offenders(
            self.info(),
            offenders,
            "All operations, parameters and payloads are documented",
            |count| format!("Found {} documentation gap(s)", count),
        )
        .with_suggested_fix(
            "Add summaries and descriptions to operations and parameters, and examples to request and response payloads",
        )
        .with_notes(notes))
    }

    fn fix(
        &self,
        _result: &RuleResult,
        model: &mut ContractModel,
    ) -> Result<Vec<String>, RuleEvaluationError> {
        let mut changes = Vec::new();

        for op in model.operations_mut() {
            let endpoint = op.endpoint_id();

            if is_blank(op.summary.as_deref()) {
                op.summary = Some(endpoint.clone());
                changes.push(format!("Added summary to {}", endpoint));
            }
            if is_blank(op.description.as_deref()) {
                op.description = Some(format!("Operation {}", endpoint));
                changes.push(format!("Added description to {}", endpoint));
            }
            for param in &mut op.parameters {
                if is_blank(param.description.as_deref()) {
                    param.description = Some(format!("The {} parameter", param.name));
                    changes.push(format!("Added description to parameter '{}' of {}", param.name, endpoint));
                }
            }

            let request_media = op
                .request_body
                .iter_mut()
                .flat_map(|body| body.content.iter_mut())
                .map(|(media_type, media)| (format!("request body {}", media_type), media));
            let response_media = op.responses.iter_mut().flat_map(|(code, response)| {
                response
                    .content
                    .iter_mut()
                    .map(move |(media_type, media)| (format!("response {} {}", code, media_type), media))
            });

            for (label, media) in request_media.chain(response_media) {
                if media.has_example() {
                    continue;
                }
                if let Some(schema) = &media.schema {
                    media.example = Some(synthesize(schema));
                    changes.push(format!("Added synthesized example to {} of {}", label, endpoint));
                }
            }
        }

        Ok(changes)
    }
}
