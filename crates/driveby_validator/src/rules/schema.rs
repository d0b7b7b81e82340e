//! Request schema completeness (P004).

use super::Rule;
use driveby_core::{
    CheckInfo, ContractModel, MediaType, Offender, OffenderTarget, RuleEvaluationError,
    RuleResult, SchemaNode, SchemaType, Severity,
};

const ID: &str = "P004";

/// Checks that every parameter and request body carries a typed schema.
///
/// Numeric schemas without bounds and string schemas without length limits
/// are reported as notes; they never fail the rule.
#[derive(Debug, Clone, Default)]
pub struct SchemaRule;

impl SchemaRule {
    pub fn new() -> Self {
        Self
    }
}

/// Walks a schema tree and records constraint notes under `label`.
fn constraint_notes(schema: &SchemaNode, label: &str, notes: &mut Vec<String>) {
    if schema.recursive_ref.is_some() {
        return;
    }
    match &schema.schema_type {
        Some(kind) if kind.is_numeric() && !schema.has_numeric_bounds() && schema.enum_values.is_empty() => {
            notes.push(format!("{}: numeric schema has no minimum or maximum", label));
        }
        Some(SchemaType::String)
            if !schema.has_length_bounds() && schema.enum_values.is_empty() && schema.format.is_none() =>
        {
            notes.push(format!("{}: string schema has no length limits", label));
        }
        _ => {}
    }
    for (name, property) in &schema.properties {
        constraint_notes(property, &format!("{}.{}", label, name), notes);
    }
    if let Some(items) = &schema.items {
        constraint_notes(items, &format!("{}[]", label), notes);
    }
}

impl Rule for SchemaRule {
    fn info(&self) -> CheckInfo {
        CheckInfo::new(ID, "Request Schema Definitions", "Schema", Severity::Warning)
            .tags(&["schema", "validation", "request"])
            .auto_fixable()
    }

    fn evaluate(&self, model: &ContractModel) -> Result<RuleResult, RuleEvaluationError> {
        let mut offenders = Vec::new();
        let mut notes = Vec::new();

        for op in model.operations() {
            let endpoint = op.endpoint_id();

            for param in &op.parameters {
                let target = OffenderTarget::Parameter(param.name.clone());
                match &param.schema {
                    None => offenders.push(Offender::at(
                        op.method,
                        op.path.clone(),
                        target,
                        "no schema",
                    )),
                    Some(schema) if schema.schema_type.is_none() && schema.recursive_ref.is_none() => {
                        offenders.push(Offender::at(
                            op.method,
                            op.path.clone(),
                            target,
                            "schema declares no type",
                        ))
                    }
                    Some(schema) => constraint_notes(
                        schema,
                        &format!("{} parameter '{}'", endpoint, param.name),
                        &mut notes,
                    ),
                }
            }

            if let Some(body) = &op.request_body {
                let schemas: Vec<(&String, &SchemaNode)> = body
                    .content
                    .iter()
                    .filter_map(|(media_type, media)| media.schema.as_ref().map(|s| (media_type, s)))
                    .collect();
                if schemas.is_empty() {
                    offenders.push(Offender::at(
                        op.method,
                        op.path.clone(),
                        OffenderTarget::RequestBody,
                        "no content schema",
                    ));
                }
                for (media_type, schema) in schemas {
                    constraint_notes(
                        schema,
                        &format!("{} request body {}", endpoint, media_type),
                        &mut notes,
                    );
                }
            }
        }

        Ok(RuleResult::from_offenders(
            self.info(),
            offenders,
            "Every parameter and request body has a schema",
            |count| format!("Found {} missing or untyped schema(s)", count),
        )
        .with_suggested_fix("Attach a typed schema to every parameter and request body")
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

            for param in &mut op.parameters {
                let Some(schema) = param.schema.as_mut() else {
                    param.schema = Some(SchemaNode::of_type(SchemaType::String));
                    changes.push(format!("Added string schema to parameter '{}' of {}", param.name, endpoint));
                    continue;
                };
                if schema.schema_type.is_none() && schema.recursive_ref.is_none() {
                    let inferred = if schema.properties.is_empty() {
                        SchemaType::String
                    } else {
                        SchemaType::Object
                    };
                    schema.schema_type = Some(inferred);
                    changes.push(format!("Typed schema of parameter '{}' of {}", param.name, endpoint));
                }
            }

            if let Some(body) = &mut op.request_body {
                if body.content.values().all(|media| media.schema.is_none()) {
                    if body.content.is_empty() {
                        body.content
                            .insert("application/json".to_string(), MediaType::default());
                    }
                    for (media_type, media) in body.content.iter_mut() {
                        media.schema = Some(SchemaNode::of_type(SchemaType::Object));
                        changes.push(format!("Added object schema to request body {} of {}", media_type, endpoint));
                    }
                }
            }
        }

        Ok(changes)
    }
}
