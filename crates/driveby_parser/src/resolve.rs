//! Local `$ref` resolution.
//!
//! Only same-document JSON pointer references (`#/...`) are supported. A
//! reference that re-enters itself is replaced by a recursion marker instead
//! of being expanded again.

use driveby_core::ContractLoadError;
use serde_json::{Map, Value};

use crate::normalize::is_name_map;

/// Key of the marker object left where a reference cycle was cut.
pub const RECURSIVE_REF_KEY: &str = "x-driveby-recursive-ref";

/// Returns a copy of the document with every local reference inlined.
///
/// # Errors
///
/// Returns `ContractLoadError::UnresolvedReference` for external references
/// and for pointers that do not exist in the document.
pub fn resolve_references(doc: &Value) -> Result<Value, ContractLoadError> {
    let mut stack = Vec::new();
    resolve_value(doc, doc, false, &mut stack)
}

/// `name_map` is set when `value` maps author-chosen names to objects, where
/// a key spelled `example` names a property rather than a literal.
fn resolve_value(
    root: &Value,
    value: &Value,
    name_map: bool,
    stack: &mut Vec<String>,
) -> Result<Value, ContractLoadError> {
    match value {
        Value::Object(map) => {
            if !name_map {
                if let Some(Value::String(reference)) = map.get("$ref") {
                    return resolve_reference(root, reference, map, stack);
                }
            }
            let mut resolved = Map::with_capacity(map.len());
            for (key, child) in map {
                let child = if !name_map && key == "example" {
                    child.clone()
                } else {
                    resolve_value(root, child, is_name_map(name_map, key), stack)?
                };
                resolved.insert(key.clone(), child);
            }
            Ok(Value::Object(resolved))
        }
        Value::Array(items) => items
            .iter()
            .map(|item| resolve_value(root, item, false, stack))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        other => Ok(other.clone()),
    }
}

fn resolve_reference(
    root: &Value,
    reference: &str,
    siblings: &Map<String, Value>,
    stack: &mut Vec<String>,
) -> Result<Value, ContractLoadError> {
    let unresolved = || ContractLoadError::UnresolvedReference {
        reference: reference.to_string(),
    };

    let pointer = reference.strip_prefix('#').ok_or_else(unresolved)?;
    if stack.iter().any(|seen| seen == reference) {
        let mut marker = Map::new();
        marker.insert(RECURSIVE_REF_KEY.to_string(), Value::from(reference));
        return Ok(Value::Object(marker));
    }

    let target = root.pointer(pointer).ok_or_else(unresolved)?;

    stack.push(reference.to_string());
    let resolved = resolve_value(root, target, false, stack);
    stack.pop();
    let mut resolved = resolved?;

    // Sibling keys next to $ref override the referenced content.
    if let Value::Object(target_map) = &mut resolved {
        for (key, sibling) in siblings {
            if key == "$ref" {
                continue;
            }
            let sibling = resolve_value(root, sibling, is_name_map(false, key), stack)?;
            target_map.insert(key.clone(), sibling);
        }
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_resolves_local_reference() {
        let doc = json!({
            "paths": {"/w": {"get": {"responses": {"200": {"$ref": "#/components/responses/Ok"}}}}},
            "components": {"responses": {"Ok": {"description": "fine"}}}
        });
        let resolved = resolve_references(&doc).unwrap();
        assert_eq!(
            resolved["paths"]["/w"]["get"]["responses"]["200"],
            json!({"description": "fine"})
        );
    }

    #[test]
    fn test_sibling_keys_override() {
        let doc = json!({
            "a": {"$ref": "#/defs/B", "description": "overridden"},
            "defs": {"B": {"type": "string", "description": "original"}}
        });
        let resolved = resolve_references(&doc).unwrap();
        assert_eq!(
            resolved["a"],
            json!({"type": "string", "description": "overridden"})
        );
    }

    #[test]
    fn test_missing_reference_fails() {
        let doc = json!({"a": {"$ref": "#/components/schemas/Nope"}});
        let err = resolve_references(&doc).unwrap_err();
        assert!(matches!(
            err,
            ContractLoadError::UnresolvedReference { reference } if reference == "#/components/schemas/Nope"
        ));
    }

    #[test]
    fn test_external_reference_fails() {
        let doc = json!({"a": {"$ref": "other.yaml#/Pet"}});
        assert!(matches!(
            resolve_references(&doc),
            Err(ContractLoadError::UnresolvedReference { .. })
        ));
    }

    #[test]
    fn test_cycle_is_cut_with_marker() {
        let doc = json!({
            "components": {"schemas": {"Node": {
                "type": "object",
                "properties": {"child": {"$ref": "#/components/schemas/Node"}}
            }}},
            "root": {"$ref": "#/components/schemas/Node"}
        });
        let resolved = resolve_references(&doc).unwrap();
        assert_eq!(
            resolved["root"]["properties"]["child"],
            json!({(RECURSIVE_REF_KEY): "#/components/schemas/Node"})
        );
        assert_eq!(
            resolved["components"]["schemas"]["Node"]["properties"]["child"]["properties"]["child"],
            json!({(RECURSIVE_REF_KEY): "#/components/schemas/Node"})
        );
    }

    #[test]
    fn test_example_values_are_not_resolved() {
        let doc = json!({"s": {"example": {"$ref": "#/nowhere"}}});
        let resolved = resolve_references(&doc).unwrap();
        assert_eq!(resolved, doc);
    }

    #[test]
    fn test_properties_named_example_are_resolved() {
        let doc = json!({
            "components": {"schemas": {
                "Sample": {"type": "object", "properties": {"id": {"type": "integer"}}},
                "Widget": {
                    "type": "object",
                    "properties": {
                        "example": {"$ref": "#/components/schemas/Sample"},
                        "default": {"$ref": "#/components/schemas/Sample"}
                    },
                    "example": {"example": {"$ref": "#/literal"}}
                }
            }}
        });
        let resolved = resolve_references(&doc).unwrap();
        let widget = &resolved["components"]["schemas"]["Widget"];
        let sample = json!({"type": "object", "properties": {"id": {"type": "integer"}}});
        assert_eq!(widget["properties"]["example"], sample);
        assert_eq!(widget["properties"]["default"], sample);
        assert_eq!(widget["example"], json!({"example": {"$ref": "#/literal"}}));
    }

    #[test]
    fn test_component_named_example_is_resolved() {
        let doc = json!({
            "components": {"schemas": {
                "example": {"$ref": "#/components/schemas/Real"},
                "Real": {"type": "string"}
            }}
        });
        let resolved = resolve_references(&doc).unwrap();
        assert_eq!(resolved["components"]["schemas"]["example"], json!({"type": "string"}));
    }
}
