//! Normalization passes applied to the raw contract tree.
//!
//! Every pass is idempotent and touches disjoint keys, so the order they run
//! in does not matter. Literal example values are never rewritten.

use serde_json::{Map, Value};
use tracing::warn;

const METHOD_KEYS: [&str; 8] = [
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

const PATH_ITEM_FIELDS: [&str; 14] = [
    "$ref",
    "summary",
    "description",
    "servers",
    "parameters",
    "get",
    "put",
    "post",
    "delete",
    "options",
    "head",
    "patch",
    "trace",
    "title",
];

const OPERATION_FIELDS: [&str; 13] = [
    "tags",
    "summary",
    "description",
    "externalDocs",
    "operationId",
    "parameters",
    "requestBody",
    "responses",
    "callbacks",
    "deprecated",
    "security",
    "servers",
    "title",
];

const RESPONSE_FIELDS: [&str; 5] = ["$ref", "description", "headers", "content", "links"];

const REQUEST_BODY_FIELDS: [&str; 4] = ["$ref", "description", "content", "required"];

/// Keys whose values are literal data, not schema structure.
const LITERAL_KEYS: [&str; 5] = ["example", "examples", "enum", "default", "const"];

/// Keys whose values map user-chosen names to objects. A child of such a map
/// is named by the contract author, so `example` there is a property or a
/// component, never a literal.
const NAME_MAP_KEYS: [&str; 16] = [
    "properties",
    "patternProperties",
    "definitions",
    "$defs",
    "paths",
    "schemas",
    "responses",
    "parameters",
    "requestBodies",
    "headers",
    "content",
    "encoding",
    "securitySchemes",
    "links",
    "callbacks",
    "variables",
];

/// Whether the value under `key` is a name-keyed map, given whether the
/// object holding `key` is one itself.
pub(crate) fn is_name_map(parent_is_name_map: bool, key: &str) -> bool {
    !parent_is_name_map && NAME_MAP_KEYS.contains(&key)
}

/// Whether the value under `key` is literal data that must not be rewritten.
pub(crate) fn is_literal(parent_is_name_map: bool, key: &str) -> bool {
    !parent_is_name_map && LITERAL_KEYS.contains(&key)
}

/// Runs every normalization pass over the document.
///
/// Returns a note for each change made or anomaly seen.
pub fn normalize(doc: &mut Value) -> Vec<String> {
    let mut notes = Vec::new();
    collapse_null_unions(doc, "#", false, &mut notes);
    convert_exclusive_bounds(doc, "#", false, &mut notes);
    strip_cosmetic_fields(doc, &mut notes);
    notes
}

fn child_pointer(pointer: &str, key: &str) -> String {
    format!("{}/{}", pointer, key.replace('~', "~0").replace('/', "~1"))
}

/// Collapses `type: [X, "null"]` into `type: X` plus `nullable: true`, and
/// drops `{type: "null"}` members from `oneOf`/`anyOf` the same way.
fn collapse_null_unions(
    value: &mut Value,
    pointer: &str,
    name_map: bool,
    notes: &mut Vec<String>,
) {
    match value {
        Value::Object(map) => {
            if !name_map {
                collapse_type_array(map, pointer, notes);
                collapse_null_variant(map, "anyOf", pointer, notes);
                collapse_null_variant(map, "oneOf", pointer, notes);
            }
            for (key, child) in map.iter_mut() {
                if !is_literal(name_map, key) {
                    let child_map = is_name_map(name_map, key);
                    collapse_null_unions(child, &child_pointer(pointer, key), child_map, notes);
                }
            }
        }
        Value::Array(items) => {
            for (index, item) in items.iter_mut().enumerate() {
                collapse_null_unions(item, &format!("{}/{}", pointer, index), false, notes);
            }
        }
        _ => {}
    }
}

fn collapse_type_array(map: &mut Map<String, Value>, pointer: &str, notes: &mut Vec<String>) {
    let Some(Value::Array(types)) = map.get("type") else {
        if map.get("type").and_then(Value::as_str) == Some("null") {
            map.insert("type".to_string(), Value::from("string"));
            map.insert("nullable".to_string(), Value::Bool(true));
            notes.push(format!("{}: replaced type \"null\" with nullable string", pointer));
        }
        return;
    };

    let names: Vec<&str> = types.iter().filter_map(Value::as_str).collect();
    let has_null = names.contains(&"null");
    let base = names
        .iter()
        .find(|name| **name != "null")
        .map(|name| name.to_string())
        .unwrap_or_else(|| "string".to_string());

    if names.iter().filter(|name| **name != "null").count() > 1 {
        notes.push(format!(
            "{}: type union {:?} reduced to '{}'",
            pointer, names, base
        ));
    } else {
        notes.push(format!("{}: collapsed type union to '{}'", pointer, base));
    }

    map.insert("type".to_string(), Value::from(base));
    if has_null {
        map.insert("nullable".to_string(), Value::Bool(true));
    }
}

fn collapse_null_variant(
    map: &mut Map<String, Value>,
    key: &str,
    pointer: &str,
    notes: &mut Vec<String>,
) {
    let Some(Value::Array(variants)) = map.get_mut(key) else {
        return;
    };
    let before = variants.len();
    variants.retain(|variant| variant.get("type").and_then(Value::as_str) != Some("null"));
    if variants.len() == before {
        return;
    }

    notes.push(format!("{}: removed null variant from {}", pointer, key));
    if variants.len() == 1 {
        let only = variants.remove(0);
        map.remove(key);
        if let Value::Object(fields) = only {
            for (field, field_value) in fields {
                map.entry(field).or_insert(field_value);
            }
        }
    }
    map.insert("nullable".to_string(), Value::Bool(true));
}

/// Rewrites numeric `exclusiveMinimum`/`exclusiveMaximum` into the boolean
/// form when the paired bound exists, otherwise drops them.
fn convert_exclusive_bounds(
    value: &mut Value,
    pointer: &str,
    name_map: bool,
    notes: &mut Vec<String>,
) {
    match value {
        Value::Object(map) => {
            let bounds: &[(&str, &str)] = if name_map {
                &[]
            } else {
                &[("exclusiveMinimum", "minimum"), ("exclusiveMaximum", "maximum")]
            };
            for &(exclusive, inclusive) in bounds {
                if !map.get(exclusive).is_some_and(Value::is_number) {
                    continue;
                }
                if map.contains_key(inclusive) {
                    map.insert(exclusive.to_string(), Value::Bool(true));
                    notes.push(format!("{}: converted numeric {} to boolean", pointer, exclusive));
                } else {
                    map.remove(exclusive);
                    notes.push(format!(
                        "{}: dropped numeric {} without {}",
                        pointer, exclusive, inclusive
                    ));
                }
            }
            for (key, child) in map.iter_mut() {
                if !is_literal(name_map, key) {
                    let child_map = is_name_map(name_map, key);
                    convert_exclusive_bounds(child, &child_pointer(pointer, key), child_map, notes);
                }
            }
        }
        Value::Array(items) => {
            for (index, item) in items.iter_mut().enumerate() {
                convert_exclusive_bounds(item, &format!("{}/{}", pointer, index), false, notes);
            }
        }
        _ => {}
    }
}

/// Strips `title` from path items and operations, and logs any other field
/// that is not legal at its position. Only `title` is ever removed.
fn strip_cosmetic_fields(doc: &mut Value, notes: &mut Vec<String>) {
    let Some(Value::Object(paths)) = doc.get_mut("paths") else {
        return;
    };

    for (path, item) in paths.iter_mut() {
        let Value::Object(item) = item else {
            continue;
        };
        if item.remove("title").is_some() {
            notes.push(format!("{}: removed stray title on path item", path));
        }
        report_unexpected(item, &PATH_ITEM_FIELDS, path, None, "path item", notes);

        for method in METHOD_KEYS {
            let Some(Value::Object(operation)) = item.get_mut(method) else {
                continue;
            };
            if operation.remove("title").is_some() {
                notes.push(format!(
                    "{} {}: removed stray title on operation",
                    method.to_uppercase(),
                    path
                ));
            }
            report_unexpected(operation, &OPERATION_FIELDS, path, Some(method), "operation", notes);

            if let Some(Value::Object(body)) = operation.get("requestBody") {
                report_unexpected(body, &REQUEST_BODY_FIELDS, path, Some(method), "requestBody", notes);
            }
            if let Some(Value::Object(responses)) = operation.get("responses") {
                for response in responses.values() {
                    if let Value::Object(response) = response {
                        report_unexpected(response, &RESPONSE_FIELDS, path, Some(method), "response", notes);
                    }
                }
            }
        }
    }
}

fn report_unexpected(
    map: &Map<String, Value>,
    allowed: &[&str],
    path: &str,
    method: Option<&str>,
    position: &str,
    notes: &mut Vec<String>,
) {
    for key in map.keys() {
        if key.starts_with("x-") || allowed.contains(&key.as_str()) {
            continue;
        }
        let method = method.map(str::to_uppercase).unwrap_or_default();
        warn!(path = %path, method = %method, field = %key, position = %position, "Unexpected contract field kept");
        notes.push(format!(
            "{} {}: unexpected field '{}' on {} kept",
            method, path, key, position
        ));
    }
}
