//! Structural validation and conversion of a resolved document into a
//! [`ContractModel`].

use crate::resolve::RECURSIVE_REF_KEY;
use driveby_core::{
    ContractInfo, ContractLoadError, ContractModel, HttpMethod, MediaType, Operation, Parameter,
    ParameterLocation, PathItem, RequestBody, Response, SchemaNode, SchemaType,
    SecurityRequirement, SecurityScheme,
};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

type Result<T> = std::result::Result<T, ContractLoadError>;

/// Converts a normalized, fully resolved document into a contract model.
///
/// `openapi`, `info` and `paths` are required and at least one operation must
/// exist. `info.title` and `info.version` may be empty; rules report those.
pub fn convert_document(doc: &Value, source: &str) -> Result<ContractModel> {
    let root = doc
        .as_object()
        .ok_or_else(|| ContractLoadError::structure("#", "document root must be a mapping"))?;

    let openapi = match root.get("openapi") {
        Some(Value::String(version)) => version.clone(),
        Some(Value::Number(version)) => version.to_string(),
        Some(_) => return Err(ContractLoadError::structure("#/openapi", "must be a string")),
        None => return Err(ContractLoadError::MissingField("openapi".to_string())),
    };

    let info = root
        .get("info")
        .ok_or_else(|| ContractLoadError::MissingField("info".to_string()))?;
    let info = convert_info(info)?;

    let paths = root
        .get("paths")
        .ok_or_else(|| ContractLoadError::MissingField("paths".to_string()))?
        .as_object()
        .ok_or_else(|| ContractLoadError::structure("#/paths", "must be a mapping"))?;

    let mut path_items = Vec::with_capacity(paths.len());
    for (path, item) in paths {
        path_items.push(convert_path_item(path, item)?);
    }
    if path_items.iter().all(|item| item.operations.is_empty()) {
        return Err(ContractLoadError::NoOperations);
    }

    let servers = root
        .get("servers")
        .and_then(Value::as_array)
        .map(|servers| {
            servers
                .iter()
                .filter_map(|server| server.get("url").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let security_schemes = root
        .get("components")
        .and_then(|components| components.get("securitySchemes"))
        .and_then(Value::as_object)
        .map(convert_security_schemes)
        .unwrap_or_default();

    let security = match root.get("security") {
        Some(value) => Some(convert_security(value, "#/security")?),
        None => None,
    };

    Ok(ContractModel {
        openapi,
        info,
        servers,
        paths: path_items,
        security_schemes,
        security,
        source: source.to_string(),
    })
}

fn convert_info(value: &Value) -> Result<ContractInfo> {
    let info = value
        .as_object()
        .ok_or_else(|| ContractLoadError::structure("#/info", "must be a mapping"))?;

    let version = match info.get("version") {
        Some(Value::String(version)) => version.clone(),
        Some(Value::Number(version)) => version.to_string(),
        _ => String::new(),
    };
    let contact = info.get("contact").and_then(|contact| {
        ["name", "email", "url"]
            .iter()
            .find_map(|key| contact.get(*key).and_then(Value::as_str))
            .map(str::to_string)
    });

    Ok(ContractInfo {
        title: string_field(info, "title").unwrap_or_default(),
        version,
        description: string_field(info, "description"),
        contact,
        license: info
            .get("license")
            .and_then(|license| license.get("name"))
            .and_then(Value::as_str)
            .map(str::to_string),
    })
}

fn convert_path_item(path: &str, value: &Value) -> Result<PathItem> {
    let location = format!("#/paths/{}", path);
    let item = value
        .as_object()
        .ok_or_else(|| ContractLoadError::structure(&location, "path item must be a mapping"))?;

    let shared = match item.get("parameters") {
        Some(params) => convert_parameters(params, &location)?,
        None => Vec::new(),
    };

    let mut operations = Vec::new();
    for method in HttpMethod::ALL {
        let Some(op) = item.get(method.contract_key()) else {
            continue;
        };
        let op_location = format!("{}/{}", location, method.contract_key());
        operations.push(convert_operation(method, path, op, &shared, &op_location)?);
    }

    Ok(PathItem {
        path: path.to_string(),
        operations,
    })
}

fn convert_operation(
    method: HttpMethod,
    path: &str,
    value: &Value,
    shared: &[Parameter],
    location: &str,
) -> Result<Operation> {
    let op = value
        .as_object()
        .ok_or_else(|| ContractLoadError::structure(location, "operation must be a mapping"))?;

    let mut parameters = match op.get("parameters") {
        Some(params) => convert_parameters(params, location)?,
        None => Vec::new(),
    };
    // Operation-level parameters override path-level ones with the same name and location.
    for inherited in shared {
        let overridden = parameters
            .iter()
            .any(|p| p.name == inherited.name && p.location == inherited.location);
        if !overridden {
            parameters.push(inherited.clone());
        }
    }

    let request_body = op
        .get("requestBody")
        .and_then(Value::as_object)
        .map(|body| RequestBody {
            description: string_field(body, "description"),
            required: body.get("required").and_then(Value::as_bool).unwrap_or(false),
            content: convert_content(body.get("content")),
        });

    let mut responses = BTreeMap::new();
    match op.get("responses") {
        Some(Value::Object(map)) => {
            for (code, response) in map {
                let response = response.as_object();
                responses.insert(
                    code.clone(),
                    Response {
                        description: response.and_then(|r| string_field(r, "description")),
                        content: convert_content(response.and_then(|r| r.get("content"))),
                    },
                );
            }
        }
        Some(_) => {
            return Err(ContractLoadError::structure(
                format!("{}/responses", location),
                "must be a mapping",
            ));
        }
        None => {}
    }

    let security = match op.get("security") {
        Some(value) => Some(convert_security(value, &format!("{}/security", location))?),
        None => None,
    };

    Ok(Operation {
        method,
        path: path.to_string(),
        operation_id: string_field(op, "operationId"),
        summary: string_field(op, "summary"),
        description: string_field(op, "description"),
        tags: op
            .get("tags")
            .and_then(Value::as_array)
            .map(|tags| tags.iter().filter_map(Value::as_str).map(str::to_string).collect())
            .unwrap_or_default(),
        parameters,
        request_body,
        responses,
        security,
        deprecated: op.get("deprecated").and_then(Value::as_bool).unwrap_or(false),
    })
}

fn convert_parameters(value: &Value, location: &str) -> Result<Vec<Parameter>> {
    let params = value.as_array().ok_or_else(|| {
        ContractLoadError::structure(format!("{}/parameters", location), "must be a sequence")
    })?;

    params
        .iter()
        .enumerate()
        .map(|(index, param)| -> Result<Parameter> {
            let param_location = format!("{}/parameters/{}", location, index);
            let map = param.as_object().ok_or_else(|| {
                ContractLoadError::structure(&param_location, "parameter must be a mapping")
            })?;
            let name = string_field(map, "name").ok_or_else(|| {
                ContractLoadError::structure(&param_location, "parameter has no name")
            })?;
            let location_name = map.get("in").and_then(Value::as_str).unwrap_or_default();
            let param_in = ParameterLocation::parse(location_name).ok_or_else(|| {
                ContractLoadError::structure(
                    &param_location,
                    format!("invalid parameter location '{}'", location_name),
                )
            })?;

            Ok(Parameter {
                name,
                location: param_in,
                required: map.get("required").and_then(Value::as_bool).unwrap_or(false),
                description: string_field(map, "description"),
                schema: map.get("schema").map(convert_schema),
                example: literal_example(map),
            })
        })
        .collect()
}

fn convert_content(value: Option<&Value>) -> BTreeMap<String, MediaType> {
    let Some(Value::Object(content)) = value else {
        return BTreeMap::new();
    };
    content
        .iter()
        .map(|(media_type, media)| {
            let media_map = media.as_object();
            (
                media_type.clone(),
                MediaType {
                    schema: media.get("schema").map(convert_schema),
                    example: media_map.and_then(literal_example),
                },
            )
        })
        .collect()
}

/// `example`, or the value of the first entry in `examples`.
fn literal_example(map: &Map<String, Value>) -> Option<Value> {
    if let Some(example) = map.get("example") {
        return Some(example.clone());
    }
    map.get("examples")
        .and_then(Value::as_object)
        .and_then(|examples| examples.values().next())
        .and_then(|example| example.get("value"))
        .cloned()
}

fn convert_security_schemes(schemes: &Map<String, Value>) -> BTreeMap<String, SecurityScheme> {
    schemes
        .iter()
        .filter_map(|(name, scheme)| {
            let map = scheme.as_object()?;
            Some((
                name.clone(),
                SecurityScheme {
                    scheme_type: string_field(map, "type").unwrap_or_default(),
                    scheme: string_field(map, "scheme"),
                    name: string_field(map, "name"),
                    location: string_field(map, "in"),
                    description: string_field(map, "description"),
                },
            ))
        })
        .collect()
}

fn convert_security(value: &Value, location: &str) -> Result<Vec<SecurityRequirement>> {
    let requirements = value
        .as_array()
        .ok_or_else(|| ContractLoadError::structure(location, "must be a sequence"))?;

    Ok(requirements
        .iter()
        .filter_map(Value::as_object)
        .map(|requirement| {
            requirement
                .iter()
                .map(|(name, scopes)| {
                    let scopes = scopes
                        .as_array()
                        .map(|s| s.iter().filter_map(Value::as_str).map(str::to_string).collect())
                        .unwrap_or_default();
                    (name.clone(), scopes)
                })
                .collect()
        })
        .collect())
}

/// Converts a schema value into a [`SchemaNode`].
///
/// `allOf` members are merged into the node; for `oneOf`/`anyOf` the first
/// variant fills in whatever the node leaves unset.
pub fn convert_schema(value: &Value) -> SchemaNode {
    let Some(map) = value.as_object() else {
        return SchemaNode::default();
    };

    if let Some(reference) = map.get(RECURSIVE_REF_KEY).and_then(Value::as_str) {
        return SchemaNode {
            recursive_ref: Some(reference.to_string()),
            ..Default::default()
        };
    }

    let mut node = SchemaNode {
        schema_type: match map.get("type") {
            Some(Value::String(name)) => Some(SchemaType::parse(name)),
            Some(Value::Array(names)) => names
                .iter()
                .filter_map(Value::as_str)
                .find(|name| *name != "null")
                .map(SchemaType::parse),
            _ => None,
        },
        nullable: map.get("nullable").and_then(Value::as_bool).unwrap_or(false),
        format: string_field(map, "format"),
        enum_values: map
            .get("enum")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default(),
        minimum: map.get("minimum").and_then(Value::as_f64),
        maximum: map.get("maximum").and_then(Value::as_f64),
        exclusive_minimum: map.get("exclusiveMinimum").and_then(Value::as_bool).unwrap_or(false),
        exclusive_maximum: map.get("exclusiveMaximum").and_then(Value::as_bool).unwrap_or(false),
        min_length: map.get("minLength").and_then(Value::as_u64),
        max_length: map.get("maxLength").and_then(Value::as_u64),
        properties: map
            .get("properties")
            .and_then(Value::as_object)
            .map(|props| {
                props
                    .iter()
                    .map(|(name, schema)| (name.clone(), convert_schema(schema)))
                    .collect()
            })
            .unwrap_or_default(),
        required: map
            .get("required")
            .and_then(Value::as_array)
            .map(|names| names.iter().filter_map(Value::as_str).map(str::to_string).collect())
            .unwrap_or_default(),
        items: map.get("items").map(|items| Box::new(convert_schema(items))),
        example: map.get("example").cloned(),
        description: string_field(map, "description"),
        recursive_ref: None,
    };

    if let Some(Value::Array(members)) = map.get("allOf") {
        for member in members {
            merge_schema(&mut node, convert_schema(member));
        }
    }
    for key in ["oneOf", "anyOf"] {
        if let Some(first) = map.get(key).and_then(Value::as_array).and_then(|v| v.first()) {
            merge_schema(&mut node, convert_schema(first));
        }
    }
    node
}

/// Fills unset fields of `node` from `other` and unions object members.
fn merge_schema(node: &mut SchemaNode, other: SchemaNode) {
    if node.schema_type.is_none() {
        node.schema_type = other.schema_type;
    }
    node.nullable |= other.nullable;
    if node.format.is_none() {
        node.format = other.format;
    }
    if node.enum_values.is_empty() {
        node.enum_values = other.enum_values;
    }
    if node.minimum.is_none() {
        node.minimum = other.minimum;
        node.exclusive_minimum = other.exclusive_minimum;
    }
    if node.maximum.is_none() {
        node.maximum = other.maximum;
        node.exclusive_maximum = other.exclusive_maximum;
    }
    if node.min_length.is_none() {
        node.min_length = other.min_length;
    }
    if node.max_length.is_none() {
        node.max_length = other.max_length;
    }
    for (name, schema) in other.properties {
        node.properties.entry(name).or_insert(schema);
    }
    for name in other.required {
        if !node.required.contains(&name) {
            node.required.push(name);
        }
    }
    if node.items.is_none() {
        node.items = other.items;
    }
    if node.example.is_none() {
        node.example = other.example;
    }
    if node.description.is_none() {
        node.description = other.description;
    }
    if node.recursive_ref.is_none() && node.schema_type.is_none() {
        node.recursive_ref = other.recursive_ref;
    }
}

fn string_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key).and_then(Value::as_str).map(str::to_string)
}
