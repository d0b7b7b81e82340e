//! Example value synthesis.
//!
//! Maps a schema node to one representative value of its shape. The mapping
//! is pure: the same schema always yields byte-identical output, which keeps
//! functional runs reproducible.

use driveby_core::{Parameter, RequestBody, SchemaNode, SchemaType};
use serde_json::{Map, Value};

/// Placeholder for strings without a known format and for untyped schemas.
pub const PLACEHOLDER_STRING: &str = "example string";

/// Canonical `date` value.
pub const CANONICAL_DATE: &str = "2024-01-01";

/// Canonical `date-time` value.
pub const CANONICAL_DATE_TIME: &str = "2024-01-01T00:00:00Z";

/// Canonical `email` value.
pub const CANONICAL_EMAIL: &str = "example@example.com";

/// Canonical `uuid` value.
pub const CANONICAL_UUID: &str = "123e4567-e89b-12d3-a456-426614174000";

/// Canonical numeric value for `number` and `integer`.
pub const CANONICAL_NUMBER: i64 = 42;

/// Synthesizes a representative value for a schema.
///
/// A literal `example` wins, then the first `enum` member, then a value
/// derived from the declared type. Bounds are not honoured. A node that
/// closes a reference cycle yields the placeholder string.
///
/// # Example
///
/// ```rust
/// use driveby_core::SchemaBuilder;
/// use driveby_validator::synthesize;
/// use serde_json::json;
///
/// let schema = SchemaBuilder::object()
///     .property("id", SchemaBuilder::string().format("uuid").build())
///     .property("tags", SchemaBuilder::array(SchemaBuilder::string().build()).build())
///     .build();
///
/// assert_eq!(
///     synthesize(&schema),
///     json!({"id": "123e4567-e89b-12d3-a456-426614174000", "tags": ["example string"]})
/// );
/// ```
pub fn synthesize(schema: &SchemaNode) -> Value {
    if let Some(example) = &schema.example {
        return example.clone();
    }
    if let Some(first) = schema.enum_values.first() {
        return first.clone();
    }
    if schema.recursive_ref.is_some() {
        return Value::from(PLACEHOLDER_STRING);
    }

    match &schema.schema_type {
        Some(SchemaType::String) => synthesize_string(schema.format.as_deref()),
        Some(SchemaType::Number) | Some(SchemaType::Integer) => Value::from(CANONICAL_NUMBER),
        Some(SchemaType::Boolean) => Value::Bool(true),
        Some(SchemaType::Array) => match &schema.items {
            Some(items) => Value::Array(vec![synthesize(items)]),
            None => Value::Array(Vec::new()),
        },
        Some(SchemaType::Object) => {
            let object: Map<String, Value> = schema
                .properties
                .iter()
                .map(|(name, property)| (name.clone(), synthesize(property)))
                .collect();
            Value::Object(object)
        }
        Some(SchemaType::Other(_)) | None => Value::from(PLACEHOLDER_STRING),
    }
}

fn synthesize_string(format: Option<&str>) -> Value {
    let literal = match format {
        Some("date") => CANONICAL_DATE,
        Some("date-time") => CANONICAL_DATE_TIME,
        Some("email") => CANONICAL_EMAIL,
        Some("uuid") => CANONICAL_UUID,
        _ => PLACEHOLDER_STRING,
    };
    Value::from(literal)
}

/// Value for a parameter: its own example, else its schema's synthesized
/// value, else the placeholder string.
pub fn parameter_value(parameter: &Parameter) -> Value {
    if let Some(example) = &parameter.example {
        return example.clone();
    }
    parameter
        .schema
        .as_ref()
        .map(synthesize)
        .unwrap_or_else(|| Value::from(PLACEHOLDER_STRING))
}

/// Body for a request: the first JSON-compatible media type with a schema,
/// using its media-level example when present.
///
/// Returns the chosen media type and the body value.
pub fn request_body_example(body: &RequestBody) -> Option<(String, Value)> {
    let (media_type, media) = body.json_media()?;
    let value = match &media.example {
        Some(example) => example.clone(),
        None => synthesize(media.schema.as_ref()?),
    };
    Some((media_type.to_string(), value))
}

/// Renders a value for a path segment or header.
///
/// Strings are used raw, arrays are comma-joined and objects JSON-encoded.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Bool(_) | Value::Number(_) => value.to_string(),
        Value::Array(items) => items
            .iter()
            .map(render_value)
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => value.to_string(),
    }
}

/// Renders a value for a query string; arrays become repeated pairs.
pub fn render_query_values(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().map(render_value).collect(),
        other => vec![render_value(other)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use driveby_core::{MediaType, ParameterBuilder, SchemaBuilder};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_literal_example_wins() {
        let schema = SchemaBuilder::string()
            .format("uuid")
            .enum_values(vec![json!("a")])
            .example(json!("author-value"))
            .build();
        assert_eq!(synthesize(&schema), json!("author-value"));
    }

    #[test]
    fn test_enum_before_type() {
        let schema = SchemaBuilder::integer()
            .enum_values(vec![json!(7), json!(9)])
            .build();
        assert_eq!(synthesize(&schema), json!(7));
    }

    #[test]
    fn test_string_formats() {
        let cases = [
            ("date", CANONICAL_DATE),
            ("date-time", CANONICAL_DATE_TIME),
            ("email", CANONICAL_EMAIL),
            ("uuid", CANONICAL_UUID),
            ("hostname", PLACEHOLDER_STRING),
        ];
        for (format, expected) in cases {
            let schema = SchemaBuilder::string().format(format).build();
            assert_eq!(synthesize(&schema), json!(expected), "format {}", format);
        }
        assert_eq!(
            synthesize(&SchemaBuilder::string().build()),
            json!(PLACEHOLDER_STRING)
        );
    }

    #[test]
    fn test_scalar_types() {
        assert_eq!(synthesize(&SchemaBuilder::integer().minimum(100.0).build()), json!(42));
        assert_eq!(synthesize(&SchemaBuilder::number().build()), json!(42));
        assert_eq!(synthesize(&SchemaBuilder::boolean().build()), json!(true));
    }

    #[test]
    fn test_untyped_and_unknown_fall_back_to_string() {
        assert_eq!(synthesize(&SchemaBuilder::untyped().build()), json!(PLACEHOLDER_STRING));
        let unknown = SchemaBuilder::new(SchemaType::Other("file".to_string())).build();
        assert_eq!(synthesize(&unknown), json!(PLACEHOLDER_STRING));
    }

    #[test]
    fn test_arrays_and_objects() {
        assert_eq!(synthesize(&SchemaBuilder::new(SchemaType::Array).build()), json!([]));
        assert_eq!(synthesize(&SchemaBuilder::object().build()), json!({}));

        let nested = SchemaBuilder::object()
            .property(
                "owner",
                SchemaBuilder::object()
                    .property("email", SchemaBuilder::string().format("email").build())
                    .build(),
            )
            .property("scores", SchemaBuilder::array(SchemaBuilder::number().build()).build())
            .build();
        assert_eq!(
            synthesize(&nested),
            json!({"owner": {"email": CANONICAL_EMAIL}, "scores": [42]})
        );
    }

    #[test]
    fn test_recursive_node_yields_placeholder() {
        let node = SchemaNode {
            recursive_ref: Some("#/components/schemas/Node".to_string()),
            ..Default::default()
        };
        let schema = SchemaBuilder::object().property("child", node).build();
        assert_eq!(synthesize(&schema), json!({"child": PLACEHOLDER_STRING}));
    }

    #[test]
    fn test_synthesis_is_deterministic() {
        let schema = SchemaBuilder::object()
            .property("z", SchemaBuilder::string().format("date").build())
            .property("a", SchemaBuilder::array(SchemaBuilder::boolean().build()).build())
            .property("m", SchemaBuilder::integer().build())
            .build();
        let first = serde_json::to_vec(&synthesize(&schema)).unwrap();
        let second = serde_json::to_vec(&synthesize(&schema)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_parameter_value_precedence() {
        let with_example = ParameterBuilder::query("limit")
            .schema(SchemaBuilder::integer().build())
            .example(json!(5))
            .build();
        assert_eq!(parameter_value(&with_example), json!(5));

        let schema_only = ParameterBuilder::path("id")
            .schema(SchemaBuilder::string().format("uuid").build())
            .build();
        assert_eq!(parameter_value(&schema_only), json!(CANONICAL_UUID));

        let bare = ParameterBuilder::header("X-Trace").build();
        assert_eq!(parameter_value(&bare), json!(PLACEHOLDER_STRING));
    }

    #[test]
    fn test_request_body_example() {
        let mut body = RequestBody::default();
        body.content.insert(
            "application/json".to_string(),
            MediaType {
                schema: Some(SchemaBuilder::object().property("n", SchemaBuilder::integer().build()).build()),
                example: None,
            },
        );
        assert_eq!(
            request_body_example(&body),
            Some(("application/json".to_string(), json!({"n": 42})))
        );

        body.content.get_mut("application/json").unwrap().example = Some(json!({"n": 1}));
        assert_eq!(request_body_example(&body).unwrap().1, json!({"n": 1}));

        let mut form = RequestBody::default();
        form.content.insert(
            "multipart/form-data".to_string(),
            MediaType {
                schema: Some(SchemaBuilder::object().build()),
                example: None,
            },
        );
        assert_eq!(request_body_example(&form), None);
    }

    #[test]
    fn test_render_values() {
        assert_eq!(render_value(&json!("abc")), "abc");
        assert_eq!(render_value(&json!(42)), "42");
        assert_eq!(render_value(&json!(["a", 1])), "a,1");
        assert_eq!(render_value(&json!({"k": "v"})), r#"{"k":"v"}"#);
        assert_eq!(render_query_values(&json!(["a", "b"])), vec!["a", "b"]);
        assert_eq!(render_query_values(&json!(true)), vec!["true"]);
    }
}
