//! API contract types and structures.
//!
//! This module contains the normalized, fully resolved in-memory form of an
//! OpenAPI document: paths, operations, parameters, schemas, responses and
//! security requirements. Every `$ref` has already been resolved by the time a
//! [`ContractModel`] exists.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// A parsed and normalized API contract.
///
/// The model is treated as immutable by every phase of a run. Auto-fixes work
/// on a cloned copy, never on the model handed to the executors.
///
/// # Example
///
/// ```rust
/// use driveby_core::{ContractBuilder, HttpMethod, OperationBuilder};
///
/// let model = ContractBuilder::new("Widgets", "1.0.0")
///     .operation(OperationBuilder::new(HttpMethod::Get, "/widgets").response("200", "OK").build())
///     .build();
///
/// assert_eq!(model.operation_count(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractModel {
    /// Declared OpenAPI version (e.g., "3.0.3")
    pub openapi: String,

    /// Contract metadata
    pub info: ContractInfo,

    /// Server URLs declared by the contract, in declaration order
    #[serde(default)]
    pub servers: Vec<String>,

    /// Path items in declaration order
    pub paths: Vec<PathItem>,

    /// Security schemes declared under `components.securitySchemes`
    #[serde(default)]
    pub security_schemes: BTreeMap<String, SecurityScheme>,

    /// Global security requirements; `None` when the contract declares none
    #[serde(default)]
    pub security: Option<Vec<SecurityRequirement>>,

    /// Where the contract was loaded from (file path or URL)
    #[serde(default)]
    pub source: String,
}

impl ContractModel {
    /// Iterates every operation in path order, then method order.
    pub fn operations(&self) -> impl Iterator<Item = &Operation> {
        self.paths.iter().flat_map(|item| item.operations.iter())
    }

    /// Iterates every operation mutably.
    pub fn operations_mut(&mut self) -> impl Iterator<Item = &mut Operation> {
        self.paths.iter_mut().flat_map(|item| item.operations.iter_mut())
    }

    /// Total number of operations in the contract.
    pub fn operation_count(&self) -> usize {
        self.paths.iter().map(|item| item.operations.len()).sum()
    }

    /// Finds an operation by method and path template.
    pub fn find_operation(&self, method: HttpMethod, path: &str) -> Option<&Operation> {
        self.operations()
            .find(|op| op.method == method && op.path == path)
    }

    /// Finds an operation mutably by method and path template.
    pub fn find_operation_mut(&mut self, method: HttpMethod, path: &str) -> Option<&mut Operation> {
        self.operations_mut()
            .find(|op| op.method == method && op.path == path)
    }

    /// Whether any security requirement applies globally.
    ///
    /// An empty global list (`security: []`) counts as no requirement.
    pub fn has_global_security(&self) -> bool {
        self.security
            .as_ref()
            .is_some_and(|requirements| !requirements.is_empty())
    }
}

/// Contract metadata from the `info` object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContractInfo {
    /// API title
    pub title: String,

    /// API version string
    pub version: String,

    /// General API description
    #[serde(default)]
    pub description: Option<String>,

    /// Contact name, URL or email
    #[serde(default)]
    pub contact: Option<String>,

    /// License name
    #[serde(default)]
    pub license: Option<String>,
}

/// All operations declared under one path template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathItem {
    /// Path template (e.g., "/widgets/{id}")
    pub path: String,

    /// Operations in canonical method order
    pub operations: Vec<Operation>,
}

/// HTTP methods an operation can be declared under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Put,
    Post,
    Delete,
    Options,
    Head,
    Patch,
    Trace,
}

impl HttpMethod {
    /// All methods in the order path items are scanned.
    pub const ALL: [HttpMethod; 8] = [
        HttpMethod::Get,
        HttpMethod::Put,
        HttpMethod::Post,
        HttpMethod::Delete,
        HttpMethod::Options,
        HttpMethod::Head,
        HttpMethod::Patch,
        HttpMethod::Trace,
    ];

    /// Upper-case method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Put => "PUT",
            HttpMethod::Post => "POST",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Head => "HEAD",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Trace => "TRACE",
        }
    }

    /// Lower-case key used by OpenAPI path items.
    pub fn contract_key(&self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Put => "put",
            HttpMethod::Post => "post",
            HttpMethod::Delete => "delete",
            HttpMethod::Options => "options",
            HttpMethod::Head => "head",
            HttpMethod::Patch => "patch",
            HttpMethod::Trace => "trace",
        }
    }

    /// Parses a method name, case-insensitively.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|method| method.as_str().eq_ignore_ascii_case(name.trim()))
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single (method, path) operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    /// HTTP method
    pub method: HttpMethod,

    /// Path template the operation belongs to
    pub path: String,

    /// Optional operationId
    #[serde(default)]
    pub operation_id: Option<String>,

    /// Short summary
    #[serde(default)]
    pub summary: Option<String>,

    /// Long description
    #[serde(default)]
    pub description: Option<String>,

    /// Tags for grouping
    #[serde(default)]
    pub tags: Vec<String>,

    /// Parameters, with path-level parameters already merged in
    #[serde(default)]
    pub parameters: Vec<Parameter>,

    /// Optional request body
    #[serde(default)]
    pub request_body: Option<RequestBody>,

    /// Responses keyed by status code, status range ("4XX") or "default"
    #[serde(default)]
    pub responses: BTreeMap<String, Response>,

    /// Operation-level security; `Some(vec![])` explicitly opts out
    #[serde(default)]
    pub security: Option<Vec<SecurityRequirement>>,

    /// Whether the operation is deprecated
    #[serde(default)]
    pub deprecated: bool,
}

impl Operation {
    /// Stable "METHOD /path" identifier used in reports.
    pub fn endpoint_id(&self) -> String {
        format!("{} {}", self.method, self.path)
    }

    /// Parameters declared at the given location.
    pub fn parameters_in(&self, location: ParameterLocation) -> impl Iterator<Item = &Parameter> {
        self.parameters
            .iter()
            .filter(move |param| param.location == location)
    }

    /// Whether a concrete status code is documented, either exactly or by
    /// its range key (e.g., "4XX"). The "default" key does not count.
    pub fn documents_status(&self, status: u16) -> bool {
        let exact = status.to_string();
        if self.responses.contains_key(&exact) {
            return true;
        }
        let range = format!("{}XX", status / 100);
        self.responses
            .keys()
            .any(|key| key.eq_ignore_ascii_case(&range))
    }

    /// Whether at least one 4xx or 5xx response is documented.
    pub fn has_error_response(&self) -> bool {
        self.responses.keys().any(|key| is_error_status_key(key))
    }
}

/// Whether a response key denotes a 4xx/5xx status or status range.
pub fn is_error_status_key(key: &str) -> bool {
    let bytes = key.as_bytes();
    if bytes.len() != 3 || !matches!(bytes[0], b'4' | b'5') {
        return false;
    }
    let rest = &key[1..];
    rest.eq_ignore_ascii_case("XX") || rest.bytes().all(|b| b.is_ascii_digit())
}

/// Location of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Cookie,
}

impl ParameterLocation {
    /// Parses the OpenAPI `in` value.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "path" => Some(ParameterLocation::Path),
            "query" => Some(ParameterLocation::Query),
            "header" => Some(ParameterLocation::Header),
            "cookie" => Some(ParameterLocation::Cookie),
            _ => None,
        }
    }
}

impl fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParameterLocation::Path => "path",
            ParameterLocation::Query => "query",
            ParameterLocation::Header => "header",
            ParameterLocation::Cookie => "cookie",
        };
        f.write_str(name)
    }
}

/// An operation parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name
    pub name: String,

    /// Where the parameter is sent
    pub location: ParameterLocation,

    /// Whether the parameter is required
    #[serde(default)]
    pub required: bool,

    /// Human-readable description
    #[serde(default)]
    pub description: Option<String>,

    /// Parameter schema, if any
    #[serde(default)]
    pub schema: Option<SchemaNode>,

    /// Parameter-level literal example
    #[serde(default)]
    pub example: Option<Value>,
}

/// A request body declaration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestBody {
    /// Human-readable description
    #[serde(default)]
    pub description: Option<String>,

    /// Whether the body is required
    #[serde(default)]
    pub required: bool,

    /// Content keyed by media type
    #[serde(default)]
    pub content: BTreeMap<String, MediaType>,
}

impl RequestBody {
    /// First JSON-compatible media type with a schema.
    ///
    /// `application/json` wins. Otherwise the lexicographically first `+json`
    /// or `/json` media type is taken, so the pick does not depend on the
    /// order the contract lists them in.
    pub fn json_media(&self) -> Option<(&str, &MediaType)> {
        if let Some(media) = self.content.get("application/json") {
            if media.schema.is_some() {
                return Some(("application/json", media));
            }
        }
        self.content
            .iter()
            .find(|(key, media)| is_json_media_type(key) && media.schema.is_some())
            .map(|(key, media)| (key.as_str(), media))
    }
}

/// Whether a media type carries JSON.
pub fn is_json_media_type(media_type: &str) -> bool {
    let essence = media_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || essence.ends_with("+json") || essence.ends_with("/json")
}

/// A media type entry of a request body or response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaType {
    /// Content schema
    #[serde(default)]
    pub schema: Option<SchemaNode>,

    /// Media-level example (`example`, or first entry of `examples`)
    #[serde(default)]
    pub example: Option<Value>,
}

impl MediaType {
    /// Whether an author-supplied example exists at media or schema level.
    pub fn has_example(&self) -> bool {
        self.example.is_some()
            || self
                .schema
                .as_ref()
                .is_some_and(|schema| schema.example.is_some())
    }
}

/// A documented response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Response description
    #[serde(default)]
    pub description: Option<String>,

    /// Content keyed by media type
    #[serde(default)]
    pub content: BTreeMap<String, MediaType>,
}

impl Response {
    /// Creates a response with only a description.
    pub fn described(description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            content: BTreeMap::new(),
        }
    }

    /// Whether the description is present and non-blank.
    pub fn has_description(&self) -> bool {
        self.description
            .as_deref()
            .is_some_and(|text| !text.trim().is_empty())
    }
}

/// Declared schema type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
    /// A type name outside the known set
    #[serde(untagged)]
    Other(String),
}

impl SchemaType {
    /// Maps an OpenAPI type name.
    pub fn parse(name: &str) -> Self {
        match name {
            "string" => SchemaType::String,
            "number" => SchemaType::Number,
            "integer" => SchemaType::Integer,
            "boolean" => SchemaType::Boolean,
            "array" => SchemaType::Array,
            "object" => SchemaType::Object,
            other => SchemaType::Other(other.to_string()),
        }
    }

    /// Whether the type is numeric.
    pub fn is_numeric(&self) -> bool {
        matches!(self, SchemaType::Number | SchemaType::Integer)
    }
}

/// A recursive schema node.
///
/// Type unions with `null` have been collapsed into a single type plus the
/// `nullable` flag during normalization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaNode {
    /// Declared type; `None` when undeclared
    #[serde(default, rename = "type")]
    pub schema_type: Option<SchemaType>,

    /// Whether `null` is allowed
    #[serde(default)]
    pub nullable: bool,

    /// Declared format (e.g., "uuid", "date-time")
    #[serde(default)]
    pub format: Option<String>,

    /// Allowed values, in declaration order
    #[serde(default, rename = "enum")]
    pub enum_values: Vec<Value>,

    /// Numeric lower bound
    #[serde(default)]
    pub minimum: Option<f64>,

    /// Numeric upper bound
    #[serde(default)]
    pub maximum: Option<f64>,

    /// Whether `minimum` is exclusive
    #[serde(default)]
    pub exclusive_minimum: bool,

    /// Whether `maximum` is exclusive
    #[serde(default)]
    pub exclusive_maximum: bool,

    /// String minimum length
    #[serde(default)]
    pub min_length: Option<u64>,

    /// String maximum length
    #[serde(default)]
    pub max_length: Option<u64>,

    /// Object properties
    #[serde(default)]
    pub properties: BTreeMap<String, SchemaNode>,

    /// Required property names
    #[serde(default)]
    pub required: Vec<String>,

    /// Array item schema
    #[serde(default)]
    pub items: Option<Box<SchemaNode>>,

    /// Author-supplied literal example
    #[serde(default)]
    pub example: Option<Value>,

    /// Schema description
    #[serde(default)]
    pub description: Option<String>,

    /// Set when this node closes a reference cycle; holds the `$ref` target
    #[serde(default)]
    pub recursive_ref: Option<String>,
}

impl SchemaNode {
    /// Creates a node of the given type.
    pub fn of_type(schema_type: SchemaType) -> Self {
        Self {
            schema_type: Some(schema_type),
            ..Default::default()
        }
    }

    /// Whether the node declares numeric bounds.
    pub fn has_numeric_bounds(&self) -> bool {
        self.minimum.is_some() || self.maximum.is_some()
    }

    /// Whether the node declares string length bounds.
    pub fn has_length_bounds(&self) -> bool {
        self.min_length.is_some() || self.max_length.is_some()
    }
}

/// A declared security scheme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityScheme {
    /// Scheme type ("http", "apiKey", "oauth2", "openIdConnect")
    pub scheme_type: String,

    /// HTTP auth scheme for `http` schemes (e.g., "bearer")
    #[serde(default)]
    pub scheme: Option<String>,

    /// Header/query/cookie name for `apiKey` schemes
    #[serde(default)]
    pub name: Option<String>,

    /// Location for `apiKey` schemes
    #[serde(default)]
    pub location: Option<String>,

    /// Scheme description
    #[serde(default)]
    pub description: Option<String>,
}

/// A security requirement: scheme name to required scopes.
pub type SecurityRequirement = BTreeMap<String, Vec<String>>;
