//! Builder pattern for creating contract models.
//!
//! This module provides ergonomic builders for constructing contracts,
//! operations, parameters and schemas with a fluent API. Loading from a
//! document goes through `driveby_parser`; the builders are for code and tests.

use crate::{
    ContractInfo, ContractModel, HttpMethod, MediaType, Operation, Parameter, ParameterLocation,
    PathItem, RequestBody, Response, SchemaNode, SchemaType, SecurityRequirement, SecurityScheme,
};
use serde_json::Value;
use std::collections::BTreeMap;

/// Builder for creating a `ContractModel`.
///
/// Operations are grouped into path items in the order their paths first
/// appear.
///
/// # Example
///
/// ```rust
/// use driveby_core::{ContractBuilder, HttpMethod, OperationBuilder};
///
/// let model = ContractBuilder::new("Widgets", "1.0.0")
///     .server("http://localhost:8080")
///     .operation(OperationBuilder::new(HttpMethod::Get, "/widgets").build())
///     .operation(OperationBuilder::new(HttpMethod::Post, "/widgets").build())
///     .build();
///
/// assert_eq!(model.paths.len(), 1);
/// assert_eq!(model.operation_count(), 2);
/// ```
#[derive(Debug, Default)]
pub struct ContractBuilder {
    openapi: String,
    info: ContractInfo,
    servers: Vec<String>,
    operations: Vec<Operation>,
    security_schemes: BTreeMap<String, SecurityScheme>,
    security: Option<Vec<SecurityRequirement>>,
    source: String,
}

impl ContractBuilder {
    /// Creates a new contract builder.
    ///
    /// # Arguments
    ///
    /// * `title` - API title
    /// * `version` - API version string
    pub fn new(title: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            openapi: "3.0.3".to_string(),
            info: ContractInfo {
                title: title.into(),
                version: version.into(),
                ..Default::default()
            },
            source: "<memory>".to_string(),
            ..Default::default()
        }
    }

    /// Sets the declared OpenAPI version.
    pub fn openapi(mut self, openapi: impl Into<String>) -> Self {
        self.openapi = openapi.into();
        self
    }

    /// Sets the API description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.info.description = Some(description.into());
        self
    }

    /// Adds a server URL.
    pub fn server(mut self, url: impl Into<String>) -> Self {
        self.servers.push(url.into());
        self
    }

    /// Sets the source descriptor.
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Declares a security scheme.
    pub fn security_scheme(mut self, name: impl Into<String>, scheme: SecurityScheme) -> Self {
        self.security_schemes.insert(name.into(), scheme);
        self
    }

    /// Declares a bearer HTTP security scheme and requires it globally.
    pub fn bearer_security(self, name: impl Into<String>) -> Self {
        let name = name.into();
        let scheme = SecurityScheme {
            scheme_type: "http".to_string(),
            scheme: Some("bearer".to_string()),
            name: None,
            location: None,
            description: None,
        };
        self.security_scheme(name.clone(), scheme)
            .security(vec![BTreeMap::from([(name, Vec::new())])])
    }

    /// Sets the global security requirements.
    pub fn security(mut self, security: Vec<SecurityRequirement>) -> Self {
        self.security = Some(security);
        self
    }

    /// Adds an operation.
    pub fn operation(mut self, operation: Operation) -> Self {
        self.operations.push(operation);
        self
    }

    /// Builds the contract model.
    pub fn build(self) -> ContractModel {
        let mut paths: Vec<PathItem> = Vec::new();
        for operation in self.operations {
            match paths.iter_mut().find(|item| item.path == operation.path) {
                Some(item) => item.operations.push(operation),
                None => paths.push(PathItem {
                    path: operation.path.clone(),
                    operations: vec![operation],
                }),
            }
        }

        ContractModel {
            openapi: self.openapi,
            info: self.info,
            servers: self.servers,
            paths,
            security_schemes: self.security_schemes,
            security: self.security,
            source: self.source,
        }
    }
}

/// Builder for creating an `Operation`.
///
/// # Example
///
/// ```rust
/// use driveby_core::{HttpMethod, OperationBuilder, ParameterBuilder, SchemaBuilder};
///
/// let op = OperationBuilder::new(HttpMethod::Get, "/widgets/{id}")
///     .summary("Get a widget")
///     .parameter(ParameterBuilder::path("id").schema(SchemaBuilder::string().format("uuid").build()).build())
///     .response("200", "The widget")
///     .response("404", "Not found")
///     .build();
///
/// assert!(op.has_error_response());
/// ```
#[derive(Debug)]
pub struct OperationBuilder {
    operation: Operation,
}

impl OperationBuilder {
    /// Creates a new operation builder.
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            operation: Operation {
                method,
                path: path.into(),
                operation_id: None,
                summary: None,
                description: None,
                tags: Vec::new(),
                parameters: Vec::new(),
                request_body: None,
                responses: BTreeMap::new(),
                security: None,
                deprecated: false,
            },
        }
    }

    /// Sets the operationId.
    pub fn operation_id(mut self, id: impl Into<String>) -> Self {
        self.operation.operation_id = Some(id.into());
        self
    }

    /// Sets the summary.
    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.operation.summary = Some(summary.into());
        self
    }

    /// Sets the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.operation.description = Some(description.into());
        self
    }

    /// Adds a tag.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.operation.tags.push(tag.into());
        self
    }

    /// Adds a parameter.
    pub fn parameter(mut self, parameter: Parameter) -> Self {
        self.operation.parameters.push(parameter);
        self
    }

    /// Sets a required JSON request body with the given schema.
    pub fn json_body(self, schema: SchemaNode) -> Self {
        self.request_body("application/json", schema)
    }

    /// Sets a required request body for a media type.
    pub fn request_body(mut self, media_type: impl Into<String>, schema: SchemaNode) -> Self {
        let body = self
            .operation
            .request_body
            .get_or_insert_with(|| RequestBody {
                required: true,
                ..Default::default()
            });
        body.content.insert(
            media_type.into(),
            MediaType {
                schema: Some(schema),
                example: None,
            },
        );
        self
    }

    /// Adds a response with a description.
    pub fn response(mut self, code: impl Into<String>, description: impl Into<String>) -> Self {
        self.operation
            .responses
            .insert(code.into(), Response::described(description));
        self
    }

    /// Adds a response with a JSON schema.
    pub fn json_response(
        mut self,
        code: impl Into<String>,
        description: impl Into<String>,
        schema: SchemaNode,
    ) -> Self {
        let mut response = Response::described(description);
        response.content.insert(
            "application/json".to_string(),
            MediaType {
                schema: Some(schema),
                example: None,
            },
        );
        self.operation.responses.insert(code.into(), response);
        self
    }

    /// Sets the operation-level security requirements.
    pub fn security(mut self, security: Vec<SecurityRequirement>) -> Self {
        self.operation.security = Some(security);
        self
    }

    /// Marks the operation deprecated.
    pub fn deprecated(mut self) -> Self {
        self.operation.deprecated = true;
        self
    }

    /// Builds the operation.
    pub fn build(self) -> Operation {
        self.operation
    }
}

/// Builder for creating a `Parameter`.
#[derive(Debug)]
pub struct ParameterBuilder {
    parameter: Parameter,
}

impl ParameterBuilder {
    /// Creates a parameter at the given location.
    ///
    /// Path parameters start out required.
    pub fn new(name: impl Into<String>, location: ParameterLocation) -> Self {
        Self {
            parameter: Parameter {
                name: name.into(),
                location,
                required: location == ParameterLocation::Path,
                description: None,
                schema: None,
                example: None,
            },
        }
    }

    /// Path parameter.
    pub fn path(name: impl Into<String>) -> Self {
        Self::new(name, ParameterLocation::Path)
    }

    /// Query parameter.
    pub fn query(name: impl Into<String>) -> Self {
        Self::new(name, ParameterLocation::Query)
    }

    /// Header parameter.
    pub fn header(name: impl Into<String>) -> Self {
        Self::new(name, ParameterLocation::Header)
    }

    /// Sets whether the parameter is required.
    pub fn required(mut self, required: bool) -> Self {
        self.parameter.required = required;
        self
    }

    /// Sets the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.parameter.description = Some(description.into());
        self
    }

    /// Sets the schema.
    pub fn schema(mut self, schema: SchemaNode) -> Self {
        self.parameter.schema = Some(schema);
        self
    }

    /// Sets a parameter-level example.
    pub fn example(mut self, example: Value) -> Self {
        self.parameter.example = Some(example);
        self
    }

    /// Builds the parameter.
    pub fn build(self) -> Parameter {
        self.parameter
    }
}

/// Builder for creating a `SchemaNode`.
///
/// # Example
///
/// ```rust
/// use driveby_core::SchemaBuilder;
///
/// let schema = SchemaBuilder::object()
///     .property("id", SchemaBuilder::string().format("uuid").build())
///     .property("count", SchemaBuilder::integer().minimum(0.0).build())
///     .required_property("id")
///     .build();
///
/// assert_eq!(schema.properties.len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    node: SchemaNode,
}

impl SchemaBuilder {
    /// Creates a schema of the given type.
    pub fn new(schema_type: SchemaType) -> Self {
        Self {
            node: SchemaNode::of_type(schema_type),
        }
    }

    /// Creates a schema with no declared type.
    pub fn untyped() -> Self {
        Self::default()
    }

    pub fn string() -> Self {
        Self::new(SchemaType::String)
    }

    pub fn integer() -> Self {
        Self::new(SchemaType::Integer)
    }

    pub fn number() -> Self {
        Self::new(SchemaType::Number)
    }

    pub fn boolean() -> Self {
        Self::new(SchemaType::Boolean)
    }

    pub fn object() -> Self {
        Self::new(SchemaType::Object)
    }

    /// Array of the given item schema.
    pub fn array(items: SchemaNode) -> Self {
        let mut builder = Self::new(SchemaType::Array);
        builder.node.items = Some(Box::new(items));
        builder
    }

    /// Sets the format.
    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.node.format = Some(format.into());
        self
    }

    /// Sets the allowed values.
    pub fn enum_values(mut self, values: Vec<Value>) -> Self {
        self.node.enum_values = values;
        self
    }

    /// Sets a literal example.
    pub fn example(mut self, example: Value) -> Self {
        self.node.example = Some(example);
        self
    }

    /// Sets the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.node.description = Some(description.into());
        self
    }

    /// Marks the schema nullable.
    pub fn nullable(mut self) -> Self {
        self.node.nullable = true;
        self
    }

    pub fn minimum(mut self, minimum: f64) -> Self {
        self.node.minimum = Some(minimum);
        self
    }

    pub fn maximum(mut self, maximum: f64) -> Self {
        self.node.maximum = Some(maximum);
        self
    }

    pub fn min_length(mut self, min_length: u64) -> Self {
        self.node.min_length = Some(min_length);
        self
    }

    pub fn max_length(mut self, max_length: u64) -> Self {
        self.node.max_length = Some(max_length);
        self
    }

    /// Adds an object property.
    pub fn property(mut self, name: impl Into<String>, schema: SchemaNode) -> Self {
        self.node.properties.insert(name.into(), schema);
        self
    }

    /// Marks a property as required.
    pub fn required_property(mut self, name: impl Into<String>) -> Self {
        self.node.required.push(name.into());
        self
    }

    /// Builds the schema.
    pub fn build(self) -> SchemaNode {
        self.node
    }
}
