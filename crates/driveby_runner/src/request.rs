//! Request construction from contract operations.
//!
//! Path parameters are substituted into the template, query and header
//! parameters attached, and an optional JSON body synthesized. Cookie
//! parameters are not sent.

use driveby_core::{HttpMethod, Operation, ParameterLocation, TransportError};
use driveby_validator::{
    PLACEHOLDER_STRING, parameter_value, render_query_values, render_value, request_body_example,
};
use reqwest::{Method, Url};
use tracing::debug;

/// A fully built outbound request.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestPlan {
    pub method: Method,
    pub url: Url,
    /// Header name/value pairs, in attachment order
    pub headers: Vec<(String, String)>,
    /// Content type and encoded body
    pub body: Option<(String, Vec<u8>)>,
}

/// Parses and checks a base URL.
pub fn parse_base_url(base_url: &str) -> Result<Url, TransportError> {
    let url = Url::parse(base_url).map_err(|e| TransportError::InvalidUrl {
        url: base_url.to_string(),
        message: e.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(TransportError::InvalidUrl {
            url: base_url.to_string(),
            message: "URL cannot be used as a base".to_string(),
        });
    }
    Ok(url)
}

pub fn to_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Post => Method::POST,
        HttpMethod::Delete => Method::DELETE,
        HttpMethod::Options => Method::OPTIONS,
        HttpMethod::Head => Method::HEAD,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Trace => Method::TRACE,
    }
}

/// Builds the request for an operation.
///
/// # Arguments
///
/// * `base_url` - Base URL the path template is appended to
/// * `operation` - Operation to invoke
/// * `with_body` - Whether to synthesize a request body when one is declared
///
/// # Example
///
/// ```rust
/// use driveby_core::{HttpMethod, OperationBuilder, ParameterBuilder, SchemaBuilder};
/// use driveby_runner::{build_request_plan, parse_base_url};
///
/// let op = OperationBuilder::new(HttpMethod::Get, "/widgets/{id}")
///     .parameter(ParameterBuilder::path("id").schema(SchemaBuilder::string().format("uuid").build()).build())
///     .response("200", "OK")
///     .build();
///
/// let base = parse_base_url("http://localhost:8080").unwrap();
/// let plan = build_request_plan(&base, &op, true).unwrap();
/// assert_eq!(
///     plan.url.as_str(),
///     "http://localhost:8080/widgets/123e4567-e89b-12d3-a456-426614174000"
/// );
/// ```
pub fn build_request_plan(
    base_url: &Url,
    operation: &Operation,
    with_body: bool,
) -> Result<RequestPlan, TransportError> {
    let mut url = base_url.clone();
    url.set_fragment(None);
    {
        let mut segments = url.path_segments_mut().map_err(|_| TransportError::InvalidUrl {
            url: base_url.to_string(),
            message: "URL cannot be used as a base".to_string(),
        })?;
        segments.pop_if_empty();
        for segment in operation.path.split('/').filter(|s| !s.is_empty()) {
            segments.push(&substitute_placeholders(segment, operation));
        }
    }

    let query: Vec<(String, String)> = operation
        .parameters_in(ParameterLocation::Query)
        .flat_map(|param| {
            render_query_values(&parameter_value(param))
                .into_iter()
                .map(|value| (param.name.clone(), value))
                .collect::<Vec<_>>()
        })
        .collect();
    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query);
    }

    let mut headers = vec![("Accept".to_string(), "application/json".to_string())];
    headers.extend(
        operation
            .parameters_in(ParameterLocation::Header)
            .map(|param| (param.name.clone(), render_value(&parameter_value(param)))),
    );
    for param in operation.parameters_in(ParameterLocation::Cookie) {
        debug!(
            endpoint = %operation.endpoint_id(),
            parameter = %param.name,
            "Skipping cookie parameter"
        );
    }

    let body = match operation.request_body.as_ref().filter(|_| with_body) {
        Some(declared) => match request_body_example(declared) {
            Some((content_type, value)) => {
                let bytes = serde_json::to_vec(&value)
                    .map_err(|e| TransportError::Request(format!("Failed to encode body: {}", e)))?;
                Some((content_type, bytes))
            }
            None => None,
        },
        None => None,
    };

    Ok(RequestPlan {
        method: to_method(operation.method),
        url,
        headers,
        body,
    })
}

/// Replaces every `{name}` in a path segment with the rendered parameter value.
fn substitute_placeholders(segment: &str, operation: &Operation) -> String {
    let mut rendered = String::with_capacity(segment.len());
    let mut rest = segment;
    while let Some(start) = rest.find('{') {
        let Some(end) = rest[start..].find('}') else {
            break;
        };
        let name = &rest[start + 1..start + end];
        rendered.push_str(&rest[..start]);
        let value = operation
            .parameters_in(ParameterLocation::Path)
            .find(|param| param.name == name)
            .map(|param| render_value(&parameter_value(param)))
            .unwrap_or_else(|| PLACEHOLDER_STRING.to_string());
        rendered.push_str(&value);
        rest = &rest[start + end + 1..];
    }
    rendered.push_str(rest);
    rendered
}
