//! Error types for contract loading, rule evaluation and transport.
//!
//! Only [`ContractLoadError`] ever aborts a run. Rule evaluation and
//! transport errors are captured and recorded as data inside the report.

use std::time::Duration;
use thiserror::Error;

/// Result type for contract loading.
pub type Result<T> = std::result::Result<T, ContractLoadError>;

/// Fatal error raised while loading a contract.
#[derive(Error, Debug)]
pub enum ContractLoadError {
    /// The contract source could not be fetched
    #[error("Contract source '{source_name}' is unreachable: {message}")]
    Unreachable {
        /// Path or URL that was requested
        source_name: String,
        /// Failure details
        message: String,
    },

    /// Local file could not be read
    #[error("Failed to read contract file: {0}")]
    Io(#[from] std::io::Error),

    /// Contract bytes are not valid JSON or YAML
    #[error("Failed to parse contract: {0}")]
    Parse(String),

    /// A required top-level field is missing
    #[error("Missing required field: {0}")]
    MissingField(String),

    /// The document shape is not a valid contract
    #[error("Invalid contract structure at '{location}': {message}")]
    InvalidStructure {
        /// JSON pointer or dotted location of the problem
        location: String,
        /// Description of the problem
        message: String,
    },

    /// A `$ref` could not be resolved
    #[error("Unresolved reference '{reference}'")]
    UnresolvedReference {
        /// The reference as written in the contract
        reference: String,
    },

    /// The contract declares no operations
    #[error("Contract declares no operations")]
    NoOperations,
}

impl ContractLoadError {
    /// Creates a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        ContractLoadError::Parse(message.into())
    }

    /// Creates a structure error.
    pub fn structure(location: impl Into<String>, message: impl Into<String>) -> Self {
        ContractLoadError::InvalidStructure {
            location: location.into(),
            message: message.into(),
        }
    }

    /// Creates an unreachable-source error.
    pub fn unreachable(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        ContractLoadError::Unreachable {
            source_name: source_name.into(),
            message: message.into(),
        }
    }
}

/// Error raised inside a rule's evaluation or fix.
///
/// The rule engine downgrades these to failing results; they never escape a run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuleEvaluationError {
    /// The rule hit a contract shape it cannot evaluate
    #[error("Rule '{rule}' failed: {message}")]
    Failed {
        /// Rule identifier
        rule: String,
        /// Failure details
        message: String,
    },

    /// The rule panicked during evaluation
    #[error("Rule '{rule}' panicked: {message}")]
    Panicked {
        /// Rule identifier
        rule: String,
        /// Panic payload, when it was a string
        message: String,
    },

    /// A fix was requested for a rule that has none
    #[error("Rule '{0}' is not auto-fixable")]
    NotFixable(String),
}

impl RuleEvaluationError {
    /// Creates a failure for the given rule.
    pub fn failed(rule: impl Into<String>, message: impl Into<String>) -> Self {
        RuleEvaluationError::Failed {
            rule: rule.into(),
            message: message.into(),
        }
    }
}

/// Error raised by a single outbound HTTP request.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    /// The request exceeded the per-request timeout
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// The connection could not be established
    #[error("Connection failed: {0}")]
    Connect(String),

    /// Any other request failure
    #[error("Request failed: {0}")]
    Request(String),

    /// The request URL could not be built
    #[error("Invalid URL '{url}': {message}")]
    InvalidUrl {
        /// URL or base URL that was rejected
        url: String,
        /// Failure details
        message: String,
    },
}
