//! # Driveby Core
//!
//! Core data structures and types for the Driveby API validation engine.
//!
//! This crate provides the fundamental building blocks shared by every other
//! crate in the workspace: the resolved in-memory contract model, the report
//! types each phase produces, run configuration, and the error taxonomy.
//!
//! ## Key Concepts
//!
//! - **Contract**: a parsed and normalized OpenAPI document ([`ContractModel`])
//! - **Schema**: a recursive [`SchemaNode`] with nullable unions already collapsed
//! - **Rule result**: the verdict of one compliance check ([`RuleResult`])
//! - **Report**: the unified output of a run ([`ValidationReport`])
//!
//! ## Example
//!
//! ```rust
//! use driveby_core::{ContractBuilder, HttpMethod, OperationBuilder, ParameterBuilder, SchemaBuilder};
//!
//! let model = ContractBuilder::new("Widgets", "1.0.0")
//!     .operation(
//!         OperationBuilder::new(HttpMethod::Get, "/widgets/{id}")
//!             .parameter(
//!                 ParameterBuilder::path("id")
//!                     .schema(SchemaBuilder::string().format("uuid").build())
//!                     .build(),
//!             )
//!             .response("200", "The widget")
//!             .build(),
//!     )
//!     .build();
//!
//! assert_eq!(model.operation_count(), 1);
//! ```

pub mod builder;
pub mod config;
pub mod contract;
pub mod duration;
pub mod error;
pub mod report;

pub use builder::*;
pub use config::*;
pub use contract::*;
pub use duration::{DurationError, format_duration, parse_duration};
pub use error::*;
pub use report::*;
