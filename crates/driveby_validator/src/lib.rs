//! # Driveby Validator
//!
//! Static analysis of API contracts. This crate provides:
//!
//! - The example synthesizer, mapping a schema to one deterministic value
//! - The compliance rule catalog (specification, documentation, error
//!   handling, request schemas, security, versioning)
//! - The rule engine, which never fails and optionally applies each failing
//!   rule's mechanical fix once
//!
//! ## Example
//!
//! ```rust
//! use driveby_core::{ContractBuilder, HttpMethod, OperationBuilder};
//! use driveby_validator::RuleEngine;
//!
//! let model = ContractBuilder::new("Widgets", "1.0.0")
//!     .bearer_security("bearerAuth")
//!     .operation(
//!         OperationBuilder::new(HttpMethod::Get, "/widgets")
//!             .summary("List widgets")
//!             .description("Lists every widget")
//!             .response("200", "OK")
//!             .response("500", "Internal Server Error")
//!             .build(),
//!     )
//!     .build();
//!
//! let results = RuleEngine::with_default_rules().evaluate(&model);
//! for result in results.iter().filter(|r| !r.passed) {
//!     println!("{}: {}", result.check.id, result.message);
//! }
//! assert!(results.iter().all(|r| r.passed));
//! ```

mod engine;
pub mod rules;
mod synthesizer;

pub use engine::*;
pub use rules::{Rule, default_rules};
pub use synthesizer::*;
