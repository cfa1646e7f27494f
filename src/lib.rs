//! # fpml-rules
//!
//! A semantic rule engine for versioned FpML-style XML business documents.
//!
//! Schemas cannot express constraints such as "a stream with reset dates
//! needs a floating rate calculation" or "every party reference must point
//! at a party". This crate runs such rules over a parsed document.
//!
//! ## Features
//!
//! - Document index by element name, declared type, `id` and attribute name
//! - Memoised applicability preconditions, including version ranges
//! - Rules and rule sets with batch (never fail-fast) error reporting
//! - id/href reference resolution with XPointer fragment stripping
//! - Version-aware coding scheme validation
//! - Optional parallel rule execution with deterministic error order
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use fpml_rules::{standard, ReleaseRegistry, Validator};
//!
//! let registry = Arc::new(ReleaseRegistry::from_file("releases.json")?);
//! let validator = Validator::new(Arc::clone(&registry), standard::rule_set(&registry)?);
//!
//! for error in validator.check_str(&std::fs::read_to_string("trade.xml")?)? {
//!     println!("{}", error);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Core modules - foundation
pub mod error;
pub mod namespaces;
pub mod version;

// Document model
pub mod documents;
pub mod index;
pub mod references;

// Rule engine
pub mod preconditions;
pub mod rules;
pub mod schemes;

// Entry points
pub mod standard;
pub mod validator;

// Re-exports for convenience
pub use documents::{Document, NodeId, NodeRef};
pub use error::{Error, Result, ValidationError};
pub use index::DocumentIndex;
pub use preconditions::{EvaluationCache, Precondition, PreconditionKind};
pub use rules::{Rule, RuleOutcome, RuleSet, ValidationErrorHandler};
pub use schemes::{Release, ReleaseRegistry, Scheme, SchemeCollection};
pub use validator::Validator;
pub use version::Version;

/// Version of the fpml-rules library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
