//! Rules and rule sets
//!
//! A [`Rule`] pairs a [`Precondition`](crate::preconditions::Precondition)
//! with a validation body. Specialised behaviour (scheme checks, reference
//! checks) is provided by constructor functions that return ordinary rules.

pub mod handler;
pub mod reference;
pub mod rule;
pub mod rule_set;
pub mod scheme;
pub mod selector;

pub use handler::{ErrorCounter, Reporter, ValidationErrorHandler};
pub use reference::reference_rule;
pub use rule::{Procedure, Rule, RuleOutcome};
pub use rule_set::RuleSet;
pub use scheme::{broken_scheme_rule, scheme_rule};
pub use selector::ElementSelector;

/// Code for every semantic violation, including scheme failures
pub const RULE_VIOLATION: &str = "305";

/// Code for a document whose root or version is not recognised
pub const UNRECOGNIZED_DOCUMENT: &str = "300";
