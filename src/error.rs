//! Error types for fpml-rules
//!
//! Two kinds of failure live here. [`Error`] covers faults that stop work
//! before validation starts (malformed XML, bad registry configuration,
//! duplicate rule names). [`ValidationError`] is the record of a single
//! semantic violation found while running rules; those never abort a run.

use std::fmt;
use thiserror::Error;

use crate::documents::NodeId;

/// Result type alias using the crate [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for fpml-rules operations
#[derive(Error, Debug)]
pub enum Error {
    /// XML parsing error
    #[error("XML error: {0}")]
    Xml(String),

    /// A rule with the same name is already registered in the rule set
    #[error("rule set '{set}' already contains a rule named '{rule}'")]
    DuplicateRule {
        /// Name of the rule set
        set: String,
        /// Name of the clashing rule
        rule: String,
    },

    /// Version string could not be parsed
    #[error("invalid version: '{0}'")]
    Version(String),

    /// Release registry configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// A release with the same version is already registered
    #[error("release '{0}' is already registered")]
    DuplicateRelease(String),

    /// Scheme pattern failed to compile
    #[error("invalid pattern for scheme '{uri}': {source}")]
    Pattern {
        /// URI of the scheme owning the pattern
        uri: String,
        /// Underlying regex error
        #[source]
        source: regex::Error,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A semantic violation reported by a rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Error code (e.g. `305`)
    pub code: String,
    /// Element the violation was found on
    pub context: Option<NodeId>,
    /// Path to the element, for display
    pub path: Option<String>,
    /// Human readable description
    pub description: String,
    /// Name of the rule that reported the error
    pub rule_name: Option<String>,
    /// Additional data, usually the offending value
    pub additional_data: Option<String>,
}

impl ValidationError {
    /// Create a new validation error
    pub fn new(code: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            context: None,
            path: None,
            description: description.into(),
            rule_name: None,
            additional_data: None,
        }
    }

    /// Set the element the error refers to
    pub fn with_context(mut self, node: NodeId, path: impl Into<String>) -> Self {
        self.context = Some(node);
        self.path = Some(path.into());
        self
    }

    /// Set the originating rule name
    pub fn with_rule_name(mut self, rule_name: impl Into<String>) -> Self {
        self.rule_name = Some(rule_name.into());
        self
    }

    /// Set the additional data
    pub fn with_additional_data(mut self, data: impl Into<String>) -> Self {
        self.additional_data = Some(data.into());
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.code)?;

        if let Some(ref rule) = self.rule_name {
            write!(f, " {}:", rule)?;
        }

        write!(f, " {}", self.description)?;

        if let Some(ref path) = self.path {
            write!(f, "\n\nPath: {}", path)?;
        }

        if let Some(ref data) = self.additional_data {
            write!(f, "\n\nData: {}", data)?;
        }

        Ok(())
    }
}

impl std::error::Error for ValidationError {}
