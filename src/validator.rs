//! Document validation entry point
//!
//! Ties a release registry and a rule set together. A document whose root
//! is missing or not recognised by the registry gets a single structural
//! error and no semantic checks.

use std::sync::Arc;

use crate::documents::Document;
use crate::error::{Result, ValidationError};
use crate::index::DocumentIndex;
use crate::rules::{RuleSet, ValidationErrorHandler, UNRECOGNIZED_DOCUMENT};
use crate::schemes::ReleaseRegistry;
use crate::version::declared_version;

/// Validates documents against one rule set
#[derive(Debug, Clone)]
pub struct Validator {
    registry: Arc<ReleaseRegistry>,
    rules: RuleSet,
    parallel: bool,
}

impl Validator {
    /// Create a validator
    pub fn new(registry: Arc<ReleaseRegistry>, rules: RuleSet) -> Self {
        Self {
            registry,
            rules,
            parallel: false,
        }
    }

    /// Run rules on the rayon thread pool
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// The release registry
    pub fn registry(&self) -> &Arc<ReleaseRegistry> {
        &self.registry
    }

    /// The rule set
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Validate a document, streaming violations into `handler`
    pub fn validate(&self, document: &Document, handler: &mut dyn ValidationErrorHandler) -> bool {
        let Some(root) = document.root() else {
            handler.error(UNRECOGNIZED_DOCUMENT, None, "Document has no root element", None, None);
            return false;
        };

        if self.registry.release_for_root(&root).is_none() {
            let version = declared_version(&root);
            tracing::warn!(root = root.local_name(), version, "unrecognised document");
            handler.error(
                UNRECOGNIZED_DOCUMENT,
                Some(&root),
                &format!(
                    "Unrecognised document root <{}> for version '{}'",
                    root.local_name(),
                    version.unwrap_or("")
                ),
                None,
                version,
            );
            return false;
        }

        let index = DocumentIndex::new(document);
        if self.parallel {
            self.rules.run_parallel(&index, handler)
        } else {
            self.rules.run(&index, handler)
        }
    }

    /// Validate a document and collect its violations
    pub fn check(&self, document: &Document) -> Vec<ValidationError> {
        let mut errors: Vec<ValidationError> = Vec::new();
        self.validate(document, &mut errors);
        errors
    }

    /// Parse and validate XML text
    pub fn check_str(&self, xml: &str) -> Result<Vec<ValidationError>> {
        let document = Document::from_string(xml)?;
        Ok(self.check(&document))
    }
}
