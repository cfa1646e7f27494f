//! Precondition-guarded validation rules

use std::fmt;
use std::sync::Arc;

use crate::index::DocumentIndex;
use crate::preconditions::{EvaluationCache, Precondition};

use super::handler::{Reporter, ValidationErrorHandler};

/// Signature of a rule body.
///
/// The body visits every element it cares about, reports each violation
/// through the [`Reporter`] and returns `false` if it found any.
pub type Procedure = dyn Fn(&DocumentIndex<'_>, &mut Reporter<'_>) -> bool + Send + Sync;

/// Result of running one rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleOutcome {
    /// The precondition did not hold; the body was not run
    NotApplicable,
    /// The body ran and found nothing
    Passed,
    /// The body reported at least one violation
    Failed,
}

impl RuleOutcome {
    /// Boolean view: only `Failed` is false
    pub fn is_ok(self) -> bool {
        !matches!(self, RuleOutcome::Failed)
    }
}

/// A named, precondition-guarded check
#[derive(Clone)]
pub struct Rule {
    name: String,
    precondition: Arc<Precondition>,
    procedure: Arc<Procedure>,
}

impl Rule {
    /// Create a rule from a precondition and a body
    pub fn new<F>(name: impl Into<String>, precondition: Arc<Precondition>, procedure: F) -> Self
    where
        F: Fn(&DocumentIndex<'_>, &mut Reporter<'_>) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            precondition,
            procedure: Arc::new(procedure),
        }
    }

    /// Rule name, unique within its rule set
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The applicability precondition
    pub fn precondition(&self) -> &Arc<Precondition> {
        &self.precondition
    }

    /// Run the rule and say whether it applied, passed or failed
    pub fn evaluate(
        &self,
        index: &DocumentIndex<'_>,
        cache: &mut EvaluationCache,
        handler: &mut dyn ValidationErrorHandler,
    ) -> RuleOutcome {
        if !self.precondition.evaluate(index, cache) {
            tracing::trace!(rule = %self.name, "not applicable");
            return RuleOutcome::NotApplicable;
        }

        let mut reporter = Reporter::new(&self.name, handler);
        let passed = (self.procedure)(index, &mut reporter);
        let reported = reporter.reported();

        if !passed && reported == 0 {
            tracing::warn!(rule = %self.name, "rule failed without reporting a violation");
        }
        if passed && reported > 0 {
            tracing::debug!(rule = %self.name, reported, "rule reported violations but returned true");
        }

        if passed && reported == 0 {
            RuleOutcome::Passed
        } else {
            tracing::debug!(rule = %self.name, reported, "rule failed");
            RuleOutcome::Failed
        }
    }

    /// Run the rule; an inapplicable rule counts as passed
    pub fn run(
        &self,
        index: &DocumentIndex<'_>,
        cache: &mut EvaluationCache,
        handler: &mut dyn ValidationErrorHandler,
    ) -> bool {
        self.evaluate(index, cache, handler).is_ok()
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("precondition", &self.precondition)
            .finish_non_exhaustive()
    }
}
