//! Error reporting plumbing
//!
//! Rules never return error values for violations. They report each one
//! synchronously through a [`ValidationErrorHandler`] and keep going.

use crate::documents::NodeRef;
use crate::error::ValidationError;

/// Receives every violation discovered during a run
pub trait ValidationErrorHandler {
    /// Handle one violation
    fn error(
        &mut self,
        code: &str,
        context: Option<&NodeRef<'_>>,
        description: &str,
        rule_name: Option<&str>,
        additional_data: Option<&str>,
    );
}

impl ValidationErrorHandler for Vec<ValidationError> {
    fn error(
        &mut self,
        code: &str,
        context: Option<&NodeRef<'_>>,
        description: &str,
        rule_name: Option<&str>,
        additional_data: Option<&str>,
    ) {
        let mut err = ValidationError::new(code, description);
        if let Some(node) = context {
            err = err.with_context(node.id(), node.path());
        }
        if let Some(rule) = rule_name {
            err = err.with_rule_name(rule);
        }
        if let Some(data) = additional_data {
            err = err.with_additional_data(data);
        }
        self.push(err);
    }
}

impl<H: ValidationErrorHandler + ?Sized> ValidationErrorHandler for &mut H {
    fn error(
        &mut self,
        code: &str,
        context: Option<&NodeRef<'_>>,
        description: &str,
        rule_name: Option<&str>,
        additional_data: Option<&str>,
    ) {
        (**self).error(code, context, description, rule_name, additional_data)
    }
}

/// Handler that only counts violations
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ErrorCounter(pub usize);

impl ValidationErrorHandler for ErrorCounter {
    fn error(&mut self, _: &str, _: Option<&NodeRef<'_>>, _: &str, _: Option<&str>, _: Option<&str>) {
        self.0 += 1;
    }
}

/// Handle given to a rule procedure for reporting its violations
///
/// The reporter stamps each report with the rule's name and counts them,
/// so a rule that reports anything is always treated as failed.
pub struct Reporter<'h> {
    rule_name: &'h str,
    handler: &'h mut dyn ValidationErrorHandler,
    reported: usize,
}

impl<'h> Reporter<'h> {
    /// Wrap a handler for one rule
    pub fn new(rule_name: &'h str, handler: &'h mut dyn ValidationErrorHandler) -> Self {
        Self {
            rule_name,
            handler,
            reported: 0,
        }
    }

    /// Report a violation on `context`
    pub fn report(
        &mut self,
        code: &str,
        context: &NodeRef<'_>,
        description: impl AsRef<str>,
        additional_data: Option<&str>,
    ) {
        self.reported += 1;
        self.handler.error(
            code,
            Some(context),
            description.as_ref(),
            Some(self.rule_name),
            additional_data,
        );
    }

    /// Report a violation with no element context
    pub fn report_document(&mut self, code: &str, description: impl AsRef<str>) {
        self.reported += 1;
        self.handler
            .error(code, None, description.as_ref(), Some(self.rule_name), None);
    }

    /// Name of the rule being run
    pub fn rule_name(&self) -> &str {
        self.rule_name
    }

    /// Violations reported so far
    pub fn reported(&self) -> usize {
        self.reported
    }
}
