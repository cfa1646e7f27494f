//! Named, ordered collections of rules
//!
//! Every rule in a set is always run; a failing rule never stops the
//! batch. The sequential run shares one [`EvaluationCache`] across all
//! rules. The parallel run gives each rule its own cache and buffers its
//! errors, then replays them in registration order so both runs report the
//! same errors in the same order.

use indexmap::IndexMap;
use rayon::prelude::*;

use crate::error::{Error, Result, ValidationError};
use crate::index::DocumentIndex;
use crate::preconditions::EvaluationCache;

use super::handler::ValidationErrorHandler;
use super::rule::{Rule, RuleOutcome};

/// An ordered set of uniquely named rules
#[derive(Debug, Clone)]
pub struct RuleSet {
    name: String,
    rules: IndexMap<String, Rule>,
}

impl RuleSet {
    /// Create an empty rule set
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rules: IndexMap::new(),
        }
    }

    /// Name of the set
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a rule; names must be unique within the set
    pub fn add(&mut self, rule: Rule) -> Result<()> {
        if self.rules.contains_key(rule.name()) {
            return Err(Error::DuplicateRule {
                set: self.name.clone(),
                rule: rule.name().to_string(),
            });
        }
        self.rules.insert(rule.name().to_string(), rule);
        Ok(())
    }

    /// Add every rule of another set, in its order
    pub fn extend(&mut self, other: &RuleSet) -> Result<()> {
        for rule in other.rules.values() {
            self.add(rule.clone())?;
        }
        Ok(())
    }

    /// Look up a rule by name
    pub fn get(&self, name: &str) -> Option<&Rule> {
        self.rules.get(name)
    }

    /// Rules in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.values()
    }

    /// Rule names in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    /// Number of rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// True if the set has no rules
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Run every rule and collect each rule's outcome
    pub fn evaluate(
        &self,
        index: &DocumentIndex<'_>,
        handler: &mut dyn ValidationErrorHandler,
    ) -> Vec<(&str, RuleOutcome)> {
        let mut cache = EvaluationCache::new();
        let mut outcomes = Vec::with_capacity(self.rules.len());
        for rule in self.rules.values() {
            outcomes.push((rule.name(), rule.evaluate(index, &mut cache, handler)));
        }

        tracing::debug!(
            rule_set = %self.name,
            cached = cache.len(),
            hits = cache.hits(),
            "precondition cache"
        );
        self.log_summary(&outcomes);
        outcomes
    }

    /// Run every rule; true if none failed
    pub fn run(&self, index: &DocumentIndex<'_>, handler: &mut dyn ValidationErrorHandler) -> bool {
        self.evaluate(index, handler)
            .iter()
            .all(|(_, outcome)| outcome.is_ok())
    }

    /// Run rules in parallel, reporting errors in registration order
    pub fn evaluate_parallel(
        &self,
        index: &DocumentIndex<'_>,
        handler: &mut dyn ValidationErrorHandler,
    ) -> Vec<(&str, RuleOutcome)> {
        let rules: Vec<&Rule> = self.rules.values().collect();
        let results: Vec<(RuleOutcome, Vec<ValidationError>)> = rules
            .par_iter()
            .map(|rule| {
                let mut cache = EvaluationCache::new();
                let mut buffer: Vec<ValidationError> = Vec::new();
                let outcome = rule.evaluate(index, &mut cache, &mut buffer);
                (outcome, buffer)
            })
            .collect();

        let document = index.document();
        let mut outcomes = Vec::with_capacity(rules.len());
        for (&rule, (outcome, errors)) in rules.iter().zip(results) {
            for err in errors {
                let context = err.context.map(|id| document.node(id));
                handler.error(
                    &err.code,
                    context.as_ref(),
                    &err.description,
                    err.rule_name.as_deref(),
                    err.additional_data.as_deref(),
                );
            }
            outcomes.push((rule.name(), outcome));
        }

        self.log_summary(&outcomes);
        outcomes
    }

    /// Parallel form of [`RuleSet::run`]
    pub fn run_parallel(
        &self,
        index: &DocumentIndex<'_>,
        handler: &mut dyn ValidationErrorHandler,
    ) -> bool {
        self.evaluate_parallel(index, handler)
            .iter()
            .all(|(_, outcome)| outcome.is_ok())
    }

    fn log_summary(&self, outcomes: &[(&str, RuleOutcome)]) {
        let count = |wanted: RuleOutcome| outcomes.iter().filter(|(_, o)| *o == wanted).count();
        tracing::info!(
            rule_set = %self.name,
            rules = outcomes.len(),
            passed = count(RuleOutcome::Passed),
            failed = count(RuleOutcome::Failed),
            not_applicable = count(RuleOutcome::NotApplicable),
            "rule set complete"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::Document;
    use crate::preconditions::Precondition;
    use crate::rules::handler::ErrorCounter;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn reject(name: &str, element: &'static str) -> Rule {
        Rule::new(name, Precondition::always(), move |index, reporter| {
            let mut ok = true;
            for node in index.elements_by_name(element) {
                reporter.report("305", &node, format!("{} rejected", element), None);
                ok = false;
            }
            ok
        })
    }

    fn sample_set() -> RuleSet {
        let mut set = RuleSet::new("sample");
        set.add(reject("r-1", "swap")).unwrap();
        set.add(reject("r-2", "fra")).unwrap();
        set.add(reject("r-3", "swap")).unwrap();
        set
    }

    const DOC: &str = "<FpML><trade><swap/></trade><trade><fra/></trade><trade><swap/></trade></FpML>";

    #[test]
    fn test_duplicate_rule_rejected() {
        let mut set = sample_set();
        let err = set.add(reject("r-2", "capFloor")).unwrap_err();
        assert!(matches!(err, Error::DuplicateRule { ref rule, .. } if rule == "r-2"));
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_lookup_and_order() {
        let set = sample_set();
        assert_eq!(set.get("r-2").unwrap().name(), "r-2");
        assert!(set.get("r-9").is_none());
        assert_eq!(set.names().collect::<Vec<_>>(), ["r-1", "r-2", "r-3"]);
    }

    #[test]
    fn test_run_continues_past_failures() {
        let doc = Document::from_string(DOC).unwrap();
        let index = DocumentIndex::new(&doc);
        let mut errors: Vec<ValidationError> = Vec::new();

        assert!(!sample_set().run(&index, &mut errors));
        let rules: Vec<_> = errors.iter().map(|e| e.rule_name.clone().unwrap()).collect();
        assert_eq!(rules, ["r-1", "r-1", "r-2", "r-3", "r-3"]);
    }

    #[test]
    fn test_false_iff_reported() {
        let clean = Document::from_string("<FpML><trade/></FpML>").unwrap();
        let index = DocumentIndex::new(&clean);
        let mut counter = ErrorCounter::default();
        assert!(sample_set().run(&index, &mut counter));
        assert_eq!(counter.0, 0);

        let dirty = Document::from_string(DOC).unwrap();
        let index = DocumentIndex::new(&dirty);
        let mut counter = ErrorCounter::default();
        assert!(!sample_set().run(&index, &mut counter));
        assert!(counter.0 > 0);
    }

    #[test]
    fn test_shared_precondition_evaluated_once_per_run() {
        let doc = Document::from_string(DOC).unwrap();
        let index = DocumentIndex::new(&doc);
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let shared = Precondition::custom("has-trade", move |index| {
            seen.fetch_add(1, Ordering::SeqCst);
            !index.elements_by_name("trade").is_empty()
        });

        let mut set = RuleSet::new("shared");
        for i in 0..5 {
            set.add(Rule::new(format!("s-{}", i), Arc::clone(&shared), |_, _| true))
                .unwrap();
        }

        let mut counter = ErrorCounter::default();
        assert!(set.run(&index, &mut counter));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // Each run starts with a fresh cache
        assert!(set.run(&index, &mut counter));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_union_is_monotonic() {
        let doc = Document::from_string(DOC).unwrap();
        let index = DocumentIndex::new(&doc);

        let mut first = RuleSet::new("first");
        first.add(reject("r-1", "swap")).unwrap();
        let mut second = RuleSet::new("second");
        second.add(reject("r-2", "fra")).unwrap();

        let mut alone: Vec<ValidationError> = Vec::new();
        first.run(&index, &mut alone);

        let mut union = first.clone();
        union.extend(&second).unwrap();
        let mut combined: Vec<ValidationError> = Vec::new();
        union.run(&index, &mut combined);

        assert!(alone.iter().all(|e| combined.contains(e)));
        assert!(combined.len() > alone.len());
    }

    #[test]
    fn test_extend_rejects_clash() {
        let mut set = sample_set();
        assert!(set.extend(&sample_set()).is_err());
    }

    #[test]
    fn test_outcomes_are_three_valued() {
        let doc = Document::from_string("<FpML><swap/></FpML>").unwrap();
        let index = DocumentIndex::new(&doc);
        let mut set = RuleSet::new("mixed");
        set.add(reject("fails", "swap")).unwrap();
        set.add(reject("passes", "fra")).unwrap();
        set.add(Rule::new("skipped", Precondition::never(), |_, _| false))
            .unwrap();

        let mut counter = ErrorCounter::default();
        let outcomes = set.evaluate(&index, &mut counter);
        assert_eq!(
            outcomes,
            vec![
                ("fails", RuleOutcome::Failed),
                ("passes", RuleOutcome::Passed),
                ("skipped", RuleOutcome::NotApplicable),
            ]
        );
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let doc = Document::from_string(DOC).unwrap();
        let index = DocumentIndex::new(&doc);
        let set = sample_set();

        let mut sequential: Vec<ValidationError> = Vec::new();
        let seq_ok = set.run(&index, &mut sequential);
        let mut parallel: Vec<ValidationError> = Vec::new();
        let par_ok = set.run_parallel(&index, &mut parallel);

        assert_eq!(seq_ok, par_ok);
        assert_eq!(sequential, parallel);
    }
}
