//! Rule applicability preconditions
//!
//! A [`Precondition`] is a pure predicate over a [`DocumentIndex`]. Leaf
//! instances are typically built once and shared through `Arc` by many
//! rules, so results are memoised per run in an [`EvaluationCache`] keyed
//! by instance identity. Two structurally identical preconditions built
//! separately get different identities and separate cache entries.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::index::DocumentIndex;
use crate::namespaces::QName;
use crate::schemes::Release;
use crate::version::{document_version, Version};

/// Signature of a caller supplied leaf predicate
pub type PredicateFn = dyn Fn(&DocumentIndex<'_>) -> bool + Send + Sync;

static NEXT_ID: AtomicU64 = AtomicU64::new(0);

/// Identity of a precondition instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PreconditionId(u64);

impl PreconditionId {
    fn next() -> Self {
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// The predicate a precondition applies
pub enum PreconditionKind {
    /// Always applicable
    Always,
    /// Never applicable
    Never,
    /// Negation
    Not(Arc<Precondition>),
    /// Conjunction, short-circuits on a false left side
    And(Arc<Precondition>, Arc<Precondition>),
    /// Disjunction, short-circuits on a true left side
    Or(Arc<Precondition>, Arc<Precondition>),
    /// At least one element with one of the local names exists
    ElementPresence(Vec<String>),
    /// At least one element of the given types (or, without type
    /// information, the given names) exists
    ContentPresence {
        /// Element local names
        names: Vec<String>,
        /// Declared type names
        types: Vec<QName>,
    },
    /// The document declares exactly this version
    VersionEquals(Version),
    /// The document version lies within the inclusive bounds
    VersionInRange {
        /// Lowest accepted version
        min: Option<Version>,
        /// Highest accepted version
        max: Option<Version>,
    },
    /// Named caller supplied predicate
    Custom {
        /// Label used in logs
        name: String,
        /// The predicate; must be pure
        test: Box<PredicateFn>,
    },
}

/// An identity-carrying applicability predicate
pub struct Precondition {
    id: PreconditionId,
    kind: PreconditionKind,
}

impl Precondition {
    /// Wrap a predicate kind with a fresh identity
    pub fn new(kind: PreconditionKind) -> Arc<Self> {
        Arc::new(Self {
            id: PreconditionId::next(),
            kind,
        })
    }

    /// Precondition that always holds
    pub fn always() -> Arc<Self> {
        Self::new(PreconditionKind::Always)
    }

    /// Precondition that never holds
    pub fn never() -> Arc<Self> {
        Self::new(PreconditionKind::Never)
    }

    /// Negate a precondition
    pub fn not(inner: &Arc<Precondition>) -> Arc<Self> {
        Self::new(PreconditionKind::Not(Arc::clone(inner)))
    }

    /// Both preconditions hold
    pub fn and(left: &Arc<Precondition>, right: &Arc<Precondition>) -> Arc<Self> {
        Self::new(PreconditionKind::And(Arc::clone(left), Arc::clone(right)))
    }

    /// Either precondition holds
    pub fn or(left: &Arc<Precondition>, right: &Arc<Precondition>) -> Arc<Self> {
        Self::new(PreconditionKind::Or(Arc::clone(left), Arc::clone(right)))
    }

    /// Any of the named elements is present
    pub fn element_presence<I, S>(names: I) -> Arc<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(PreconditionKind::ElementPresence(
            names.into_iter().map(Into::into).collect(),
        ))
    }

    /// Any element of the given types is present, falling back to names
    /// when the document has no type information
    pub fn content_presence<I, S>(names: I, types: Vec<QName>) -> Arc<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(PreconditionKind::ContentPresence {
            names: names.into_iter().map(Into::into).collect(),
            types,
        })
    }

    /// The document is of the given release
    pub fn version_equals(release: &Release) -> Arc<Self> {
        Self::new(PreconditionKind::VersionEquals(release.version().clone()))
    }

    /// The document release lies between the given releases, inclusive
    pub fn version_in_range(min: Option<&Release>, max: Option<&Release>) -> Arc<Self> {
        Self::new(PreconditionKind::VersionInRange {
            min: min.map(|r| r.version().clone()),
            max: max.map(|r| r.version().clone()),
        })
    }

    /// Caller supplied predicate
    pub fn custom<F>(name: impl Into<String>, test: F) -> Arc<Self>
    where
        F: Fn(&DocumentIndex<'_>) -> bool + Send + Sync + 'static,
    {
        Self::new(PreconditionKind::Custom {
            name: name.into(),
            test: Box::new(test),
        })
    }

    /// Identity used as the cache key
    pub fn id(&self) -> PreconditionId {
        self.id
    }

    /// The predicate kind
    pub fn kind(&self) -> &PreconditionKind {
        &self.kind
    }

    /// Evaluate against an index, consulting and filling the cache.
    ///
    /// Composite preconditions store only their own result; children
    /// store theirs when they are visited.
    pub fn evaluate(&self, index: &DocumentIndex<'_>, cache: &mut EvaluationCache) -> bool {
        if let Some(result) = cache.lookup(self.id) {
            return result;
        }
        let result = self.compute(index, cache);
        tracing::trace!(precondition = ?self, result, "precondition evaluated");
        cache.store(self.id, result);
        result
    }

    fn compute(&self, index: &DocumentIndex<'_>, cache: &mut EvaluationCache) -> bool {
        match &self.kind {
            PreconditionKind::Always => true,
            PreconditionKind::Never => false,
            PreconditionKind::Not(inner) => !inner.evaluate(index, cache),
            PreconditionKind::And(left, right) => {
                left.evaluate(index, cache) && right.evaluate(index, cache)
            }
            PreconditionKind::Or(left, right) => {
                left.evaluate(index, cache) || right.evaluate(index, cache)
            }
            PreconditionKind::ElementPresence(names) => names
                .iter()
                .any(|name| !index.elements_by_name(name).is_empty()),
            PreconditionKind::ContentPresence { names, types } => {
                if index.has_type_information() && !types.is_empty() {
                    // Elements without a declared type still count by name
                    types.iter().any(|t| {
                        !index
                            .elements_by_type(t.namespace.as_deref(), &t.local_name)
                            .is_empty()
                    }) || names.iter().any(|name| {
                        index
                            .elements_by_name(name)
                            .iter()
                            .any(|n| n.declared_type().is_none())
                    })
                } else {
                    names
                        .iter()
                        .any(|name| !index.elements_by_name(name).is_empty())
                }
            }
            PreconditionKind::VersionEquals(version) => {
                version_of(index).is_some_and(|v| &v == version)
            }
            PreconditionKind::VersionInRange { min, max } => match version_of(index) {
                Some(v) => {
                    min.as_ref().map_or(true, |m| &v >= m) && max.as_ref().map_or(true, |m| &v <= m)
                }
                None => false,
            },
            PreconditionKind::Custom { test, .. } => test(index),
        }
    }
}

fn version_of(index: &DocumentIndex<'_>) -> Option<Version> {
    index.root().as_ref().and_then(document_version)
}

impl fmt::Debug for Precondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Precondition#{}(", self.id.0)?;
        match &self.kind {
            PreconditionKind::Always => write!(f, "always")?,
            PreconditionKind::Never => write!(f, "never")?,
            PreconditionKind::Not(p) => write!(f, "not {:?}", p)?,
            PreconditionKind::And(l, r) => write!(f, "{:?} and {:?}", l, r)?,
            PreconditionKind::Or(l, r) => write!(f, "{:?} or {:?}", l, r)?,
            PreconditionKind::ElementPresence(names) => write!(f, "elements {:?}", names)?,
            PreconditionKind::ContentPresence { names, types } => {
                let types: Vec<String> = types.iter().map(|t| t.to_string()).collect();
                write!(f, "content {:?} / {:?}", names, types)?
            }
            PreconditionKind::VersionEquals(v) => write!(f, "version = {}", v)?,
            PreconditionKind::VersionInRange { min, max } => {
                let show = |v: &Option<Version>| v.as_ref().map_or("*".to_string(), |v| v.to_string());
                write!(f, "version in [{}, {}]", show(min), show(max))?
            }
            PreconditionKind::Custom { name, .. } => write!(f, "{}", name)?,
        }
        write!(f, ")")
    }
}

/// Per-run memo of precondition results, keyed by identity
#[derive(Debug, Default)]
pub struct EvaluationCache {
    results: HashMap<PreconditionId, bool>,
    hits: usize,
    misses: usize,
}

impl EvaluationCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    fn lookup(&mut self, id: PreconditionId) -> Option<bool> {
        let found = self.results.get(&id).copied();
        if found.is_some() {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
        found
    }

    fn store(&mut self, id: PreconditionId, result: bool) {
        self.results.insert(id, result);
    }

    /// Cached result for a precondition, if it was evaluated
    pub fn get(&self, precondition: &Precondition) -> Option<bool> {
        self.results.get(&precondition.id).copied()
    }

    /// Number of cached preconditions
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// True if nothing has been cached yet
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Lookups answered from the cache
    pub fn hits(&self) -> usize {
        self.hits
    }

    /// Lookups that required evaluation
    pub fn misses(&self) -> usize {
        self.misses
    }
}
