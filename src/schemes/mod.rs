//! Coding schemes and format releases
//!
//! A [`Scheme`] is an enumeration (or pattern) identified by a URI that code
//! values must belong to. Each format [`Release`] owns the
//! [`SchemeCollection`] valid for its documents, and a [`ReleaseRegistry`]
//! maps declared version strings to releases.

pub mod config;
pub mod release;

pub use config::{RegistryConfig, ReleaseConfig, SchemeConfig};
pub use release::{Release, ReleaseRegistry};

use std::collections::HashMap;

use indexmap::IndexSet;
use regex::Regex;

use crate::error::{Error, Result};

/// How a scheme decides membership
#[derive(Debug, Clone)]
pub enum SchemeKind {
    /// Explicit list of codes
    Closed(IndexSet<String>),
    /// Codes must match an anchored regular expression
    Pattern(Regex),
    /// Any non-empty token is accepted
    Open,
}

/// A coding scheme identified by URI
#[derive(Debug, Clone)]
pub struct Scheme {
    uri: String,
    kind: SchemeKind,
}

impl Scheme {
    /// Scheme with an explicit code list
    pub fn closed<I, S>(uri: impl Into<String>, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            uri: uri.into(),
            kind: SchemeKind::Closed(codes.into_iter().map(Into::into).collect()),
        }
    }

    /// Scheme whose codes must fully match `pattern`
    pub fn pattern(uri: impl Into<String>, pattern: &str) -> Result<Self> {
        let uri = uri.into();
        let regex = Regex::new(&format!("^(?:{})$", pattern)).map_err(|source| Error::Pattern {
            uri: uri.clone(),
            source,
        })?;
        Ok(Self {
            uri,
            kind: SchemeKind::Pattern(regex),
        })
    }

    /// Scheme accepting any non-empty code
    pub fn open(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            kind: SchemeKind::Open,
        }
    }

    /// Identifying URI
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Membership rule
    pub fn kind(&self) -> &SchemeKind {
        &self.kind
    }

    /// Check a code value against the scheme
    pub fn is_valid(&self, code: &str) -> bool {
        match &self.kind {
            SchemeKind::Closed(codes) => codes.contains(code),
            SchemeKind::Pattern(regex) => regex.is_match(code),
            SchemeKind::Open => !code.is_empty(),
        }
    }
}

/// The schemes defined for one release, keyed by URI
#[derive(Debug, Clone, Default)]
pub struct SchemeCollection {
    schemes: HashMap<String, Scheme>,
}

impl SchemeCollection {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a scheme, replacing any previous one with the same URI
    pub fn add(&mut self, scheme: Scheme) {
        self.schemes.insert(scheme.uri.clone(), scheme);
    }

    /// Builder form of [`SchemeCollection::add`]
    pub fn with(mut self, scheme: Scheme) -> Self {
        self.add(scheme);
        self
    }

    /// Find a scheme by URI
    pub fn find(&self, uri: &str) -> Option<&Scheme> {
        self.schemes.get(uri.trim())
    }

    /// Number of schemes
    pub fn len(&self) -> usize {
        self.schemes.len()
    }

    /// True if the collection defines no schemes
    pub fn is_empty(&self) -> bool {
        self.schemes.is_empty()
    }
}
