//! Document format versions
//!
//! Versions are written as numeric components separated by `-` or `.`
//! (`4-2`, `5.10`). Comparison is numeric per component and missing
//! trailing components count as zero, so `5` and `5-0` are equal.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::documents::NodeRef;
use crate::error::{Error, Result};

static VERSION_SYNTAX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]+(?:[-.][0-9]+)*$").unwrap());

/// Root attributes that may carry the document version, in lookup order
pub const VERSION_ATTRIBUTES: [&str; 2] = ["version", "fpmlVersion"];

/// A parsed format version
#[derive(Debug, Clone)]
pub struct Version {
    components: Vec<u32>,
}

impl Version {
    /// Parse a version string
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if !VERSION_SYNTAX.is_match(s) {
            return Err(Error::Version(s.to_string()));
        }

        let components = s
            .split(['-', '.'])
            .map(|part| part.parse::<u32>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|_| Error::Version(s.to_string()))?;

        Ok(Self { components })
    }

    /// Numeric components
    pub fn components(&self) -> &[u32] {
        &self.components
    }

    /// Major component
    pub fn major(&self) -> u32 {
        self.components.first().copied().unwrap_or(0)
    }

    fn component(&self, i: usize) -> u32 {
        self.components.get(i).copied().unwrap_or(0)
    }
}

impl FromStr for Version {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.components.len().max(other.components.len());
        (0..len)
            .map(|i| self.component(i).cmp(&other.component(i)))
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.components.iter().map(|c| c.to_string()).collect();
        write!(f, "{}", parts.join("-"))
    }
}

/// The raw version string declared on a root element
pub fn declared_version<'a>(root: &NodeRef<'a>) -> Option<&'a str> {
    VERSION_ATTRIBUTES
        .iter()
        .find_map(|name| root.attribute(name))
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// The parsed version declared on a root element, if any
pub fn document_version(root: &NodeRef<'_>) -> Option<Version> {
    declared_version(root).and_then(|v| Version::parse(v).ok())
}
