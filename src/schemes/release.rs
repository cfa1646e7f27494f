//! Format releases and the version registry
//!
//! Registries are built once at startup and then only read. They are
//! passed explicitly to whatever needs them.

use std::sync::Arc;

use crate::documents::NodeRef;
use crate::error::{Error, Result};
use crate::version::{declared_version, Version};

use super::SchemeCollection;

/// One version of the document format
#[derive(Debug, Clone)]
pub struct Release {
    label: String,
    version: Version,
    root_elements: Vec<String>,
    schemes: SchemeCollection,
    scheme_defaults: bool,
}

impl Release {
    /// Create a release from its version string, root element names and schemes
    pub fn new<I, S>(version: &str, root_elements: I, schemes: SchemeCollection) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let root_elements: Vec<String> = root_elements.into_iter().map(Into::into).collect();
        if root_elements.is_empty() {
            return Err(Error::Config(format!(
                "release '{}' declares no root elements",
                version
            )));
        }
        Ok(Self {
            label: version.trim().to_string(),
            version: Version::parse(version)?,
            root_elements,
            schemes,
            scheme_defaults: false,
        })
    }

    /// Enable the legacy `<attribute>Default` convention on the root element
    pub fn with_scheme_defaults(mut self, enabled: bool) -> Self {
        self.scheme_defaults = enabled;
        self
    }

    /// Version string as declared
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Parsed version
    pub fn version(&self) -> &Version {
        &self.version
    }

    /// Recognised root element local names
    pub fn root_elements(&self) -> &[String] {
        &self.root_elements
    }

    /// Schemes valid for documents of this release
    pub fn schemes(&self) -> &SchemeCollection {
        &self.schemes
    }

    /// Whether root level scheme default attributes apply
    pub fn has_scheme_defaults(&self) -> bool {
        self.scheme_defaults
    }

    /// Whether an element can be the root of a document of this release
    pub fn is_root_element(&self, node: &NodeRef<'_>) -> bool {
        self.root_elements.iter().any(|r| r == node.local_name())
    }

    /// Name of the root attribute carrying the default for `attribute`
    pub fn default_attribute(&self, attribute: &str) -> Option<String> {
        self.scheme_defaults.then(|| format!("{}Default", attribute))
    }
}

/// Version to release lookup
#[derive(Debug, Clone, Default)]
pub struct ReleaseRegistry {
    releases: Vec<Arc<Release>>,
}

impl ReleaseRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a release; versions must be unique
    pub fn register(&mut self, release: Release) -> Result<Arc<Release>> {
        if self.releases.iter().any(|r| r.version == release.version) {
            return Err(Error::DuplicateRelease(release.label));
        }
        tracing::debug!(version = %release.label, roots = ?release.root_elements, "registered release");
        let release = Arc::new(release);
        self.releases.push(Arc::clone(&release));
        Ok(release)
    }

    /// All releases in registration order
    pub fn releases(&self) -> &[Arc<Release>] {
        &self.releases
    }

    /// Find the release for a version string
    pub fn for_version(&self, version: &str) -> Option<&Arc<Release>> {
        let version = Version::parse(version).ok()?;
        self.releases.iter().find(|r| r.version == version)
    }

    /// The release governing `node` if it is a recognised document root
    pub fn release_for_root(&self, node: &NodeRef<'_>) -> Option<&Arc<Release>> {
        let release = self.for_version(declared_version(node)?)?;
        release.is_root_element(node).then_some(release)
    }

    /// Walk from `node` (inclusive) to the nearest recognised document root
    pub fn enclosing_root<'a>(&self, node: &NodeRef<'a>) -> Option<(NodeRef<'a>, &Arc<Release>)> {
        std::iter::once(*node)
            .chain(node.ancestors())
            .find_map(|n| self.release_for_root(&n).map(|r| (n, r)))
    }

    /// Number of registered releases
    pub fn len(&self) -> usize {
        self.releases.len()
    }

    /// True if no release is registered
    pub fn is_empty(&self) -> bool {
        self.releases.is_empty()
    }
}
