//! Registry configuration
//!
//! Releases and their schemes are described in JSON and turned into a
//! [`ReleaseRegistry`] once at startup:
//!
//! ```json
//! {
//!   "releases": [
//!     {
//!       "version": "4-2",
//!       "rootElements": ["FpML"],
//!       "schemeDefaults": true,
//!       "schemes": [
//!         { "kind": "closed", "uri": "http://www.fpml.org/ext/iso4217", "codes": ["USD", "EUR"] },
//!         { "kind": "pattern", "uri": "urn:bic", "pattern": "[A-Z]{6}[A-Z0-9]{2}([A-Z0-9]{3})?" },
//!         { "kind": "open", "uri": "urn:any" }
//!       ]
//!     }
//!   ]
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::{Release, ReleaseRegistry, Scheme, SchemeCollection};

/// Top level configuration document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryConfig {
    /// Releases to register
    pub releases: Vec<ReleaseConfig>,
}

/// One release
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseConfig {
    /// Version string, e.g. `4-2`
    pub version: String,
    /// Recognised root element local names
    pub root_elements: Vec<String>,
    /// Whether `<attr>Default` attributes on the root apply
    #[serde(default)]
    pub scheme_defaults: bool,
    /// Scheme definitions
    #[serde(default)]
    pub schemes: Vec<SchemeConfig>,
}

/// One scheme definition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SchemeConfig {
    /// Explicit code list
    Closed {
        /// Scheme URI
        uri: String,
        /// Valid codes
        codes: Vec<String>,
    },
    /// Regular expression
    Pattern {
        /// Scheme URI
        uri: String,
        /// Pattern every code must fully match
        pattern: String,
    },
    /// Any non-empty code
    Open {
        /// Scheme URI
        uri: String,
    },
}

impl SchemeConfig {
    fn build(&self) -> Result<Scheme> {
        match self {
            SchemeConfig::Closed { uri, codes } => Ok(Scheme::closed(uri.as_str(), codes.iter().cloned())),
            SchemeConfig::Pattern { uri, pattern } => Scheme::pattern(uri.as_str(), pattern),
            SchemeConfig::Open { uri } => Ok(Scheme::open(uri.as_str())),
        }
    }
}

impl RegistryConfig {
    /// Parse configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::Config(format!("invalid registry configuration: {}", e)))
    }

    /// Read configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        Self::from_json(&content).map_err(|e| match e {
            Error::Config(msg) => Error::Config(format!("{}: {}", path.display(), msg)),
            other => other,
        })
    }

    /// Build the registry
    pub fn build(&self) -> Result<ReleaseRegistry> {
        let mut registry = ReleaseRegistry::new();
        for release in &self.releases {
            let mut schemes = SchemeCollection::new();
            for scheme in &release.schemes {
                schemes.add(scheme.build()?);
            }
            registry.register(
                Release::new(&release.version, release.root_elements.iter().cloned(), schemes)?
                    .with_scheme_defaults(release.scheme_defaults),
            )?;
        }
        tracing::info!(releases = registry.len(), "release registry loaded");
        Ok(registry)
    }
}

impl ReleaseRegistry {
    /// Load a registry from a JSON configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        RegistryConfig::from_file(path)?.build()
    }

    /// Load a registry from a JSON configuration string
    pub fn from_json(json: &str) -> Result<Self> {
        RegistryConfig::from_json(json)?.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CONFIG: &str = r#"{
        "releases": [
            {
                "version": "4-2",
                "rootElements": ["FpML"],
                "schemeDefaults": true,
                "schemes": [
                    { "kind": "closed", "uri": "http://www.fpml.org/ext/iso4217", "codes": ["USD", "EUR"] },
                    { "kind": "pattern", "uri": "urn:bic", "pattern": "[A-Z]{6}[A-Z0-9]{2}" }
                ]
            },
            {
                "version": "5-0",
                "rootElements": ["dataDocument"],
                "schemes": [ { "kind": "open", "uri": "urn:any" } ]
            }
        ]
    }"#;

    #[test]
    fn test_build_registry() {
        let registry = ReleaseRegistry::from_json(CONFIG).unwrap();
        assert_eq!(registry.len(), 2);

        let r42 = registry.for_version("4-2").unwrap();
        assert!(r42.has_scheme_defaults());
        let currency = r42.schemes().find("http://www.fpml.org/ext/iso4217").unwrap();
        assert!(currency.is_valid("EUR"));
        assert!(!currency.is_valid("JPY"));
        assert!(r42.schemes().find("urn:bic").unwrap().is_valid("DEUTDEFF"));

        let r50 = registry.for_version("5-0").unwrap();
        assert!(!r50.has_scheme_defaults());
        assert!(r50.schemes().find("urn:any").unwrap().is_valid("x"));
    }

    #[test]
    fn test_bad_pattern_is_reported() {
        let json = r#"{ "releases": [ { "version": "4-2", "rootElements": ["FpML"],
                        "schemes": [ { "kind": "pattern", "uri": "urn:x", "pattern": "(" } ] } ] }"#;
        assert!(matches!(ReleaseRegistry::from_json(json), Err(Error::Pattern { .. })));
    }

    #[test]
    fn test_unknown_kind_is_config_error() {
        let json = r#"{ "releases": [ { "version": "4-2", "rootElements": ["FpML"],
                        "schemes": [ { "kind": "fuzzy", "uri": "urn:x" } ] } ] }"#;
        assert!(matches!(ReleaseRegistry::from_json(json), Err(Error::Config(_))));
        assert!(matches!(ReleaseRegistry::from_json("{"), Err(Error::Config(_))));
    }

    #[test]
    fn test_invalid_file_names_the_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{ \"releases\": 1 }").unwrap();

        match ReleaseRegistry::from_file(file.path()) {
            Err(Error::Config(msg)) => {
                assert!(msg.starts_with(&file.path().display().to_string()), "{}", msg)
            }
            other => panic!("expected a configuration error, got {:?}", other),
        }
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CONFIG.as_bytes()).unwrap();

        let registry = ReleaseRegistry::from_file(file.path()).unwrap();
        assert!(registry.for_version("5-0").is_some());
    }

    #[test]
    fn test_from_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = ReleaseRegistry::from_file(dir.path().join("missing.json"));
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
