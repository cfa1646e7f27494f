//! Scheme validation rules
//!
//! A scheme rule checks coded values such as `<currency
//! currencyScheme="...">USD</currency>`. For each selected element it finds
//! the enclosing document root, resolves the release from the declared
//! version, determines the scheme URI and checks the trimmed text against
//! that release's scheme.
//!
//! Older releases allow the URI to be omitted when the root carries a
//! default (`currencySchemeDefault` for `currencyScheme`). The "broken"
//! variant skips that fallback for elements where the convention is known
//! not to apply.

use std::sync::Arc;

use crate::documents::NodeRef;
use crate::preconditions::Precondition;
use crate::schemes::ReleaseRegistry;

use super::handler::Reporter;
use super::selector::ElementSelector;
use super::{Rule, RULE_VIOLATION};

/// Build a scheme rule with the version-default fallback
pub fn scheme_rule(
    name: impl Into<String>,
    precondition: Arc<Precondition>,
    registry: Arc<ReleaseRegistry>,
    targets: ElementSelector,
    attribute: impl Into<String>,
) -> Rule {
    build(name, precondition, registry, targets, attribute.into(), true)
}

/// Build a scheme rule that only looks at the element's own attribute
pub fn broken_scheme_rule(
    name: impl Into<String>,
    precondition: Arc<Precondition>,
    registry: Arc<ReleaseRegistry>,
    targets: ElementSelector,
    attribute: impl Into<String>,
) -> Rule {
    build(name, precondition, registry, targets, attribute.into(), false)
}

fn build(
    name: impl Into<String>,
    precondition: Arc<Precondition>,
    registry: Arc<ReleaseRegistry>,
    targets: ElementSelector,
    attribute: String,
    use_defaults: bool,
) -> Rule {
    Rule::new(name, precondition, move |index, reporter| {
        targets
            .select(index)
            .iter()
            .fold(true, |ok, element| {
                check_element(&registry, element, &attribute, use_defaults, reporter) && ok
            })
    })
}

fn check_element(
    registry: &ReleaseRegistry,
    element: &NodeRef<'_>,
    attribute: &str,
    use_defaults: bool,
    reporter: &mut Reporter<'_>,
) -> bool {
    let Some((root, release)) = registry.enclosing_root(element) else {
        tracing::debug!(path = %element.path(), "no recognised document root; skipping scheme check");
        return true;
    };

    let uri = element
        .attribute(attribute)
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .or_else(|| {
            if !use_defaults {
                return None;
            }
            let default = release.default_attribute(attribute)?;
            root.attribute(&default).map(str::trim).filter(|u| !u.is_empty())
        });

    let Some(uri) = uri else {
        reporter.report(
            RULE_VIOLATION,
            element,
            format!(
                "The <{}> element has no {} and no default applies",
                element.local_name(),
                attribute
            ),
            None,
        );
        return false;
    };

    let Some(scheme) = release.schemes().find(uri) else {
        reporter.report(
            RULE_VIOLATION,
            element,
            format!(
                "The {} value '{}' is not a recognised scheme for release {}",
                attribute,
                uri,
                release.label()
            ),
            Some(uri),
        );
        return false;
    };

    let code = element.text();
    if scheme.is_valid(code) {
        true
    } else {
        reporter.report(
            RULE_VIOLATION,
            element,
            format!("The code value '{}' is not valid for scheme '{}'", code, uri),
            Some(code),
        );
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::Document;
    use crate::error::ValidationError;
    use crate::index::DocumentIndex;
    use crate::preconditions::EvaluationCache;
    use crate::schemes::{Release, Scheme, SchemeCollection};
    use pretty_assertions::assert_eq;

    const ISO4217: &str = "http://www.fpml.org/ext/iso4217";

    fn registry() -> Arc<ReleaseRegistry> {
        let schemes = || SchemeCollection::new().with(Scheme::closed(ISO4217, ["USD", "EUR"]));
        let mut registry = ReleaseRegistry::new();
        registry
            .register(Release::new("4-2", ["FpML"], schemes()).unwrap().with_scheme_defaults(true))
            .unwrap();
        registry
            .register(Release::new("5-0", ["dataDocument"], schemes()).unwrap())
            .unwrap();
        Arc::new(registry)
    }

    fn currency_rule(broken: bool) -> Rule {
        let targets = ElementSelector::names(["currency"]);
        if broken {
            broken_scheme_rule("scheme-currency", Precondition::always(), registry(), targets, "currencyScheme")
        } else {
            scheme_rule("scheme-currency", Precondition::always(), registry(), targets, "currencyScheme")
        }
    }

    fn run(rule: &Rule, xml: &str) -> (bool, Vec<ValidationError>) {
        let doc = Document::from_string(xml).unwrap();
        let index = DocumentIndex::new(&doc);
        let mut errors: Vec<ValidationError> = Vec::new();
        let ok = rule.run(&index, &mut EvaluationCache::new(), &mut errors);
        (ok, errors)
    }

    #[test]
    fn test_valid_codes() {
        let xml = format!(
            r#"<dataDocument fpmlVersion="5-0"><currency currencyScheme="{0}">USD</currency><currency currencyScheme="{0}"> EUR </currency></dataDocument>"#,
            ISO4217
        );
        let (ok, errors) = run(&currency_rule(false), &xml);
        assert!(ok);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_invalid_code_reported_and_batch_continues() {
        let xml = format!(
            r#"<dataDocument fpmlVersion="5-0"><currency currencyScheme="{0}">XXX</currency><currency currencyScheme="{0}">YYY</currency></dataDocument>"#,
            ISO4217
        );
        let (ok, errors) = run(&currency_rule(false), &xml);
        assert!(!ok);
        let data: Vec<_> = errors.iter().map(|e| e.additional_data.clone().unwrap()).collect();
        assert_eq!(data, ["XXX", "YYY"]);
        assert!(errors.iter().all(|e| e.code == RULE_VIOLATION));
    }

    #[test]
    fn test_unrecognised_scheme() {
        let xml = r#"<dataDocument fpmlVersion="5-0"><currency currencyScheme="urn:mine">USD</currency></dataDocument>"#;
        let (ok, errors) = run(&currency_rule(false), xml);
        assert!(!ok);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].additional_data.as_deref(), Some("urn:mine"));
        assert!(errors[0].description.contains("not a recognised scheme"));
    }

    #[test]
    fn test_missing_scheme_without_default() {
        let xml = r#"<dataDocument fpmlVersion="5-0"><currency>USD</currency></dataDocument>"#;
        let (ok, errors) = run(&currency_rule(false), xml);
        assert!(!ok);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, "305");
        assert!(errors[0].description.contains("has no currencyScheme"));
    }

    #[test]
    fn test_root_default_applies_to_older_release() {
        let xml = format!(
            r#"<FpML version="4-2" currencySchemeDefault="{}"><trade><currency>EUR</currency><currency>JPY</currency></trade></FpML>"#,
            ISO4217
        );
        let (ok, errors) = run(&currency_rule(false), &xml);
        assert!(!ok);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].additional_data.as_deref(), Some("JPY"));
        assert_eq!(errors[0].path.as_deref(), Some("/FpML/trade[1]/currency[2]"));

        // Defaults are allowed for this release but the root declares none
        let xml = r#"<FpML version="4-2"><trade><currency>EUR</currency></trade></FpML>"#;
        let (ok, errors) = run(&currency_rule(false), xml);
        assert!(!ok);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, RULE_VIOLATION);
        assert!(errors[0].description.contains("has no currencyScheme"));
    }

    #[test]
    fn test_broken_variant_ignores_root_default() {
        let xml = format!(
            r#"<FpML version="4-2" currencySchemeDefault="{}"><currency>EUR</currency></FpML>"#,
            ISO4217
        );
        let (ok, errors) = run(&currency_rule(true), &xml);
        assert!(!ok);
        assert!(errors[0].description.contains("has no currencyScheme"));
    }

    #[test]
    fn test_unrecognised_root_is_skipped() {
        let xml = r#"<FpML version="9-9"><currency>ZZZ</currency></FpML>"#;
        let (ok, errors) = run(&currency_rule(false), xml);
        assert!(ok);
        assert!(errors.is_empty());
    }
}
