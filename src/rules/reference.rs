//! Cross-reference rules
//!
//! Checks that every `href` on a set of context elements resolves to an
//! element of the expected kind. Unresolved and mistyped references are
//! reported one by one; the additional data carries the `href` exactly as
//! written, including any leading `#`.

use std::sync::Arc;

use crate::preconditions::Precondition;
use crate::references::resolve;

use super::selector::ElementSelector;
use super::{Rule, RULE_VIOLATION};

/// Build a reference rule
pub fn reference_rule(
    name: impl Into<String>,
    precondition: Arc<Precondition>,
    context: ElementSelector,
    targets: ElementSelector,
) -> Rule {
    Rule::new(name, precondition, move |index, reporter| {
        let mut ok = true;
        for element in context.select(index) {
            let Some(href) = element.attribute("href") else {
                continue;
            };

            match resolve(index, href) {
                None => {
                    reporter.report(
                        RULE_VIOLATION,
                        &element,
                        format!(
                            "The <{}> href '{}' does not match any element id",
                            element.local_name(),
                            href
                        ),
                        Some(href),
                    );
                    ok = false;
                }
                Some(target) if !targets.matches(index, &target) => {
                    reporter.report(
                        RULE_VIOLATION,
                        &element,
                        format!(
                            "The <{}> href '{}' refers to a <{}> element, expected {}",
                            element.local_name(),
                            href,
                            target.local_name(),
                            targets.describe(index)
                        ),
                        Some(href),
                    );
                    ok = false;
                }
                Some(_) => {}
            }
        }
        ok
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::Document;
    use crate::error::ValidationError;
    use crate::index::DocumentIndex;
    use crate::namespaces::QName;
    use crate::preconditions::EvaluationCache;
    use pretty_assertions::assert_eq;

    fn party_reference_rule() -> Rule {
        reference_rule(
            "ref-1",
            Precondition::always(),
            ElementSelector::names(["partyReference", "payerPartyReference"]),
            ElementSelector::names(["party"]).with_types([QName::local("Party")]),
        )
    }

    fn run(doc: &Document) -> (bool, Vec<ValidationError>) {
        let index = DocumentIndex::new(doc);
        let mut errors: Vec<ValidationError> = Vec::new();
        let ok = party_reference_rule().run(&index, &mut EvaluationCache::new(), &mut errors);
        (ok, errors)
    }

    #[test]
    fn test_resolved_references_pass() {
        let doc = Document::from_string(
            r##"<FpML><partyReference href="#partyA"/><payerPartyReference href="partyB"/>
               <party id="partyA"/><party id="partyB"/></FpML>"##,
        )
        .unwrap();
        let (ok, errors) = run(&doc);
        assert!(ok);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_unresolved_reference_keeps_literal_href() {
        let doc = Document::from_string(r##"<FpML><partyReference href="#partyA"/></FpML>"##).unwrap();
        let (ok, errors) = run(&doc);
        assert!(!ok);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].additional_data.as_deref(), Some("#partyA"));
        assert_eq!(errors[0].rule_name.as_deref(), Some("ref-1"));
    }

    #[test]
    fn test_every_bad_reference_is_reported() {
        let doc = Document::from_string(
            r##"<FpML>
                 <partyReference href="nowhere"/>
                 <partyReference href="#acct"/>
                 <partyReference href="partyA"/>
                 <partyReference/>
                 <account id="acct"/><party id="partyA"/>
               </FpML>"##,
        )
        .unwrap();
        let (ok, errors) = run(&doc);
        assert!(!ok);
        let data: Vec<_> = errors.iter().map(|e| e.additional_data.clone().unwrap()).collect();
        assert_eq!(data, ["nowhere", "#acct"]);
        assert!(errors[1].description.contains("refers to a <account> element"));
    }

    #[test]
    fn test_type_aware_target_check() {
        let mut doc = Document::from_string(
            r#"<FpML><partyReference href="p1"/><organisation id="p1"/></FpML>"#,
        )
        .unwrap();
        let (ok, _) = run(&doc);
        assert!(!ok, "by name an organisation is not a party");

        let org = doc.elements().find(|n| n.local_name() == "organisation").unwrap().id();
        let reference = doc.elements().find(|n| n.local_name() == "partyReference").unwrap().id();
        doc.annotate_type(org, QName::local("Party"));
        doc.annotate_type(reference, QName::local("PartyReference"));

        // Context selection now runs on types too; names-only context still works
        let (ok, errors) = run(&doc);
        assert!(ok, "{:?}", errors);
    }

    #[test]
    fn test_partially_typed_document() {
        let mut doc = Document::from_string(
            r##"<FpML xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
                  <partyReference href="p1"/><partyReference href="#p2"/><partyReference href="p3"/>
                  <party id="p1"/><organisation id="p2" xsi:type="Party"/><party id="p3" xsi:type="Account"/>
                </FpML>"##,
        )
        .unwrap();
        assert_eq!(doc.annotate_xsi_types(), 2);

        let (ok, errors) = run(&doc);
        assert!(!ok);
        assert_eq!(errors.len(), 1, "{:?}", errors);
        assert_eq!(errors[0].additional_data.as_deref(), Some("p3"));
        assert!(errors[0]
            .description
            .ends_with("refers to a <party> element, expected party or type Party"));
    }
}
