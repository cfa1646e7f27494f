//! Per-run lookup structures over a parsed document
//!
//! A [`DocumentIndex`] is built in a single pass over the tree and binds
//! four maps at once: elements by local name, elements by declared type,
//! elements by `id` attribute and attributes by local name. It borrows the
//! document and is never mutated after construction.
//!
//! When two elements declare the same `id` the first one in document order
//! is kept; later ones are recorded in [`DocumentIndex::duplicate_ids`].

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::documents::{Attribute, Document, NodeId, NodeRef};
use crate::namespaces::QName;
use crate::references::strip_fragment;

/// Handle to one attribute of one element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttrRef {
    /// Element owning the attribute
    pub element: NodeId,
    /// Position of the attribute on the element
    pub position: usize,
}

/// Read-only lookup tables over a [`Document`]
#[derive(Debug)]
pub struct DocumentIndex<'a> {
    document: &'a Document,
    by_name: HashMap<&'a str, Vec<NodeId>>,
    by_type: HashMap<&'a QName, Vec<NodeId>>,
    by_id: HashMap<&'a str, NodeId>,
    by_attribute: HashMap<&'a str, Vec<AttrRef>>,
    duplicate_ids: IndexMap<&'a str, Vec<NodeId>>,
}

impl<'a> DocumentIndex<'a> {
    /// Index a document
    pub fn new(document: &'a Document) -> Self {
        let mut index = Self {
            document,
            by_name: HashMap::new(),
            by_type: HashMap::new(),
            by_id: HashMap::new(),
            by_attribute: HashMap::new(),
            duplicate_ids: IndexMap::new(),
        };

        for node in document.elements() {
            let id = node.id();
            index.by_name.entry(node.local_name()).or_default().push(id);

            if let Some(type_name) = node.declared_type() {
                index.by_type.entry(type_name).or_default().push(id);
            }

            for (position, attr) in node.attributes().iter().enumerate() {
                index
                    .by_attribute
                    .entry(attr.name.local_name.as_str())
                    .or_default()
                    .push(AttrRef { element: id, position });

                if attr.name.namespace.is_none() && attr.name.local_name == "id" {
                    index.bind_id(attr.value.trim(), id);
                }
            }
        }

        tracing::debug!(
            elements = document.len(),
            names = index.by_name.len(),
            ids = index.by_id.len(),
            typed = document.has_type_information(),
            "built document index"
        );

        index
    }

    fn bind_id(&mut self, value: &'a str, id: NodeId) {
        if self.by_id.contains_key(value) {
            tracing::warn!(id = value, "duplicate id attribute; keeping first occurrence");
            self.duplicate_ids.entry(value).or_default().push(id);
        } else {
            self.by_id.insert(value, id);
        }
    }

    /// The indexed document
    pub fn document(&self) -> &'a Document {
        self.document
    }

    /// The document root, if any
    pub fn root(&self) -> Option<NodeRef<'a>> {
        self.document.root()
    }

    /// Whether declared type information is available for lookups
    pub fn has_type_information(&self) -> bool {
        self.document.has_type_information()
    }

    /// Elements with the given local name, in document order
    pub fn elements_by_name(&self, local_name: &str) -> Vec<NodeRef<'a>> {
        self.lookup(self.by_name.get(local_name))
    }

    /// Elements with the given namespace and local name, in document order
    pub fn elements_by_qname(&self, namespace: Option<&str>, local_name: &str) -> Vec<NodeRef<'a>> {
        self.elements_by_name(local_name)
            .into_iter()
            .filter(|n| n.namespace() == namespace)
            .collect()
    }

    /// Elements whose declared type is `{namespace}type_name`.
    ///
    /// Empty unless the document carries type information.
    pub fn elements_by_type(&self, namespace: Option<&str>, type_name: &str) -> Vec<NodeRef<'a>> {
        let key = QName::new(namespace, type_name);
        self.lookup(self.by_type.get(&key))
    }

    /// Element whose `id` matches, after stripping one leading `#`
    pub fn element_by_id(&self, id: &str) -> Option<NodeRef<'a>> {
        self.by_id
            .get(strip_fragment(id))
            .map(|&node| self.document.node(node))
    }

    /// Attributes with the given local name, in document order
    pub fn attributes_by_name(&self, local_name: &str) -> Vec<AttrRef> {
        self.by_attribute.get(local_name).cloned().unwrap_or_default()
    }

    /// Resolve an attribute handle
    pub fn attribute(&self, attr: AttrRef) -> Option<&'a Attribute> {
        self.document.node(attr.element).attributes().get(attr.position)
    }

    /// Ids declared more than once, with the elements that lost out
    pub fn duplicate_ids(&self) -> impl Iterator<Item = (&'a str, &[NodeId])> + '_ {
        self.duplicate_ids.iter().map(|(k, v)| (*k, v.as_slice()))
    }

    fn lookup(&self, ids: Option<&Vec<NodeId>>) -> Vec<NodeRef<'a>> {
        ids.map(|ids| ids.iter().map(|&id| self.document.node(id)).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const TRADE: &str = r##"
        <FpML xmlns="urn:fpml" version="4-2">
          <trade>
            <swap>
              <swapStream id="s1"><payerPartyReference href="#partyA"/></swapStream>
              <swapStream id="s2"><payerPartyReference href="partyB"/></swapStream>
            </swap>
          </trade>
          <party id="partyA"><partyId>A</partyId></party>
          <party id="partyB"><partyId>B</partyId></party>
        </FpML>"##;

    #[test]
    fn test_elements_by_name_in_document_order() {
        let doc = Document::from_string(TRADE).unwrap();
        let index = DocumentIndex::new(&doc);

        let streams: Vec<_> = index
            .elements_by_name("swapStream")
            .iter()
            .map(|n| n.attribute("id").unwrap())
            .collect();
        assert_eq!(streams, ["s1", "s2"]);
        assert!(index.elements_by_name("capFloor").is_empty());
    }

    #[test]
    fn test_elements_by_qname() {
        let doc = Document::from_string(TRADE).unwrap();
        let index = DocumentIndex::new(&doc);
        assert_eq!(index.elements_by_qname(Some("urn:fpml"), "party").len(), 2);
        assert!(index.elements_by_qname(None, "party").is_empty());
    }

    #[test]
    fn test_element_by_id_strips_fragment() {
        let doc = Document::from_string(TRADE).unwrap();
        let index = DocumentIndex::new(&doc);

        let plain = index.element_by_id("partyA").unwrap();
        let fragment = index.element_by_id("#partyA").unwrap();
        assert_eq!(plain, fragment);
        assert_eq!(plain.local_name(), "party");
        assert!(index.element_by_id("##partyA").is_none());
        assert!(index.element_by_id("partyC").is_none());
    }

    #[test]
    fn test_duplicate_ids_first_wins() {
        let xml = r#"<r><a id="A" n="1"/><b id="A" n="2"/><c id="A" n="3"/></r>"#;
        let doc = Document::from_string(xml).unwrap();
        let index = DocumentIndex::new(&doc);

        for _ in 0..3 {
            assert_eq!(index.element_by_id("A").unwrap().attribute("n"), Some("1"));
        }
        let dups: Vec<_> = index.duplicate_ids().collect();
        assert_eq!(dups.len(), 1);
        assert_eq!(dups[0].0, "A");
        assert_eq!(dups[0].1.len(), 2);
    }

    #[test]
    fn test_attributes_by_name() {
        let doc = Document::from_string(TRADE).unwrap();
        let index = DocumentIndex::new(&doc);

        let hrefs: Vec<_> = index
            .attributes_by_name("href")
            .into_iter()
            .filter_map(|a| index.attribute(a))
            .map(|a| a.value.as_str())
            .collect();
        assert_eq!(hrefs, ["#partyA", "partyB"]);
    }

    #[test]
    fn test_type_index_requires_annotations() {
        let mut doc = Document::from_string(TRADE).unwrap();
        {
            let index = DocumentIndex::new(&doc);
            assert!(!index.has_type_information());
            assert!(index.elements_by_type(Some("urn:fpml"), "Party").is_empty());
        }

        let parties: Vec<_> = doc
            .elements()
            .filter(|n| n.local_name() == "party")
            .map(|n| n.id())
            .collect();
        for id in parties {
            doc.annotate_type(id, QName::namespaced("urn:fpml", "Party"));
        }

        let index = DocumentIndex::new(&doc);
        assert!(index.has_type_information());
        assert_eq!(index.elements_by_type(Some("urn:fpml"), "Party").len(), 2);
    }

    #[test]
    fn test_empty_document() {
        let doc = Document::new();
        let index = DocumentIndex::new(&doc);
        assert!(index.root().is_none());
        assert!(index.elements_by_name("FpML").is_empty());
        assert!(index.element_by_id("x").is_none());
    }
}
