//! Type-aware element selection
//!
//! Rules name the elements they apply to both by local name and by declared
//! type. When the document carries type information, an element with a
//! declared type is judged by that type; an element without one is still
//! judged by its local name, since `xsi:type` usually annotates only a few
//! elements.

use crate::documents::NodeRef;
use crate::index::DocumentIndex;
use crate::namespaces::QName;

/// A set of element names and declared types
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementSelector {
    names: Vec<String>,
    types: Vec<QName>,
}

impl ElementSelector {
    /// Select by local names only
    pub fn names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            types: Vec::new(),
        }
    }

    /// Add declared types used when type information is available
    pub fn with_types<I>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = QName>,
    {
        self.types.extend(types);
        self
    }

    fn use_types(&self, index: &DocumentIndex<'_>) -> bool {
        index.has_type_information() && !self.types.is_empty()
    }

    /// Matching elements in document order
    pub fn select<'a>(&self, index: &DocumentIndex<'a>) -> Vec<NodeRef<'a>> {
        let by_name = self.names.iter().flat_map(|n| index.elements_by_name(n));
        let mut found: Vec<NodeRef<'a>> = if self.use_types(index) {
            self.types
                .iter()
                .flat_map(|t| index.elements_by_type(t.namespace.as_deref(), &t.local_name))
                .chain(by_name.filter(|n| n.declared_type().is_none()))
                .collect()
        } else {
            by_name.collect()
        };
        found.sort_by_key(|n| n.id());
        found.dedup_by_key(|n| n.id());
        found
    }

    /// Whether one element belongs to the set
    pub fn matches(&self, index: &DocumentIndex<'_>, node: &NodeRef<'_>) -> bool {
        match node.declared_type() {
            Some(declared) if self.use_types(index) => self.types.iter().any(|t| t == declared),
            _ => self.names.iter().any(|n| n == node.local_name()),
        }
    }

    /// Human readable description for messages
    pub fn describe(&self, index: &DocumentIndex<'_>) -> String {
        let mut parts = self.names.clone();
        if self.use_types(index) {
            parts.extend(self.types.iter().map(|t| format!("type {}", t)));
        }
        parts.join(" or ")
    }
}
