//! XML document tree
//!
//! Documents are parsed once into an immutable arena of element nodes.
//! Nodes are addressed by [`NodeId`] and navigated through [`NodeRef`],
//! which exposes the read-only view the rule engine works against: names,
//! attributes, children, parent and trimmed text.
//!
//! Nodes are stored in document order, so iterating the arena is a
//! pre-order traversal of the tree.

use crate::error::{Error, Result};
use crate::namespaces::{resolve_in_scopes, split_qname, NamespaceContext, QName, XSI_NAMESPACE};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::fmt;

/// Handle to an element inside a [`Document`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Position of the element in document order
    pub fn index(self) -> usize {
        self.0
    }
}

/// An attribute on an element
#[derive(Debug, Clone)]
pub struct Attribute {
    /// Attribute qualified name (unprefixed attributes have no namespace)
    pub name: QName,
    /// Attribute value
    pub value: String,
}

#[derive(Debug, Clone)]
struct NodeData {
    name: QName,
    attributes: Vec<Attribute>,
    text: String,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
    namespaces: NamespaceContext,
    declared_type: Option<QName>,
}

/// XML Document representation
#[derive(Debug, Clone, Default)]
pub struct Document {
    nodes: Vec<NodeData>,
    root: Option<NodeId>,
    typed: bool,
}

impl Document {
    /// Create a new empty document (no root element)
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an XML document from a string
    pub fn from_string(xml: &str) -> Result<Self> {
        Self::parse(xml.as_bytes())
    }

    /// Parse an XML document from bytes
    pub fn parse(xml: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(xml);
        reader.trim_text(true);

        let mut doc = Document::new();
        let mut stack: Vec<NodeId> = Vec::new();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => {
                    let id = doc.open_element(&e, stack.last().copied())?;
                    stack.push(id);
                }
                Ok(Event::End(_)) => {
                    stack.pop();
                }
                Ok(Event::Empty(e)) => {
                    doc.open_element(&e, stack.last().copied())?;
                }
                Ok(Event::Text(e)) => {
                    if let Some(&current) = stack.last() {
                        let text = e
                            .unescape()
                            .map_err(|e| Error::Xml(format!("Failed to unescape text: {}", e)))?;
                        doc.nodes[current.0].text.push_str(&text);
                    }
                }
                Ok(Event::CData(e)) => {
                    if let Some(&current) = stack.last() {
                        let bytes = e.into_inner();
                        doc.nodes[current.0]
                            .text
                            .push_str(&String::from_utf8_lossy(&bytes));
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::Xml(format!(
                        "Error parsing XML at position {}: {}",
                        reader.buffer_position(),
                        e
                    )))
                }
                _ => {} // Ignore comments, processing instructions, doctype
            }
            buf.clear();
        }

        if !stack.is_empty() {
            return Err(Error::Xml("Unexpected end of document".to_string()));
        }

        Ok(doc)
    }

    /// Append an element for a start tag and bind it to its parent
    fn open_element(&mut self, start: &BytesStart, parent: Option<NodeId>) -> Result<NodeId> {
        if parent.is_none() && self.root.is_some() {
            return Err(Error::Xml("Document has more than one root element".to_string()));
        }

        let name = std::str::from_utf8(start.name().as_ref())
            .map_err(|e| Error::Xml(format!("Invalid element name: {}", e)))?
            .to_string();

        // Namespace declarations first, they scope this element's own name
        let mut namespaces = NamespaceContext::new();
        let mut raw_attributes = Vec::new();
        for attr_result in start.attributes() {
            let attr = attr_result
                .map_err(|e| Error::Xml(format!("Failed to parse attribute: {}", e)))?;
            let attr_name = std::str::from_utf8(attr.key.as_ref())
                .map_err(|e| Error::Xml(format!("Invalid attribute name: {}", e)))?
                .to_string();
            let attr_value = attr
                .unescape_value()
                .map_err(|e| Error::Xml(format!("Failed to unescape attribute value: {}", e)))?
                .to_string();

            if attr_name == "xmlns" {
                namespaces.set_default_namespace(attr_value);
            } else if let Some(prefix) = attr_name.strip_prefix("xmlns:") {
                namespaces.add_prefix(prefix, attr_value);
            } else {
                raw_attributes.push((attr_name, attr_value));
            }
        }

        let (prefix, local) = split_qname(&name);
        let namespace = self.resolve_prefix(&namespaces, parent, prefix);
        if prefix.is_some() && namespace.is_none() {
            return Err(Error::Xml(format!("Unbound namespace prefix in '{}'", name)));
        }

        let mut attributes = Vec::with_capacity(raw_attributes.len());
        for (attr_name, value) in raw_attributes {
            let qname = match split_qname(&attr_name) {
                (Some(prefix), local) => {
                    let ns = self
                        .resolve_prefix(&namespaces, parent, Some(prefix))
                        .ok_or_else(|| {
                            Error::Xml(format!("Unbound namespace prefix in '{}'", attr_name))
                        })?;
                    QName::namespaced(ns, local)
                }
                (None, local) => QName::local(local),
            };
            attributes.push(Attribute { name: qname, value });
        }

        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            name: QName::new(namespace, local),
            attributes,
            text: String::new(),
            children: Vec::new(),
            parent,
            namespaces,
            declared_type: None,
        });

        match parent {
            Some(p) => self.nodes[p.0].children.push(id),
            None => self.root = Some(id),
        }

        Ok(id)
    }

    fn resolve_prefix(
        &self,
        local: &NamespaceContext,
        parent: Option<NodeId>,
        prefix: Option<&str>,
    ) -> Option<String> {
        resolve_in_scopes(std::iter::once(local).chain(self.scopes(parent)), prefix)
    }

    /// Namespace scopes from `start` up to the root
    fn scopes(&self, start: Option<NodeId>) -> impl Iterator<Item = &NamespaceContext> + '_ {
        std::iter::successors(start, move |id| self.nodes[id.0].parent)
            .map(move |id| &self.nodes[id.0].namespaces)
    }

    /// Get the root element
    pub fn root(&self) -> Option<NodeRef<'_>> {
        self.root.map(|id| self.node(id))
    }

    /// Get a view of an element
    ///
    /// Panics if the id does not belong to this document.
    pub fn node(&self, id: NodeId) -> NodeRef<'_> {
        assert!(id.0 < self.nodes.len(), "node id out of range");
        NodeRef { doc: self, id }
    }

    /// All elements in document order
    pub fn elements(&self) -> impl Iterator<Item = NodeRef<'_>> + '_ {
        (0..self.nodes.len()).map(move |i| NodeRef { doc: self, id: NodeId(i) })
    }

    /// Number of elements in the document
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if the document has no elements
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether declared type information has been supplied
    pub fn has_type_information(&self) -> bool {
        self.typed
    }

    /// Record the declared schema type of an element
    pub fn annotate_type(&mut self, id: NodeId, type_name: QName) {
        self.nodes[id.0].declared_type = Some(type_name);
        self.typed = true;
    }

    /// Derive declared types from `xsi:type` attributes.
    ///
    /// The document carries type information afterwards only if at least
    /// one element was annotated. Returns the number of elements annotated.
    pub fn annotate_xsi_types(&mut self) -> usize {
        let mut found = Vec::new();
        for node in self.elements() {
            let Some(value) = node.attribute_ns(Some(XSI_NAMESPACE), "type") else {
                continue;
            };
            let (prefix, local) = split_qname(value.trim());
            let namespace = resolve_in_scopes(self.scopes(Some(node.id)), prefix);
            if prefix.is_some() && namespace.is_none() {
                tracing::debug!(path = %node.path(), value, "unresolvable xsi:type prefix");
                continue;
            }
            found.push((node.id, QName::new(namespace, local)));
        }

        let count = found.len();
        for (id, qname) in found {
            self.annotate_type(id, qname);
        }
        count
    }
}

/// Borrowed view of one element in a [`Document`]
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    doc: &'a Document,
    id: NodeId,
}

impl<'a> NodeRef<'a> {
    fn data(&self) -> &'a NodeData {
        &self.doc.nodes[self.id.0]
    }

    /// The element handle
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The owning document
    pub fn document(&self) -> &'a Document {
        self.doc
    }

    /// Qualified element name
    pub fn name(&self) -> &'a QName {
        &self.data().name
    }

    /// Get the local name of the element
    pub fn local_name(&self) -> &'a str {
        &self.data().name.local_name
    }

    /// Get the namespace of the element
    pub fn namespace(&self) -> Option<&'a str> {
        self.data().name.namespace.as_deref()
    }

    /// Get an attribute value by local name
    pub fn attribute(&self, local_name: &str) -> Option<&'a str> {
        self.data()
            .attributes
            .iter()
            .find(|a| a.name.local_name == local_name)
            .map(|a| a.value.as_str())
    }

    /// Get an attribute value by namespace and local name
    pub fn attribute_ns(&self, namespace: Option<&str>, local_name: &str) -> Option<&'a str> {
        self.data()
            .attributes
            .iter()
            .find(|a| a.name.matches(namespace, local_name))
            .map(|a| a.value.as_str())
    }

    /// All attributes in source order
    pub fn attributes(&self) -> &'a [Attribute] {
        &self.data().attributes
    }

    /// Child elements in document order
    pub fn children(&self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        let doc = self.doc;
        self.data().children.iter().map(move |&id| NodeRef { doc, id })
    }

    /// First child element with the given local name
    pub fn child(&self, local_name: &str) -> Option<NodeRef<'a>> {
        self.children().find(|c| c.local_name() == local_name)
    }

    /// Follow a chain of child local names
    pub fn descend(&self, path: &[&str]) -> Option<NodeRef<'a>> {
        path.iter().try_fold(*self, |node, name| node.child(name))
    }

    /// Parent element
    pub fn parent(&self) -> Option<NodeRef<'a>> {
        self.data().parent.map(|id| NodeRef { doc: self.doc, id })
    }

    /// Ancestors from the parent up to the root
    pub fn ancestors(&self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        std::iter::successors(self.parent(), |n| n.parent())
    }

    /// Trimmed text content
    pub fn text(&self) -> &'a str {
        self.data().text.trim()
    }

    /// Declared schema type, when type information is available
    pub fn declared_type(&self) -> Option<&'a QName> {
        self.data().declared_type.as_ref()
    }

    /// Location path such as `/FpML/trade[1]/swap[1]`
    pub fn path(&self) -> String {
        let mut steps = Vec::new();
        let mut current = Some(*self);
        while let Some(node) = current {
            match node.parent() {
                Some(parent) => {
                    let position = parent
                        .children()
                        .filter(|c| c.name() == node.name())
                        .position(|c| c.id == node.id)
                        .map_or(1, |p| p + 1);
                    steps.push(format!("{}[{}]", node.local_name(), position));
                }
                None => steps.push(node.local_name().to_string()),
            }
            current = node.parent();
        }
        steps.reverse();
        format!("/{}", steps.join("/"))
    }
}

impl PartialEq for NodeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.doc, other.doc) && self.id == other.id
    }
}

impl Eq for NodeRef<'_> {}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id)
            .field("name", self.name())
            .finish()
    }
}
