//! id/href reference resolution
//!
//! An `href` holds either the target's `id` directly or the same token
//! prefixed with `#` (XPointer bare-name fragment). One leading `#` is
//! stripped before the id lookup.

use crate::documents::NodeRef;
use crate::index::DocumentIndex;

/// Strip one leading `#` from a reference value
pub fn strip_fragment(reference: &str) -> &str {
    reference.strip_prefix('#').unwrap_or(reference)
}

/// Resolve a reference value to its target element
pub fn resolve<'a>(index: &DocumentIndex<'a>, reference: &str) -> Option<NodeRef<'a>> {
    index.element_by_id(reference.trim())
}

/// Resolve the `href` attribute of an element
pub fn resolve_href<'a>(index: &DocumentIndex<'a>, element: &NodeRef<'a>) -> Option<NodeRef<'a>> {
    element.attribute("href").and_then(|href| resolve(index, href))
}
