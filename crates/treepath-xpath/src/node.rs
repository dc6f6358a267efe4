//! Interface to the external XML data model.
//!
//! Evaluation never owns a document: it navigates whatever tree the caller
//! supplies through [`NodeModel`]. Names are expanded (`{uri}local`), and
//! every node exposes a stable document-order index used for sorting and
//! identity deduplication.

use std::fmt;

/// Kind of a node in the data model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Document,
    Element,
    Attribute,
    Text,
    Comment,
    ProcessingInstruction,
}

/// An XML-like node supplied by the caller.
///
/// Implementations are expected to be cheap handles (reference-counted or
/// indexed) — evaluation clones them freely.
pub trait NodeModel: Clone + PartialEq + fmt::Debug + 'static {
    fn node_kind(&self) -> NodeKind;

    /// Expanded name: `{uri}local` for namespaced nodes, `local` otherwise;
    /// `None` for kinds without names.
    fn name(&self) -> Option<String>;

    /// The XPath string value of the node.
    fn string_value(&self) -> String;

    /// Attribute value by expanded name; elements only.
    fn attribute(&self, name: &str) -> Option<String>;

    fn parent(&self) -> Option<Self>;

    /// Child nodes in document order (elements, text, comments, PIs).
    fn children(&self) -> Vec<Self>;

    /// Attribute nodes of an element.
    fn attributes(&self) -> Vec<Self>;

    /// Stable position of the node in document order.
    fn document_order(&self) -> usize;
}

/// A namespace binding yielded by the `namespace` axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceNode {
    pub prefix: String,
    pub uri: String,
}

/// Uninhabited node type for evaluating expressions without a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoNode {}

impl NodeModel for NoNode {
    fn node_kind(&self) -> NodeKind {
        match *self {}
    }

    fn name(&self) -> Option<String> {
        match *self {}
    }

    fn string_value(&self) -> String {
        match *self {}
    }

    fn attribute(&self, _name: &str) -> Option<String> {
        match *self {}
    }

    fn parent(&self) -> Option<Self> {
        match *self {}
    }

    fn children(&self) -> Vec<Self> {
        match *self {}
    }

    fn attributes(&self) -> Vec<Self> {
        match *self {}
    }

    fn document_order(&self) -> usize {
        match *self {}
    }
}

/// Match an expanded node name against a name test.
///
/// Supports exact matches, the `*:local` form (any namespace), and the
/// `{uri}*` form (any local name in a namespace).
pub(crate) fn name_matches(name: &str, test: &str) -> bool {
    if test == "*" {
        return true;
    }
    if let Some(local) = test.strip_prefix("*:") {
        let node_local = name.rsplit_once('}').map_or(name, |(_, l)| l);
        return node_local == local;
    }
    let (test_uri, test_local) = split_expanded(test);
    if test_uri.is_some() && test_local == "*" {
        return split_expanded(name).0 == test_uri;
    }
    name == test
}

/// Split an expanded name into its namespace URI and local part.
pub(crate) fn split_expanded(name: &str) -> (Option<&str>, &str) {
    if let Some(rest) = name.strip_prefix('{') {
        if let Some((uri, local)) = rest.split_once('}') {
            return (Some(uri), local);
        }
    }
    (None, name)
}

/// Render an expanded name as `prefix:local` using a namespace map.
pub(crate) fn prefixed_name(
    name: &str,
    namespaces: &indexmap::IndexMap<String, String>,
) -> String {
    let (uri, local) = split_expanded(name);
    let Some(uri) = uri else {
        return local.to_owned();
    };
    for (prefix, bound) in namespaces {
        if bound == uri {
            if prefix.is_empty() {
                return local.to_owned();
            }
            return format!("{prefix}:{local}");
        }
    }
    local.to_owned()
}
