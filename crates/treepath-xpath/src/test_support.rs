//! A small in-memory XML tree implementing [`NodeModel`] for the tests.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::node::{NodeKind, NodeModel};

#[derive(Clone)]
pub(crate) struct TreeNode(Rc<NodeData>);

struct NodeData {
    kind: NodeKind,
    name: Option<String>,
    value: String,
    attributes: RefCell<Vec<TreeNode>>,
    children: RefCell<Vec<TreeNode>>,
    parent: RefCell<Weak<NodeData>>,
    order: Cell<usize>,
}

fn node(kind: NodeKind, name: Option<&str>, value: &str) -> TreeNode {
    TreeNode(Rc::new(NodeData {
        kind,
        name: name.map(str::to_owned),
        value: value.to_owned(),
        attributes: RefCell::new(Vec::new()),
        children: RefCell::new(Vec::new()),
        parent: RefCell::new(Weak::new()),
        order: Cell::new(0),
    }))
}

/// Wrap children into a document node and assign parents and document
/// order over the whole tree.
pub(crate) fn document(children: Vec<TreeNode>) -> TreeNode {
    let doc = node(NodeKind::Document, None, "");
    *doc.0.children.borrow_mut() = children;
    let mut order = 0;
    wire(&doc, None, &mut order);
    doc
}

fn wire(current: &TreeNode, parent: Option<&TreeNode>, order: &mut usize) {
    if let Some(parent) = parent {
        *current.0.parent.borrow_mut() = Rc::downgrade(&parent.0);
    }
    current.0.order.set(*order);
    *order += 1;
    for attribute in current.0.attributes.borrow().iter() {
        *attribute.0.parent.borrow_mut() = Rc::downgrade(&current.0);
        attribute.0.order.set(*order);
        *order += 1;
    }
    for child in current.0.children.borrow().iter() {
        wire(child, Some(current), order);
    }
}

pub(crate) fn elem(name: &str, children: Vec<TreeNode>) -> TreeNode {
    elem_with(name, &[], children)
}

pub(crate) fn elem_with(
    name: &str,
    attributes: &[(&str, &str)],
    children: Vec<TreeNode>,
) -> TreeNode {
    let element = node(NodeKind::Element, Some(name), "");
    *element.0.attributes.borrow_mut() = attributes
        .iter()
        .map(|(name, value)| node(NodeKind::Attribute, Some(name), value))
        .collect();
    *element.0.children.borrow_mut() = children;
    element
}

pub(crate) fn text(value: &str) -> TreeNode {
    node(NodeKind::Text, None, value)
}

pub(crate) fn comment(value: &str) -> TreeNode {
    node(NodeKind::Comment, None, value)
}

pub(crate) fn pi(target: &str, value: &str) -> TreeNode {
    node(NodeKind::ProcessingInstruction, Some(target), value)
}

impl TreeNode {
    /// First descendant element with the given name.
    pub(crate) fn find(&self, name: &str) -> Option<TreeNode> {
        for child in self.children() {
            if child.node_kind() == NodeKind::Element {
                if child.name().as_deref() == Some(name) {
                    return Some(child);
                }
                if let Some(found) = child.find(name) {
                    return Some(found);
                }
            }
        }
        None
    }
}

impl PartialEq for TreeNode {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for TreeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0.name {
            Some(name) => write!(f, "{:?}({name})", self.0.kind),
            None => write!(f, "{:?}({:?})", self.0.kind, self.0.value),
        }
    }
}

impl NodeModel for TreeNode {
    fn node_kind(&self) -> NodeKind {
        self.0.kind
    }

    fn name(&self) -> Option<String> {
        self.0.name.clone()
    }

    fn string_value(&self) -> String {
        match self.0.kind {
            NodeKind::Document | NodeKind::Element => {
                let mut out = String::new();
                gather_text(self, &mut out);
                out
            }
            _ => self.0.value.clone(),
        }
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.0
            .attributes
            .borrow()
            .iter()
            .find(|a| a.0.name.as_deref() == Some(name))
            .map(|a| a.0.value.clone())
    }

    fn parent(&self) -> Option<Self> {
        self.0.parent.borrow().upgrade().map(TreeNode)
    }

    fn children(&self) -> Vec<Self> {
        self.0.children.borrow().clone()
    }

    fn attributes(&self) -> Vec<Self> {
        self.0.attributes.borrow().clone()
    }

    fn document_order(&self) -> usize {
        self.0.order.get()
    }
}

fn gather_text(node: &TreeNode, out: &mut String) {
    for child in node.0.children.borrow().iter() {
        match child.0.kind {
            NodeKind::Text => out.push_str(&child.0.value),
            NodeKind::Element => gather_text(child, out),
            _ => {}
        }
    }
}
