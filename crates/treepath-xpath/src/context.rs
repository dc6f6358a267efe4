//! The dynamic evaluation context and its axis iterators.
//!
//! A context is a cheap-to-clone bundle: the tree root, the current item,
//! the 1-based position and size of the current node list, the axis being
//! traversed, and the in-scope variables. Axis iterators return derived
//! contexts — one per selected node, with position and size filled in —
//! so nested selections compose by cloning at every boundary instead of
//! mutating shared state.

use std::collections::HashSet;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::error::{ErrorCode, XPathError};
use crate::node::{NodeKind, NodeModel};
use crate::value::{Item, Value};

/// An XPath axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Child,
    Descendant,
    DescendantOrSelf,
    Self_,
    Parent,
    Ancestor,
    AncestorOrSelf,
    FollowingSibling,
    PrecedingSibling,
    Following,
    Preceding,
    Attribute,
    Namespace,
}

impl Axis {
    pub fn from_symbol(symbol: &str) -> Option<Axis> {
        match symbol {
            "child" => Some(Axis::Child),
            "descendant" => Some(Axis::Descendant),
            "descendant-or-self" => Some(Axis::DescendantOrSelf),
            "self" => Some(Axis::Self_),
            "parent" => Some(Axis::Parent),
            "ancestor" => Some(Axis::Ancestor),
            "ancestor-or-self" => Some(Axis::AncestorOrSelf),
            "following-sibling" => Some(Axis::FollowingSibling),
            "preceding-sibling" => Some(Axis::PrecedingSibling),
            "following" => Some(Axis::Following),
            "preceding" => Some(Axis::Preceding),
            "attribute" => Some(Axis::Attribute),
            "namespace" => Some(Axis::Namespace),
            _ => None,
        }
    }

    /// Reverse axes yield nodes in reverse document order.
    pub fn is_reverse(&self) -> bool {
        matches!(
            self,
            Axis::Parent
                | Axis::Ancestor
                | Axis::AncestorOrSelf
                | Axis::PrecedingSibling
                | Axis::Preceding
        )
    }
}

/// The dynamic context an expression is evaluated against.
#[derive(Debug, Clone)]
pub struct XPathContext<N: NodeModel> {
    pub root: N,
    /// The current item; `None` means the document position.
    pub item: Option<Item<N>>,
    /// 1-based position of the item within the current node list.
    pub position: usize,
    /// Size of the current node list.
    pub size: usize,
    /// The axis being traversed, when inside an axis step.
    pub axis: Option<Axis>,
    /// In-scope variable bindings.
    pub variables: Rc<IndexMap<String, Value<N>>>,
}

impl<N: NodeModel> XPathContext<N> {
    pub fn new(root: N) -> Self {
        XPathContext {
            root,
            item: None,
            position: 1,
            size: 1,
            axis: None,
            variables: Rc::new(IndexMap::new()),
        }
    }

    pub fn with_variables(mut self, variables: IndexMap<String, Value<N>>) -> Self {
        self.variables = Rc::new(variables);
        self
    }

    /// A copy of this context focused on `item`, outside any axis.
    pub fn with_item(&self, item: Item<N>) -> Self {
        let mut ctx = self.clone();
        ctx.item = Some(item);
        ctx.axis = None;
        ctx
    }

    /// Focus the context on a tree node.
    pub fn with_item_node(mut self, node: N) -> Self {
        self.item = Some(Item::Node(node));
        self.axis = None;
        self
    }

    /// The current item as a tree node, if it is one.
    pub fn node(&self) -> Option<&N> {
        match &self.item {
            Some(Item::Node(n)) => Some(n),
            _ => None,
        }
    }

    /// The node the step applies to: the current item, or the root when
    /// the context sits at the document position.
    fn anchor(&self) -> Option<N> {
        match &self.item {
            None => Some(self.root.clone()),
            Some(Item::Node(n)) => Some(n.clone()),
            Some(_) => None,
        }
    }

    fn derive(&self, nodes: Vec<N>, axis: Axis) -> Vec<Self> {
        let size = nodes.len();
        nodes
            .into_iter()
            .enumerate()
            .map(|(i, node)| {
                let mut ctx = self.clone();
                ctx.item = Some(Item::Node(node));
                ctx.position = i + 1;
                ctx.size = size;
                ctx.axis = Some(axis);
                ctx
            })
            .collect()
    }

    /// The context itself, marked as a `self` axis step.
    pub fn iter_self(&self) -> Vec<Self> {
        let mut ctx = self.clone();
        ctx.axis = Some(Axis::Self_);
        vec![ctx]
    }

    /// Children of the current item — or, inside an axis step, the item
    /// itself, so node tests apply to the node under test.
    pub fn iter_children_or_self(&self, child_axis: bool) -> Vec<Self> {
        if !child_axis && self.axis.is_some() {
            return vec![self.clone()];
        }
        match self.anchor() {
            Some(node) => self.derive(node.children(), Axis::Child),
            None => Vec::new(),
        }
    }

    /// Attribute nodes of the current element.
    pub fn iter_attributes(&self) -> Vec<Self> {
        match self.node() {
            Some(n) if n.node_kind() == NodeKind::Element => {
                self.derive(n.attributes(), Axis::Attribute)
            }
            _ => Vec::new(),
        }
    }

    pub fn iter_parent(&self) -> Vec<Self> {
        match self.get_parent_node() {
            Some(parent) => self.derive(vec![parent], Axis::Parent),
            None => Vec::new(),
        }
    }

    /// Siblings after or before the current node, preceding ones nearest
    /// first.
    pub fn iter_siblings(&self, axis: Axis) -> Vec<Self> {
        let Some(node) = self.node().cloned() else {
            return Vec::new();
        };
        let Some(parent) = node.parent() else {
            return Vec::new();
        };
        let siblings = parent.children();
        let Some(index) = siblings.iter().position(|s| *s == node) else {
            return Vec::new();
        };
        let nodes: Vec<N> = match axis {
            Axis::FollowingSibling => siblings[index + 1..].to_vec(),
            _ => siblings[..index].iter().rev().cloned().collect(),
        };
        self.derive(nodes, axis)
    }

    /// Ancestors of the current node, nearest first; `ancestor-or-self`
    /// starts at the node itself.
    pub fn iter_ancestors(&self, axis: Axis) -> Vec<Self> {
        let Some(node) = self.node().cloned() else {
            return Vec::new();
        };
        let mut nodes = Vec::new();
        if axis == Axis::AncestorOrSelf {
            nodes.push(node.clone());
        }
        let mut cursor = node.parent();
        while let Some(parent) = cursor {
            cursor = parent.parent();
            nodes.push(parent);
        }
        self.derive(nodes, axis)
    }

    /// Descendants of the current item in document order;
    /// `descendant-or-self` includes the item.
    pub fn iter_descendants(&self, axis: Axis) -> Vec<Self> {
        let Some(node) = self.anchor() else {
            return Vec::new();
        };
        let mut nodes = Vec::new();
        if axis == Axis::DescendantOrSelf {
            nodes.push(node.clone());
        }
        descend(&node, &mut nodes);
        self.derive(nodes, axis)
    }

    /// Descendant-or-self contexts rooted at an explicit node; used by the
    /// `//` step composition.
    pub fn iter_descendants_of(&self, node: &N) -> Vec<Self> {
        let mut nodes = vec![node.clone()];
        descend(node, &mut nodes);
        self.derive(nodes, Axis::DescendantOrSelf)
    }

    /// Nodes after the current node in document order, excluding its own
    /// descendants.
    pub fn iter_followings(&self) -> Vec<Self> {
        let Some(node) = self.node().cloned() else {
            return Vec::new();
        };
        let mut subtree = vec![node.clone()];
        descend(&node, &mut subtree);
        let excluded: HashSet<usize> = subtree.iter().map(NodeModel::document_order).collect();
        let mut all = Vec::new();
        descend(&self.root, &mut all);
        let order = node.document_order();
        let nodes: Vec<N> = all
            .into_iter()
            .filter(|n| n.document_order() > order && !excluded.contains(&n.document_order()))
            .collect();
        self.derive(nodes, Axis::Following)
    }

    /// Nodes before the current node in document order, excluding its
    /// ancestors, nearest first.
    pub fn iter_preceding(&self) -> Vec<Self> {
        let Some(node) = self.node().cloned() else {
            return Vec::new();
        };
        if node.node_kind() != NodeKind::Element {
            return Vec::new();
        }
        let mut ancestors = HashSet::new();
        let mut cursor = node.parent();
        while let Some(parent) = cursor {
            ancestors.insert(parent.document_order());
            cursor = parent.parent();
        }
        let mut all = Vec::new();
        descend(&self.root, &mut all);
        let order = node.document_order();
        let mut nodes: Vec<N> = all
            .into_iter()
            .filter(|n| n.document_order() < order && !ancestors.contains(&n.document_order()))
            .collect();
        nodes.reverse();
        self.derive(nodes, Axis::Preceding)
    }

    /// Impose document order on a set of items and drop duplicates.
    ///
    /// Namespace nodes follow the tree nodes; atomic values are not
    /// allowed in node-set results.
    pub fn iter_results(&self, items: Vec<Item<N>>) -> Result<Vec<Item<N>>, XPathError> {
        let mut nodes: Vec<N> = Vec::new();
        let mut namespaces: Vec<crate::node::NamespaceNode> = Vec::new();
        for item in items {
            match item {
                Item::Node(n) => nodes.push(n),
                Item::Namespace(ns) => {
                    if !namespaces.contains(&ns) {
                        namespaces.push(ns);
                    }
                }
                other => {
                    return Err(XPathError::code(
                        ErrorCode::XPTY0004,
                        format!("{other:?} is not a node"),
                    ));
                }
            }
        }
        nodes.sort_by_key(NodeModel::document_order);
        nodes.dedup_by_key(|n| n.document_order());
        let mut results: Vec<Item<N>> = nodes.into_iter().map(Item::Node).collect();
        results.extend(namespaces.into_iter().map(Item::Namespace));
        Ok(results)
    }

    /// Parent of the current item; attribute nodes report their element.
    pub fn get_parent_node(&self) -> Option<N> {
        self.node().and_then(NodeModel::parent)
    }

    /// Whether the current item is of the principal node kind of the axis
    /// being traversed (attributes on the attribute axis, elements
    /// elsewhere).
    pub fn is_principal_node_kind(&self) -> bool {
        let kind = match &self.item {
            Some(Item::Node(n)) => n.node_kind(),
            Some(Item::Namespace(_)) => {
                return self.axis == Some(Axis::Namespace);
            }
            _ => return false,
        };
        match self.axis {
            Some(Axis::Attribute) => kind == NodeKind::Attribute,
            Some(Axis::Namespace) => false,
            _ => kind == NodeKind::Element,
        }
    }
}

/// Push all descendants of `node` in document order.
fn descend<N: NodeModel>(node: &N, out: &mut Vec<N>) {
    for child in node.children() {
        out.push(child.clone());
        descend(&child, out);
    }
}
