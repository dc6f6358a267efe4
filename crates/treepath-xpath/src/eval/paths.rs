//! Selection over paths, axes, node tests, predicates, and unions.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use treepath_tdop::Label;

use super::{argument, collect, empty_iter, evaluate, once_err, select, ItemIter, XTok};
use crate::context::{Axis, XPathContext};
use crate::dialect::{XPath1, XML_ID};
use crate::error::{ErrorCode, XPathError};
use crate::node::{name_matches, NamespaceNode, NodeKind, NodeModel};
use crate::value::{ebv_items, string_value, Item, Number};

/// Name test: matches elements (or, on the attribute axis, attributes)
/// against the token's name.
pub(super) fn select_name<'a, N: NodeModel>(
    token: &'a XTok,
    _env: &'a XPath1,
    context: &XPathContext<N>,
) -> ItemIter<'a, N> {
    let test = token.value.str_or_empty().to_owned();
    select_name_test(context, test)
}

fn select_name_test<'a, N: NodeModel>(
    context: &XPathContext<N>,
    test: String,
) -> ItemIter<'a, N> {
    let contexts = context.iter_children_or_self(false);
    Box::new(contexts.into_iter().filter_map(move |c| {
        let item = c.item?;
        let Item::Node(node) = &item else {
            return None;
        };
        match node.node_kind() {
            NodeKind::Element | NodeKind::Attribute => node
                .name()
                .is_some_and(|name| name_matches(&name, &test))
                .then_some(Ok(item)),
            _ => None,
        }
    }))
}

/// Prefixed name test (`p:local`), or a call through a prefixed function.
pub(super) fn select_colon<'a, N: NodeModel>(
    token: &'a XTok,
    env: &'a XPath1,
    context: &XPathContext<N>,
) -> ItemIter<'a, N> {
    let right = token.child(1);
    if right.label().is(Label::Function) || right.label().is(Label::Constructor) {
        return match evaluate(right, env, Some(context)) {
            Ok(value) => Box::new(value.into_items().into_iter().map(Ok)),
            Err(err) => once_err(err),
        };
    }
    let prefix = token.child(0).value.str_or_empty();
    let local = right.value.str_or_empty();
    let test = if prefix == "*" {
        format!("*:{local}")
    } else {
        match env.namespace(prefix) {
            Some(uri) => format!("{{{uri}}}{local}"),
            None => {
                return once_err(XPathError::code(
                    ErrorCode::XPST0081,
                    format!("prefix {prefix:?} has not been declared"),
                ));
            }
        }
    };
    select_name_test(context, test)
}

/// Extended name test (`{uri}local`), or a call through a bound function.
pub(super) fn select_brace<'a, N: NodeModel>(
    token: &'a XTok,
    env: &'a XPath1,
    context: &XPathContext<N>,
) -> ItemIter<'a, N> {
    let right = token.child(1);
    if right.label().is(Label::Function) {
        return match evaluate(right, env, Some(context)) {
            Ok(value) => Box::new(value.into_items().into_iter().map(Ok)),
            Err(err) => once_err(err),
        };
    }
    let test = format!(
        "{{{}}}{}",
        token.child(0).value.str_or_empty(),
        right.value.str_or_empty()
    );
    select_name_test(context, test)
}

/// Wildcard: every node of the principal kind of the current axis.
pub(super) fn select_wildcard<'a, N: NodeModel>(
    _token: &'a XTok,
    _env: &'a XPath1,
    context: &XPathContext<N>,
) -> ItemIter<'a, N> {
    let contexts = context.iter_children_or_self(false);
    Box::new(contexts.into_iter().filter_map(|c| {
        if c.is_principal_node_kind() {
            c.item.map(Ok)
        } else {
            None
        }
    }))
}

/// `.`: the context item itself, or the document root at the document
/// position.
pub(super) fn select_dot<'a, N: NodeModel>(
    _token: &'a XTok,
    _env: &'a XPath1,
    context: &XPathContext<N>,
) -> ItemIter<'a, N> {
    let root = context.root.clone();
    let contexts = context.iter_self();
    Box::new(contexts.into_iter().filter_map(move |c| match c.item {
        Some(item) => Some(Ok(item)),
        None => (root.node_kind() == NodeKind::Document).then(|| Ok(Item::Node(root.clone()))),
    }))
}

/// `..`: the parent element of the context item.
pub(super) fn select_parent_shorthand<'a, N: NodeModel>(
    _token: &'a XTok,
    _env: &'a XPath1,
    context: &XPathContext<N>,
) -> ItemIter<'a, N> {
    match context.get_parent_node() {
        Some(parent) if parent.node_kind() == NodeKind::Element => {
            Box::new(std::iter::once(Ok(Item::Node(parent))))
        }
        _ => empty_iter(),
    }
}

/// `@name` and `attribute::`: the node test applied over the attributes.
pub(super) fn select_attribute<'a, N: NodeModel>(
    token: &'a XTok,
    env: &'a XPath1,
    context: &XPathContext<N>,
) -> ItemIter<'a, N> {
    let child = token.child(0);
    let contexts = context.iter_attributes();
    Box::new(
        contexts
            .into_iter()
            .flat_map(move |c| select(child, env, &c)),
    )
}

/// `namespace::`: the in-scope namespace bindings of the parser.
pub(super) fn select_namespace<'a, N: NodeModel>(
    _token: &'a XTok,
    env: &'a XPath1,
    context: &XPathContext<N>,
) -> ItemIter<'a, N> {
    match context.node() {
        Some(node) if node.node_kind() == NodeKind::Element => {
            let items: Vec<Item<N>> = env
                .namespaces
                .iter()
                .map(|(prefix, uri)| {
                    Item::Namespace(NamespaceNode {
                        prefix: prefix.clone(),
                        uri: uri.clone(),
                    })
                })
                .collect();
            Box::new(items.into_iter().map(Ok))
        }
        _ => empty_iter(),
    }
}

/// A named axis step: iterate the axis, apply the node test per node.
pub(super) fn select_axis<'a, N: NodeModel>(
    token: &'a XTok,
    env: &'a XPath1,
    context: &XPathContext<N>,
) -> ItemIter<'a, N> {
    let Some(axis) = Axis::from_symbol(token.symbol()) else {
        return empty_iter();
    };
    let contexts = match axis {
        Axis::Self_ => context.iter_self(),
        Axis::Child => context.iter_children_or_self(true),
        Axis::Parent => context.iter_parent(),
        Axis::FollowingSibling | Axis::PrecedingSibling => context.iter_siblings(axis),
        Axis::Ancestor | Axis::AncestorOrSelf => context.iter_ancestors(axis),
        Axis::Descendant | Axis::DescendantOrSelf => context.iter_descendants(axis),
        Axis::Following => context.iter_followings(),
        Axis::Preceding => context.iter_preceding(),
        Axis::Attribute | Axis::Namespace => return empty_iter(),
    };
    let child = token.child(0);
    Box::new(
        contexts
            .into_iter()
            .flat_map(move |c| select(child, env, &c)),
    )
}

/// Kind tests: `node()`, `text()`, `comment()`,
/// `processing-instruction()`.
pub(super) fn select_kind_test<'a, N: NodeModel>(
    token: &'a XTok,
    _env: &'a XPath1,
    context: &XPathContext<N>,
) -> ItemIter<'a, N> {
    match token.symbol() {
        "node" => {
            let root = context.root.clone();
            let contexts = context.iter_children_or_self(false);
            Box::new(contexts.into_iter().map(move |c| match c.item {
                Some(item) => Ok(item),
                None => Ok(Item::Node(root.clone())),
            }))
        }
        "text" => {
            let contexts = context.iter_children_or_self(false);
            Box::new(contexts.into_iter().filter_map(|c| {
                let item = c.item?;
                match &item {
                    Item::Node(n) if n.node_kind() == NodeKind::Text => Some(Ok(item)),
                    _ => None,
                }
            }))
        }
        "comment" => match context.node() {
            Some(n) if n.node_kind() == NodeKind::Comment => {
                Box::new(std::iter::once(Ok(Item::Node(n.clone()))))
            }
            _ => empty_iter(),
        },
        _ => match context.node() {
            Some(n) if n.node_kind() == NodeKind::ProcessingInstruction => {
                Box::new(std::iter::once(Ok(Item::Node(n.clone()))))
            }
            _ => empty_iter(),
        },
    }
}

/// Union: chain when composing into an outer union, otherwise collect
/// both sides and emit in document order without duplicates.
pub(super) fn select_union<'a, N: NodeModel>(
    token: &'a XTok,
    env: &'a XPath1,
    context: &XPathContext<N>,
) -> ItemIter<'a, N> {
    if !token.meta.cut_and_sort {
        let left = select(token.child(0), env, context);
        let right = select(token.child(1), env, context);
        return Box::new(left.chain(right));
    }
    let mut items = match collect(token.child(0), env, context) {
        Ok(items) => items,
        Err(err) => return once_err(err),
    };
    match collect(token.child(1), env, context) {
        Ok(more) => items.extend(more),
        Err(err) => return once_err(err),
    }
    match context.iter_results(items) {
        Ok(results) => Box::new(results.into_iter().map(Ok)),
        Err(err) => once_err(err),
    }
}

/// `/`: document root selector, rooted path, or step composition with
/// identity deduplication.
pub(super) fn select_child_path<'a, N: NodeModel>(
    token: &'a XTok,
    env: &'a XPath1,
    context: &XPathContext<N>,
) -> ItemIter<'a, N> {
    match token.arity() {
        0 => {
            if context.root.node_kind() == NodeKind::Document {
                Box::new(std::iter::once(Ok(Item::Node(context.root.clone()))))
            } else {
                empty_iter()
            }
        }
        1 => {
            if !at_document_start(context) {
                return empty_iter();
            }
            let mut start = context.clone();
            start.item = None;
            start.axis = None;
            select(token.child(0), env, &start)
        }
        _ => {
            let base = context.clone();
            let right = token.child(1);
            let seen: Rc<RefCell<HashSet<usize>>> = Rc::new(RefCell::new(HashSet::new()));
            Box::new(
                select(token.child(0), env, context).flat_map(move |result| -> ItemIter<'a, N> {
                    match result {
                        Err(err) => once_err(err),
                        Ok(item) if !item.is_node() => once_err(XPathError::code(
                            ErrorCode::XPTY0019,
                            format!("a path step selected the non-node value {item:?}"),
                        )),
                        Ok(item) => {
                            let step = base.with_item(item);
                            let seen = Rc::clone(&seen);
                            Box::new(select(right, env, &step).filter_map(move |result| {
                                match result {
                                    Err(err) => Some(Err(err)),
                                    Ok(Item::Node(node)) => seen
                                        .borrow_mut()
                                        .insert(node.document_order())
                                        .then(|| Ok(Item::Node(node))),
                                    Ok(other) => Some(Ok(other)),
                                }
                            }))
                        }
                    }
                }),
            )
        }
    }
}

/// `//`: expand through descendant-or-self between steps (or from the
/// document root as a prefix).
pub(super) fn select_descendant_path<'a, N: NodeModel>(
    token: &'a XTok,
    env: &'a XPath1,
    context: &XPathContext<N>,
) -> ItemIter<'a, N> {
    if token.arity() == 1 {
        if !at_document_start(context) {
            return empty_iter();
        }
        let mut start = context.clone();
        start.item = None;
        start.axis = None;
        let contexts = start.iter_descendants(Axis::DescendantOrSelf);
        let child = token.child(0);
        return Box::new(
            contexts
                .into_iter()
                .flat_map(move |c| select(child, env, &c)),
        );
    }
    let base = context.clone();
    let right = token.child(1);
    Box::new(
        select(token.child(0), env, context).flat_map(move |result| -> ItemIter<'a, N> {
            match result {
                Err(err) => once_err(err),
                Ok(Item::Node(node)) if node.node_kind() == NodeKind::Element => {
                    let contexts = base.iter_descendants_of(&node);
                    Box::new(
                        contexts
                            .into_iter()
                            .flat_map(move |c| select(right, env, &c)),
                    )
                }
                Ok(other) => once_err(XPathError::Type(format!(
                    "the left operand of '//' must select element nodes, got {other:?}"
                ))),
            }
        }),
    )
}

/// Predicate filter: positional when the predicate value is a single
/// number, effective boolean value otherwise.
pub(super) fn select_predicate<'a, N: NodeModel>(
    token: &'a XTok,
    env: &'a XPath1,
    context: &XPathContext<N>,
) -> ItemIter<'a, N> {
    let candidates = match collect(token.child(0), env, context) {
        Ok(items) => items,
        Err(err) => return once_err(err),
    };
    let size = candidates.len();
    let base = context.clone();
    let predicate = token.child(1);
    Box::new(
        candidates
            .into_iter()
            .enumerate()
            .filter_map(move |(index, item)| {
                let mut step = base.with_item(item.clone());
                step.position = index + 1;
                step.size = size;
                let values = match collect(predicate, env, &step) {
                    Ok(values) => values,
                    Err(err) => return Some(Err(err)),
                };
                let selected = if let [Item::Number(n)] = values.as_slice() {
                    *n == Number::Integer((index + 1) as i64)
                } else {
                    ebv_items(&values)
                };
                selected.then_some(Ok(item))
            }),
    )
}

/// `id()`: elements in the context subtree whose `xml:id` matches.
pub(super) fn select_id<'a, N: NodeModel>(
    token: &'a XTok,
    env: &'a XPath1,
    context: &XPathContext<N>,
) -> ItemIter<'a, N> {
    let value = match argument(token, 0, env, Some(context), false) {
        Ok(Some(item)) => string_value(&item),
        Ok(None) => return empty_iter(),
        Err(err) => return once_err(err),
    };
    let Some(anchor) = (match &context.item {
        None => Some(context.root.clone()),
        Some(Item::Node(n)) => Some(n.clone()),
        Some(_) => None,
    }) else {
        return empty_iter();
    };
    let mut nodes = vec![anchor.clone()];
    collect_descendants(&anchor, &mut nodes);
    Box::new(nodes.into_iter().filter_map(move |n| {
        (n.node_kind() == NodeKind::Element && n.attribute(XML_ID).as_deref() == Some(&value))
            .then(|| Ok(Item::Node(n)))
    }))
}

fn collect_descendants<N: NodeModel>(node: &N, out: &mut Vec<N>) {
    for child in node.children() {
        out.push(child.clone());
        collect_descendants(&child, out);
    }
}

fn at_document_start<N: NodeModel>(context: &XPathContext<N>) -> bool {
    context.root.node_kind() == NodeKind::Document
        || context.node() == Some(&context.root)
}
