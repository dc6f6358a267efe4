use crate::context::{Axis, XPathContext};
use crate::node::{NodeKind, NodeModel};
use crate::test_support::{document, elem, text, TreeNode};
use crate::value::Item;

/// `<doc><r><a/><b><t/></b><c/></r></doc>`
fn tree() -> TreeNode {
    document(vec![elem(
        "r",
        vec![
            elem("a", vec![]),
            elem("b", vec![elem("t", vec![])]),
            elem("c", vec![]),
        ],
    )])
}

fn names(contexts: &[XPathContext<TreeNode>]) -> Vec<String> {
    contexts
        .iter()
        .map(|c| match &c.item {
            Some(Item::Node(n)) => n
                .name()
                .unwrap_or_else(|| format!("{:?}", n.node_kind())),
            other => format!("{other:?}"),
        })
        .collect()
}

fn context_at(name: &str) -> XPathContext<TreeNode> {
    let doc = tree();
    let node = doc.find(name).unwrap();
    XPathContext::new(doc).with_item_node(node)
}

#[test]
fn children_carry_position_and_size() {
    let contexts = context_at("r").iter_children_or_self(false);
    assert_eq!(names(&contexts), vec!["a", "b", "c"]);
    assert_eq!(contexts[0].position, 1);
    assert_eq!(contexts[2].position, 3);
    assert!(contexts.iter().all(|c| c.size == 3));
    assert!(contexts.iter().all(|c| c.axis == Some(Axis::Child)));
}

#[test]
fn inside_an_axis_the_item_itself_is_yielded() {
    let mut context = context_at("a");
    context.axis = Some(Axis::Child);
    let contexts = context.iter_children_or_self(false);
    assert_eq!(names(&contexts), vec!["a"]);
}

#[test]
fn document_position_iterates_the_root_element() {
    let doc = tree();
    let context = XPathContext::new(doc);
    assert_eq!(names(&context.iter_children_or_self(false)), vec!["r"]);
}

#[test]
fn siblings_follow_and_precede() {
    let context = context_at("b");
    assert_eq!(
        names(&context.iter_siblings(Axis::FollowingSibling)),
        vec!["c"]
    );
    assert_eq!(
        names(&context.iter_siblings(Axis::PrecedingSibling)),
        vec!["a"]
    );
}

#[test]
fn ancestors_are_nearest_first() {
    let context = context_at("t");
    assert_eq!(
        names(&context.iter_ancestors(Axis::Ancestor)),
        vec!["r", "Document"]
    );
    assert_eq!(
        names(&context.iter_ancestors(Axis::AncestorOrSelf)),
        vec!["t", "r", "Document"]
    );
}

#[test]
fn descendants_are_in_document_order() {
    let context = context_at("r");
    assert_eq!(
        names(&context.iter_descendants(Axis::Descendant)),
        vec!["a", "b", "t", "c"]
    );
    assert_eq!(
        names(&context.iter_descendants(Axis::DescendantOrSelf)),
        vec!["r", "a", "b", "t", "c"]
    );
}

#[test]
fn followings_exclude_descendants() {
    let context = context_at("b");
    assert_eq!(names(&context.iter_followings()), vec!["c"]);
}

#[test]
fn precedings_exclude_ancestors_and_come_nearest_first() {
    let context = context_at("c");
    assert_eq!(names(&context.iter_preceding()), vec!["t", "b", "a"]);
}

#[test]
fn results_are_document_ordered_and_deduplicated() {
    let doc = tree();
    let a = doc.find("a").unwrap();
    let b = doc.find("b").unwrap();
    let context = XPathContext::new(doc);
    let items = vec![
        Item::Node(b.clone()),
        Item::Node(a.clone()),
        Item::Node(b.clone()),
    ];
    let results = context.iter_results(items).unwrap();
    assert_eq!(results, vec![Item::Node(a), Item::Node(b)]);
}

#[test]
fn atomic_values_are_rejected_in_node_sets() {
    let context = XPathContext::new(tree());
    let err = context
        .iter_results(vec![Item::String("x".to_owned())])
        .unwrap_err();
    assert!(matches!(err, crate::error::XPathError::Code { .. }));
}

#[test]
fn principal_node_kind_depends_on_the_axis() {
    let doc = document(vec![elem(
        "r",
        vec![elem("a", vec![]), text("payload")],
    )]);
    let r = doc.find("r").unwrap();
    let context = XPathContext::new(doc).with_item_node(r);

    let children = context.iter_children_or_self(false);
    let principal: Vec<bool> = children
        .iter()
        .map(XPathContext::is_principal_node_kind)
        .collect();
    assert_eq!(principal, vec![true, false]);
}

#[test]
fn attribute_axis_yields_attribute_nodes() {
    let doc = document(vec![crate::test_support::elem_with(
        "r",
        &[("x", "1"), ("y", "2")],
        vec![],
    )]);
    let r = doc.find("r").unwrap();
    let context = XPathContext::new(doc).with_item_node(r);
    let attributes = context.iter_attributes();
    assert_eq!(names(&attributes), vec!["x", "y"]);
    assert!(attributes.iter().all(XPathContext::is_principal_node_kind));
    assert!(
        attributes
            .iter()
            .all(|c| c.node().unwrap().node_kind() == NodeKind::Attribute)
    );
}
