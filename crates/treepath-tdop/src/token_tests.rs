use crate::test_dialect;

#[test]
fn arity_matches_children() {
    let root = test_dialect::parse("1 + 2 * 3").unwrap();
    assert_eq!(root.arity(), 2);
    assert_eq!(root.arity(), root.children.len());
    assert_eq!(root.child(1).arity(), 2);
    assert_eq!(root.child(0).arity(), 0);
}

#[test]
fn iteration_is_infix_ordered() {
    let root = test_dialect::parse("1 + 2 * 3").unwrap();
    let symbols: Vec<&str> = root.iter(&[]).map(|t| t.symbol()).collect();
    assert_eq!(
        symbols,
        vec!["(integer)", "+", "(integer)", "*", "(integer)"]
    );
}

#[test]
fn iteration_yields_unary_nodes_before_their_operand() {
    let root = test_dialect::parse("not 1 + 2").unwrap();
    let symbols: Vec<&str> = root.iter(&[]).map(|t| t.symbol()).collect();
    assert_eq!(symbols, vec!["not", "(integer)", "+", "(integer)"]);
}

#[test]
fn iteration_filters_by_symbol() {
    let root = test_dialect::parse("1 + 2 * 3 + 4").unwrap();
    let plus: Vec<&str> = root.iter(&["+"]).map(|t| t.symbol()).collect();
    assert_eq!(plus, vec!["+", "+"]);
    let numbers = root.iter(&["(integer)"]).count();
    assert_eq!(numbers, 4);
}

#[test]
fn tree_rendering() {
    let root = test_dialect::parse("not (1 + 'two')").unwrap();
    insta::assert_snapshot!(root.tree(), @"(not (+ (1) ('two')))");
}

#[test]
fn source_reconstruction_reparses_equivalently() {
    for source in ["1 + 2 * 3", "- 1 - 2", "(1 + 2) * 3", "not 1 and 2"] {
        let root = test_dialect::parse(source).unwrap();
        let reparsed = test_dialect::parse(&root.to_source()).unwrap();
        assert_eq!(root.tree(), reparsed.tree(), "source {source:?}");
    }
}

#[test]
fn spans_cover_the_token_text() {
    let source = "12 + 345";
    let root = test_dialect::parse(source).unwrap();
    let left = root.child(0);
    assert_eq!(&source[left.span.start..left.span.end], "12");
    let right = root.child(1);
    assert_eq!(&source[right.span.start..right.span.end], "345");
}
