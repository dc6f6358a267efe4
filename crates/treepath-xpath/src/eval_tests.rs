use indexmap::IndexMap;

use crate::context::XPathContext;
use crate::error::{ErrorCode, XPathError};
use crate::node::NodeModel;
use crate::test_support::{comment, document, elem, elem_with, pi, text, TreeNode};
use crate::value::{Item, Number, Value};
use crate::XPath1Parser;

fn parser() -> XPath1Parser {
    XPath1Parser::new().unwrap()
}

fn lax_parser() -> XPath1Parser {
    XPath1Parser::with_namespaces(&IndexMap::new(), false).unwrap()
}

/// Evaluate a context-free expression.
fn eval(source: &str) -> Value<TreeNode> {
    parser().parse(source).unwrap().evaluate(None).unwrap()
}

/// Select against a context and return the selected nodes' names.
fn select_names(source: &str, context: &XPathContext<TreeNode>) -> Vec<String> {
    select_items(source, context)
        .into_iter()
        .map(|item| match item {
            Item::Node(n) => n.name().unwrap_or_else(|| format!("{:?}", n.node_kind())),
            other => format!("{other:?}"),
        })
        .collect()
}

fn select_items(source: &str, context: &XPathContext<TreeNode>) -> Vec<Item<TreeNode>> {
    parser()
        .parse(source)
        .unwrap()
        .select(context)
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
}

fn eval_with(source: &str, context: &XPathContext<TreeNode>) -> Value<TreeNode> {
    parser()
        .parse(source)
        .unwrap()
        .evaluate(Some(context))
        .unwrap()
}

fn assert_number(value: Value<TreeNode>, expected: Number) {
    match value {
        Value::Number(n) => assert_eq!(n, expected),
        other => panic!("expected a number, got {other:?}"),
    }
}

fn assert_string(value: Value<TreeNode>, expected: &str) {
    assert_eq!(value, Value::String(expected.to_owned()));
}

#[test]
fn arithmetic_evaluates() {
    assert_number(eval("1 + 2 * 3"), Number::Integer(7));
    assert_number(eval("(1 + 2) * 3"), Number::Integer(9));
    assert_number(eval("- 2 * 3"), Number::Integer(-6));
    assert_number(eval("7 mod 3"), Number::Integer(1));
}

#[test]
fn division_boundaries() {
    assert_number(eval("1.0 div 0"), Number::Double(f64::INFINITY));
    assert_number(eval("- 1.0 div 0"), Number::Double(f64::NEG_INFINITY));
    assert!(matches!(eval("0e0 div 0"), Value::Number(n) if n.is_nan()));

    // Strict parsers reject integer division by zero statically; a lax
    // parser yields the signed infinity.
    let lax = lax_parser();
    let value: Value<TreeNode> = lax.parse("1 div 0").unwrap().evaluate(None).unwrap();
    assert_eq!(value, Value::Number(Number::Double(f64::INFINITY)));
}

#[test]
fn modulo_boundaries() {
    assert!(matches!(
        parser().parse("5 mod 0").unwrap_err(),
        XPathError::Code {
            code: ErrorCode::FOAR0001,
            ..
        }
    ));
    assert!(matches!(eval("5e0 mod 0e0"), Value::Number(n) if n.is_nan()));
}

#[test]
fn comparisons_are_general() {
    assert_eq!(eval("1 < 2"), Value::Boolean(true));
    assert_eq!(eval("2 <= 2"), Value::Boolean(true));
    assert_eq!(eval("'a' = 'a'"), Value::Boolean(true));
    assert_eq!(eval("'a' != 'b'"), Value::Boolean(true));
}

#[test]
fn mixed_type_comparison_is_a_type_error() {
    let err = parser().parse("1 = 'a'").unwrap_err();
    assert!(matches!(
        err,
        XPathError::Code {
            code: ErrorCode::XPTY0004,
            ..
        }
    ));
}

#[test]
fn boolean_functions() {
    assert_eq!(eval("true()"), Value::Boolean(true));
    assert_eq!(eval("false()"), Value::Boolean(false));
    assert_eq!(eval("boolean(0)"), Value::Boolean(false));
    assert_eq!(eval("boolean('x')"), Value::Boolean(true));
    assert_eq!(eval("not(0)"), Value::Boolean(true));
    assert_eq!(eval("true() or false()"), Value::Boolean(true));
    assert_eq!(eval("true() and false()"), Value::Boolean(false));
}

#[test]
fn string_functions() {
    assert_string(eval("concat('a', 'b', 'c')"), "abc");
    assert_eq!(eval("starts-with('abc', 'ab')"), Value::Boolean(true));
    assert_eq!(eval("contains('abc', 'x')"), Value::Boolean(false));
    assert_string(eval("substring-before('1999/04/01', '/')"), "1999");
    assert_string(eval("substring-after('1999/04/01', '/')"), "04/01");
    assert_string(eval("normalize-space('  a   b  ')"), "a b");
    assert_number(eval("string-length('hello')"), Number::Integer(5));
    assert_string(eval("string(12)"), "12");
}

#[test]
fn substring_boundaries() {
    assert_string(eval("substring('12345', 2)"), "2345");
    assert_string(eval("substring('12345', 2, 3)"), "234");
    assert_string(eval("substring('12345', 1.5, 2.6)"), "234");
    assert_string(eval("substring('12345', 0, 3)"), "12");
    assert_string(eval("substring('12345', 0 div 0e0)"), "");
    assert_string(eval("substring('12345', 1, 0 div 0e0)"), "");
    assert_string(eval("substring('12345', - 1 div 0e0)"), "");
    assert_string(eval("substring('12345', 2, 1 div 0e0)"), "2345");
}

#[test]
fn substring_of_full_length_is_identity() {
    assert_string(eval("substring('hello', 1, string-length('hello'))"), "hello");
}

#[test]
fn normalize_space_is_idempotent() {
    assert_string(eval("normalize-space(normalize-space('  a   b  '))"), "a b");
}

#[test]
fn translate_deletes_unmapped_characters() {
    assert_string(eval("translate('bar', 'abc', 'AB')"), "BAr");
    assert_string(eval("translate('--aaa--', 'abc-', 'ABC')"), "AAA");
}

#[test]
fn rounding_functions() {
    assert_number(eval("round(0.5)"), Number::Integer(1));
    assert_number(eval("round(- 0.5)"), Number::Integer(0));
    assert_number(eval("round(2.4)"), Number::Integer(2));
    assert_number(eval("floor(2.9)"), Number::Integer(2));
    assert_number(eval("ceiling(2.1)"), Number::Integer(3));
    assert_number(eval("floor(- 2.5)"), Number::Integer(-3));
}

#[test]
fn number_conversion() {
    assert_number(eval("number('12.5')"), Number::Double(12.5));
    assert!(matches!(eval("number('abc')"), Value::Number(n) if n.is_nan()));
    assert_number(eval("number(true())"), Number::Double(1.0));
}

fn sample_tree() -> TreeNode {
    document(vec![elem(
        "root",
        vec![elem("a", vec![]), elem("a", vec![]), elem("a", vec![])],
    )])
}

#[test]
fn rooted_path_with_positional_predicate() {
    let doc = sample_tree();
    let context = XPathContext::new(doc.clone());
    let items = select_items("/root/a[2]", &context);
    assert_eq!(items.len(), 1);
    let second = doc.find("root").unwrap().children()[1].clone();
    assert_eq!(items[0], Item::Node(second));
}

#[test]
fn last_predicate_selects_the_final_node() {
    let doc = sample_tree();
    let context = XPathContext::new(doc.clone());
    let items = select_items("/root/a[last()]", &context);
    assert_eq!(items.len(), 1);
    let third = doc.find("root").unwrap().children()[2].clone();
    assert_eq!(items[0], Item::Node(third));
}

#[test]
fn descendant_text_nodes_come_in_document_order() {
    let doc = document(vec![elem(
        "r",
        vec![
            elem("b", vec![text("x")]),
            elem("c", vec![elem("b", vec![text("y")])]),
        ],
    )]);
    let context = XPathContext::new(doc);
    let texts: Vec<String> = select_items("//b/text()", &context)
        .into_iter()
        .map(|item| match item {
            Item::Node(n) => n.string_value(),
            other => panic!("expected a text node, got {other:?}"),
        })
        .collect();
    assert_eq!(texts, vec!["x", "y"]);
}

#[test]
fn count_all_elements() {
    let doc = document(vec![elem("r", vec![elem("a", vec![]), elem("b", vec![])])]);
    let context = XPathContext::new(doc);
    assert_eq!(eval_with("count(//*) = 3", &context), Value::Boolean(true));
    assert_number(eval_with("count(//*)", &context), Number::Integer(3));
}

#[test]
fn namespace_uri_of_a_bound_element() {
    let mut namespaces = IndexMap::new();
    namespaces.insert("p".to_owned(), "u".to_owned());
    let parser = XPath1Parser::with_namespaces(&namespaces, true).unwrap();

    let doc = document(vec![elem("root", vec![elem("{u}e", vec![])])]);
    let root = doc.find("root").unwrap();
    let context = XPathContext::new(doc).with_item_node(root);

    let expr = parser.parse("namespace-uri(p:e)").unwrap();
    assert_eq!(
        expr.evaluate(Some(&context)).unwrap(),
        Value::String("u".to_owned())
    );
    let expr = parser.parse("name(p:e)").unwrap();
    assert_eq!(
        expr.evaluate(Some(&context)).unwrap(),
        Value::String("p:e".to_owned())
    );
    let expr = parser.parse("local-name(p:e)").unwrap();
    assert_eq!(
        expr.evaluate(Some(&context)).unwrap(),
        Value::String("e".to_owned())
    );
}

#[test]
fn union_is_deduplicated_and_document_ordered() {
    let doc = document(vec![elem(
        "r",
        vec![elem("a", vec![]), elem("b", vec![]), elem("a", vec![])],
    )]);
    let r = doc.find("r").unwrap();
    let context = XPathContext::new(doc).with_item_node(r);
    let names = select_names("b | a | a", &context);
    assert_eq!(names, vec!["a", "b", "a"]);
}

#[test]
fn attribute_selection() {
    let doc = document(vec![elem(
        "r",
        vec![elem_with("a", &[("href", "#top")], vec![])],
    )]);
    let context = XPathContext::new(doc);
    let items = select_items("/r/a/@href", &context);
    assert_eq!(items.len(), 1);
    let Item::Node(attr) = &items[0] else {
        panic!("expected an attribute node");
    };
    assert_eq!(attr.string_value(), "#top");

    assert_eq!(
        eval_with("/r/a[@href = '#top']", &context),
        eval_with("/r/a", &context)
    );
}

#[test]
fn parent_and_self_shorthands() {
    let doc = document(vec![elem("r", vec![elem("a", vec![])])]);
    let a = doc.find("a").unwrap();
    let context = XPathContext::new(doc).with_item_node(a);
    assert_eq!(select_names("..", &context), vec!["r"]);
    assert_eq!(select_names(".", &context), vec!["a"]);
}

#[test]
fn explicit_axes_select() {
    let doc = document(vec![elem(
        "r",
        vec![elem("a", vec![]), elem("b", vec![]), elem("c", vec![])],
    )]);
    let b = doc.find("b").unwrap();
    let context = XPathContext::new(doc).with_item_node(b);
    assert_eq!(select_names("following-sibling::*", &context), vec!["c"]);
    assert_eq!(select_names("preceding-sibling::*", &context), vec!["a"]);
    assert_eq!(select_names("ancestor::*", &context), vec!["r"]);
    assert_eq!(select_names("self::b", &context), vec!["b"]);
    assert_eq!(select_names("self::a", &context), Vec::<String>::new());
}

#[test]
fn kind_tests_select() {
    let doc = document(vec![elem(
        "r",
        vec![text("t"), comment("c"), pi("target", "data")],
    )]);
    let context = XPathContext::new(doc);
    let items = select_items("/r/node()", &context);
    assert_eq!(items.len(), 3);
    let texts = select_items("/r/text()", &context);
    assert_eq!(texts.len(), 1);
}

#[test]
fn variables_resolve_from_the_context() {
    let doc = sample_tree();
    let mut variables = IndexMap::new();
    variables.insert("x".to_owned(), Value::Number(Number::Integer(2)));
    let context = XPathContext::new(doc).with_variables(variables);
    assert_number(eval_with("$x + 1", &context), Number::Integer(3));

    let err = parser()
        .parse("$missing")
        .unwrap()
        .evaluate(Some(&context))
        .unwrap_err();
    assert!(matches!(err, XPathError::MissingName(_)));
}

#[test]
fn lang_checks_ancestors_and_subtags() {
    let doc = document(vec![elem_with(
        "r",
        &[("{http://www.w3.org/XML/1998/namespace}lang", "en-US")],
        vec![elem("e", vec![])],
    )]);
    let e = doc.find("e").unwrap();
    let context = XPathContext::new(doc).with_item_node(e);
    assert_eq!(eval_with("lang('en')", &context), Value::Boolean(true));
    assert_eq!(eval_with("lang('EN')", &context), Value::Boolean(true));
    assert_eq!(eval_with("lang('fr')", &context), Value::Boolean(false));
}

#[test]
fn id_matches_xml_id_attributes() {
    let doc = document(vec![elem(
        "r",
        vec![
            elem_with(
                "a",
                &[("{http://www.w3.org/XML/1998/namespace}id", "first")],
                vec![],
            ),
            elem("b", vec![]),
        ],
    )]);
    let context = XPathContext::new(doc);
    assert_eq!(select_names("id('first')", &context), vec!["a"]);
    assert_eq!(select_names("id('other')", &context), Vec::<String>::new());
}

#[test]
fn sum_over_node_values() {
    let doc = document(vec![elem(
        "r",
        vec![
            elem("n", vec![text("1")]),
            elem("n", vec![text("2")]),
            elem("n", vec![text("3.5")]),
        ],
    )]);
    let context = XPathContext::new(doc);
    assert_number(eval_with("sum(/r/n)", &context), Number::Double(6.5));
    assert_number(eval_with("sum(/r/x)", &context), Number::Integer(0));
}

#[test]
fn string_value_of_an_element_concatenates_descendants() {
    let doc = document(vec![elem(
        "r",
        vec![elem("a", vec![text("he")]), elem("b", vec![text("llo")])],
    )]);
    let root = doc.find("r").unwrap();
    let context = XPathContext::new(doc).with_item_node(root);
    assert_string(eval_with("string(.)", &context), "hello");
}

#[test]
fn path_over_atomics_is_a_type_error() {
    let doc = sample_tree();
    let context = XPathContext::new(doc);
    let result: Result<Vec<_>, _> = parser()
        .parse("count(/root)/a")
        .unwrap()
        .select(&context)
        .collect();
    let err = result.unwrap_err();
    assert!(matches!(
        err,
        XPathError::Code {
            code: ErrorCode::XPTY0019,
            ..
        }
    ));
}

#[test]
fn missing_context_is_reported() {
    let err = parser()
        .parse("position() + count(a)")
        .unwrap()
        .evaluate::<TreeNode>(None)
        .unwrap_err();
    assert!(err.is_missing_context());
}
