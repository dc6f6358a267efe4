use crate::registry::{Dialect, FollowsConstraint, Grammar, SymbolRegistry};
use crate::test_dialect::{self, TestLang};
use crate::tokenizer::tokenize;

/// Format a lexeme stream as `Group "text"` lines.
fn snapshot(grammar: &Grammar<TestLang>, source: &str) -> String {
    let lexemes = tokenize(grammar, source).unwrap();
    let mut out = String::new();
    for lexeme in lexemes {
        out.push_str(&format!("{:?} {:?}\n", lexeme.group, lexeme.text(source)));
    }
    out
}

#[test]
fn pattern_has_five_alternatives() {
    let grammar = test_dialect::grammar();
    let pattern = grammar.tokenizer_pattern();
    insta::assert_snapshot!(pattern, @r#"(?P<literal>'[^']*'|"[^"]*"|(?:\d+|\.\d+)(?:\.\d*)?(?:[Ee][+\-]?\d+)?)|(?P<symbol>[\+\-\*/\(\)])|(?P<name>[A-Za-z0-9_]+)|(?P<unknown>\S)|\s+"#);
}

#[test]
fn numbers_and_operators() {
    let grammar = test_dialect::grammar();
    insta::assert_snapshot!(snapshot(&grammar, "1 + 2.5 * .5e2"), @r#"
    Literal "1"
    Symbol "+"
    Literal "2.5"
    Symbol "*"
    Literal ".5e2"
    "#);
}

#[test]
fn string_literals_beat_names() {
    let grammar = test_dialect::grammar();
    insta::assert_snapshot!(snapshot(&grammar, "'abc' abc"), @r#"
    Literal "'abc'"
    Name "abc"
    "#);
}

#[test]
fn name_shaped_symbols_are_reclassified() {
    let grammar = test_dialect::grammar();
    insta::assert_snapshot!(snapshot(&grammar, "1 and 2"), @r#"
    Literal "1"
    Symbol "and"
    Literal "2"
    "#);
}

#[test]
fn maximal_munch_protects_longer_names() {
    // "android" must never lex as the symbol "and" plus "roid".
    let grammar = test_dialect::grammar();
    insta::assert_snapshot!(snapshot(&grammar, "android and"), @r#"
    Name "android"
    Symbol "and"
    "#);
}

#[test]
fn stray_characters_surface_as_unknown() {
    let grammar = test_dialect::grammar();
    insta::assert_snapshot!(snapshot(&grammar, "1 § 2"), @r#"
    Literal "1"
    Unknown "§"
    Literal "2"
    "#);
}

#[test]
fn whitespace_is_skipped() {
    let grammar = test_dialect::grammar();
    assert_eq!(tokenize(&grammar, "  \t\n ").unwrap(), vec![]);
}

/// Grammar with follow-constrained name symbols, as an XPath-style dialect
/// would register axes and functions.
fn constrained_grammar() -> Grammar<TestLang> {
    let mut reg: SymbolRegistry<TestLang> =
        SymbolRegistry::new(["child", "count", "::", "(", ")"]).unwrap();
    for symbol in [
        "(string)",
        "(float)",
        "(decimal)",
        "(integer)",
        "(invalid)",
        "(unknown)",
        "(name)",
    ] {
        reg.literal(symbol, 0).unwrap();
    }
    reg.register("(end)").unwrap();
    reg.register("::").unwrap();
    reg.register("(").unwrap();
    reg.register(")").unwrap();
    reg.register("child").unwrap().follows = FollowsConstraint::DoubleColon;
    reg.register("count").unwrap().follows = FollowsConstraint::LeftParen;
    reg.build().unwrap()
}

#[test]
fn axis_name_requires_double_colon() {
    let grammar = constrained_grammar();
    insta::assert_snapshot!(snapshot(&grammar, "child :: child"), @r#"
    Symbol "child"
    Symbol "::"
    Name "child"
    "#);
}

#[test]
fn function_name_requires_paren() {
    let grammar = constrained_grammar();
    insta::assert_snapshot!(snapshot(&grammar, "count(count)"), @r#"
    Symbol "count"
    Symbol "("
    Name "count"
    Symbol ")"
    "#);
}

#[test]
fn follow_check_skips_comments() {
    let grammar = constrained_grammar();
    insta::assert_snapshot!(snapshot(&grammar, "child (: note :) :: count"), @r#"
    Symbol "child"
    Symbol "("
    Unknown ":"
    Name "note"
    Unknown ":"
    Symbol ")"
    Symbol "::"
    Name "count"
    "#);
}

#[test]
fn round_trip_single_symbols() {
    // Lexing exactly one registered symbol yields one lexeme of that kind.
    let grammar = test_dialect::grammar();
    for symbol in test_dialect::ALPHABET {
        let lexemes = tokenize(&grammar, symbol).unwrap();
        assert_eq!(lexemes.len(), 1, "symbol {symbol:?}");
        assert_eq!(lexemes[0].text(symbol), symbol);
    }
}

#[test]
fn default_unescape_handles_both_quotes() {
    assert_eq!(TestLang::unescape(r#"'a\'b'"#), "a'b");
    assert_eq!(TestLang::unescape(r#""a\"b""#), "a\"b");
}
