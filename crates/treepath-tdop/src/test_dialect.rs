//! Shared test language: a tiny arithmetic grammar with grouping.

use crate::error::ParseError;
use crate::parser::Parser;
use crate::registry::{Dialect, Grammar, Nud, SymbolRegistry};
use crate::token::Token;

#[derive(Debug, Clone, Default)]
pub(crate) struct TestLang;

impl Dialect for TestLang {
    type KindMeta = ();
    type TokenMeta = ();
}

pub(crate) const ALPHABET: [&str; 8] = ["+", "-", "*", "/", "(", ")", "and", "not"];

/// A registry with the special symbols registered and the alphabet open.
pub(crate) fn registry() -> SymbolRegistry<TestLang> {
    let mut reg = SymbolRegistry::new(ALPHABET).unwrap();
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
    reg
}

/// The full test grammar.
pub(crate) fn grammar() -> Grammar<TestLang> {
    let mut reg = registry();
    reg.infix("+", 10).unwrap();
    reg.infix("-", 10).unwrap().nud = Nud::Prefix(30);
    reg.infix("*", 20).unwrap();
    reg.infix("/", 20).unwrap();
    reg.infix("and", 5).unwrap();
    reg.prefix("not", 25).unwrap();
    reg.method("(", 40).unwrap().nud = Nud::Custom(nud_paren);
    reg.register(")").unwrap();
    reg.build().unwrap()
}

fn nud_paren(
    parser: &mut Parser<'_, TestLang>,
    mut token: Token<TestLang>,
) -> Result<Token<TestLang>, ParseError> {
    let inner = parser.expression(0)?;
    token.children.push(inner);
    parser.advance(&[")"])?;
    Ok(token)
}

/// Parse a source string with the test grammar.
pub(crate) fn parse(source: &str) -> Result<Token<TestLang>, ParseError> {
    let grammar = grammar();
    let mut parser = Parser::new(&grammar, TestLang);
    parser.parse(source)
}
