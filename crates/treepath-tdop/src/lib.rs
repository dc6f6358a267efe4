//! Engine for defining and running Pratt (top-down operator precedence)
//! parsers.
//!
//! A language is declared as a [`SymbolRegistry`]: a table of token kinds
//! over a closed alphabet, each carrying binding powers, a label, and its
//! null/left denotations. [`SymbolRegistry::build`] freezes the table into
//! a [`Grammar`], from which a regex tokenizer is synthesized on first
//! parse. A [`Parser`] then drives the classic mutual recursion between
//! `expression(rbp)` and the token denotations, producing an owned
//! [`Token`] tree.
//!
//! # Example
//!
//! ```
//! use treepath_tdop::{Dialect, Parser, SymbolRegistry};
//!
//! #[derive(Debug, Clone, Default)]
//! struct Calc;
//!
//! impl Dialect for Calc {
//!     type KindMeta = ();
//!     type TokenMeta = ();
//! }
//!
//! let mut registry = SymbolRegistry::<Calc>::new(["+", "*"]).unwrap();
//! registry.literal("(string)", 0).unwrap();
//! registry.literal("(float)", 0).unwrap();
//! registry.literal("(decimal)", 0).unwrap();
//! registry.literal("(integer)", 0).unwrap();
//! registry.literal("(invalid)", 0).unwrap();
//! registry.literal("(unknown)", 0).unwrap();
//! registry.literal("(name)", 0).unwrap();
//! registry.register("(end)").unwrap();
//! registry.infix("+", 10).unwrap();
//! registry.infix("*", 20).unwrap();
//!
//! let grammar = registry.build().unwrap();
//! let mut parser = Parser::new(&grammar, Calc);
//! let root = parser.parse("1 + 2 * 3").unwrap();
//! assert_eq!(root.tree(), "(+ (1) (* (2) (3)))");
//! ```

pub mod error;
pub mod parser;
pub mod registry;
pub mod symbol;
pub mod token;
pub mod tokenizer;

pub use error::{GrammarError, ParseError};
pub use parser::Parser;
pub use registry::{
    Bp, Dialect, FollowsConstraint, Grammar, Led, LedFn, Nud, NudFn, SymbolRegistry, TokenKind,
};
pub use symbol::{Label, LabelSet, Span, TokenValue};
pub use token::Token;

#[cfg(test)]
mod test_dialect;

#[cfg(test)]
mod tokenizer_tests;
#[cfg(test)]
mod token_tests;
