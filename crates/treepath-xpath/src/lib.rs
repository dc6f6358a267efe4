//! XPath 1.0 expression parser and evaluator over pluggable XML node
//! trees, built on the [`treepath_tdop`] Pratt engine.
//!
//! # Architecture
//!
//! ```text
//! source → tokenizer → Pratt driver → token tree → evaluate / select
//!                (grammar.rs)                        (eval::*)
//! ```
//!
//! - [`grammar`](crate): registers the XPath 1.0 alphabet — axes,
//!   operators, kind tests, and the function library — with their
//!   parse-time denotations.
//! - [`node`]: the [`NodeModel`] interface the caller's XML tree
//!   implements; evaluation never owns a document.
//! - [`context`]: the dynamic context (item, position, size, variables)
//!   and its axis iterators.
//! - `eval`: per-symbol `evaluate`/`select` dispatch.
//!
//! # Example
//!
//! ```
//! use treepath_xpath::XPath1Parser;
//!
//! let parser = XPath1Parser::new().unwrap();
//! let expr = parser.parse("1 + 2 * 3").unwrap();
//! assert_eq!(expr.root().tree(), "(+ (1) (* (2) (3)))");
//! ```

pub mod context;
pub mod dialect;
pub mod error;
mod eval;
mod grammar;
pub mod node;
pub mod value;

use indexmap::IndexMap;
use treepath_tdop::{Grammar, GrammarError, Parser, Token};

pub use context::{Axis, XPathContext};
pub use dialect::XPath1;
pub use error::{ErrorCode, XPathError};
pub use node::{NamespaceNode, NoNode, NodeKind, NodeModel};
pub use value::{Duration, Item, Number, Value};

/// An XPath 1.0 parser bound to a namespace map and strictness mode.
///
/// The grammar and its tokenizer are owned by the parser; each `parse`
/// call runs an independent session, so a parser can be reused for any
/// number of expressions.
pub struct XPath1Parser {
    grammar: Grammar<XPath1>,
    dialect: XPath1,
}

impl XPath1Parser {
    /// A strict parser with only the default `xml` namespace.
    pub fn new() -> Result<Self, GrammarError> {
        Self::with_namespaces(&IndexMap::new(), true)
    }

    /// A parser with the given prefix-to-URI bindings. With `strict`
    /// unset, `{uri}name` extended names are accepted.
    pub fn with_namespaces(
        namespaces: &IndexMap<String, String>,
        strict: bool,
    ) -> Result<Self, GrammarError> {
        Ok(XPath1Parser {
            grammar: grammar::build_grammar()?,
            dialect: XPath1::new(namespaces, strict),
        })
    }

    pub fn version(&self) -> &'static str {
        "1.0"
    }

    pub fn strict(&self) -> bool {
        self.dialect.strict
    }

    /// Parse an expression.
    ///
    /// After parsing, the expression is evaluated once without a context;
    /// this surfaces static errors (unknown prefixes, type mismatches
    /// between literals) while ignoring anything that needs a document.
    pub fn parse(&self, source: &str) -> Result<XPathExpr, XPathError> {
        let mut parser = Parser::new(&self.grammar, self.dialect.clone());
        let root = parser.parse(source).map_err(XPathError::from_parse)?;
        let expr = XPathExpr {
            root,
            env: self.dialect.clone(),
        };
        match expr.evaluate::<NoNode>(None) {
            Err(err) if !err.is_missing_context() => Err(err),
            _ => Ok(expr),
        }
    }
}

/// A parsed XPath expression: the token tree plus the namespace bindings
/// it was parsed under.
#[derive(Debug)]
pub struct XPathExpr {
    root: Token<XPath1>,
    env: XPath1,
}

impl XPathExpr {
    /// The root of the token tree.
    pub fn root(&self) -> &Token<XPath1> {
        &self.root
    }

    /// Evaluate to a single value. Node-centric expressions require a
    /// context.
    pub fn evaluate<N: NodeModel>(
        &self,
        context: Option<&XPathContext<N>>,
    ) -> Result<Value<N>, XPathError> {
        eval::evaluate(&self.root, &self.env, context)
    }

    /// Select a lazy stream of items against a context.
    pub fn select<'a, N: NodeModel>(
        &'a self,
        context: &XPathContext<N>,
    ) -> impl Iterator<Item = Result<Item<N>, XPathError>> + 'a {
        eval::select(&self.root, &self.env, context)
    }
}

#[cfg(test)]
mod test_support;

#[cfg(test)]
mod eval_tests;
#[cfg(test)]
mod context_tests;
