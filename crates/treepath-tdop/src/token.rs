//! The token tree.
//!
//! A token is an ordered n-ary node: its children are its operands and its
//! arity is the number of children. Nullary tokens are symbols, names, and
//! literals; tokens with children represent the operators.

use std::rc::Rc;

use crate::registry::{Bp, Dialect, TokenKind};
use crate::symbol::{self, is_special, Label, LabelSet, Span, TokenValue, NAME};

/// A node of the parse tree, referencing its kind in the grammar.
#[derive(Debug, Clone)]
pub struct Token<D: Dialect> {
    kind: Rc<TokenKind<D>>,
    /// The token value; defaults to the symbol, literals carry the decoded
    /// literal.
    pub value: TokenValue,
    /// Byte span of the token in the original source.
    pub span: Span,
    /// The operands, in order.
    pub children: Vec<Token<D>>,
    /// Dialect payload (e.g. a namespace bound during parsing).
    pub meta: D::TokenMeta,
}

impl<D: Dialect> Token<D> {
    pub fn new(kind: Rc<TokenKind<D>>, value: TokenValue, span: Span) -> Self {
        Token {
            kind,
            value,
            span,
            children: Vec::new(),
            meta: D::TokenMeta::default(),
        }
    }

    pub fn kind(&self) -> &TokenKind<D> {
        &self.kind
    }

    pub fn symbol(&self) -> &str {
        &self.kind.symbol
    }

    pub fn label(&self) -> &LabelSet {
        &self.kind.label
    }

    pub fn lbp(&self) -> Bp {
        self.kind.lbp
    }

    pub fn rbp(&self) -> Bp {
        self.kind.rbp
    }

    pub fn is(&self, symbol: &str) -> bool {
        self.kind.symbol == symbol
    }

    /// Number of operands.
    pub fn arity(&self) -> usize {
        self.children.len()
    }

    pub fn child(&self, index: usize) -> &Token<D> {
        &self.children[index]
    }

    /// Iterate the subtree, optionally filtered to the given symbols.
    ///
    /// The traversal order is: a leaf yields itself; a unary node yields
    /// itself then descends; a node with two or more children descends into
    /// the first child, yields itself, then descends into the rest.
    pub fn iter<'a>(&'a self, symbols: &[&str]) -> impl Iterator<Item = &'a Token<D>> {
        let mut out = Vec::new();
        self.collect_iter(symbols, &mut out);
        out.into_iter()
    }

    fn collect_iter<'a>(&'a self, symbols: &[&str], out: &mut Vec<&'a Token<D>>) {
        let matches = symbols.is_empty() || symbols.contains(&self.symbol());
        match self.children.len() {
            0 => {
                if matches {
                    out.push(self);
                }
            }
            1 => {
                if matches {
                    out.push(self);
                }
                self.children[0].collect_iter(symbols, out);
            }
            _ => {
                self.children[0].collect_iter(symbols, out);
                if matches {
                    out.push(self);
                }
                for child in &self.children[1..] {
                    child.collect_iter(symbols, out);
                }
            }
        }
    }

    /// S-expression rendering of the subtree, for diagnostics.
    pub fn tree(&self) -> String {
        let symbol = self.symbol();
        if symbol == NAME {
            format!("({})", self.value)
        } else if is_special(symbol) {
            match &self.value {
                TokenValue::Str(s) => format!("('{s}')"),
                other => format!("({other})"),
            }
        } else if symbol == "(" {
            if self.children.is_empty() {
                "()".to_owned()
            } else {
                self.children[0].tree()
            }
        } else if self.children.is_empty() {
            format!("({symbol})")
        } else {
            let operands: Vec<String> = self.children.iter().map(Token::tree).collect();
            format!("({symbol} {})", operands.join(" "))
        }
    }

    /// Reconstruct a source representation of the subtree.
    ///
    /// The output is not the original text but re-parses to a structurally
    /// equivalent tree; used for diagnostics and round-trip checks.
    pub fn to_source(&self) -> String {
        let symbol = self.symbol();
        if symbol == NAME {
            return self.value.to_string();
        }
        if is_special(symbol) {
            return match &self.value {
                TokenValue::Str(s) => format!("'{s}'"),
                other => other.to_string(),
            };
        }
        // Grouping and name-composite constructs join tightly.
        match (symbol, self.children.len()) {
            ("(", 0) => "()".to_owned(),
            ("(", _) => format!("({})", self.children[0].to_source()),
            ("[", 2) => format!(
                "{}[{}]",
                self.children[0].to_source(),
                self.children[1].to_source()
            ),
            (":", 2) => format!(
                "{}:{}",
                self.children[0].to_source(),
                self.children[1].to_source()
            ),
            ("{", 2) => format!(
                "{{{}}}{}",
                self.children[0].value,
                self.children[1].to_source()
            ),
            _ => {
                if self.kind.label.is(Label::Axis) && self.children.len() == 1 {
                    return format!("{symbol}::{}", self.children[0].to_source());
                }
                if (self.kind.label.is(Label::Function) || self.kind.label.is(Label::KindTest))
                    && self.kind.nud_parses_call()
                {
                    let args: Vec<String> =
                        self.children.iter().map(Token::to_source).collect();
                    return format!("{symbol}({})", args.join(", "));
                }
                match self.children.len() {
                    0 => symbol.to_owned(),
                    1 => {
                        if self.kind.label.is(Label::PostfixOperator) {
                            format!("{} {symbol}", self.children[0].to_source())
                        } else {
                            format!("{symbol} {}", self.children[0].to_source())
                        }
                    }
                    2 => format!(
                        "{} {symbol} {}",
                        self.children[0].to_source(),
                        self.children[1].to_source()
                    ),
                    _ => {
                        let operands: Vec<String> =
                            self.children.iter().map(Token::to_source).collect();
                        format!("{symbol} {}", operands.join(" "))
                    }
                }
            }
        }
    }

    /// Line and column of the token in `source` (both 1-based).
    pub fn position(&self, source: &str) -> (usize, usize) {
        symbol::line_column(source, self.span.start)
    }
}

impl<D: Dialect> TokenKind<D> {
    /// Whether this kind's null denotation consumes a `(args)` call form.
    pub(crate) fn nud_parses_call(&self) -> bool {
        self.follows == crate::registry::FollowsConstraint::LeftParen
    }
}

impl<D: Dialect> std::fmt::Display for Token<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if is_special(self.symbol()) {
            write!(f, "{:?} {}", self.value.to_string(), &self.symbol()[1..self.symbol().len() - 1])
        } else {
            write!(f, "{:?} {}", self.symbol(), self.kind.label)
        }
    }
}
