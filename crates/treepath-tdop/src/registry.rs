//! Declarative symbol registry and the frozen grammar it builds.
//!
//! A grammar is declared by registering token kinds against a closed
//! alphabet of symbols. Each kind is a plain record: binding powers, an
//! optional custom tokenizer fragment, a label set, and its null/left
//! denotations. The denotations cover the standard Pratt shapes as data
//! ([`Nud::Prefix`], [`Led::Infix`], ...) with function-pointer escape
//! hatches for grammar-specific behavior.
//!
//! `build()` validates that every alphabet symbol was registered and
//! freezes the table into a [`Grammar`]; the tokenizer regex is synthesized
//! lazily on first parse.

use std::cell::OnceCell;
use std::fmt;
use std::rc::Rc;

use indexmap::{IndexMap, IndexSet};
use regex::Regex;

use crate::error::{GrammarError, ParseError};
use crate::parser::Parser;
use crate::symbol::{Label, LabelSet, SPECIAL_SYMBOLS};
use crate::token::Token;
use crate::tokenizer;

/// Binding power.
pub type Bp = u32;

/// Default literal pattern: single- or double-quoted strings with
/// backslash escapes, or a numeric literal.
pub const DEFAULT_LITERALS_PATTERN: &str =
    r#"'[^']*'|"[^"]*"|(?:\d+|\.\d+)(?:\.\d*)?(?:[Ee][+\-]?\d+)?"#;

/// Default name pattern: ASCII alphanumerics and underscores.
pub const DEFAULT_NAME_PATTERN: &str = r"[A-Za-z0-9_]+";

/// Hooks a concrete language supplies to the engine.
///
/// The dialect value itself is carried inside the [`Parser`] and holds any
/// per-parse state a grammar's denotations need (e.g. a namespace map).
pub trait Dialect: Sized + 'static {
    /// Payload attached to every token kind (e.g. function arity).
    type KindMeta: Default + Clone + fmt::Debug;
    /// Payload attached to every token instance (e.g. a bound namespace).
    type TokenMeta: Default + Clone + fmt::Debug;

    /// Group-free regex fragment matching string and numeric literals.
    const LITERALS_PATTERN: &'static str = DEFAULT_LITERALS_PATTERN;
    /// Group-free regex fragment matching names.
    const NAME_PATTERN: &'static str = DEFAULT_NAME_PATTERN;

    /// Decode a matched string literal (quotes included) to its value.
    fn unescape(literal: &str) -> String {
        let inner = &literal[1..literal.len() - 1];
        inner.replace("\\'", "'").replace("\\\"", "\"")
    }
}

/// Custom null denotation: receives the parser and the token being denoted.
pub type NudFn<D> = fn(&mut Parser<'_, D>, Token<D>) -> Result<Token<D>, ParseError>;

/// Custom left denotation: receives the parser, the token, and the left operand.
pub type LedFn<D> = fn(&mut Parser<'_, D>, Token<D>, Token<D>) -> Result<Token<D>, ParseError>;

/// Null denotation of a token kind.
pub enum Nud<D: Dialect> {
    /// The kind cannot start an expression.
    None,
    /// The token denotes itself (literals, nullary operators).
    Literal,
    /// Consume one subexpression at the given right binding power.
    Prefix(Bp),
    /// Grammar-specific behavior.
    Custom(NudFn<D>),
}

/// Left denotation of a token kind.
pub enum Led<D: Dialect> {
    /// The kind cannot continue an expression.
    None,
    /// Adopt the left operand as the sole child.
    Postfix,
    /// Adopt the left operand and a subexpression at the given power.
    Infix(Bp),
    /// Right-associative: the subexpression is parsed at `bp - 1`.
    InfixR(Bp),
    /// Grammar-specific behavior.
    Custom(LedFn<D>),
}

impl<D: Dialect> Clone for Nud<D> {
    fn clone(&self) -> Self {
        match self {
            Nud::None => Nud::None,
            Nud::Literal => Nud::Literal,
            Nud::Prefix(bp) => Nud::Prefix(*bp),
            Nud::Custom(f) => Nud::Custom(*f),
        }
    }
}

impl<D: Dialect> Clone for Led<D> {
    fn clone(&self) -> Self {
        match self {
            Led::None => Led::None,
            Led::Postfix => Led::Postfix,
            Led::Infix(bp) => Led::Infix(*bp),
            Led::InfixR(bp) => Led::InfixR(*bp),
            Led::Custom(f) => Led::Custom(*f),
        }
    }
}

impl<D: Dialect> fmt::Debug for Nud<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Nud::None => f.write_str("None"),
            Nud::Literal => f.write_str("Literal"),
            Nud::Prefix(bp) => write!(f, "Prefix({bp})"),
            Nud::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl<D: Dialect> fmt::Debug for Led<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Led::None => f.write_str("None"),
            Led::Postfix => f.write_str("Postfix"),
            Led::Infix(bp) => write!(f, "Infix({bp})"),
            Led::InfixR(bp) => write!(f, "InfixR({bp})"),
            Led::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Context a name-shaped symbol requires on its right to be classified as
/// that symbol rather than as a plain `(name)`.
///
/// The tokenizer checks the constraint after the name match, skipping
/// whitespace and `(: ... :)` comments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FollowsConstraint {
    /// No constraint: the name is always this symbol.
    #[default]
    Any,
    /// Requires a following `::` (axes).
    DoubleColon,
    /// Requires a following `(` (functions, kind tests).
    LeftParen,
}

/// A token kind: the registry record for one symbol.
#[derive(Debug)]
pub struct TokenKind<D: Dialect> {
    pub symbol: String,
    pub lbp: Bp,
    pub rbp: Bp,
    /// Custom tokenizer fragment; when absent the tokenizer derives one
    /// from the symbol text.
    pub pattern: Option<String>,
    pub label: LabelSet,
    pub nud: Nud<D>,
    pub led: Led<D>,
    pub follows: FollowsConstraint,
    pub meta: D::KindMeta,
}

impl<D: Dialect> Clone for TokenKind<D> {
    fn clone(&self) -> Self {
        TokenKind {
            symbol: self.symbol.clone(),
            lbp: self.lbp,
            rbp: self.rbp,
            pattern: self.pattern.clone(),
            label: self.label.clone(),
            nud: self.nud.clone(),
            led: self.led.clone(),
            follows: self.follows,
            meta: self.meta.clone(),
        }
    }
}

impl<D: Dialect> TokenKind<D> {
    fn new(symbol: &str) -> Self {
        TokenKind {
            symbol: symbol.to_owned(),
            lbp: 0,
            rbp: 0,
            pattern: None,
            label: LabelSet::default(),
            nud: Nud::None,
            led: Led::None,
            follows: FollowsConstraint::Any,
            meta: D::KindMeta::default(),
        }
    }

    /// Raise binding powers monotonically; updates never lower them.
    pub fn raise_bp(&mut self, lbp: Bp, rbp: Bp) {
        self.lbp = self.lbp.max(lbp);
        self.rbp = self.rbp.max(rbp);
    }
}

/// Mutable builder for a grammar: a symbol table over a closed alphabet.
pub struct SymbolRegistry<D: Dialect> {
    alphabet: IndexSet<String>,
    kinds: IndexMap<String, TokenKind<D>>,
    name_re: Regex,
}

impl<D: Dialect> SymbolRegistry<D> {
    /// Create a registry over the given alphabet. The special symbols are
    /// always part of the alphabet.
    pub fn new<I, S>(alphabet: I) -> Result<Self, GrammarError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set: IndexSet<String> = SPECIAL_SYMBOLS.iter().map(|s| (*s).to_owned()).collect();
        for symbol in alphabet {
            set.insert(symbol.as_ref().to_owned());
        }
        let name_re = Regex::new(&format!("^(?:{})$", D::NAME_PATTERN)).map_err(|err| {
            GrammarError::Pattern {
                symbol: "(name)".to_owned(),
                message: err.to_string(),
            }
        })?;
        Ok(SymbolRegistry {
            alphabet: set,
            kinds: IndexMap::new(),
            name_re,
        })
    }

    /// Whether `text` matches the dialect's name pattern in full.
    pub fn is_name(&self, text: &str) -> bool {
        self.name_re.is_match(text)
    }

    /// Create or fetch the kind for `symbol`.
    ///
    /// Creating requires the symbol to be in the alphabet; symbols with
    /// whitespace are always rejected.
    pub fn register(&mut self, symbol: &str) -> Result<&mut TokenKind<D>, GrammarError> {
        if symbol.chars().any(char::is_whitespace) {
            return Err(GrammarError::InvalidSymbol {
                symbol: symbol.to_owned(),
            });
        }
        if !self.kinds.contains_key(symbol) {
            if !self.alphabet.contains(symbol) {
                return Err(GrammarError::UnknownSymbol {
                    symbol: symbol.to_owned(),
                });
            }
            self.kinds
                .insert(symbol.to_owned(), TokenKind::new(symbol));
        }
        Ok(&mut self.kinds[symbol])
    }

    /// Set a validated custom tokenizer fragment on `symbol`.
    pub fn set_pattern(&mut self, symbol: &str, pattern: &str) -> Result<(), GrammarError> {
        Regex::new(pattern).map_err(|err| GrammarError::Pattern {
            symbol: symbol.to_owned(),
            message: err.to_string(),
        })?;
        self.register(symbol)?.pattern = Some(pattern.to_owned());
        Ok(())
    }

    /// Remove a kind from the table.
    pub fn unregister(&mut self, symbol: &str) {
        self.kinds.shift_remove(symbol.trim());
    }

    /// Copy all inheritable attributes of `symbol` onto `new_symbol`,
    /// except the symbol itself and the custom pattern.
    pub fn duplicate(
        &mut self,
        symbol: &str,
        new_symbol: &str,
    ) -> Result<&mut TokenKind<D>, GrammarError> {
        let source = self
            .kinds
            .get(symbol)
            .cloned()
            .ok_or_else(|| GrammarError::UnknownSymbol {
                symbol: symbol.to_owned(),
            })?;
        let kind = self.register(new_symbol)?;
        kind.raise_bp(source.lbp, source.rbp);
        kind.label = source.label;
        kind.nud = source.nud;
        kind.led = source.led;
        kind.follows = source.follows;
        kind.meta = source.meta;
        Ok(kind)
    }

    /// Register a kind whose token denotes a literal value.
    pub fn literal(&mut self, symbol: &str, bp: Bp) -> Result<&mut TokenKind<D>, GrammarError> {
        let created = !self.kinds.contains_key(symbol);
        let kind = self.register(symbol)?;
        if created {
            kind.label = Label::Literal.into();
        }
        kind.raise_bp(bp, 0);
        kind.nud = Nud::Literal;
        Ok(kind)
    }

    /// Register a nullary operator: denotes itself, no operands.
    pub fn nullary(&mut self, symbol: &str, bp: Bp) -> Result<&mut TokenKind<D>, GrammarError> {
        let created = !self.kinds.contains_key(symbol);
        let kind = self.register(symbol)?;
        if created {
            kind.label = Label::Operator.into();
        }
        kind.raise_bp(bp, 0);
        kind.nud = Nud::Literal;
        Ok(kind)
    }

    /// Register a prefix unary operator: consumes one subexpression at
    /// `rbp = bp`.
    pub fn prefix(&mut self, symbol: &str, bp: Bp) -> Result<&mut TokenKind<D>, GrammarError> {
        let created = !self.kinds.contains_key(symbol);
        let kind = self.register(symbol)?;
        if created {
            kind.label = Label::PrefixOperator.into();
        }
        kind.raise_bp(bp, bp);
        kind.nud = Nud::Prefix(bp);
        Ok(kind)
    }

    /// Register a postfix unary operator: adopts the left operand.
    pub fn postfix(&mut self, symbol: &str, bp: Bp) -> Result<&mut TokenKind<D>, GrammarError> {
        let created = !self.kinds.contains_key(symbol);
        let kind = self.register(symbol)?;
        if created {
            kind.label = Label::PostfixOperator.into();
        }
        kind.raise_bp(bp, bp);
        kind.led = Led::Postfix;
        Ok(kind)
    }

    /// Register an infix binary operator.
    pub fn infix(&mut self, symbol: &str, bp: Bp) -> Result<&mut TokenKind<D>, GrammarError> {
        let created = !self.kinds.contains_key(symbol);
        let kind = self.register(symbol)?;
        if created {
            kind.label = Label::Operator.into();
        }
        kind.raise_bp(bp, bp);
        kind.led = Led::Infix(bp);
        Ok(kind)
    }

    /// Register a right-associative infix binary operator.
    pub fn infixr(&mut self, symbol: &str, bp: Bp) -> Result<&mut TokenKind<D>, GrammarError> {
        let created = !self.kinds.contains_key(symbol);
        let kind = self.register(symbol)?;
        if created {
            kind.label = Label::Operator.into();
        }
        kind.raise_bp(bp, bp.saturating_sub(1));
        kind.led = Led::InfixR(bp);
        Ok(kind)
    }

    /// Register an operator whose denotations are supplied by the caller
    /// (set `nud`/`led` on the returned kind).
    pub fn method(&mut self, symbol: &str, bp: Bp) -> Result<&mut TokenKind<D>, GrammarError> {
        let created = !self.kinds.contains_key(symbol);
        let kind = self.register(symbol)?;
        if created {
            kind.label = Label::Operator.into();
        }
        kind.raise_bp(bp, bp);
        Ok(kind)
    }

    /// Validate the registry and freeze it.
    ///
    /// Fails when any declared alphabet symbol has no registration.
    pub fn build(self) -> Result<Grammar<D>, GrammarError> {
        let missing: Vec<String> = self
            .alphabet
            .iter()
            .filter(|s| !self.kinds.contains_key(*s))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(GrammarError::UnregisteredSymbols { symbols: missing });
        }

        let kinds: IndexMap<String, Rc<TokenKind<D>>> = self
            .kinds
            .into_iter()
            .map(|(symbol, kind)| (symbol, Rc::new(kind)))
            .collect();

        // The completeness check above guarantees every special symbol is
        // present; resolve the handles the driver needs.
        let special = |symbol: &str| Rc::clone(&kinds[symbol]);
        Ok(Grammar {
            string_kind: special(crate::symbol::STRING_LITERAL),
            float_kind: special(crate::symbol::FLOAT_LITERAL),
            decimal_kind: special(crate::symbol::DECIMAL_LITERAL),
            integer_kind: special(crate::symbol::INTEGER_LITERAL),
            name_kind: special(crate::symbol::NAME),
            end_kind: special(crate::symbol::END),
            invalid_kind: special(crate::symbol::INVALID),
            unknown_kind: special(crate::symbol::UNKNOWN),
            kinds,
            name_re: self.name_re,
            tokenizer: OnceCell::new(),
        })
    }
}

/// A frozen symbol table plus its (lazily compiled) tokenizer.
pub struct Grammar<D: Dialect> {
    pub(crate) kinds: IndexMap<String, Rc<TokenKind<D>>>,
    pub(crate) name_re: Regex,
    tokenizer: OnceCell<Regex>,

    pub(crate) string_kind: Rc<TokenKind<D>>,
    pub(crate) float_kind: Rc<TokenKind<D>>,
    pub(crate) decimal_kind: Rc<TokenKind<D>>,
    pub(crate) integer_kind: Rc<TokenKind<D>>,
    pub(crate) name_kind: Rc<TokenKind<D>>,
    pub(crate) end_kind: Rc<TokenKind<D>>,
    pub(crate) invalid_kind: Rc<TokenKind<D>>,
    pub(crate) unknown_kind: Rc<TokenKind<D>>,
}

impl<D: Dialect> Grammar<D> {
    /// Look up the kind registered for `symbol`.
    pub fn get(&self, symbol: &str) -> Option<&Rc<TokenKind<D>>> {
        self.kinds.get(symbol)
    }

    /// Whether `text` matches the dialect's name pattern in full.
    pub fn is_name(&self, text: &str) -> bool {
        self.name_re.is_match(text)
    }

    /// The synthesized tokenizer, compiled on first use.
    pub(crate) fn tokenizer(&self) -> Result<&Regex, ParseError> {
        match self.tokenizer.get() {
            Some(re) => Ok(re),
            None => {
                let pattern = tokenizer::synthesize_pattern(self);
                let re = Regex::new(&pattern).map_err(|err| ParseError::Tokenizer {
                    message: err.to_string(),
                })?;
                Ok(self.tokenizer.get_or_init(|| re))
            }
        }
    }

    /// The synthesized tokenizer pattern, for inspection.
    pub fn tokenizer_pattern(&self) -> String {
        tokenizer::synthesize_pattern(self)
    }
}

impl<D: Dialect> fmt::Debug for Grammar<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grammar")
            .field("symbols", &self.kinds.len())
            .finish()
    }
}
