//! Symbols, labels, spans, and token values.
//!
//! A *symbol* is the short string that identifies a token kind: an
//! identifier, a piece of punctuation, or one of the reserved forms listed
//! in [`SPECIAL_SYMBOLS`]. Labels classify the role a kind plays in the
//! grammar; a kind may carry several roles at once (e.g. a name that can act
//! as a function or as an axis), which [`LabelSet`] models as a small set.

use std::fmt;

use rust_decimal::Decimal;

/// String literal token kind.
pub const STRING_LITERAL: &str = "(string)";
/// Float literal token kind (numeric literal with an exponent).
pub const FLOAT_LITERAL: &str = "(float)";
/// Decimal literal token kind (numeric literal with a fraction point).
pub const DECIMAL_LITERAL: &str = "(decimal)";
/// Integer literal token kind.
pub const INTEGER_LITERAL: &str = "(integer)";
/// Name token kind, for identifiers that are not registered symbols.
pub const NAME: &str = "(name)";
/// End-of-source token kind.
pub const END: &str = "(end)";
/// Malformed literal token kind.
pub const INVALID: &str = "(invalid)";
/// Catch-all token kind for unmatched non-space characters.
pub const UNKNOWN: &str = "(unknown)";

/// The reserved symbols every grammar alphabet contains implicitly.
pub const SPECIAL_SYMBOLS: [&str; 8] = [
    STRING_LITERAL,
    FLOAT_LITERAL,
    DECIMAL_LITERAL,
    INTEGER_LITERAL,
    NAME,
    END,
    INVALID,
    UNKNOWN,
];

/// Whether `symbol` is one of the reserved special symbols.
pub fn is_special(symbol: &str) -> bool {
    SPECIAL_SYMBOLS.contains(&symbol)
}

/// Role of a token kind in the grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Label {
    Symbol,
    Literal,
    Operator,
    PrefixOperator,
    PostfixOperator,
    Function,
    Constructor,
    KindTest,
    Axis,
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Label::Symbol => "symbol",
            Label::Literal => "literal",
            Label::Operator => "operator",
            Label::PrefixOperator => "prefix operator",
            Label::PostfixOperator => "postfix operator",
            Label::Function => "function",
            Label::Constructor => "constructor",
            Label::KindTest => "kind test",
            Label::Axis => "axis",
        };
        f.write_str(s)
    }
}

/// A non-empty set of labels.
///
/// Most kinds carry a single label; a multi-label kind matches any of its
/// members, so `set.is(Label::Function)` answers "can this kind act as a
/// function" rather than "is its only role function".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSet(Vec<Label>);

impl LabelSet {
    pub fn single(label: Label) -> Self {
        LabelSet(vec![label])
    }

    pub fn of(labels: &[Label]) -> Self {
        debug_assert!(!labels.is_empty());
        LabelSet(labels.to_vec())
    }

    /// Membership test; equality against a label means membership.
    pub fn is(&self, label: Label) -> bool {
        self.0.contains(&label)
    }

    /// The first (primary) label, used for display.
    pub fn primary(&self) -> Label {
        self.0[0]
    }
}

impl Default for LabelSet {
    fn default() -> Self {
        LabelSet::single(Label::Symbol)
    }
}

impl From<Label> for LabelSet {
    fn from(label: Label) -> Self {
        LabelSet::single(label)
    }
}

impl PartialEq<Label> for LabelSet {
    fn eq(&self, other: &Label) -> bool {
        self.is(*other)
    }
}

impl fmt::Display for LabelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, label) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("__")?;
            }
            write!(f, "{label}")?;
        }
        Ok(())
    }
}

/// Byte range into the source string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }

    pub fn empty(at: usize) -> Self {
        Span { start: at, end: at }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Value carried by a token instance. Defaults to the symbol text; literal
/// tokens carry the decoded literal.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenValue {
    Str(String),
    Integer(i64),
    Decimal(Decimal),
    Float(f64),
}

impl TokenValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            TokenValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// String contents, or the empty string for numeric values.
    pub fn str_or_empty(&self) -> &str {
        self.as_str().unwrap_or("")
    }
}

impl fmt::Display for TokenValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenValue::Str(s) => f.write_str(s),
            TokenValue::Integer(i) => write!(f, "{i}"),
            TokenValue::Decimal(d) => write!(f, "{d}"),
            TokenValue::Float(v) => write!(f, "{v}"),
        }
    }
}

impl From<&str> for TokenValue {
    fn from(s: &str) -> Self {
        TokenValue::Str(s.to_owned())
    }
}

impl From<String> for TokenValue {
    fn from(s: String) -> Self {
        TokenValue::Str(s)
    }
}

/// Line and column (both 1-based) of a byte offset into `source`.
/// Columns count characters, not bytes.
pub(crate) fn line_column(source: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(source.len());
    let before = &source[..offset];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    let column = before[line_start..].chars().count() + 1;
    (line, column)
}
