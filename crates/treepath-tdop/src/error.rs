//! Error types for grammar construction and parsing.

use thiserror::Error;

/// Errors raised while declaring a grammar or building its tokenizer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    /// Symbols cannot contain whitespace.
    #[error("{symbol:?}: a symbol cannot contain whitespace")]
    InvalidSymbol { symbol: String },

    /// The symbol is not part of the declared grammar alphabet.
    #[error("{symbol:?} is not a symbol of the grammar alphabet")]
    UnknownSymbol { symbol: String },

    /// `build` found alphabet symbols that were never registered.
    #[error("grammar has unregistered symbols: {symbols:?}")]
    UnregisteredSymbols { symbols: Vec<String> },

    /// A pattern fragment did not compile as a regular expression.
    #[error("invalid pattern for {symbol:?}: {message}")]
    Pattern { symbol: String, message: String },
}

/// Errors raised while parsing a source string.
///
/// Every variant that points into the source carries a 1-based line and
/// column so callers can render diagnostics.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    /// A registered symbol appeared where the grammar does not allow it.
    #[error("unexpected {symbol:?} {label} at line {line}, column {column}")]
    Unexpected {
        symbol: String,
        label: String,
        line: usize,
        column: usize,
    },

    /// A literal matched the tokenizer but failed to decode.
    #[error("invalid literal {literal:?} at line {line}, column {column}")]
    InvalidLiteral {
        literal: String,
        line: usize,
        column: usize,
    },

    /// A chunk of source matched no registered symbol and is not a name.
    #[error("unknown symbol {symbol:?} at line {line}, column {column}")]
    UnknownSymbol {
        symbol: String,
        line: usize,
        column: usize,
    },

    /// A name appeared where the grammar does not allow one.
    #[error("unexpected name {name:?} at line {line}, column {column}")]
    UnexpectedName {
        name: String,
        line: usize,
        column: usize,
    },

    /// A literal appeared where the grammar does not allow one.
    #[error("unexpected literal {value:?} at line {line}, column {column}")]
    UnexpectedLiteral {
        value: String,
        line: usize,
        column: usize,
    },

    /// The source ended before the expression was complete.
    #[error("unexpected end of source")]
    UnexpectedEnd,

    /// The source contains no tokens at all.
    #[error("source is empty")]
    EmptySource,

    /// The tokenizer pattern failed to compile from the registered symbols.
    #[error("incompatible tokenizer: {message}")]
    Tokenizer { message: String },

    /// A grammar-specific message, positioned at the current token.
    #[error("{message} at line {line}, column {column}")]
    Message {
        message: String,
        line: usize,
        column: usize,
    },
}

impl ParseError {
    /// The message text without the position suffix.
    pub fn message(&self) -> String {
        match self {
            ParseError::Unexpected { symbol, label, .. } => {
                format!("unexpected {symbol:?} {label}")
            }
            ParseError::InvalidLiteral { literal, .. } => format!("invalid literal {literal:?}"),
            ParseError::UnknownSymbol { symbol, .. } => format!("unknown symbol {symbol:?}"),
            ParseError::UnexpectedName { name, .. } => format!("unexpected name {name:?}"),
            ParseError::UnexpectedLiteral { value, .. } => format!("unexpected literal {value:?}"),
            ParseError::UnexpectedEnd => "unexpected end of source".to_owned(),
            ParseError::EmptySource => "source is empty".to_owned(),
            ParseError::Tokenizer { message } => format!("incompatible tokenizer: {message}"),
            ParseError::Message { message, .. } => message.clone(),
        }
    }

    /// Line and column, when the error points into the source.
    pub fn position(&self) -> Option<(usize, usize)> {
        match self {
            ParseError::Unexpected { line, column, .. }
            | ParseError::InvalidLiteral { line, column, .. }
            | ParseError::UnknownSymbol { line, column, .. }
            | ParseError::UnexpectedName { line, column, .. }
            | ParseError::UnexpectedLiteral { line, column, .. }
            | ParseError::Message { line, column, .. } => Some((*line, *column)),
            _ => None,
        }
    }
}
