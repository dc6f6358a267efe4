//! XPath error codes and the crate error type.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use treepath_tdop::ParseError;

/// W3C XPath error codes raised by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Static syntax error.
    XPST0003,
    /// Unknown function or arity mismatch.
    XPST0017,
    /// Undeclared namespace prefix.
    XPST0081,
    /// Type error in an expression.
    XPTY0004,
    /// Path step applied to a non-node.
    XPTY0019,
    /// Invalid value for a cast or coercion.
    FORG0001,
    /// Invalid argument type for an aggregate.
    FORG0006,
    /// Division by zero.
    FOAR0001,
    /// Numeric operation overflow or underflow.
    FOAR0002,
    /// Invalid operand for a numeric operation.
    FOCA0005,
    /// Overflow or underflow in date/time arithmetic.
    FODT0001,
    /// Overflow or underflow in duration arithmetic.
    FODT0002,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::XPST0003 => "XPST0003",
            ErrorCode::XPST0017 => "XPST0017",
            ErrorCode::XPST0081 => "XPST0081",
            ErrorCode::XPTY0004 => "XPTY0004",
            ErrorCode::XPTY0019 => "XPTY0019",
            ErrorCode::FORG0001 => "FORG0001",
            ErrorCode::FORG0006 => "FORG0006",
            ErrorCode::FOAR0001 => "FOAR0001",
            ErrorCode::FOAR0002 => "FOAR0002",
            ErrorCode::FOCA0005 => "FOCA0005",
            ErrorCode::FODT0001 => "FODT0001",
            ErrorCode::FODT0002 => "FODT0002",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErrorCode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, ()> {
        match s {
            "XPST0003" => Ok(ErrorCode::XPST0003),
            "XPST0017" => Ok(ErrorCode::XPST0017),
            "XPST0081" => Ok(ErrorCode::XPST0081),
            "XPTY0004" => Ok(ErrorCode::XPTY0004),
            "XPTY0019" => Ok(ErrorCode::XPTY0019),
            "FORG0001" => Ok(ErrorCode::FORG0001),
            "FORG0006" => Ok(ErrorCode::FORG0006),
            "FOAR0001" => Ok(ErrorCode::FOAR0001),
            "FOAR0002" => Ok(ErrorCode::FOAR0002),
            "FOCA0005" => Ok(ErrorCode::FOCA0005),
            "FODT0001" => Ok(ErrorCode::FODT0001),
            "FODT0002" => Ok(ErrorCode::FODT0002),
            _ => Err(()),
        }
    }
}

/// Errors raised while parsing or evaluating an XPath expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum XPathError {
    /// A classified error with a W3C code.
    #[error("[err:{code}] {message}")]
    Code { code: ErrorCode, message: String },

    /// A structural syntax error from the parser.
    #[error(transparent)]
    Syntax(#[from] ParseError),

    /// A node-centric operator was evaluated without a context.
    #[error("missing context: {0}")]
    MissingContext(String),

    /// An unbound variable or name.
    #[error("missing name: {0}")]
    MissingName(String),

    /// A name was used as an axis without being one.
    #[error("missing axis: {0}")]
    MissingAxis(String),

    /// An operand has a type the operation cannot accept.
    #[error("invalid type: {0}")]
    Type(String),
}

impl XPathError {
    pub fn code(code: ErrorCode, message: impl Into<String>) -> Self {
        XPathError::Code {
            code,
            message: message.into(),
        }
    }

    pub fn missing_context(what: impl Into<String>) -> Self {
        XPathError::MissingContext(what.into())
    }

    pub fn missing_axis(what: impl Into<String>) -> Self {
        XPathError::MissingAxis(what.into())
    }

    pub fn is_missing_context(&self) -> bool {
        matches!(self, XPathError::MissingContext(_))
    }

    /// Lift a parse error, recognizing the typed messages the grammar
    /// raises: `CODE: text` becomes a coded error and the reserved
    /// `missing axis: text` prefix becomes [`XPathError::MissingAxis`].
    pub(crate) fn from_parse(err: ParseError) -> Self {
        if let ParseError::Message { message, .. } = &err {
            if let Some(rest) = message.strip_prefix("missing axis: ") {
                return XPathError::missing_axis(rest);
            }
            if let Some((head, rest)) = message.split_once(": ") {
                if let Ok(code) = head.parse::<ErrorCode>() {
                    return XPathError::Code {
                        code,
                        message: rest.to_owned(),
                    };
                }
            }
        }
        XPathError::Syntax(err)
    }
}
