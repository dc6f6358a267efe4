//! The Pratt driver.
//!
//! `parse` lexes the whole source, primes the lookahead, and runs the
//! canonical `expression(rbp)` loop: take the lookahead, apply its null
//! denotation, then keep applying left denotations while the right binding
//! power stays below the lookahead's left binding power. Denotations call
//! back into `expression`, giving the mutual recursion the method relies
//! on.
//!
//! Cursor state lives on the parser and is cleared on every exit path of
//! `parse`, so a parser instance can be reused for successive sources.

use crate::error::ParseError;
use crate::registry::{Bp, Dialect, Grammar, Led, Nud};
use crate::symbol::{
    self, is_special, Span, TokenValue, DECIMAL_LITERAL, END, FLOAT_LITERAL, INTEGER_LITERAL,
    INVALID, NAME, STRING_LITERAL, UNKNOWN,
};
use crate::token::Token;
use crate::tokenizer::{self, Group, Lexeme};

/// A single-threaded parser session over a frozen grammar.
///
/// The `dialect` value carries per-parse language state (e.g. a namespace
/// map) and is reachable from custom denotations through the parser.
pub struct Parser<'g, D: Dialect> {
    grammar: &'g Grammar<D>,
    pub dialect: D,

    source: String,
    lexemes: Vec<Lexeme>,
    /// Index of the next unconsumed lexeme.
    pos: usize,
    /// Symbol and span of the current token, for diagnostics.
    current: Option<(String, Span)>,
    next_token: Option<Token<D>>,
}

impl<'g, D: Dialect> Parser<'g, D> {
    pub fn new(grammar: &'g Grammar<D>, dialect: D) -> Self {
        Parser {
            grammar,
            dialect,
            source: String::new(),
            lexemes: Vec::new(),
            pos: 0,
            current: None,
            next_token: None,
        }
    }

    pub fn grammar(&self) -> &Grammar<D> {
        self.grammar
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Parse a source string into a token tree.
    ///
    /// The cursor state is released unconditionally on exit, so a failed
    /// parse leaves the instance clean for the next call.
    pub fn parse(&mut self, source: &str) -> Result<Token<D>, ParseError> {
        let result = self.parse_inner(source);
        self.reset();
        result
    }

    fn parse_inner(&mut self, source: &str) -> Result<Token<D>, ParseError> {
        self.source = source.to_owned();
        self.lexemes = tokenizer::tokenize(self.grammar, &self.source)?;
        self.pos = 0;
        self.next_token = Some(self.fetch_next()?);

        let root = self.expression(0)?;
        match &self.next_token {
            Some(next) if next.is(END) => Ok(root),
            Some(next) => Err(self.syntax_error(next)),
            None => Err(ParseError::UnexpectedEnd),
        }
    }

    fn reset(&mut self) {
        self.source.clear();
        self.lexemes.clear();
        self.pos = 0;
        self.current = None;
        self.next_token = None;
    }

    /// Consume the lookahead, making it the current token, and pull the
    /// next one. With a non-empty `expected` list, the lookahead's symbol
    /// must be one of them.
    ///
    /// Returns the consumed token. Advancing onto the end of source fails.
    pub fn advance(&mut self, expected: &[&str]) -> Result<Token<D>, ParseError> {
        if let Some(next) = &self.next_token {
            if next.is(END) || (!expected.is_empty() && !expected.contains(&next.symbol())) {
                return Err(self.syntax_error(next));
            }
        }
        let token = self.next_token.take().ok_or(ParseError::EmptySource)?;
        self.current = Some((token.symbol().to_owned(), token.span));
        self.next_token = Some(self.fetch_next()?);
        Ok(token)
    }

    /// Accumulate raw source until the lookahead is one of `stop`, leaving
    /// that stop symbol as the lookahead.
    ///
    /// Returns the raw text from the (former) lookahead's start up to the
    /// stop symbol. Reaching the end of source returns the remaining text;
    /// the caller's next `advance` then reports the missing terminator.
    pub fn advance_until(&mut self, stop: &[&str]) -> Result<String, ParseError> {
        if stop.is_empty() {
            return Err(self.error_message("at least one stop symbol is required"));
        }
        let Some(next) = &self.next_token else {
            return Err(ParseError::EmptySource);
        };
        if next.is(END) {
            return Err(self.syntax_error(next));
        }
        let chunk_start = next.span.start;
        self.current = Some((next.symbol().to_owned(), next.span));

        // Scan forward for a symbol lexeme matching a stop symbol; the
        // lookahead's own lexemes have already been consumed from `pos`.
        let mut index = self.pos;
        while index < self.lexemes.len() {
            let lexeme = self.lexemes[index];
            if lexeme.group == Group::Symbol && stop.contains(&lexeme.text(&self.source)) {
                let chunk = self.source[chunk_start..lexeme.span.start].to_owned();
                self.pos = index;
                self.next_token = Some(self.fetch_next()?);
                return Ok(chunk);
            }
            index += 1;
        }
        let chunk = self.source[chunk_start..].to_owned();
        self.pos = self.lexemes.len();
        self.next_token = Some(self.end_token());
        Ok(chunk)
    }

    /// The canonical Pratt loop.
    pub fn expression(&mut self, rbp: Bp) -> Result<Token<D>, ParseError> {
        let token = self.advance(&[])?;
        let mut left = self.apply_nud(token)?;
        while rbp < self.next_lbp() {
            let token = self.advance(&[])?;
            left = self.apply_led(token, left)?;
        }
        Ok(left)
    }

    fn apply_nud(&mut self, mut token: Token<D>) -> Result<Token<D>, ParseError> {
        match token.kind().nud.clone() {
            Nud::Literal => Ok(token),
            Nud::Prefix(bp) => {
                let operand = self.expression(bp)?;
                token.children.push(operand);
                Ok(token)
            }
            Nud::Custom(f) => f(self, token),
            Nud::None => Err(self.syntax_error(&token)),
        }
    }

    fn apply_led(&mut self, mut token: Token<D>, left: Token<D>) -> Result<Token<D>, ParseError> {
        match token.kind().led.clone() {
            Led::Postfix => {
                token.children.push(left);
                Ok(token)
            }
            Led::Infix(bp) => {
                token.children.push(left);
                let right = self.expression(bp)?;
                token.children.push(right);
                Ok(token)
            }
            Led::InfixR(bp) => {
                token.children.push(left);
                let right = self.expression(bp.saturating_sub(1))?;
                token.children.push(right);
                Ok(token)
            }
            Led::Custom(f) => f(self, token, left),
            Led::None => Err(self.syntax_error(&token)),
        }
    }

    /// Materialize the next lexeme as a token.
    fn fetch_next(&mut self) -> Result<Token<D>, ParseError> {
        let Some(lexeme) = self.lexemes.get(self.pos).copied() else {
            return Ok(self.end_token());
        };
        self.pos += 1;
        let text = lexeme.text(&self.source).to_owned();
        let span = lexeme.span;

        match lexeme.group {
            Group::Symbol => {
                if let Some(kind) = self.grammar.get(&text) {
                    Ok(Token::new(kind.clone(), TokenValue::Str(text), span))
                } else if self.grammar.is_name(&text) {
                    Ok(Token::new(
                        self.grammar.name_kind.clone(),
                        TokenValue::Str(text),
                        span,
                    ))
                } else {
                    let token = Token::new(
                        self.grammar.unknown_kind.clone(),
                        TokenValue::Str(text),
                        span,
                    );
                    Err(self.syntax_error(&token))
                }
            }
            Group::Literal => self.literal_token(text, span),
            Group::Name => Ok(Token::new(
                self.grammar.name_kind.clone(),
                TokenValue::Str(text),
                span,
            )),
            Group::Unknown => {
                let token = Token::new(
                    self.grammar.unknown_kind.clone(),
                    TokenValue::Str(text),
                    span,
                );
                Err(self.syntax_error(&token))
            }
        }
    }

    fn literal_token(&mut self, text: String, span: Span) -> Result<Token<D>, ParseError> {
        if text.starts_with('\'') || text.starts_with('"') {
            let value = D::unescape(&text);
            return Ok(Token::new(
                self.grammar.string_kind.clone(),
                TokenValue::Str(value),
                span,
            ));
        }
        if text.contains(['e', 'E']) {
            return match text.parse::<f64>() {
                Ok(value) => Ok(Token::new(
                    self.grammar.float_kind.clone(),
                    TokenValue::Float(value),
                    span,
                )),
                Err(_) => Err(self.invalid_literal(text, span)),
            };
        }
        if text.contains('.') {
            return match text.parse::<rust_decimal::Decimal>() {
                Ok(value) => Ok(Token::new(
                    self.grammar.decimal_kind.clone(),
                    TokenValue::Decimal(value),
                    span,
                )),
                Err(_) => Err(self.invalid_literal(text, span)),
            };
        }
        match text.parse::<i64>() {
            Ok(value) => Ok(Token::new(
                self.grammar.integer_kind.clone(),
                TokenValue::Integer(value),
                span,
            )),
            Err(_) => Err(self.invalid_literal(text, span)),
        }
    }

    fn invalid_literal(&self, text: String, span: Span) -> ParseError {
        let token = Token::new(
            self.grammar.invalid_kind.clone(),
            TokenValue::Str(text),
            span,
        );
        self.syntax_error(&token)
    }

    fn end_token(&self) -> Token<D> {
        Token::new(
            self.grammar.end_kind.clone(),
            TokenValue::Str(END.to_owned()),
            Span::empty(self.source.len()),
        )
    }

    // --- Lookahead inspection, for custom denotations ---------------------

    /// The lookahead token, when a parse is in progress.
    pub fn peek(&self) -> Option<&Token<D>> {
        self.next_token.as_ref()
    }

    /// Mutable lookahead access, for binding dialect payloads.
    pub fn peek_mut(&mut self) -> Option<&mut Token<D>> {
        self.next_token.as_mut()
    }

    /// The lookahead's symbol, or `(end)`.
    pub fn next_symbol(&self) -> &str {
        self.next_token.as_ref().map_or(END, |t| t.symbol())
    }

    fn next_lbp(&self) -> Bp {
        self.next_token.as_ref().map_or(0, Token::lbp)
    }

    /// Fail unless the lookahead's symbol is one of `symbols`.
    pub fn expect_next(&self, symbols: &[&str]) -> Result<(), ParseError> {
        match &self.next_token {
            Some(next) if symbols.contains(&next.symbol()) => Ok(()),
            Some(next) => Err(self.syntax_error(next)),
            None => Err(ParseError::EmptySource),
        }
    }

    /// Replace the lookahead with a synthesized token.
    pub fn set_lookahead(&mut self, token: Token<D>) {
        self.next_token = Some(token);
    }

    /// Materialize a token of a registered kind at the lookahead's span.
    pub fn make_token(&self, symbol: &str, value: TokenValue) -> Result<Token<D>, ParseError> {
        let kind = self
            .grammar
            .get(symbol)
            .ok_or_else(|| self.error_message(format!("{symbol:?} is not registered")))?;
        let span = self
            .next_token
            .as_ref()
            .map_or_else(|| Span::empty(self.source.len()), |t| t.span);
        Ok(Token::new(kind.clone(), value, span))
    }

    // --- Diagnostics ------------------------------------------------------

    /// Line and column of the current token; before the first token it
    /// points past any leading whitespace.
    pub fn position(&self) -> (usize, usize) {
        match &self.current {
            Some((_, span)) => symbol::line_column(&self.source, span.start),
            None => {
                let leading = self.source.chars().take_while(|c| c.is_whitespace()).count();
                (1, 1 + leading)
            }
        }
    }

    /// Whether the parser is at the start of the source, ignoring spaces.
    pub fn is_source_start(&self) -> bool {
        match &self.current {
            Some((_, span)) => self.source[..span.start].trim().is_empty(),
            None => true,
        }
    }

    /// Whether the parser is at the start of a line, ignoring spaces.
    pub fn is_line_start(&self) -> bool {
        let Some((_, span)) = &self.current else {
            return true;
        };
        let before = &self.source[..span.start];
        match before.rfind('\n') {
            Some(newline) => before[newline + 1..].trim().is_empty(),
            None => before.trim().is_empty(),
        }
    }

    /// Whether the source has whitespace immediately before or after the
    /// current token.
    pub fn is_spaced(&self, before: bool, after: bool) -> bool {
        let Some((_, span)) = &self.current else {
            return false;
        };
        if before && span.start > 0 {
            if let Some(c) = self.source[..span.start].chars().next_back() {
                if c == ' ' || c == '\t' || c == '\n' {
                    return true;
                }
            }
        }
        if after {
            if let Some(c) = self.source[span.end..].chars().next() {
                return c == ' ' || c == '\t' || c == '\n';
            }
        }
        false
    }

    /// Classify a token into the parse error it raises when misplaced.
    pub fn syntax_error(&self, token: &Token<D>) -> ParseError {
        let (line, column) = token.position(&self.source);
        let symbol = token.symbol();
        if !is_special(symbol) {
            return ParseError::Unexpected {
                symbol: symbol.to_owned(),
                label: token.label().to_string(),
                line,
                column,
            };
        }
        match symbol {
            INVALID => ParseError::InvalidLiteral {
                literal: token.value.to_string(),
                line,
                column,
            },
            UNKNOWN => ParseError::UnknownSymbol {
                symbol: token.value.to_string(),
                line,
                column,
            },
            NAME => ParseError::UnexpectedName {
                name: token.value.to_string(),
                line,
                column,
            },
            END => {
                if self.current.is_none() {
                    ParseError::EmptySource
                } else {
                    ParseError::UnexpectedEnd
                }
            }
            STRING_LITERAL | FLOAT_LITERAL | DECIMAL_LITERAL | INTEGER_LITERAL => {
                ParseError::UnexpectedLiteral {
                    value: token.value.to_string(),
                    line,
                    column,
                }
            }
            _ => ParseError::Unexpected {
                symbol: symbol.to_owned(),
                label: token.label().to_string(),
                line,
                column,
            },
        }
    }

    /// A grammar-specific error message at the current position.
    pub fn error_message(&self, message: impl Into<String>) -> ParseError {
        let (line, column) = self.position();
        ParseError::Message {
            message: message.into(),
            line,
            column,
        }
    }
}
