//! Tokenizer synthesis and lexing.
//!
//! One regular expression is synthesized from the registered symbols, with
//! five ordered alternatives:
//!
//! ```text
//! (?P<literal>...)|(?P<symbol>...)|(?P<name>...)|(?P<unknown>\S)|\s+
//! ```
//!
//! The symbol alternative is the union of custom pattern fragments,
//! string-shaped symbols longest-first, and a class of single-character
//! symbols. Name-shaped symbols (`and`, `child`, `node`, ...) are matched
//! by the name group instead — maximal munch over name characters makes
//! `div-foo` a single name, never `div` followed by `-foo` — and are then
//! classified against the registry, honoring each kind's
//! [`FollowsConstraint`](crate::registry::FollowsConstraint).
//!
//! The ordering guarantees that literals beat names they could collide
//! with, that longer symbols beat shorter ones, and that any stray
//! character surfaces as an explicit unknown rather than being skipped.

use crate::registry::{Dialect, FollowsConstraint, Grammar};
use crate::symbol::{is_special, Span};

/// Which tokenizer alternative produced a lexeme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Group {
    Literal,
    Symbol,
    Name,
    Unknown,
}

/// One tokenizer match: the capture group that fired and its span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lexeme {
    pub group: Group,
    pub span: Span,
}

impl Lexeme {
    pub fn text<'s>(&self, source: &'s str) -> &'s str {
        &source[self.span.start..self.span.end]
    }
}

/// Synthesize the five-alternative tokenizer pattern from a grammar.
pub(crate) fn synthesize_pattern<D: Dialect>(grammar: &Grammar<D>) -> String {
    let mut custom = Vec::new();
    let mut strings = Vec::new();
    let mut chars = Vec::new();

    for (symbol, kind) in &grammar.kinds {
        if is_special(symbol) {
            continue;
        }
        if let Some(pattern) = &kind.pattern {
            custom.push(pattern.clone());
        } else if grammar.is_name(symbol) {
            // Matched through the name group, classified afterwards.
        } else if symbol.chars().count() == 1 {
            chars.push(regex::escape(symbol));
        } else {
            strings.push(regex::escape(symbol));
        }
    }

    strings.sort_by_key(|s| std::cmp::Reverse(s.len()));

    let mut symbol_alts = Vec::new();
    if !custom.is_empty() {
        symbol_alts.push(custom.join("|"));
    }
    if !strings.is_empty() {
        symbol_alts.push(strings.join("|"));
    }
    if !chars.is_empty() {
        symbol_alts.push(format!("[{}]", chars.join("")));
    }
    if symbol_alts.is_empty() {
        // A grammar of pure name-shaped symbols still needs a non-empty
        // alternative; use one that can never match.
        symbol_alts.push("[^\\s\\S]".to_owned());
    }

    format!(
        r"(?P<literal>{})|(?P<symbol>{})|(?P<name>{})|(?P<unknown>\S)|\s+",
        D::LITERALS_PATTERN,
        symbol_alts.join("|"),
        D::NAME_PATTERN,
    )
}

/// Lex `source` into lexemes, dropping whitespace.
///
/// Name matches that equal a registered name-shaped symbol are reclassified
/// as symbol lexemes when the kind's follow constraint holds.
pub(crate) fn tokenize<D: Dialect>(
    grammar: &Grammar<D>,
    source: &str,
) -> Result<Vec<Lexeme>, crate::error::ParseError> {
    let re = grammar.tokenizer()?;
    let mut lexemes = Vec::new();

    for caps in re.captures_iter(source) {
        let (group, m) = if let Some(m) = caps.name("literal") {
            (Group::Literal, m)
        } else if let Some(m) = caps.name("symbol") {
            (Group::Symbol, m)
        } else if let Some(m) = caps.name("name") {
            let group = classify_name(grammar, source, m.as_str(), m.end());
            (group, m)
        } else if let Some(m) = caps.name("unknown") {
            (Group::Unknown, m)
        } else {
            // Whitespace alternative.
            continue;
        };
        lexemes.push(Lexeme {
            group,
            span: Span::new(m.start(), m.end()),
        });
    }
    Ok(lexemes)
}

/// Decide whether a name match is a registered name-shaped symbol.
fn classify_name<D: Dialect>(
    grammar: &Grammar<D>,
    source: &str,
    text: &str,
    end: usize,
) -> Group {
    let Some(kind) = grammar.get(text) else {
        return Group::Name;
    };
    let satisfied = match kind.follows {
        FollowsConstraint::Any => true,
        FollowsConstraint::DoubleColon => follower(source, end).starts_with("::"),
        FollowsConstraint::LeftParen => {
            let rest = follower(source, end);
            rest.starts_with('(') && !rest.starts_with("(:")
        }
    };
    if satisfied { Group::Symbol } else { Group::Name }
}

/// The source text after `end`, with whitespace and `(: ... :)` comments
/// stripped from the front.
fn follower(source: &str, end: usize) -> &str {
    let mut rest = source[end..].trim_start();
    while let Some(after_open) = rest.strip_prefix("(:") {
        match after_open.find(":)") {
            Some(close) => rest = after_open[close + 2..].trim_start(),
            None => break,
        }
    }
    rest
}
