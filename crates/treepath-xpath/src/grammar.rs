//! Registration of the XPath 1.0 grammar: axes, operators, kind tests,
//! and the function library, with their parse-time denotations.

use treepath_tdop::symbol::{
    DECIMAL_LITERAL, FLOAT_LITERAL, INTEGER_LITERAL, INVALID, NAME, STRING_LITERAL, UNKNOWN,
};
use treepath_tdop::{
    FollowsConstraint, Grammar, GrammarError, Label, Led, Nud, ParseError, Parser, SymbolRegistry,
    Token, TokenValue,
};

use crate::dialect::{KindMeta, Nargs, XPath1, XSD_NAMESPACE};

type XTok = Token<XPath1>;
type XParser<'g> = Parser<'g, XPath1>;
type NudResult = Result<XTok, ParseError>;

/// The closed alphabet of the XPath 1.0 grammar.
pub(crate) const SYMBOLS: &[&str] = &[
    // Axes
    "descendant-or-self",
    "following-sibling",
    "preceding-sibling",
    "ancestor-or-self",
    "descendant",
    "attribute",
    "following",
    "namespace",
    "preceding",
    "ancestor",
    "parent",
    "child",
    "self",
    // Operators
    "and",
    "mod",
    "div",
    "or",
    "..",
    "//",
    "!=",
    "<=",
    ">=",
    "(",
    ")",
    "[",
    "]",
    ":",
    ".",
    "@",
    ",",
    "/",
    "|",
    "*",
    "-",
    "=",
    "+",
    "<",
    ">",
    "$",
    "::",
    // Kind tests
    "node",
    "text",
    "comment",
    "processing-instruction",
    // Node set functions
    "last",
    "position",
    "count",
    "id",
    "name",
    "local-name",
    "namespace-uri",
    // String functions
    "string",
    "concat",
    "starts-with",
    "contains",
    "substring-before",
    "substring-after",
    "substring",
    "string-length",
    "normalize-space",
    "translate",
    // Boolean functions
    "boolean",
    "not",
    "true",
    "false",
    "lang",
    // Number functions
    "number",
    "sum",
    "floor",
    "ceiling",
    "round",
    // Extended-name braces
    "{",
    "}",
];

const AXES: [&str; 13] = [
    "descendant-or-self",
    "following-sibling",
    "preceding-sibling",
    "ancestor-or-self",
    "descendant",
    "attribute",
    "following",
    "namespace",
    "preceding",
    "ancestor",
    "parent",
    "child",
    "self",
];

const COMPARISON_SYMBOLS: [&str; 6] = ["=", "!=", "<", ">", "<=", ">="];

/// Labels and symbols admitted after a path step.
const PATH_STEP_SYMBOLS: [&str; 10] = [
    "(integer)",
    "(string)",
    "(float)",
    "(decimal)",
    "(name)",
    "*",
    "@",
    "..",
    ".",
    "{",
];

/// Node tests accepted after `axis::`.
const NODE_TEST_SYMBOLS: [&str; 11] = [
    "(name)",
    "*",
    "text",
    "node",
    "document-node",
    "comment",
    "processing-instruction",
    "attribute",
    "schema-attribute",
    "element",
    "schema-element",
];

/// Build the XPath 1.0 grammar.
pub(crate) fn build_grammar() -> Result<Grammar<XPath1>, GrammarError> {
    let mut reg = SymbolRegistry::<XPath1>::new(SYMBOLS)?;

    // Simple symbols
    reg.register(",")?;
    reg.register(")")?;
    reg.register("]")?;
    reg.register("::")?;
    reg.register("}")?;

    // Literals
    for symbol in [
        STRING_LITERAL,
        FLOAT_LITERAL,
        DECIMAL_LITERAL,
        INTEGER_LITERAL,
        INVALID,
        UNKNOWN,
    ] {
        reg.literal(symbol, 0)?;
    }
    reg.literal(NAME, 0)?.nud = Nud::Custom(nud_name);

    // QName and extended-name constructors
    reg.method(":", 95)?.led = Led::Custom(led_colon);
    reg.method("{", 95)?.nud = Nud::Custom(nud_brace);

    // Variable reference
    reg.method("$", 90)?.nud = Nud::Custom(nud_variable);

    // Nullary operators
    reg.nullary("*", 0)?;
    reg.nullary(".", 0)?;
    reg.nullary("..", 0)?;

    // Logical operators
    reg.infix("or", 20)?;
    reg.infix("and", 25)?;

    // Comparison operators; chained comparisons are rejected
    for op in COMPARISON_SYMBOLS {
        reg.method(op, 30)?.led = Led::Custom(led_comparison);
    }

    // Arithmetic operators; unary minus binds at 70
    reg.infix("+", 40)?.nud = Nud::Prefix(40);
    reg.infix("-", 40)?.nud = Nud::Prefix(70);
    reg.infix("*", 45)?;
    reg.infix("div", 45)?;
    reg.infix("mod", 45)?;

    // Union
    reg.method("|", 50)?.led = Led::Custom(led_union);

    // Path operators: both rooted-path prefixes and step composition
    {
        let kind = reg.method("//", 75)?;
        kind.nud = Nud::Custom(nud_descendant_path);
        kind.led = Led::Custom(led_path);
    }
    {
        let kind = reg.method("/", 75)?;
        kind.nud = Nud::Custom(nud_child_path);
        kind.led = Led::Custom(led_path);
    }

    // Predicate filter
    reg.method("[", 80)?.led = Led::Custom(led_predicate);

    // Parenthesized expressions
    reg.method("(", 100)?.nud = Nud::Custom(nud_paren);

    // Attribute abbreviation
    reg.method("@", 80)?.nud = Nud::Custom(nud_attribute);

    // Axes
    for symbol in AXES {
        axis(&mut reg, symbol, 80)?;
    }

    // Kind tests
    function(&mut reg, "node", Nargs::Exact(0), Label::KindTest, 90)?;
    function(&mut reg, "text", Nargs::Exact(0), Label::KindTest, 90)?;
    function(&mut reg, "comment", Nargs::Exact(0), Label::KindTest, 90)?;
    function(
        &mut reg,
        "processing-instruction",
        Nargs::Range(0, 1),
        Label::KindTest,
        90,
    )?;

    // Node set functions
    function(&mut reg, "last", Nargs::Exact(0), Label::Function, 90)?;
    function(&mut reg, "position", Nargs::Exact(0), Label::Function, 90)?;
    function(&mut reg, "count", Nargs::Exact(1), Label::Function, 90)?;
    function(&mut reg, "id", Nargs::Exact(1), Label::Function, 90)?;
    function(&mut reg, "name", Nargs::Range(0, 1), Label::Function, 90)?;
    function(&mut reg, "local-name", Nargs::Range(0, 1), Label::Function, 90)?;
    function(
        &mut reg,
        "namespace-uri",
        Nargs::Range(0, 1),
        Label::Function,
        90,
    )?;

    // String functions
    function(&mut reg, "string", Nargs::Range(0, 1), Label::Function, 90)?;
    function(&mut reg, "concat", Nargs::Variadic, Label::Function, 90)?;
    function(&mut reg, "starts-with", Nargs::Exact(2), Label::Function, 90)?;
    function(&mut reg, "contains", Nargs::Exact(2), Label::Function, 90)?;
    function(
        &mut reg,
        "substring-before",
        Nargs::Exact(2),
        Label::Function,
        90,
    )?;
    function(
        &mut reg,
        "substring-after",
        Nargs::Exact(2),
        Label::Function,
        90,
    )?;
    function(&mut reg, "substring", Nargs::Range(2, 3), Label::Function, 90)?;
    function(
        &mut reg,
        "string-length",
        Nargs::Range(0, 1),
        Label::Function,
        90,
    )?;
    function(
        &mut reg,
        "normalize-space",
        Nargs::Range(0, 1),
        Label::Function,
        90,
    )?;
    function(&mut reg, "translate", Nargs::Exact(3), Label::Function, 90)?;

    // Boolean functions
    function(&mut reg, "boolean", Nargs::Exact(1), Label::Function, 90)?;
    function(&mut reg, "not", Nargs::Exact(1), Label::Function, 90)?;
    function(&mut reg, "true", Nargs::Exact(0), Label::Function, 90)?;
    function(&mut reg, "false", Nargs::Exact(0), Label::Function, 90)?;
    function(&mut reg, "lang", Nargs::Exact(1), Label::Function, 90)?;

    // Number functions
    function(&mut reg, "number", Nargs::Range(0, 1), Label::Function, 90)?;
    function(&mut reg, "sum", Nargs::Range(1, 2), Label::Function, 90)?;
    function(&mut reg, "floor", Nargs::Exact(1), Label::Function, 90)?;
    function(&mut reg, "ceiling", Nargs::Exact(1), Label::Function, 90)?;
    function(&mut reg, "round", Nargs::Exact(1), Label::Function, 90)?;

    reg.register("(end)")?;
    reg.build()
}

/// Register an axis symbol: a name that acts as an axis only when followed
/// by `::`.
fn axis(
    reg: &mut SymbolRegistry<XPath1>,
    symbol: &str,
    bp: treepath_tdop::Bp,
) -> Result<(), GrammarError> {
    let kind = reg.register(symbol)?;
    kind.label = Label::Axis.into();
    kind.raise_bp(bp, bp);
    kind.follows = FollowsConstraint::DoubleColon;
    kind.nud = Nud::Custom(nud_axis);
    Ok(())
}

/// Register a callable symbol: a name that acts as a function (or kind
/// test) only when followed by `(`.
fn function(
    reg: &mut SymbolRegistry<XPath1>,
    symbol: &str,
    nargs: Nargs,
    label: Label,
    bp: treepath_tdop::Bp,
) -> Result<(), GrammarError> {
    let kind = reg.register(symbol)?;
    kind.label = label.into();
    kind.raise_bp(bp, bp);
    kind.follows = FollowsConstraint::LeftParen;
    kind.meta = KindMeta { nargs: Some(nargs) };
    kind.nud = Nud::Custom(nud_function);
    Ok(())
}

/// Check the lookahead against a symbol list, demoting an operator-shaped
/// name (e.g. `div` used as an element name) to `(name)` when possible.
pub(crate) fn expected_name(
    parser: &mut XParser<'_>,
    symbols: &[&str],
    message: Option<&str>,
) -> Result<(), ParseError> {
    if symbols.contains(&parser.next_symbol()) {
        return Ok(());
    }
    let demotable = parser
        .peek()
        .is_some_and(|next| next.label().is(Label::Operator))
        && parser.grammar().is_name(parser.next_symbol());
    if demotable {
        let value = TokenValue::Str(parser.next_symbol().to_owned());
        let token = parser.make_token(NAME, value)?;
        parser.set_lookahead(token);
        return Ok(());
    }
    match message {
        Some(message) => Err(parser.error_message(message)),
        None => match parser.peek() {
            Some(next) => Err(parser.syntax_error(next)),
            None => Err(ParseError::EmptySource),
        },
    }
}

fn at_path_step(parser: &XParser<'_>) -> bool {
    parser
        .peek()
        .is_some_and(|next| next.label().is(Label::Axis) || next.label().is(Label::KindTest))
}

// --- Custom denotations --------------------------------------------------

fn nud_name(parser: &mut XParser<'_>, token: XTok) -> NudResult {
    match parser.next_symbol() {
        "(" => {
            let message = if token.meta.namespace.as_deref() == Some(XSD_NAMESPACE) {
                format!(
                    "XPST0017: unknown constructor function {:?}",
                    token.value.str_or_empty()
                )
            } else {
                format!("XPST0017: unknown function {:?}", token.value.str_or_empty())
            };
            Err(parser.error_message(message))
        }
        "::" => Err(parser.error_message(format!(
            "missing axis: axis '{}::' not found",
            token.value.str_or_empty()
        ))),
        _ => Ok(token),
    }
}

fn led_colon(parser: &mut XParser<'_>, mut token: XTok, left: XTok) -> NudResult {
    if !left.is(NAME) {
        return Err(parser.syntax_error(&left));
    }
    let next_is_callable = parser.peek().is_some_and(|next| {
        next.label().is(Label::Function) || next.label().is(Label::Constructor)
    });
    if !next_is_callable {
        expected_name(parser, &[NAME, "*"], None)?;
    }
    if parser.is_spaced(true, true) {
        return Err(parser.error_message("a QName cannot contain spaces before or after ':'"));
    }

    let prefix = left.value.str_or_empty().to_owned();
    let Some(namespace) = parser.dialect.namespace(&prefix).map(str::to_owned) else {
        return Err(parser.error_message(format!(
            "XPST0081: prefix {prefix:?} is not declared"
        )));
    };
    if let Some(next) = parser.peek_mut() {
        next.meta.namespace = Some(namespace);
    }

    token.children.push(left);
    token.children.push(parser.expression(90)?);
    token.value = TokenValue::Str(format!(
        "{}:{}",
        token.children[0].value,
        token.children[1].value
    ));
    if token.children[1].is(":") {
        return Err(parser.error_message(format!("{:?} is not a QName", token.to_source())));
    }
    Ok(token)
}

fn nud_brace(parser: &mut XParser<'_>, mut token: XTok) -> NudResult {
    if parser.dialect.strict {
        return Err(parser.error_message("'{' is not allowed when the parser is strict"));
    }
    let namespace = parser.advance_until(&["}"])?;
    parser.advance(&[])?;

    let next_is_callable = parser.peek().is_some_and(|next| {
        next.label().is(Label::Function) || next.label().is(Label::Constructor)
    });
    if !next_is_callable {
        expected_name(parser, &[NAME, "*"], None)?;
    }
    if let Some(next) = parser.peek_mut() {
        next.meta.namespace = Some(namespace.clone());
    }

    let uri = parser.make_token(STRING_LITERAL, TokenValue::Str(namespace))?;
    token.children.push(uri);
    token.children.push(parser.expression(90)?);
    Ok(token)
}

fn nud_variable(parser: &mut XParser<'_>, mut token: XTok) -> NudResult {
    expected_name(parser, &[NAME], None)?;
    let name = parser.expression(90)?;
    if name.value.str_or_empty().contains(':') {
        return Err(parser.error_message("variable reference requires a simple reference name"));
    }
    token.children.push(name);
    Ok(token)
}

fn led_comparison(parser: &mut XParser<'_>, mut token: XTok, left: XTok) -> NudResult {
    if COMPARISON_SYMBOLS.contains(&left.symbol()) {
        return Err(parser.syntax_error(&token));
    }
    token.children.push(left);
    token.children.push(parser.expression(30)?);
    Ok(token)
}

fn led_union(parser: &mut XParser<'_>, mut token: XTok, mut left: XTok) -> NudResult {
    token.meta.cut_and_sort = true;
    if left.is("|") {
        left.meta.cut_and_sort = false;
    }
    token.children.push(left);
    token.children.push(parser.expression(50)?);
    Ok(token)
}

fn nud_child_path(parser: &mut XParser<'_>, mut token: XTok) -> NudResult {
    if !at_path_step(parser) && expected_name(parser, &PATH_STEP_SYMBOLS, None).is_err() {
        // A lone `/` selects the document root.
        return Ok(token);
    }
    token.children.push(parser.expression(75)?);
    Ok(token)
}

fn nud_descendant_path(parser: &mut XParser<'_>, mut token: XTok) -> NudResult {
    if !at_path_step(parser) {
        expected_name(parser, &PATH_STEP_SYMBOLS, None)?;
    }
    token.children.push(parser.expression(75)?);
    Ok(token)
}

fn led_path(parser: &mut XParser<'_>, mut token: XTok, left: XTok) -> NudResult {
    if !at_path_step(parser) {
        expected_name(parser, &PATH_STEP_SYMBOLS, None)?;
    }
    token.children.push(left);
    token.children.push(parser.expression(75)?);
    Ok(token)
}

fn led_predicate(parser: &mut XParser<'_>, mut token: XTok, left: XTok) -> NudResult {
    token.children.push(left);
    token.children.push(parser.expression(0)?);
    parser.advance(&["]"])?;
    Ok(token)
}

fn nud_paren(parser: &mut XParser<'_>, mut token: XTok) -> NudResult {
    token.children.push(parser.expression(0)?);
    parser.advance(&[")"])?;
    Ok(token)
}

fn nud_attribute(parser: &mut XParser<'_>, mut token: XTok) -> NudResult {
    expected_name(
        parser,
        &["*", NAME, ":"],
        Some("invalid attribute specification"),
    )?;
    token.children.push(parser.expression(80)?);
    Ok(token)
}

fn nud_axis(parser: &mut XParser<'_>, mut token: XTok) -> NudResult {
    parser.advance(&["::"])?;
    parser.expect_next(&NODE_TEST_SYMBOLS)?;
    let rbp = token.rbp();
    token.children.push(parser.expression(rbp)?);
    Ok(token)
}

fn nud_function(parser: &mut XParser<'_>, mut token: XTok) -> NudResult {
    let code = if token.label().is(Label::Function) {
        "XPST0017"
    } else {
        "XPST0003"
    };
    let nargs = token.kind().meta.nargs.unwrap_or(Nargs::Variadic);
    parser.advance(&["("])?;

    let (min, max) = match nargs {
        Nargs::Variadic => {
            if parser.next_symbol() == ")" {
                return Err(
                    parser.error_message(format!("{code}: at least an argument is required"))
                );
            }
            loop {
                token.children.push(parser.expression(5)?);
                if parser.next_symbol() != "," {
                    break;
                }
                parser.advance(&[])?;
            }
            parser.advance(&[")"])?;
            return Ok(token);
        }
        Nargs::Exact(0) => {
            if parser.next_symbol() != ")" {
                return Err(parser.error_message(format!(
                    "{code}: {}() takes no arguments",
                    token.symbol()
                )));
            }
            parser.advance(&[])?;
            return Ok(token);
        }
        Nargs::Exact(n) => (n, n),
        Nargs::Range(min, max) => (min, max),
    };

    let mut k = 0;
    while k < min {
        if parser.next_symbol() == ")" {
            return Err(parser.error_message(format!(
                "{code}: too few arguments, expected at least {min}"
            )));
        }
        token.children.push(parser.expression(5)?);
        k += 1;
        if k < min {
            if parser.next_symbol() == ")" {
                return Err(parser.error_message(format!(
                    "{code}: too few arguments, expected at least {min}"
                )));
            }
            parser.advance(&[","])?;
        }
    }
    while k < max {
        if parser.next_symbol() == "," {
            parser.advance(&[])?;
            token.children.push(parser.expression(5)?);
        } else if k == 0 && parser.next_symbol() != ")" {
            token.children.push(parser.expression(5)?);
        } else {
            break;
        }
        k += 1;
    }
    if parser.next_symbol() == "," {
        return Err(parser.error_message(format!(
            "{code}: too many arguments, expected at most {max}"
        )));
    }
    parser.advance(&[")"])?;
    Ok(token)
}
