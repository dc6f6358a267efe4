//! Evaluation and selection dispatch.
//!
//! Every parsed token evaluates to a [`Value`] and/or selects a lazy
//! sequence of [`Item`]s. Dispatch is keyed on the token's symbol: tokens
//! whose primary behavior is selection (paths, axes, node tests) derive
//! their `evaluate` by collecting, and evaluation-primary tokens
//! (operators, functions, literals) derive their `select` by evaluating.

mod functions;
mod operators;
mod paths;

use treepath_tdop::symbol::{DECIMAL_LITERAL, FLOAT_LITERAL, INTEGER_LITERAL, NAME, STRING_LITERAL};
use treepath_tdop::{Token, TokenValue};

use crate::context::XPathContext;
use crate::dialect::XPath1;
use crate::error::XPathError;
use crate::node::NodeModel;
use crate::value::{arith_value, string_value, Arith, Item, Number, Value};

pub(crate) type XTok = Token<XPath1>;
pub(crate) type ItemResult<N> = Result<Item<N>, XPathError>;
pub(crate) type ItemIter<'a, N> = Box<dyn Iterator<Item = ItemResult<N>> + 'a>;

const FUNCTION_SYMBOLS: &[&str] = &[
    "last",
    "position",
    "count",
    "name",
    "local-name",
    "namespace-uri",
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
    "boolean",
    "not",
    "true",
    "false",
    "lang",
    "number",
    "sum",
    "floor",
    "ceiling",
    "round",
];

/// Evaluate a token to a single value.
pub(crate) fn evaluate<N: NodeModel>(
    token: &XTok,
    env: &XPath1,
    context: Option<&XPathContext<N>>,
) -> Result<Value<N>, XPathError> {
    match token.symbol() {
        STRING_LITERAL => Ok(Value::String(token.value.str_or_empty().to_owned())),
        INTEGER_LITERAL | DECIMAL_LITERAL | FLOAT_LITERAL => Ok(Value::Number(literal_number(token))),
        "(" => evaluate(token.child(0), env, context),
        ":" => operators::eval_colon(token, env, context),
        "{" => operators::eval_brace(token, env, context),
        "$" => operators::eval_variable(token, env, context),
        "or" => {
            let left = evaluate(token.child(0), env, context)?.boolean();
            if left {
                return Ok(Value::Boolean(true));
            }
            Ok(Value::Boolean(
                evaluate(token.child(1), env, context)?.boolean(),
            ))
        }
        "and" => {
            let left = evaluate(token.child(0), env, context)?.boolean();
            if !left {
                return Ok(Value::Boolean(false));
            }
            Ok(Value::Boolean(
                evaluate(token.child(1), env, context)?.boolean(),
            ))
        }
        "=" | "!=" | "<" | ">" | "<=" | ">=" => operators::eval_comparison(token, env, context),
        "+" | "-" => operators::eval_additive(token, env, context),
        "*" if token.arity() == 2 => operators::eval_multiplicative(token, env, context),
        "div" => operators::eval_div(token, env, context),
        "mod" => operators::eval_mod(token, env, context),
        symbol if FUNCTION_SYMBOLS.contains(&symbol) => {
            functions::eval_function(token, env, context)
        }
        _ => match context {
            Some(context) => {
                let items = collect(token, env, context)?;
                Ok(Value::from_items(items))
            }
            None => Err(XPathError::missing_context(format!(
                "{:?} requires a context item",
                token.symbol()
            ))),
        },
    }
}

/// Select a lazy item sequence from a token.
///
/// Implementations clone whatever context state they need up front; the
/// returned iterator does not borrow the context.
pub(crate) fn select<'a, N: NodeModel>(
    token: &'a XTok,
    env: &'a XPath1,
    context: &XPathContext<N>,
) -> ItemIter<'a, N> {
    match token.symbol() {
        NAME => paths::select_name(token, env, context),
        ":" => paths::select_colon(token, env, context),
        "{" => paths::select_brace(token, env, context),
        "*" if token.arity() == 0 => paths::select_wildcard(token, env, context),
        "." => paths::select_dot(token, env, context),
        ".." => paths::select_parent_shorthand(token, env, context),
        "@" | "attribute" => paths::select_attribute(token, env, context),
        "namespace" => paths::select_namespace(token, env, context),
        "self" | "child" | "parent" | "following-sibling" | "preceding-sibling" | "ancestor"
        | "ancestor-or-self" | "descendant" | "descendant-or-self" | "following" | "preceding" => {
            paths::select_axis(token, env, context)
        }
        "node" | "text" | "comment" | "processing-instruction" => {
            paths::select_kind_test(token, env, context)
        }
        "|" => paths::select_union(token, env, context),
        "/" => paths::select_child_path(token, env, context),
        "//" => paths::select_descendant_path(token, env, context),
        "[" => paths::select_predicate(token, env, context),
        "(" => select(token.child(0), env, context),
        "id" => paths::select_id(token, env, context),
        _ => match evaluate(token, env, Some(context)) {
            Ok(value) => Box::new(value.into_items().into_iter().map(Ok)),
            Err(err) => once_err(err),
        },
    }
}

/// Collect a token's selection into a vector, stopping at the first error.
pub(crate) fn collect<N: NodeModel>(
    token: &XTok,
    env: &XPath1,
    context: &XPathContext<N>,
) -> Result<Vec<Item<N>>, XPathError> {
    select(token, env, context).collect()
}

pub(crate) fn once_err<'a, N: NodeModel>(err: XPathError) -> ItemIter<'a, N> {
    Box::new(std::iter::once(Err(err)))
}

pub(crate) fn empty_iter<'a, N: NodeModel>() -> ItemIter<'a, N> {
    Box::new(std::iter::empty())
}

fn literal_number(token: &XTok) -> Number {
    match &token.value {
        TokenValue::Integer(i) => Number::Integer(*i),
        TokenValue::Decimal(d) => Number::Decimal(*d),
        TokenValue::Float(v) => Number::Double(*v),
        TokenValue::Str(s) => Number::Double(s.parse().unwrap_or(f64::NAN)),
    }
}

// --- Argument helpers ----------------------------------------------------

/// Items produced by the `index`-th operand: its selection when a context
/// is available, its evaluation otherwise.
pub(crate) fn child_items<N: NodeModel>(
    token: &XTok,
    index: usize,
    env: &XPath1,
    context: Option<&XPathContext<N>>,
) -> Result<Vec<Item<N>>, XPathError> {
    match context {
        Some(context) => collect(token.child(index), env, context),
        None => Ok(evaluate(token.child(index), env, None)?.into_items()),
    }
}

/// A single argument value: the first item of the operand's result, per
/// the XPath 1.0 first-node rule. `None` for an empty result or a missing
/// optional argument.
pub(crate) fn argument<N: NodeModel>(
    token: &XTok,
    index: usize,
    env: &XPath1,
    context: Option<&XPathContext<N>>,
    default_to_context: bool,
) -> Result<Option<Item<N>>, XPathError> {
    if index >= token.arity() {
        if default_to_context {
            let context = context.ok_or_else(|| {
                XPathError::missing_context(format!("{}() requires a context item", token.symbol()))
            })?;
            return Ok(match &context.item {
                Some(item) => Some(item.clone()),
                None => Some(Item::Node(context.root.clone())),
            });
        }
        return Ok(None);
    }
    let mut items = child_items(token, index, env, context)?;
    if items.is_empty() {
        Ok(None)
    } else {
        Ok(Some(items.swap_remove(0)))
    }
}

/// A string argument, coerced through the string value; defaults to the
/// empty string.
pub(crate) fn string_argument<N: NodeModel>(
    token: &XTok,
    index: usize,
    env: &XPath1,
    context: Option<&XPathContext<N>>,
    default_to_context: bool,
) -> Result<String, XPathError> {
    Ok(argument(token, index, env, context, default_to_context)?
        .map(|item| string_value(&item))
        .unwrap_or_default())
}

/// Both operands of a binary operator as arithmetic values, or `None`
/// when either side is empty.
pub(crate) fn operands<N: NodeModel>(
    token: &XTok,
    env: &XPath1,
    context: Option<&XPathContext<N>>,
) -> Result<Option<(Arith, Arith)>, XPathError> {
    let Some(op1) = argument(token, 0, env, context, false)? else {
        return Ok(None);
    };
    let Some(op2) = argument(token, 1, env, context, false)? else {
        return Ok(None);
    };
    Ok(Some((arith_value(&op1)?, arith_value(&op2)?)))
}
