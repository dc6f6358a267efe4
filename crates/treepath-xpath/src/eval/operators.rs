//! Evaluation of comparison, arithmetic, and name-composite operators.

use treepath_tdop::Label;

use super::{argument, child_items, evaluate, operands, XTok};
use crate::context::XPathContext;
use crate::dialect::XPath1;
use crate::error::{ErrorCode, XPathError};
use crate::node::NodeModel;
use crate::value::{string_value, Arith, Duration, Item, Number, Value};

/// `prefix:name` outside a selection: delegate to a callable right side,
/// or produce the expanded name.
pub(super) fn eval_colon<N: NodeModel>(
    token: &XTok,
    env: &XPath1,
    context: Option<&XPathContext<N>>,
) -> Result<Value<N>, XPathError> {
    let right = token.child(1);
    if right.label().is(Label::Function) || right.label().is(Label::Constructor) {
        return evaluate(right, env, context);
    }
    match context {
        Some(context) => Ok(Value::from_items(super::collect(token, env, context)?)),
        None => {
            let prefix = token.child(0).value.str_or_empty();
            let local = right.value.str_or_empty();
            if prefix == "*" {
                return Ok(Value::String(format!("*:{local}")));
            }
            match env.namespace(prefix) {
                Some(uri) => Ok(Value::String(format!("{{{uri}}}{local}"))),
                None => Err(XPathError::code(
                    ErrorCode::XPST0081,
                    format!("prefix {prefix:?} has not been declared"),
                )),
            }
        }
    }
}

/// `{uri}name` outside a selection.
pub(super) fn eval_brace<N: NodeModel>(
    token: &XTok,
    env: &XPath1,
    context: Option<&XPathContext<N>>,
) -> Result<Value<N>, XPathError> {
    let right = token.child(1);
    if right.label().is(Label::Function) {
        return evaluate(right, env, context);
    }
    Ok(Value::String(format!(
        "{{{}}}{}",
        token.child(0).value.str_or_empty(),
        right.value.str_or_empty()
    )))
}

/// `$name`: variable lookup in the context.
pub(super) fn eval_variable<N: NodeModel>(
    token: &XTok,
    _env: &XPath1,
    context: Option<&XPathContext<N>>,
) -> Result<Value<N>, XPathError> {
    let context =
        context.ok_or_else(|| XPathError::missing_context("variable reference"))?;
    let name = token.child(0).value.str_or_empty();
    context
        .variables
        .get(name)
        .cloned()
        .ok_or_else(|| XPathError::MissingName(format!("unknown variable {name:?}")))
}

/// One side of a general comparison, with nodes replaced by their string
/// values.
#[derive(Debug, Clone, PartialEq)]
enum Comparable {
    Num(Number),
    Str(String),
    Bool(bool),
    Dur(Duration),
}

fn comparable<N: NodeModel>(item: &Item<N>) -> Comparable {
    match item {
        Item::Number(n) => Comparable::Num(*n),
        Item::Boolean(b) => Comparable::Bool(*b),
        Item::String(s) => Comparable::Str(s.clone()),
        Item::Duration(d) => Comparable::Dur(*d),
        Item::Node(_) | Item::Namespace(_) => Comparable::Str(string_value(item)),
    }
}

/// General comparison: true if any cross-product pair satisfies the
/// operator. Pairs of mismatched types are type errors.
pub(super) fn eval_comparison<N: NodeModel>(
    token: &XTok,
    env: &XPath1,
    context: Option<&XPathContext<N>>,
) -> Result<Value<N>, XPathError> {
    let left = child_items(token, 0, env, context)?;
    let right = child_items(token, 1, env, context)?;
    let op = token.symbol();
    for a in &left {
        for b in &right {
            if compare_pair(op, &comparable(a), &comparable(b))? {
                return Ok(Value::Boolean(true));
            }
        }
    }
    Ok(Value::Boolean(false))
}

fn compare_pair(op: &str, a: &Comparable, b: &Comparable) -> Result<bool, XPathError> {
    let ordering = match (a, b) {
        (Comparable::Num(x), Comparable::Num(y)) => {
            return Ok(match op {
                "=" => x == y,
                "!=" => x != y,
                _ => ordered(op, x.partial_cmp(y)),
            });
        }
        (Comparable::Str(x), Comparable::Str(y)) => x.cmp(y),
        (Comparable::Bool(x), Comparable::Bool(y)) => x.cmp(y),
        (Comparable::Dur(x), Comparable::Dur(y)) => {
            return Ok(match op {
                "=" => x == y,
                "!=" => x != y,
                _ => ordered(op, x.partial_cmp(y)),
            });
        }
        _ => {
            return Err(XPathError::code(
                ErrorCode::XPTY0004,
                format!("cannot compare {a:?} and {b:?}"),
            ));
        }
    };
    Ok(ordered(op, Some(ordering)))
}

fn ordered(op: &str, ordering: Option<std::cmp::Ordering>) -> bool {
    use std::cmp::Ordering;

    let Some(ordering) = ordering else {
        return false;
    };
    match op {
        "=" => ordering == Ordering::Equal,
        "!=" => ordering != Ordering::Equal,
        "<" => ordering == Ordering::Less,
        "<=" => ordering != Ordering::Greater,
        ">" => ordering == Ordering::Greater,
        _ => ordering != Ordering::Less,
    }
}

/// Unary and binary `+` / `-`.
pub(super) fn eval_additive<N: NodeModel>(
    token: &XTok,
    env: &XPath1,
    context: Option<&XPathContext<N>>,
) -> Result<Value<N>, XPathError> {
    let minus = token.is("-");
    if token.arity() == 1 {
        let Some(item) = argument(token, 0, env, context, false)? else {
            return Ok(Value::Empty);
        };
        return match crate::value::arith_value(&item)? {
            Arith::Num(n) => {
                let n = if minus { n.checked_neg()? } else { n };
                Ok(Value::Number(n))
            }
            Arith::Dur(_) => Err(XPathError::Type(
                "a unary arithmetic operator requires a numeric operand".to_owned(),
            )),
        };
    }
    let Some((a, b)) = operands(token, env, context)? else {
        return Ok(Value::Empty);
    };
    match (a, b) {
        (Arith::Num(x), Arith::Num(y)) => {
            let n = if minus { x.sub(y)? } else { x.add(y)? };
            Ok(Value::Number(n))
        }
        (Arith::Dur(x), Arith::Dur(y)) => {
            if !x.same_family(&y) {
                return Err(XPathError::code(
                    ErrorCode::XPTY0004,
                    "cannot mix year-month and day-time durations",
                ));
            }
            let d = if minus {
                x.checked_sub(y)?
            } else {
                x.checked_add(y)?
            };
            Ok(Value::Duration(d))
        }
        _ => Err(XPathError::code(
            ErrorCode::XPTY0004,
            "cannot mix numeric and duration operands",
        )),
    }
}

/// Binary `*`: numbers, or a duration scaled by a number.
pub(super) fn eval_multiplicative<N: NodeModel>(
    token: &XTok,
    env: &XPath1,
    context: Option<&XPathContext<N>>,
) -> Result<Value<N>, XPathError> {
    let Some((a, b)) = operands(token, env, context)? else {
        return Ok(Value::Empty);
    };
    match (a, b) {
        (Arith::Num(x), Arith::Num(y)) => Ok(Value::Number(x.mul(y)?)),
        (Arith::Dur(d), Arith::Num(n)) | (Arith::Num(n), Arith::Dur(d)) => {
            Ok(Value::Duration(d.scale(n.as_f64())?))
        }
        (Arith::Dur(_), Arith::Dur(_)) => Err(XPathError::code(
            ErrorCode::XPTY0004,
            "cannot multiply two durations",
        )),
    }
}

/// `div`: numeric division per the XPath 1.0 matrix, or duration scaling.
pub(super) fn eval_div<N: NodeModel>(
    token: &XTok,
    env: &XPath1,
    context: Option<&XPathContext<N>>,
) -> Result<Value<N>, XPathError> {
    let Some((a, b)) = operands(token, env, context)? else {
        return Ok(Value::Empty);
    };
    match (a, b) {
        (Arith::Num(x), Arith::Num(y)) => Ok(Value::Number(x.div(y, env.strict)?)),
        (Arith::Dur(d), Arith::Num(n)) => Ok(Value::Duration(d.divide(n.as_f64())?)),
        _ => Err(XPathError::code(
            ErrorCode::XPTY0004,
            "invalid operands for 'div'",
        )),
    }
}

/// `mod`: numeric remainder with the sign of the dividend.
pub(super) fn eval_mod<N: NodeModel>(
    token: &XTok,
    env: &XPath1,
    context: Option<&XPathContext<N>>,
) -> Result<Value<N>, XPathError> {
    let Some((a, b)) = operands(token, env, context)? else {
        return Ok(Value::Empty);
    };
    match (a, b) {
        (Arith::Num(x), Arith::Num(y)) => Ok(Value::Number(x.modulo(y)?)),
        _ => Err(XPathError::Type(
            "'mod' requires numeric operands".to_owned(),
        )),
    }
}
