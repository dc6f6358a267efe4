//! The XPath 1.0 function library.

use super::{argument, child_items, string_argument, XTok};
use crate::context::XPathContext;
use crate::dialect::{XPath1, XML_LANG};
use crate::error::XPathError;
use crate::node::{prefixed_name, split_expanded, NodeKind, NodeModel};
use crate::value::{ebv_items, number_value, string_value, Duration, Item, Number, Value};

pub(super) fn eval_function<N: NodeModel>(
    token: &XTok,
    env: &XPath1,
    context: Option<&XPathContext<N>>,
) -> Result<Value<N>, XPathError> {
    match token.symbol() {
        "last" => Ok(Value::Number(Number::Integer(
            context.map_or(0, |c| c.size as i64),
        ))),
        "position" => Ok(Value::Number(Number::Integer(
            context.map_or(0, |c| c.position as i64),
        ))),
        "count" => {
            let items = child_items(token, 0, env, context)?;
            Ok(Value::Number(Number::Integer(items.len() as i64)))
        }
        "name" | "local-name" | "namespace-uri" => eval_name_function(token, env, context),
        "string" => Ok(Value::String(string_argument(token, 0, env, context, true)?)),
        "concat" => {
            let mut out = String::new();
            for index in 0..token.arity() {
                out.push_str(&string_argument(token, index, env, context, false)?);
            }
            Ok(Value::String(out))
        }
        "starts-with" => {
            let arg1 = string_argument(token, 0, env, context, false)?;
            let arg2 = string_argument(token, 1, env, context, false)?;
            Ok(Value::Boolean(arg1.starts_with(&arg2)))
        }
        "contains" => {
            let arg1 = string_argument(token, 0, env, context, false)?;
            let arg2 = string_argument(token, 1, env, context, false)?;
            Ok(Value::Boolean(arg1.contains(&arg2)))
        }
        "substring-before" | "substring-after" => {
            let arg1 = string_argument(token, 0, env, context, false)?;
            let arg2 = string_argument(token, 1, env, context, false)?;
            let value = match arg1.find(&arg2) {
                None => String::new(),
                Some(index) if token.is("substring-before") => arg1[..index].to_owned(),
                Some(index) => arg1[index + arg2.len()..].to_owned(),
            };
            Ok(Value::String(value))
        }
        "substring" => eval_substring(token, env, context),
        "string-length" => {
            let arg = string_argument(token, 0, env, context, true)?;
            Ok(Value::Number(Number::Integer(arg.chars().count() as i64)))
        }
        "normalize-space" => {
            let arg = string_argument(token, 0, env, context, true)?;
            Ok(Value::String(
                arg.split_whitespace().collect::<Vec<_>>().join(" "),
            ))
        }
        "translate" => eval_translate(token, env, context),
        "boolean" => {
            let items = child_items(token, 0, env, context)?;
            Ok(Value::Boolean(ebv_items(&items)))
        }
        "not" => {
            let items = child_items(token, 0, env, context)?;
            Ok(Value::Boolean(!ebv_items(&items)))
        }
        "true" => Ok(Value::Boolean(true)),
        "false" => Ok(Value::Boolean(false)),
        "lang" => eval_lang(token, env, context),
        "number" => {
            let Some(item) = argument(token, 0, env, context, true)? else {
                return Ok(Value::Number(Number::Double(f64::NAN)));
            };
            Ok(Value::Number(Number::Double(number_value(&item).as_f64())))
        }
        "sum" => eval_sum(token, env, context),
        "floor" | "ceiling" | "round" => {
            let Some(item) = argument(token, 0, env, context, false)? else {
                return Ok(Value::Number(Number::Double(f64::NAN)));
            };
            let n = match &item {
                Item::Number(n) => *n,
                other => number_value(other),
            };
            let n = match token.symbol() {
                "floor" => n.floor(),
                "ceiling" => n.ceiling(),
                _ => n.round_half(),
            };
            Ok(Value::Number(n))
        }
        other => Err(XPathError::Type(format!(
            "{other:?} is not an XPath 1.0 function"
        ))),
    }
}

fn eval_name_function<N: NodeModel>(
    token: &XTok,
    env: &XPath1,
    context: Option<&XPathContext<N>>,
) -> Result<Value<N>, XPathError> {
    let name = match argument(token, 0, env, context, true)? {
        Some(Item::Node(node)) => node.name(),
        Some(Item::Namespace(ns)) => Some(ns.prefix),
        _ => None,
    };
    let Some(name) = name else {
        return Ok(Value::String(String::new()));
    };
    let value = match token.symbol() {
        "name" => prefixed_name(&name, &env.namespaces),
        "local-name" => split_expanded(&name).1.to_owned(),
        _ => split_expanded(&name).0.unwrap_or("").to_owned(),
    };
    Ok(Value::String(value))
}

/// `substring(s, start, length?)` with 1-based, rounded positions.
fn eval_substring<N: NodeModel>(
    token: &XTok,
    env: &XPath1,
    context: Option<&XPathContext<N>>,
) -> Result<Value<N>, XPathError> {
    let item = string_argument(token, 0, env, context, false)?;
    let start = match argument(token, 1, env, context, false)? {
        Some(Item::Number(n)) => n.as_f64(),
        _ => {
            return Err(XPathError::Type(
                "the second argument of substring() must be numeric".to_owned(),
            ));
        }
    };
    if start.is_nan() || start.is_infinite() {
        return Ok(Value::String(String::new()));
    }
    let start = (start + 0.5).floor() as i64 - 1;
    let chars: Vec<char> = item.chars().collect();

    if token.arity() == 2 {
        let from = start.max(0) as usize;
        return Ok(Value::String(
            chars.get(from.min(chars.len())..).unwrap_or(&[]).iter().collect(),
        ));
    }

    let length = match argument(token, 2, env, context, false)? {
        Some(Item::Number(n)) => n.as_f64(),
        _ => {
            return Err(XPathError::Type(
                "the third argument of substring() must be numeric".to_owned(),
            ));
        }
    };
    if length.is_nan() || length <= 0.0 {
        return Ok(Value::String(String::new()));
    }
    let from = start.max(0) as usize;
    if length.is_infinite() {
        return Ok(Value::String(
            chars.get(from.min(chars.len())..).unwrap_or(&[]).iter().collect(),
        ));
    }
    let stop = start + (length + 0.5).floor() as i64;
    let to = (stop.max(0) as usize).min(chars.len());
    let from = from.min(to);
    Ok(Value::String(chars[from..to].iter().collect()))
}

/// `translate(s, from, to)`: map characters positionally, deleting those
/// past the end of the replacement string.
fn eval_translate<N: NodeModel>(
    token: &XTok,
    env: &XPath1,
    context: Option<&XPathContext<N>>,
) -> Result<Value<N>, XPathError> {
    let arg = string_argument(token, 0, env, context, false)?;
    let from: Vec<char> = string_argument(token, 1, env, context, false)?.chars().collect();
    let to: Vec<char> = string_argument(token, 2, env, context, false)?.chars().collect();

    let mut out = String::new();
    for c in arg.chars() {
        match from.iter().position(|f| *f == c) {
            None => out.push(c),
            Some(index) => {
                if let Some(replacement) = to.get(index) {
                    out.push(*replacement);
                }
            }
        }
    }
    Ok(Value::String(out))
}

/// `lang(code)`: the `xml:lang` of the context element or its nearest
/// ancestor, compared without the region subtag.
fn eval_lang<N: NodeModel>(
    token: &XTok,
    env: &XPath1,
    context: Option<&XPathContext<N>>,
) -> Result<Value<N>, XPathError> {
    let ctx = context.ok_or_else(|| XPathError::missing_context("lang()"))?;
    let Some(node) = ctx.node() else {
        return Ok(Value::Boolean(false));
    };
    if node.node_kind() != NodeKind::Element {
        return Ok(Value::Boolean(false));
    }

    let mut lang = node.attribute(XML_LANG);
    if lang.is_none() {
        let mut cursor = node.parent();
        while let Some(ancestor) = cursor {
            if let Some(value) = ancestor.attribute(XML_LANG) {
                lang = Some(value);
                break;
            }
            cursor = ancestor.parent();
        }
    }
    let Some(lang) = lang else {
        return Ok(Value::Boolean(false));
    };
    let lang = lang.trim();
    let primary = lang.split('-').next().unwrap_or(lang);
    let code = string_argument(token, 0, env, context, false)?;
    Ok(Value::Boolean(primary.eq_ignore_ascii_case(code.trim())))
}

/// `sum(sequence, zero?)`: exact over integers and decimals, duration
/// sums within a family, NaN poisoning, and a configurable empty value.
fn eval_sum<N: NodeModel>(
    token: &XTok,
    env: &XPath1,
    context: Option<&XPathContext<N>>,
) -> Result<Value<N>, XPathError> {
    let items = child_items(token, 0, env, context)?;
    if items.is_empty() {
        if token.arity() == 1 {
            return Ok(Value::Number(Number::Integer(0)));
        }
        return match argument(token, 1, env, context, false)? {
            Some(item) => Ok(Value::from(item)),
            None => Ok(Value::Empty),
        };
    }

    if items
        .iter()
        .any(|item| matches!(item, Item::Number(n) if n.is_nan()))
    {
        return Ok(Value::Number(Number::Double(f64::NAN)));
    }

    let exact = items
        .iter()
        .all(|item| matches!(item, Item::Number(Number::Integer(_) | Number::Decimal(_))));
    if exact {
        let mut total = Number::Integer(0);
        for item in &items {
            if let Item::Number(n) = item {
                total = total.add(*n)?;
            }
        }
        return Ok(Value::Number(total));
    }

    if let Some(durations) = all_durations(&items) {
        let mut total = durations[0];
        for d in &durations[1..] {
            if !total.same_family(d) {
                return Ok(Value::Number(Number::Double(f64::NAN)));
            }
            total = total.checked_add(*d)?;
        }
        return Ok(Value::Duration(total));
    }

    let mut total = 0.0;
    for item in &items {
        match item {
            Item::Duration(_) => return Ok(Value::Number(Number::Double(f64::NAN))),
            other => total += number_value(other).as_f64(),
        }
    }
    Ok(Value::Number(Number::Double(total)))
}

fn all_durations<N: NodeModel>(items: &[Item<N>]) -> Option<Vec<Duration>> {
    items
        .iter()
        .map(|item| match item {
            Item::Duration(d) => Some(*d),
            _ => None,
        })
        .collect()
}
