//! Values, numbers, and the XPath 1.0 coercion rules.
//!
//! Selection yields [`Item`]s (nodes or atomics); evaluation produces a
//! [`Value`], which adds the empty result and item lists. [`Number`] keeps
//! the literal distinction between integers, decimals, and doubles, with
//! the promotion, division, and modulo semantics of XPath 1.0.

use std::fmt;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{ErrorCode, XPathError};
use crate::node::{NamespaceNode, NodeModel};

/// A numeric value: integer, decimal, or double.
#[derive(Debug, Clone, Copy)]
pub enum Number {
    Integer(i64),
    Decimal(Decimal),
    Double(f64),
}

impl Number {
    pub fn as_f64(&self) -> f64 {
        match self {
            Number::Integer(i) => *i as f64,
            Number::Decimal(d) => d.to_f64().unwrap_or(f64::NAN),
            Number::Double(v) => *v,
        }
    }

    pub fn is_nan(&self) -> bool {
        matches!(self, Number::Double(v) if v.is_nan())
    }

    pub fn is_zero(&self) -> bool {
        match self {
            Number::Integer(i) => *i == 0,
            Number::Decimal(d) => d.is_zero(),
            Number::Double(v) => *v == 0.0,
        }
    }

    fn is_sign_negative(&self) -> bool {
        match self {
            Number::Integer(i) => *i < 0,
            Number::Decimal(d) => d.is_sign_negative(),
            Number::Double(v) => v.is_sign_negative(),
        }
    }

    /// -1, 0, or 1; NaN reports 0.
    fn signum(&self) -> i32 {
        match self {
            Number::Integer(i) => i.signum() as i32,
            Number::Decimal(d) => {
                if d.is_zero() {
                    0
                } else if d.is_sign_negative() {
                    -1
                } else {
                    1
                }
            }
            Number::Double(v) => {
                if v.is_nan() || *v == 0.0 {
                    0
                } else if *v < 0.0 {
                    -1
                } else {
                    1
                }
            }
        }
    }

    fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Number::Integer(i) => Some(Decimal::from(*i)),
            Number::Decimal(d) => Some(*d),
            Number::Double(_) => None,
        }
    }

    fn has_double(a: &Number, b: &Number) -> bool {
        matches!(a, Number::Double(_)) || matches!(b, Number::Double(_))
    }

    pub fn checked_neg(self) -> Result<Number, XPathError> {
        match self {
            Number::Integer(i) => i
                .checked_neg()
                .map(Number::Integer)
                .ok_or_else(|| XPathError::code(ErrorCode::FOAR0002, "integer overflow")),
            Number::Decimal(d) => Ok(Number::Decimal(-d)),
            Number::Double(v) => Ok(Number::Double(-v)),
        }
    }

    pub fn add(self, other: Number) -> Result<Number, XPathError> {
        if Number::has_double(&self, &other) {
            return Ok(Number::Double(self.as_f64() + other.as_f64()));
        }
        if let (Number::Integer(a), Number::Integer(b)) = (self, other) {
            return a
                .checked_add(b)
                .map(Number::Integer)
                .ok_or_else(|| XPathError::code(ErrorCode::FOAR0002, "integer overflow"));
        }
        let (a, b) = (self.as_decimal(), other.as_decimal());
        match (a, b) {
            (Some(a), Some(b)) => a
                .checked_add(b)
                .map(Number::Decimal)
                .ok_or_else(|| XPathError::code(ErrorCode::FOAR0002, "decimal overflow")),
            _ => Ok(Number::Double(f64::NAN)),
        }
    }

    pub fn sub(self, other: Number) -> Result<Number, XPathError> {
        if Number::has_double(&self, &other) {
            return Ok(Number::Double(self.as_f64() - other.as_f64()));
        }
        if let (Number::Integer(a), Number::Integer(b)) = (self, other) {
            return a
                .checked_sub(b)
                .map(Number::Integer)
                .ok_or_else(|| XPathError::code(ErrorCode::FOAR0002, "integer overflow"));
        }
        match (self.as_decimal(), other.as_decimal()) {
            (Some(a), Some(b)) => a
                .checked_sub(b)
                .map(Number::Decimal)
                .ok_or_else(|| XPathError::code(ErrorCode::FOAR0002, "decimal overflow")),
            _ => Ok(Number::Double(f64::NAN)),
        }
    }

    pub fn mul(self, other: Number) -> Result<Number, XPathError> {
        if Number::has_double(&self, &other) {
            return Ok(Number::Double(self.as_f64() * other.as_f64()));
        }
        if let (Number::Integer(a), Number::Integer(b)) = (self, other) {
            return a
                .checked_mul(b)
                .map(Number::Integer)
                .ok_or_else(|| XPathError::code(ErrorCode::FOAR0002, "integer overflow"));
        }
        match (self.as_decimal(), other.as_decimal()) {
            (Some(a), Some(b)) => a
                .checked_mul(b)
                .map(Number::Decimal)
                .ok_or_else(|| XPathError::code(ErrorCode::FOAR0002, "decimal overflow")),
            _ => Ok(Number::Double(f64::NAN)),
        }
    }

    /// XPath 1.0 division.
    ///
    /// Doubles follow IEEE semantics. A zero divisor over integers raises
    /// FOAR0001 in strict mode; otherwise the result is a signed infinity
    /// (or NaN for a zero dividend). Integer division yields a decimal.
    pub fn div(self, other: Number, strict: bool) -> Result<Number, XPathError> {
        if Number::has_double(&self, &other) {
            return Ok(Number::Double(self.as_f64() / other.as_f64()));
        }
        if other.is_zero() {
            if strict && matches!((self, other), (Number::Integer(_), Number::Integer(_))) {
                return Err(XPathError::code(ErrorCode::FOAR0001, "division by zero"));
            }
            let negative = other.is_sign_negative();
            return Ok(Number::Double(match self.signum() {
                0 => f64::NAN,
                s if (s > 0) != negative => f64::INFINITY,
                _ => f64::NEG_INFINITY,
            }));
        }
        match (self.as_decimal(), other.as_decimal()) {
            (Some(a), Some(b)) => a
                .checked_div(b)
                .map(Number::Decimal)
                .ok_or_else(|| XPathError::code(ErrorCode::FOAR0002, "decimal overflow")),
            _ => Ok(Number::Double(f64::NAN)),
        }
    }

    /// XPath 1.0 modulo: the result takes the sign of the dividend.
    ///
    /// A float zero divisor yields NaN; an infinite divisor yields NaN
    /// (XPath 1.0 behavior); integer or decimal modulo by zero raises
    /// FOAR0001.
    pub fn modulo(self, other: Number) -> Result<Number, XPathError> {
        if Number::has_double(&self, &other) {
            let a = self.as_f64();
            let b = other.as_f64();
            if b == 0.0 {
                return Ok(Number::Double(f64::NAN));
            }
            if b.is_infinite() && a.is_finite() && a != 0.0 {
                return Ok(Number::Double(f64::NAN));
            }
            return Ok(Number::Double(a % b));
        }
        if other.is_zero() {
            return Err(XPathError::code(ErrorCode::FOAR0001, "modulo by zero"));
        }
        if let (Number::Integer(a), Number::Integer(b)) = (self, other) {
            return a
                .checked_rem(b)
                .map(Number::Integer)
                .ok_or_else(|| XPathError::code(ErrorCode::FOAR0002, "integer overflow"));
        }
        match (self.as_decimal(), other.as_decimal()) {
            (Some(a), Some(b)) => a
                .checked_rem(b)
                .map(Number::Decimal)
                .ok_or_else(|| XPathError::code(ErrorCode::FOAR0002, "decimal overflow")),
            _ => Ok(Number::Double(f64::NAN)),
        }
    }

    pub fn floor(self) -> Number {
        match self {
            Number::Integer(i) => Number::Integer(i),
            Number::Decimal(d) => Number::Decimal(d.floor()),
            Number::Double(v) if v.is_nan() || v.is_infinite() => Number::Double(v),
            Number::Double(v) => Number::Double(v.floor()),
        }
    }

    pub fn ceiling(self) -> Number {
        match self {
            Number::Integer(i) => Number::Integer(i),
            Number::Decimal(d) => Number::Decimal(d.ceil()),
            Number::Double(v) if v.is_nan() || v.is_infinite() => Number::Double(v),
            Number::Double(v) => Number::Double(v.ceil()),
        }
    }

    /// `round()`: positive values round half up, non-positive values round
    /// half toward zero (so `round(-0.5)` is 0, not -1).
    pub fn round_half(self) -> Number {
        match self {
            Number::Integer(i) => Number::Integer(i),
            Number::Decimal(d) => {
                let strategy = if d.is_sign_negative() || d.is_zero() {
                    RoundingStrategy::MidpointTowardZero
                } else {
                    RoundingStrategy::MidpointAwayFromZero
                };
                Number::Decimal(d.round_dp_with_strategy(0, strategy))
            }
            Number::Double(v) if v.is_nan() || v.is_infinite() => Number::Double(v),
            Number::Double(v) => Number::Double((v + 0.5).floor()),
        }
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        if Number::has_double(self, other) {
            return self.as_f64() == other.as_f64();
        }
        match (self.as_decimal(), other.as_decimal()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        if Number::has_double(self, other) {
            return self.as_f64().partial_cmp(&other.as_f64());
        }
        match (self.as_decimal(), other.as_decimal()) {
            (Some(a), Some(b)) => a.partial_cmp(&b),
            _ => None,
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Integer(i) => write!(f, "{i}"),
            Number::Decimal(d) => write!(f, "{}", d.normalize()),
            Number::Double(v) => {
                if v.is_nan() {
                    f.write_str("NaN")
                } else if v.is_infinite() {
                    f.write_str(if *v > 0.0 { "Infinity" } else { "-Infinity" })
                } else if *v == v.trunc() && v.abs() < 1e15 {
                    write!(f, "{}", *v as i64)
                } else {
                    write!(f, "{v}")
                }
            }
        }
    }
}

impl From<i64> for Number {
    fn from(i: i64) -> Self {
        Number::Integer(i)
    }
}

impl From<f64> for Number {
    fn from(v: f64) -> Self {
        Number::Double(v)
    }
}

impl From<Decimal> for Number {
    fn from(d: Decimal) -> Self {
        Number::Decimal(d)
    }
}

/// A minimal duration value: a month component and a seconds component.
///
/// Pure month durations are year-month durations, pure second durations
/// are day-time durations; the two families do not mix in arithmetic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Duration {
    pub months: i64,
    pub seconds: f64,
}

impl Duration {
    pub fn year_month(months: i64) -> Self {
        Duration {
            months,
            seconds: 0.0,
        }
    }

    pub fn day_time(seconds: f64) -> Self {
        Duration { months: 0, seconds }
    }

    pub fn is_year_month(&self) -> bool {
        self.seconds == 0.0
    }

    pub fn is_day_time(&self) -> bool {
        self.months == 0
    }

    /// Whether two durations belong to the same family.
    pub fn same_family(&self, other: &Duration) -> bool {
        (self.is_year_month() && other.is_year_month())
            || (self.is_day_time() && other.is_day_time())
    }

    pub fn checked_add(self, other: Duration) -> Result<Duration, XPathError> {
        let months = self
            .months
            .checked_add(other.months)
            .ok_or_else(|| XPathError::code(ErrorCode::FODT0002, "duration overflow"))?;
        let seconds = self.seconds + other.seconds;
        if seconds.is_infinite() {
            return Err(XPathError::code(ErrorCode::FODT0002, "duration overflow"));
        }
        Ok(Duration { months, seconds })
    }

    pub fn checked_sub(self, other: Duration) -> Result<Duration, XPathError> {
        self.checked_add(other.negated())
    }

    pub fn negated(self) -> Duration {
        Duration {
            months: -self.months,
            seconds: -self.seconds,
        }
    }

    pub fn scale(self, factor: f64) -> Result<Duration, XPathError> {
        if factor.is_nan() {
            return Err(XPathError::code(
                ErrorCode::FOCA0005,
                "NaN is not a valid duration factor",
            ));
        }
        if factor.is_infinite() {
            return Err(XPathError::code(ErrorCode::FODT0002, "duration overflow"));
        }
        let months = self.months as f64 * factor;
        if months.abs() >= i64::MAX as f64 {
            return Err(XPathError::code(ErrorCode::FODT0002, "duration overflow"));
        }
        Ok(Duration {
            months: months.round() as i64,
            seconds: self.seconds * factor,
        })
    }

    pub fn divide(self, divisor: f64) -> Result<Duration, XPathError> {
        if divisor == 0.0 {
            return Err(XPathError::code(
                ErrorCode::FODT0002,
                "division of a duration by zero",
            ));
        }
        self.scale(1.0 / divisor)
    }
}

impl PartialOrd for Duration {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        if self.is_year_month() && other.is_year_month() {
            self.months.partial_cmp(&other.months)
        } else if self.is_day_time() && other.is_day_time() {
            self.seconds.partial_cmp(&other.seconds)
        } else {
            None
        }
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.months == 0 && self.seconds == 0.0 {
            return f.write_str("PT0S");
        }
        let negative = self.months < 0 || self.seconds < 0.0;
        if negative {
            f.write_str("-")?;
        }
        f.write_str("P")?;
        let months = self.months.abs();
        if months != 0 {
            let (years, rem) = (months / 12, months % 12);
            if years != 0 {
                write!(f, "{years}Y")?;
            }
            if rem != 0 {
                write!(f, "{rem}M")?;
            }
        }
        let seconds = self.seconds.abs();
        if seconds != 0.0 {
            write!(f, "T{seconds}S")?;
        }
        Ok(())
    }
}

/// A single selection result: a node or an atomic value.
#[derive(Debug, Clone, PartialEq)]
pub enum Item<N: NodeModel> {
    Node(N),
    Namespace(NamespaceNode),
    Boolean(bool),
    Number(Number),
    String(String),
    Duration(Duration),
}

impl<N: NodeModel> Item<N> {
    pub fn as_node(&self) -> Option<&N> {
        match self {
            Item::Node(n) => Some(n),
            _ => None,
        }
    }

    pub fn is_node(&self) -> bool {
        matches!(self, Item::Node(_) | Item::Namespace(_))
    }
}

/// An evaluation result.
#[derive(Debug, Clone, PartialEq)]
pub enum Value<N: NodeModel> {
    Empty,
    Boolean(bool),
    Number(Number),
    String(String),
    Node(N),
    Namespace(NamespaceNode),
    Duration(Duration),
    List(Vec<Item<N>>),
}

impl<N: NodeModel> Value<N> {
    pub fn from_items(items: Vec<Item<N>>) -> Self {
        Value::List(items)
    }

    /// Flatten into items; the empty value yields nothing.
    pub fn into_items(self) -> Vec<Item<N>> {
        match self {
            Value::Empty => Vec::new(),
            Value::Boolean(b) => vec![Item::Boolean(b)],
            Value::Number(n) => vec![Item::Number(n)],
            Value::String(s) => vec![Item::String(s)],
            Value::Node(n) => vec![Item::Node(n)],
            Value::Namespace(ns) => vec![Item::Namespace(ns)],
            Value::Duration(d) => vec![Item::Duration(d)],
            Value::List(items) => items,
        }
    }

    /// Effective boolean value. A one-item list behaves as that item.
    pub fn boolean(&self) -> bool {
        match self {
            Value::Empty => false,
            Value::Boolean(b) => *b,
            Value::Number(n) => ebv_number(n),
            Value::String(s) => !s.is_empty(),
            Value::Node(_) | Value::Namespace(_) | Value::Duration(_) => true,
            Value::List(items) => ebv_items(items),
        }
    }
}

impl<N: NodeModel> From<Item<N>> for Value<N> {
    fn from(item: Item<N>) -> Self {
        match item {
            Item::Node(n) => Value::Node(n),
            Item::Namespace(ns) => Value::Namespace(ns),
            Item::Boolean(b) => Value::Boolean(b),
            Item::Number(n) => Value::Number(n),
            Item::String(s) => Value::String(s),
            Item::Duration(d) => Value::Duration(d),
        }
    }
}

fn ebv_number(n: &Number) -> bool {
    !n.is_nan() && !n.is_zero()
}

/// Effective boolean value of an item sequence: non-empty sequences of two
/// or more items are true; a singleton follows its item's value.
pub fn ebv_items<N: NodeModel>(items: &[Item<N>]) -> bool {
    match items {
        [] => false,
        [item] => match item {
            Item::Node(_) | Item::Namespace(_) | Item::Duration(_) => true,
            Item::Boolean(b) => *b,
            Item::Number(n) => ebv_number(n),
            Item::String(s) => !s.is_empty(),
        },
        _ => true,
    }
}

/// XPath string value of an item.
pub fn string_value<N: NodeModel>(item: &Item<N>) -> String {
    match item {
        Item::Node(n) => n.string_value(),
        Item::Namespace(ns) => ns.uri.clone(),
        Item::Boolean(b) => if *b { "true" } else { "false" }.to_owned(),
        Item::Number(n) => n.to_string(),
        Item::String(s) => s.clone(),
        Item::Duration(d) => d.to_string(),
    }
}

/// XPath number value of an item; unparseable strings yield NaN.
pub fn number_value<N: NodeModel>(item: &Item<N>) -> Number {
    match item {
        Item::Number(n) => *n,
        Item::Boolean(b) => Number::Double(if *b { 1.0 } else { 0.0 }),
        Item::Node(_) | Item::Namespace(_) | Item::String(_) => {
            let s = string_value(item);
            Number::Double(s.trim().parse::<f64>().unwrap_or(f64::NAN))
        }
        Item::Duration(_) => Number::Double(f64::NAN),
    }
}

/// An arithmetic operand: a number or a duration.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Arith {
    Num(Number),
    Dur(Duration),
}

/// Coerce an item to an arithmetic operand: booleans count as 0/1, nodes
/// and strings are parsed as numbers, and an unparseable string is a
/// FORG0001 value error.
pub(crate) fn arith_value<N: NodeModel>(item: &Item<N>) -> Result<Arith, XPathError> {
    match item {
        Item::Number(n) => Ok(Arith::Num(*n)),
        Item::Duration(d) => Ok(Arith::Dur(*d)),
        Item::Boolean(b) => Ok(Arith::Num(Number::Double(if *b { 1.0 } else { 0.0 }))),
        other => {
            let s = string_value(other);
            match s.trim().parse::<f64>() {
                Ok(v) => Ok(Arith::Num(Number::Double(v))),
                Err(_) => Err(XPathError::code(
                    ErrorCode::FORG0001,
                    format!("could not convert {s:?} to a number"),
                )),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn dec(s: &str) -> Number {
        Number::Decimal(Decimal::from_str(s).unwrap())
    }

    #[test]
    fn integer_division_yields_decimal() {
        let result = Number::Integer(1).div(Number::Integer(2), true).unwrap();
        assert_eq!(result, dec("0.5"));
        assert!(matches!(result, Number::Decimal(_)));
    }

    #[test]
    fn strict_integer_division_by_zero_fails() {
        let err = Number::Integer(1).div(Number::Integer(0), true).unwrap_err();
        assert!(matches!(
            err,
            XPathError::Code {
                code: ErrorCode::FOAR0001,
                ..
            }
        ));
    }

    #[test]
    fn decimal_division_by_zero_is_signed_infinity() {
        // `1.0 div 0` and `-1.0 div 0`
        assert_eq!(
            dec("1.0").div(Number::Integer(0), true).unwrap(),
            Number::Double(f64::INFINITY)
        );
        assert_eq!(
            dec("-1.0").div(Number::Integer(0), true).unwrap(),
            Number::Double(f64::NEG_INFINITY)
        );
    }

    #[test]
    fn double_zero_division_is_nan() {
        let result = Number::Double(0.0).div(Number::Integer(0), true).unwrap();
        assert!(result.is_nan());
    }

    #[test]
    fn lax_integer_division_by_zero_is_infinite() {
        assert_eq!(
            Number::Integer(1).div(Number::Integer(0), false).unwrap(),
            Number::Double(f64::INFINITY)
        );
    }

    #[test]
    fn modulo_follows_the_dividend_sign() {
        assert_eq!(
            Number::Integer(5).modulo(Number::Integer(-2)).unwrap(),
            Number::Integer(1)
        );
        assert_eq!(
            Number::Integer(-5).modulo(Number::Integer(2)).unwrap(),
            Number::Integer(-1)
        );
    }

    #[test]
    fn integer_modulo_by_zero_fails() {
        let err = Number::Integer(5).modulo(Number::Integer(0)).unwrap_err();
        assert!(matches!(
            err,
            XPathError::Code {
                code: ErrorCode::FOAR0001,
                ..
            }
        ));
    }

    #[test]
    fn float_modulo_by_zero_is_nan() {
        assert!(Number::Double(5.0)
            .modulo(Number::Double(0.0))
            .unwrap()
            .is_nan());
    }

    #[test]
    fn float_modulo_by_infinity_is_nan() {
        assert!(Number::Double(5.0)
            .modulo(Number::Double(f64::INFINITY))
            .unwrap()
            .is_nan());
    }

    #[test]
    fn rounding_is_half_up_for_positives_half_down_for_negatives() {
        assert_eq!(Number::Double(0.5).round_half(), Number::Double(1.0));
        assert_eq!(Number::Double(-0.5).round_half(), Number::Double(0.0));
        assert_eq!(Number::Double(-1.5).round_half(), Number::Double(-1.0));
        assert_eq!(dec("2.5").round_half(), dec("3"));
        assert_eq!(dec("-2.5").round_half(), dec("-2"));
    }

    #[test]
    fn cross_variant_comparison_promotes() {
        assert_eq!(Number::Integer(2), dec("2.0"));
        assert_eq!(Number::Integer(2), Number::Double(2.0));
        assert!(Number::Integer(1) < dec("1.5"));
        assert!(dec("1.5") < Number::Double(2.0));
        assert_ne!(Number::Double(f64::NAN), Number::Double(f64::NAN));
    }

    #[test]
    fn number_display() {
        assert_eq!(Number::Integer(7).to_string(), "7");
        assert_eq!(dec("2.50").to_string(), "2.5");
        assert_eq!(Number::Double(7.0).to_string(), "7");
        assert_eq!(Number::Double(f64::NAN).to_string(), "NaN");
        assert_eq!(Number::Double(f64::INFINITY).to_string(), "Infinity");
        assert_eq!(Number::Double(1.5).to_string(), "1.5");
    }

    #[test]
    fn integer_overflow_is_reported() {
        let err = Number::Integer(i64::MAX)
            .add(Number::Integer(1))
            .unwrap_err();
        assert!(matches!(
            err,
            XPathError::Code {
                code: ErrorCode::FOAR0002,
                ..
            }
        ));
    }

    #[test]
    fn durations_sum_within_a_family() {
        let a = Duration::year_month(14);
        let b = Duration::year_month(1);
        let sum = a.checked_add(b).unwrap();
        assert_eq!(sum.months, 15);
        assert_eq!(sum.to_string(), "P1Y3M");
        assert!(a.same_family(&b));
        assert!(!a.same_family(&Duration::day_time(5.0)));
    }

    #[test]
    fn duration_division_by_zero_fails() {
        let err = Duration::day_time(10.0).divide(0.0).unwrap_err();
        assert!(matches!(
            err,
            XPathError::Code {
                code: ErrorCode::FODT0002,
                ..
            }
        ));
    }
}
