use std::{cmp::Ordering, collections::BTreeMap, str::FromStr};

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use rust_decimal::{
    Decimal,
    prelude::{FromPrimitive, ToPrimitive},
};

use crate::ast::Literal;

/// A document value the predicate compiler evaluates against.
///
/// This type represents all JSON types, keeping integers apart from
/// decimals and adding calendar dates and timestamps so that constants
/// typed by the parser compare against documents without loss.
///
/// # Examples
///
/// ```
/// use sift_lang::Value;
///
/// let document = Value::from(serde_json::json!({"age": 42, "price": 9.99}));
/// assert_eq!(document.get("age"), Some(&Value::Integer(42)));
/// assert_eq!(document.get("price").and_then(Value::as_decimal).map(|d| d.to_string()), Some("9.99".to_string()));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// JSON null, also the value of a missing field
    Null,

    /// JSON boolean (true/false)
    Boolean(bool),

    /// Integer number (preserved separately from decimals)
    Integer(i64),

    /// Exact decimal number
    Decimal(Decimal),

    /// UTF-8 string
    String(String),

    /// Calendar date
    Date(NaiveDate),

    /// Timestamp with offset
    DateTime(DateTime<FixedOffset>),

    /// Array of values
    Array(Vec<Value>),

    /// Object with string keys, ordered by key
    Object(BTreeMap<String, Value>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Decimal(_) => "decimal",
            Value::String(_) => "string",
            Value::Date(_) => "date",
            Value::DateTime(_) => "datetime",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Field of an object.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Object(fields) => fields.get(key),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as decimal (integers widen)
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Value::Integer(n) => Some(Decimal::from(*n)),
            Value::Decimal(d) => Some(*d),
            _ => None,
        }
    }

    /// Get as timestamp: dates are midnight UTC, strings are parsed as
    /// RFC 3339 timestamps or `YYYY-MM-DD` dates.
    pub fn as_datetime(&self) -> Option<DateTime<FixedOffset>> {
        match self {
            Value::DateTime(timestamp) => Some(*timestamp),
            Value::Date(date) => Some(midnight(*date)),
            Value::String(s) => DateTime::parse_from_rfc3339(s).ok().or_else(|| {
                NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .ok()
                    .map(midnight)
            }),
            _ => None,
        }
    }

    /// Orders two values of comparable types.
    ///
    /// Numbers compare across integers and decimals. When either side is a
    /// date or timestamp, both sides compare as timestamps. Values of
    /// unrelated types are unordered.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Null, Value::Null) => Some(Ordering::Equal),
            (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
            (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
            (Value::Integer(_) | Value::Decimal(_), Value::Integer(_) | Value::Decimal(_)) => {
                Some(self.as_decimal()?.cmp(&other.as_decimal()?))
            }
            (Value::Date(_) | Value::DateTime(_), _) | (_, Value::Date(_) | Value::DateTime(_)) => {
                Some(self.as_datetime()?.cmp(&other.as_datetime()?))
            }
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Array(a), Value::Array(b)) if a.len() == b.len() => {
                for (x, y) in a.iter().zip(b) {
                    match x.compare(y)? {
                        Ordering::Equal => continue,
                        unequal => return Some(unequal),
                    }
                }
                Some(Ordering::Equal)
            }
            (Value::Object(_), Value::Object(_)) if self == other => Some(Ordering::Equal),
            _ => None,
        }
    }

    pub fn equals(&self, other: &Value) -> bool {
        self.compare(other) == Some(Ordering::Equal)
    }

    /// Total order for sorting.
    ///
    /// Values of different type classes order by class: null, boolean,
    /// number, date/time, string, array, object. Within a class numbers
    /// compare across integers and decimals, dates as timestamps, arrays
    /// and objects element by element.
    pub fn sort_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
            (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
            (Value::Integer(_) | Value::Decimal(_), Value::Integer(_) | Value::Decimal(_)) => {
                self.as_decimal().cmp(&other.as_decimal())
            }
            (Value::Date(_) | Value::DateTime(_), Value::Date(_) | Value::DateTime(_)) => {
                self.as_datetime().cmp(&other.as_datetime())
            }
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Array(a), Value::Array(b)) => a
                .iter()
                .zip(b)
                .map(|(x, y)| x.sort_cmp(y))
                .find(|ordering| ordering.is_ne())
                .unwrap_or_else(|| a.len().cmp(&b.len())),
            (Value::Object(a), Value::Object(b)) => a
                .iter()
                .zip(b)
                .map(|((ka, va), (kb, vb))| ka.cmp(kb).then_with(|| va.sort_cmp(vb)))
                .find(|ordering| ordering.is_ne())
                .unwrap_or_else(|| a.len().cmp(&b.len())),
            _ => self.type_rank().cmp(&other.type_rank()),
        }
    }

    fn type_rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Boolean(_) => 1,
            Value::Integer(_) | Value::Decimal(_) => 2,
            Value::Date(_) | Value::DateTime(_) => 3,
            Value::String(_) => 4,
            Value::Array(_) => 5,
            Value::Object(_) => 6,
        }
    }
}

fn midnight(date: NaiveDate) -> DateTime<FixedOffset> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)).into()
}

impl From<&Literal> for Value {
    fn from(literal: &Literal) -> Self {
        match literal {
            Literal::Null => Value::Null,
            Literal::Boolean(b) => Value::Boolean(*b),
            Literal::Integer(n) => Value::Integer(*n),
            Literal::Decimal(d) => Value::Decimal(*d),
            Literal::String(s) => Value::String(s.clone()),
            Literal::Date(date) => Value::Date(*date),
            Literal::DateTime(timestamp) => Value::DateTime(*timestamp),
            Literal::Object(map) => Value::from(serde_json::Value::Object(map.clone())),
            Literal::Array(items) => Value::from(serde_json::Value::Array(items.clone())),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => Decimal::from_str(&n.to_string())
                    .or_else(|_| Decimal::from_scientific(&n.to_string()))
                    .ok()
                    .or_else(|| n.as_f64().and_then(Decimal::from_f64))
                    .map(Value::Decimal)
                    .unwrap_or(Value::Null),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(arr) => Value::Array(arr.into_iter().map(Value::from).collect()),
            serde_json::Value::Object(obj) => {
                Value::Object(obj.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(v: Value) -> Self {
        match v {
            Value::Null => serde_json::Value::Null,
            Value::Boolean(b) => serde_json::Value::Bool(b),
            Value::Integer(i) => serde_json::Value::Number(i.into()),
            Value::Decimal(d) => match d.is_integer().then(|| d.to_i64()).flatten() {
                Some(i) => serde_json::Value::Number(i.into()),
                None => d
                    .to_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map(serde_json::Value::Number)
                    .unwrap_or(serde_json::Value::Null),
            },
            Value::String(s) => serde_json::Value::String(s),
            Value::Date(date) => serde_json::Value::String(date.format("%Y-%m-%d").to_string()),
            Value::DateTime(timestamp) => serde_json::Value::String(timestamp.to_rfc3339()),
            Value::Array(arr) => {
                serde_json::Value::Array(arr.into_iter().map(serde_json::Value::from).collect())
            }
            Value::Object(obj) => serde_json::Value::Object(
                obj.into_iter()
                    .map(|(k, v)| (k, serde_json::Value::from(v)))
                    .collect(),
            ),
        }
    }
}
