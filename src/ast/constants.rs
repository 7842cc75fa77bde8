use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate};
use rust_decimal::Decimal;

use crate::ast::Metadata;

/// Value of a literal constant, typed by the parser.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Boolean(bool),
    Integer(i64),
    Decimal(Decimal),
    String(String),
    /// A string literal read as a calendar date because the schema expected one
    Date(NaiveDate),
    /// A string literal read as a timestamp because the schema expected one
    DateTime(DateTime<FixedOffset>),
    /// Object literal decoded from its balanced source text
    Object(serde_json::Map<String, serde_json::Value>),
    /// Array literal decoded from its balanced source text
    Array(Vec<serde_json::Value>),
}

/// The type of a literal, used when reporting mismatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LiteralType {
    Null,
    Boolean,
    Integer,
    Decimal,
    String,
    Date,
    DateTime,
    Object,
    Array,
}

impl Literal {
    pub fn literal_type(&self) -> LiteralType {
        match self {
            Literal::Null => LiteralType::Null,
            Literal::Boolean(_) => LiteralType::Boolean,
            Literal::Integer(_) => LiteralType::Integer,
            Literal::Decimal(_) => LiteralType::Decimal,
            Literal::String(_) => LiteralType::String,
            Literal::Date(_) => LiteralType::Date,
            Literal::DateTime(_) => LiteralType::DateTime,
            Literal::Object(_) => LiteralType::Object,
            Literal::Array(_) => LiteralType::Array,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Literal::Null)
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Literal::Integer(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for LiteralType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LiteralType::Null => "null",
            LiteralType::Boolean => "boolean",
            LiteralType::Integer => "integer",
            LiteralType::Decimal => "decimal",
            LiteralType::String => "string",
            LiteralType::Date => "date",
            LiteralType::DateTime => "datetime",
            LiteralType::Object => "object",
            LiteralType::Array => "array",
        };
        f.write_str(name)
    }
}

/// A literal constant together with the exact source text it was read from.
///
/// # Examples
/// ```text
/// 42
/// "2024-01-31"
/// {"name": "x"}
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Constant {
    pub value: Literal,
    pub text: String,
    pub metadata: Metadata,
}

impl Constant {
    pub fn new(value: Literal, text: impl Into<String>) -> Self {
        Constant {
            value,
            text: text.into(),
            metadata: Metadata::synthetic(),
        }
    }
}
