use std::fmt;

use crate::ast::{FieldPath, Metadata};

/// Fixed unary transforms applicable to a field path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldFunctionName {
    // Date parts
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
    // Rounding
    Round,
    Floor,
    Ceiling,
    // Case conversion
    ToLower,
    ToUpper,
    /// Null test
    IsNull,
}

impl FieldFunctionName {
    pub const ALL: [FieldFunctionName; 12] = [
        FieldFunctionName::Year,
        FieldFunctionName::Month,
        FieldFunctionName::Day,
        FieldFunctionName::Hour,
        FieldFunctionName::Minute,
        FieldFunctionName::Second,
        FieldFunctionName::Round,
        FieldFunctionName::Floor,
        FieldFunctionName::Ceiling,
        FieldFunctionName::ToLower,
        FieldFunctionName::ToUpper,
        FieldFunctionName::IsNull,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|function| function.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            FieldFunctionName::Year => "year",
            FieldFunctionName::Month => "month",
            FieldFunctionName::Day => "day",
            FieldFunctionName::Hour => "hour",
            FieldFunctionName::Minute => "minute",
            FieldFunctionName::Second => "second",
            FieldFunctionName::Round => "round",
            FieldFunctionName::Floor => "floor",
            FieldFunctionName::Ceiling => "ceiling",
            FieldFunctionName::ToLower => "tolower",
            FieldFunctionName::ToUpper => "toupper",
            FieldFunctionName::IsNull => "isnull",
        }
    }

    pub fn is_date_part(self) -> bool {
        matches!(
            self,
            FieldFunctionName::Year
                | FieldFunctionName::Month
                | FieldFunctionName::Day
                | FieldFunctionName::Hour
                | FieldFunctionName::Minute
                | FieldFunctionName::Second
        )
    }
}

impl fmt::Display for FieldFunctionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A field function applied to a path.
///
/// # Examples
/// ```text
/// year(created)
/// tolower(address.city)
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFunction {
    pub function: FieldFunctionName,
    pub path: FieldPath,
    pub metadata: Metadata,
}

impl FieldFunction {
    pub fn new(function: FieldFunctionName, path: FieldPath) -> Self {
        FieldFunction {
            function,
            path,
            metadata: Metadata::synthetic(),
        }
    }
}

/// Left-hand side of a comparison or a sort key.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldOperand {
    Path(FieldPath),
    Function(FieldFunction),
}

impl FieldOperand {
    /// The path the operand reads, underneath any field function.
    pub fn path(&self) -> &FieldPath {
        match self {
            FieldOperand::Path(path) => path,
            FieldOperand::Function(function) => &function.path,
        }
    }

    pub fn function(&self) -> Option<FieldFunctionName> {
        match self {
            FieldOperand::Path(_) => None,
            FieldOperand::Function(function) => Some(function.function),
        }
    }
}

impl fmt::Display for FieldOperand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldOperand::Path(path) => write!(f, "{}", path),
            FieldOperand::Function(function) => {
                write!(f, "{}({})", function.function, function.path)
            }
        }
    }
}
