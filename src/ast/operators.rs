use std::fmt;

/// Comparison functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOperator {
    /// Equal (`eq`)
    Equal,
    /// Not equal (`ne`)
    NotEqual,
    /// Greater than (`gt`)
    GreaterThan,
    /// Greater than or equal (`ge`)
    GreaterEqual,
    /// Less than (`lt`)
    LessThan,
    /// Less than or equal (`le`)
    LessEqual,
    /// Substring test (`has`)
    Has,
    /// Prefix test (`starts`)
    StartsWith,
    /// Suffix test (`ends`)
    EndsWith,
    /// Regular expression match (`regex`)
    Regex,
}

impl ComparisonOperator {
    pub const ALL: [ComparisonOperator; 10] = [
        ComparisonOperator::Equal,
        ComparisonOperator::NotEqual,
        ComparisonOperator::GreaterThan,
        ComparisonOperator::GreaterEqual,
        ComparisonOperator::LessThan,
        ComparisonOperator::LessEqual,
        ComparisonOperator::Has,
        ComparisonOperator::StartsWith,
        ComparisonOperator::EndsWith,
        ComparisonOperator::Regex,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            ComparisonOperator::Equal => "eq",
            ComparisonOperator::NotEqual => "ne",
            ComparisonOperator::GreaterThan => "gt",
            ComparisonOperator::GreaterEqual => "ge",
            ComparisonOperator::LessThan => "lt",
            ComparisonOperator::LessEqual => "le",
            ComparisonOperator::Has => "has",
            ComparisonOperator::StartsWith => "starts",
            ComparisonOperator::EndsWith => "ends",
            ComparisonOperator::Regex => "regex",
        }
    }

    /// String-only operators.
    pub fn is_textual(self) -> bool {
        matches!(
            self,
            ComparisonOperator::Has
                | ComparisonOperator::StartsWith
                | ComparisonOperator::EndsWith
                | ComparisonOperator::Regex
        )
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Collection quantifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuantifierKind {
    /// At least one item matches (`any`)
    Any,
    /// Every item matches (`all`)
    All,
}

impl QuantifierKind {
    pub fn name(self) -> &'static str {
        match self {
            QuantifierKind::Any => "any",
            QuantifierKind::All => "all",
        }
    }
}

/// Sort directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
    /// `asc`
    Ascending,
    /// `desc`
    Descending,
}

impl SortDirection {
    pub fn name(self) -> &'static str {
        match self {
            SortDirection::Ascending => "asc",
            SortDirection::Descending => "desc",
        }
    }
}
