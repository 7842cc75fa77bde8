use crate::ast::{BooleanExpression, Constant, FieldOperand, Metadata, SortDirection};

/// Request parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum Parameter {
    /// Boolean predicate items must satisfy
    ///
    /// # Example
    /// ```text
    /// filter(gt(age, 18))
    /// ```
    Filter(Filter),

    /// Ordered sort keys
    ///
    /// # Example
    /// ```text
    /// sort(asc(name), desc(year(created)))
    /// ```
    Sort(Sort),

    /// Number of leading items to drop (`skip(10)`)
    Skip(Paging),

    /// Maximum number of items to return (`limit(20)`)
    Limit(Paging),

    /// Request the total count (`count()`)
    Count(Count),

    /// Input marker carrying a literal payload (`input({"name": "x"})`)
    Input(Input),
}

impl Parameter {
    pub fn name(&self) -> &'static str {
        match self {
            Parameter::Filter(_) => "filter",
            Parameter::Sort(_) => "sort",
            Parameter::Skip(_) => "skip",
            Parameter::Limit(_) => "limit",
            Parameter::Count(_) => "count",
            Parameter::Input(_) => "input",
        }
    }

    pub fn metadata(&self) -> &Metadata {
        match self {
            Parameter::Filter(filter) => &filter.metadata,
            Parameter::Sort(sort) => &sort.metadata,
            Parameter::Skip(paging) | Parameter::Limit(paging) => &paging.metadata,
            Parameter::Count(count) => &count.metadata,
            Parameter::Input(input) => &input.metadata,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub predicate: BooleanExpression,
    pub metadata: Metadata,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sort {
    pub keys: Vec<SortExpression>,
    pub metadata: Metadata,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SortExpression {
    pub direction: SortDirection,
    pub operand: FieldOperand,
    pub metadata: Metadata,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Paging {
    pub amount: Constant,
    pub metadata: Metadata,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Count {
    pub metadata: Metadata,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Input {
    pub value: Constant,
    pub metadata: Metadata,
}
