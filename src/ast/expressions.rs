use std::sync::Arc;

use crate::ast::{ComparisonOperator, Constant, FieldOperand, FieldPath, Metadata, QuantifierKind};

/// Boolean expression: a combinator, a comparison or a quantifier.
///
/// N-ary `and`/`or` are folded into left-associated binary nodes, so
/// `and(a, b, c)` parses as `And(And(a, b), c)`.
#[derive(Debug, Clone, PartialEq)]
pub enum BooleanExpression {
    /// Logical conjunction (`and`)
    And(Binary),

    /// Logical disjunction (`or`)
    Or(Binary),

    /// Logical negation (`not`)
    Not(Not),

    /// Comparison of a field operand against a constant
    ///
    /// # Example
    /// ```text
    /// ge(age, 18)
    /// ```
    Comparison(Comparison),

    /// Collection quantifier
    ///
    /// # Example
    /// ```text
    /// any(tags, eq($it, "admin"))
    /// ```
    Quantifier(Quantifier),
}

impl BooleanExpression {
    pub fn metadata(&self) -> &Metadata {
        match self {
            BooleanExpression::And(binary) | BooleanExpression::Or(binary) => &binary.metadata,
            BooleanExpression::Not(not) => &not.metadata,
            BooleanExpression::Comparison(comparison) => &comparison.metadata,
            BooleanExpression::Quantifier(quantifier) => &quantifier.metadata,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Binary {
    pub left: Box<BooleanExpression>,
    pub right: Box<BooleanExpression>,
    pub metadata: Metadata,
}

impl Binary {
    pub fn new(left: BooleanExpression, right: BooleanExpression) -> Self {
        Binary {
            left: Box::new(left),
            right: Box::new(right),
            metadata: Metadata::synthetic(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Not {
    pub operand: Box<BooleanExpression>,
    pub metadata: Metadata,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub operator: ComparisonOperator,
    pub left: FieldOperand,
    pub right: Constant,
    pub metadata: Metadata,
}

impl Comparison {
    pub fn new(operator: ComparisonOperator, left: FieldOperand, right: Constant) -> Self {
        Comparison {
            operator,
            left,
            right,
            metadata: Metadata::synthetic(),
        }
    }
}

/// `any`/`all` over a collection path.
///
/// The collection path is shared so `$it` markers inside the predicate can
/// point back at it without owning it.
#[derive(Debug, Clone, PartialEq)]
pub struct Quantifier {
    pub kind: QuantifierKind,
    pub collection: Arc<FieldPath>,
    pub predicate: Box<BooleanExpression>,
    pub metadata: Metadata,
}
