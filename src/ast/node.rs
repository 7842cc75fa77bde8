use std::fmt;

use crate::ast::{
    BooleanExpression, Comparison, Constant, CurrentItem, Field, FieldFunction, FieldPath,
    FieldReference, Metadata, Parameter, Quantifier, QuantifierKind, Request, SortDirection,
    SortExpression,
};

/// Type tag of every node family, abstract and concrete.
///
/// Each kind declares its parent, forming the chain a validation rule is
/// matched against: a rule registered for `BooleanExpression` fires for
/// `And`, `Comparison`, `Any` and every other boolean node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Node,

    Request,

    Parameter,
    Filter,
    Sort,
    Skip,
    Limit,
    Count,
    Input,

    SortExpression,
    Ascending,
    Descending,

    BooleanExpression,
    Logical,
    And,
    Or,
    Not,
    Comparison,
    Quantifier,
    Any,
    All,

    FieldFunction,
    FieldPath,

    FieldReference,
    Field,
    CurrentItem,

    Constant,
}

impl NodeKind {
    pub fn parent(self) -> Option<NodeKind> {
        use NodeKind::*;
        match self {
            Node => None,
            Request | Parameter | SortExpression | BooleanExpression | FieldFunction
            | FieldPath | FieldReference | Constant => Some(Node),
            Filter | Sort | Skip | Limit | Count | Input => Some(Parameter),
            Ascending | Descending => Some(SortExpression),
            Logical | Comparison | Quantifier => Some(BooleanExpression),
            And | Or | Not => Some(Logical),
            Any | All => Some(Quantifier),
            Field | CurrentItem => Some(FieldReference),
        }
    }

    /// This kind followed by its ancestors, most specific first.
    pub fn ancestry(self) -> Vec<NodeKind> {
        let mut chain = vec![self];
        let mut current = self;
        while let Some(parent) = current.parent() {
            chain.push(parent);
            current = parent;
        }
        chain
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Borrowed reference to any AST node.
#[derive(Debug, Clone, Copy)]
pub enum NodeRef<'a> {
    Request(&'a Request),
    Parameter(&'a Parameter),
    SortExpression(&'a SortExpression),
    BooleanExpression(&'a BooleanExpression),
    FieldFunction(&'a FieldFunction),
    FieldPath(&'a FieldPath),
    FieldReference(&'a FieldReference),
    Constant(&'a Constant),
}

impl<'a> NodeRef<'a> {
    /// The concrete kind of the referenced node.
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeRef::Request(_) => NodeKind::Request,
            NodeRef::Parameter(parameter) => match parameter {
                Parameter::Filter(_) => NodeKind::Filter,
                Parameter::Sort(_) => NodeKind::Sort,
                Parameter::Skip(_) => NodeKind::Skip,
                Parameter::Limit(_) => NodeKind::Limit,
                Parameter::Count(_) => NodeKind::Count,
                Parameter::Input(_) => NodeKind::Input,
            },
            NodeRef::SortExpression(key) => match key.direction {
                SortDirection::Ascending => NodeKind::Ascending,
                SortDirection::Descending => NodeKind::Descending,
            },
            NodeRef::BooleanExpression(expression) => match expression {
                BooleanExpression::And(_) => NodeKind::And,
                BooleanExpression::Or(_) => NodeKind::Or,
                BooleanExpression::Not(_) => NodeKind::Not,
                BooleanExpression::Comparison(_) => NodeKind::Comparison,
                BooleanExpression::Quantifier(quantifier) => match quantifier.kind {
                    QuantifierKind::Any => NodeKind::Any,
                    QuantifierKind::All => NodeKind::All,
                },
            },
            NodeRef::FieldFunction(_) => NodeKind::FieldFunction,
            NodeRef::FieldPath(_) => NodeKind::FieldPath,
            NodeRef::FieldReference(reference) => match reference {
                FieldReference::Field(_) => NodeKind::Field,
                FieldReference::CurrentItem(_) => NodeKind::CurrentItem,
            },
            NodeRef::Constant(_) => NodeKind::Constant,
        }
    }

    pub fn metadata(&self) -> &'a Metadata {
        match *self {
            NodeRef::Request(request) => &request.metadata,
            NodeRef::Parameter(parameter) => parameter.metadata(),
            NodeRef::SortExpression(key) => &key.metadata,
            NodeRef::BooleanExpression(expression) => expression.metadata(),
            NodeRef::FieldFunction(function) => &function.metadata,
            NodeRef::FieldPath(path) => &path.metadata,
            NodeRef::FieldReference(reference) => reference.metadata(),
            NodeRef::Constant(constant) => &constant.metadata,
        }
    }

    pub fn as_request(&self) -> Option<&'a Request> {
        match *self {
            NodeRef::Request(request) => Some(request),
            _ => None,
        }
    }

    pub fn as_parameter(&self) -> Option<&'a Parameter> {
        match *self {
            NodeRef::Parameter(parameter) => Some(parameter),
            _ => None,
        }
    }

    pub fn as_sort_expression(&self) -> Option<&'a SortExpression> {
        match *self {
            NodeRef::SortExpression(key) => Some(key),
            _ => None,
        }
    }

    pub fn as_boolean_expression(&self) -> Option<&'a BooleanExpression> {
        match *self {
            NodeRef::BooleanExpression(expression) => Some(expression),
            _ => None,
        }
    }

    pub fn as_comparison(&self) -> Option<&'a Comparison> {
        match *self {
            NodeRef::BooleanExpression(BooleanExpression::Comparison(comparison)) => {
                Some(comparison)
            }
            _ => None,
        }
    }

    pub fn as_quantifier(&self) -> Option<&'a Quantifier> {
        match *self {
            NodeRef::BooleanExpression(BooleanExpression::Quantifier(quantifier)) => {
                Some(quantifier)
            }
            _ => None,
        }
    }

    pub fn as_field_function(&self) -> Option<&'a FieldFunction> {
        match *self {
            NodeRef::FieldFunction(function) => Some(function),
            _ => None,
        }
    }

    pub fn as_field_path(&self) -> Option<&'a FieldPath> {
        match *self {
            NodeRef::FieldPath(path) => Some(path),
            _ => None,
        }
    }

    pub fn as_field(&self) -> Option<&'a Field> {
        match *self {
            NodeRef::FieldReference(FieldReference::Field(field)) => Some(field),
            _ => None,
        }
    }

    pub fn as_current_item(&self) -> Option<&'a CurrentItem> {
        match *self {
            NodeRef::FieldReference(FieldReference::CurrentItem(item)) => Some(item),
            _ => None,
        }
    }

    pub fn as_constant(&self) -> Option<&'a Constant> {
        match *self {
            NodeRef::Constant(constant) => Some(constant),
            _ => None,
        }
    }
}
