//! Semantic validation of parsed requests against a schema.
//!
//! [`Validator`] bundles the default rule groups on a [`RuleEngine`]:
//!
//! - request rules: unknown request name, duplicate parameters
//! - constant typing: a comparison's constant must fit the type the schema
//!   expects for it, honoring nullability
//! - capabilities: a field's `filter` extension must list the comparison
//!   (and field function) applied to it; `sortable: false` forbids sorting
//! - paths: every field exists, field function arguments fit, sort keys are
//!   scalar, quantifiers range over lists, `$it` is bound to an enclosing
//!   quantifier
//! - paging and input literals
//!
//! Findings accumulate into a [`ValidationReport`]; a [`ContractViolation`]
//! aborts the pass.

use std::fmt;

use thiserror::Error;
use tracing::debug;

use crate::{
    ast::{
        BooleanExpression, ComparisonOperator, FieldFunctionName, LiteralType, NodeRef, Request,
    },
    schema::{SchemaLookup, TypeDescriptor, ValueType},
    visitor::VisitState,
};

mod capabilities;
mod constants;
mod engine;
mod paths;
mod request;

pub use engine::{ContractViolation, Rule, RuleContext, RuleEngine};

pub(crate) use engine::RootType;

/// Renders a comparison target as written, e.g. `year(created)`.
fn target(function: &Option<FieldFunctionName>, path: &str) -> String {
    match function {
        Some(function) => format!("{}({})", function, path),
        None => path.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationErrorKind {
    #[error("unknown request '{name}'")]
    UnknownRequest { name: String },

    #[error("parameter '{name}' given more than once")]
    DuplicateParameter { name: &'static str },

    #[error("unknown field '{field}' in '{path}'")]
    UnknownField { field: String, path: String },

    #[error("'{field}' in '{path}' is not an object")]
    NotAnObject { field: String, path: String },

    #[error("null is not allowed for {} in '{comparison}'", target(.function, .path))]
    NullNotAllowed {
        comparison: ComparisonOperator,
        function: Option<FieldFunctionName>,
        path: String,
    },

    #[error(
        "'{comparison}' on {} expects {expected}, found {actual}",
        target(.function, .path)
    )]
    TypeMismatch {
        comparison: ComparisonOperator,
        function: Option<FieldFunctionName>,
        path: String,
        expected: ValueType,
        actual: LiteralType,
    },

    #[error("invalid regular expression '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("'{comparison}' is not supported on {}", target(.function, .path))]
    UnsupportedOperation {
        comparison: ComparisonOperator,
        function: Option<FieldFunctionName>,
        path: String,
    },

    #[error("invalid '{key}' extension on '{path}': {reason}")]
    InvalidExtension {
        key: &'static str,
        path: String,
        reason: String,
    },

    #[error("'{path}' is not sortable")]
    NotSortable { path: String },

    #[error("cannot sort by '{path}' of type {actual}")]
    UnsortableType { path: String, actual: ValueType },

    #[error("'{path}' is not a collection")]
    NotACollection { path: String },

    #[error("'$it' used outside of an enclosing quantifier")]
    CurrentItemOutsideQuantifier,

    #[error("'{function}' expects {expected}, but '{path}' is {actual}")]
    FunctionArgumentMismatch {
        function: FieldFunctionName,
        path: String,
        expected: ValueType,
        actual: ValueType,
    },

    #[error("invalid '{parameter}': {reason}")]
    InvalidPaging {
        parameter: &'static str,
        reason: String,
    },

    #[error("input must be an object or array literal, found {actual}")]
    InvalidInput { actual: LiteralType },
}

/// A finding, attached to the node it concerns.
#[derive(Debug, Clone)]
pub struct ValidationError<'a> {
    pub kind: ValidationErrorKind,
    pub node: NodeRef<'a>,
}

impl fmt::Display for ValidationError<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.node.metadata().span {
            Some(span) => write!(f, "{} at {}..{}", self.kind, span.start, span.end),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for ValidationError<'_> {}

/// Every finding of one validation pass.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport<'a> {
    pub errors: Vec<ValidationError<'a>>,
}

impl<'a> ValidationReport<'a> {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError<'a>> {
        self.errors.iter()
    }

    pub fn kinds(&self) -> impl Iterator<Item = &ValidationErrorKind> {
        self.errors.iter().map(|error| &error.kind)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ValidatorConfig {
    /// Largest accepted `limit`, unbounded when `None`.
    pub max_limit: Option<u64>,
}

impl ValidatorConfig {
    pub fn with_max_limit(mut self, max_limit: u64) -> Self {
        self.max_limit = Some(max_limit);
        self
    }
}

/// The default rule groups on one engine.
pub struct Validator<'s> {
    engine: RuleEngine<'s>,
}

impl<'s> Validator<'s> {
    pub fn new(schema: &'s dyn SchemaLookup) -> Self {
        Self::with_config(schema, ValidatorConfig::default())
    }

    pub fn with_config(schema: &'s dyn SchemaLookup, config: ValidatorConfig) -> Self {
        let mut engine = RuleEngine::new(schema);
        request::register(&mut engine, config);
        constants::register(&mut engine);
        capabilities::register(&mut engine);
        paths::register(&mut engine);
        Validator { engine }
    }

    pub fn validate_request<'a>(
        &mut self,
        request: &'a Request,
    ) -> Result<ValidationReport<'a>, ContractViolation> {
        debug!(request = %request.name, "validating request");
        let mut state = VisitState::new();
        let errors = self.engine.run(NodeRef::Request(request), &mut state)?;
        Ok(ValidationReport { errors })
    }

    /// Validates a bare filter whose paths resolve against `root`.
    pub fn validate_filter<'a>(
        &mut self,
        filter: &'a BooleanExpression,
        root: &TypeDescriptor,
    ) -> Result<ValidationReport<'a>, ContractViolation> {
        let mut state = VisitState::new();
        state.context.enter(RootType(Some(root.clone())));
        constants::open_scope(&mut state);
        capabilities::open_filter_scope(&mut state);

        let errors = self
            .engine
            .run(NodeRef::BooleanExpression(filter), &mut state)?;
        Ok(ValidationReport { errors })
    }
}
