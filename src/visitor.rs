//! AST visitor framework.
//!
//! Provides generic traversal of the AST with `enter`/`exit` hooks around
//! every node. Backends (the validator, the printer, the predicate compiler)
//! implement [`Visitor`] and never touch the AST itself.
//!
//! # Design
//!
//! Default `visit_*` implementations call the matching `walk_*` function,
//! which visits the node's children. Every `walk_*` goes through
//! [`on_visit`], so `enter` and `exit` nest strictly: all of a node's
//! subtree is visited between its `enter` and its `exit`, and `exit` runs
//! even when visiting a child failed.
//!
//! Each traversal owns a [`VisitState`] with its own [`ContextStack`],
//! separate from the parser's, and a cooperative [`Cancellation`] signal.
//! The framework never polls the signal; visitors that do slow work observe it.
//!
//! # Example
//!
//! ```text
//! struct CountComparisons(usize);
//!
//! impl<'ast> Visitor<'ast> for CountComparisons {
//!     type Error = std::convert::Infallible;
//!
//!     fn enter(&mut self, node: NodeRef<'ast>, _: &mut VisitState) -> Result<(), Self::Error> {
//!         if node.kind() == NodeKind::Comparison {
//!             self.0 += 1;
//!         }
//!         Ok(())
//!     }
//! }
//! ```

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use crate::{
    ast::{
        BooleanExpression, Constant, FieldFunction, FieldOperand, FieldPath, FieldReference,
        NodeRef, Parameter, Request, SortExpression,
    },
    context::ContextStack,
};

/// Cooperative cancellation signal shared by every clone.
#[derive(Debug, Clone, Default)]
pub struct Cancellation(Arc<AtomicBool>);

impl Cancellation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Per-traversal state.
#[derive(Debug, Default)]
pub struct VisitState {
    pub context: ContextStack,
    cancellation: Cancellation,
}

impl VisitState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancellation(cancellation: Cancellation) -> Self {
        VisitState {
            context: ContextStack::new(),
            cancellation,
        }
    }

    pub fn cancellation(&self) -> &Cancellation {
        &self.cancellation
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}

// Visitor Trait

/// AST visitor.
///
/// Override `enter`/`exit` to observe every node, or a `visit_*` method to
/// change how one node family is traversed. Call the matching `walk_*`
/// function from an override to continue into the children.
pub trait Visitor<'ast> {
    type Error;

    /// Called before a node's children are visited.
    fn enter(&mut self, _node: NodeRef<'ast>, _state: &mut VisitState) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Called after a node's children were visited, whether or not that succeeded.
    fn exit(&mut self, _node: NodeRef<'ast>, _state: &mut VisitState) -> Result<(), Self::Error> {
        Ok(())
    }

    fn visit_request(
        &mut self,
        request: &'ast Request,
        state: &mut VisitState,
    ) -> Result<(), Self::Error> {
        walk_request(self, request, state)
    }

    fn visit_parameter(
        &mut self,
        parameter: &'ast Parameter,
        state: &mut VisitState,
    ) -> Result<(), Self::Error> {
        walk_parameter(self, parameter, state)
    }

    fn visit_sort_expression(
        &mut self,
        key: &'ast SortExpression,
        state: &mut VisitState,
    ) -> Result<(), Self::Error> {
        walk_sort_expression(self, key, state)
    }

    fn visit_boolean_expression(
        &mut self,
        expression: &'ast BooleanExpression,
        state: &mut VisitState,
    ) -> Result<(), Self::Error> {
        walk_boolean_expression(self, expression, state)
    }

    fn visit_field_function(
        &mut self,
        function: &'ast FieldFunction,
        state: &mut VisitState,
    ) -> Result<(), Self::Error> {
        walk_field_function(self, function, state)
    }

    fn visit_field_path(
        &mut self,
        path: &'ast FieldPath,
        state: &mut VisitState,
    ) -> Result<(), Self::Error> {
        walk_field_path(self, path, state)
    }

    fn visit_field_reference(
        &mut self,
        reference: &'ast FieldReference,
        state: &mut VisitState,
    ) -> Result<(), Self::Error> {
        walk_field_reference(self, reference, state)
    }

    fn visit_constant(
        &mut self,
        constant: &'ast Constant,
        state: &mut VisitState,
    ) -> Result<(), Self::Error> {
        walk_constant(self, constant, state)
    }
}

/// Runs `body` between `enter` and `exit` for `node`.
///
/// `exit` is called even when `body` fails; the body's error is returned in
/// that case. When `enter` fails, neither `body` nor `exit` runs.
pub fn on_visit<'ast, V, F>(
    visitor: &mut V,
    node: NodeRef<'ast>,
    state: &mut VisitState,
    body: F,
) -> Result<(), V::Error>
where
    V: Visitor<'ast> + ?Sized,
    F: FnOnce(&mut V, &mut VisitState) -> Result<(), V::Error>,
{
    visitor.enter(node, state)?;
    let result = body(visitor, state);
    let exited = visitor.exit(node, state);
    result.and(exited)
}

// Walk Functions

pub fn walk_request<'ast, V: Visitor<'ast> + ?Sized>(
    visitor: &mut V,
    request: &'ast Request,
    state: &mut VisitState,
) -> Result<(), V::Error> {
    on_visit(visitor, NodeRef::Request(request), state, |v, state| {
        for parameter in &request.parameters {
            v.visit_parameter(parameter, state)?;
        }
        Ok(())
    })
}

pub fn walk_parameter<'ast, V: Visitor<'ast> + ?Sized>(
    visitor: &mut V,
    parameter: &'ast Parameter,
    state: &mut VisitState,
) -> Result<(), V::Error> {
    on_visit(visitor, NodeRef::Parameter(parameter), state, |v, state| {
        match parameter {
            Parameter::Filter(filter) => v.visit_boolean_expression(&filter.predicate, state),
            Parameter::Sort(sort) => {
                for key in &sort.keys {
                    v.visit_sort_expression(key, state)?;
                }
                Ok(())
            }
            Parameter::Skip(paging) | Parameter::Limit(paging) => {
                v.visit_constant(&paging.amount, state)
            }
            Parameter::Count(_) => Ok(()),
            Parameter::Input(input) => v.visit_constant(&input.value, state),
        }
    })
}

pub fn walk_sort_expression<'ast, V: Visitor<'ast> + ?Sized>(
    visitor: &mut V,
    key: &'ast SortExpression,
    state: &mut VisitState,
) -> Result<(), V::Error> {
    on_visit(visitor, NodeRef::SortExpression(key), state, |v, state| {
        walk_operand(v, &key.operand, state)
    })
}

pub fn walk_boolean_expression<'ast, V: Visitor<'ast> + ?Sized>(
    visitor: &mut V,
    expression: &'ast BooleanExpression,
    state: &mut VisitState,
) -> Result<(), V::Error> {
    on_visit(
        visitor,
        NodeRef::BooleanExpression(expression),
        state,
        |v, state| match expression {
            BooleanExpression::And(binary) | BooleanExpression::Or(binary) => {
                v.visit_boolean_expression(&binary.left, state)?;
                v.visit_boolean_expression(&binary.right, state)
            }
            BooleanExpression::Not(not) => v.visit_boolean_expression(&not.operand, state),
            BooleanExpression::Comparison(comparison) => {
                walk_operand(v, &comparison.left, state)?;
                v.visit_constant(&comparison.right, state)
            }
            BooleanExpression::Quantifier(quantifier) => {
                v.visit_field_path(&quantifier.collection, state)?;
                v.visit_boolean_expression(&quantifier.predicate, state)
            }
        },
    )
}

/// Visits a field operand: the field function if there is one, otherwise the path.
pub fn walk_operand<'ast, V: Visitor<'ast> + ?Sized>(
    visitor: &mut V,
    operand: &'ast FieldOperand,
    state: &mut VisitState,
) -> Result<(), V::Error> {
    match operand {
        FieldOperand::Path(path) => visitor.visit_field_path(path, state),
        FieldOperand::Function(function) => visitor.visit_field_function(function, state),
    }
}

pub fn walk_field_function<'ast, V: Visitor<'ast> + ?Sized>(
    visitor: &mut V,
    function: &'ast FieldFunction,
    state: &mut VisitState,
) -> Result<(), V::Error> {
    on_visit(visitor, NodeRef::FieldFunction(function), state, |v, state| {
        v.visit_field_path(&function.path, state)
    })
}

pub fn walk_field_path<'ast, V: Visitor<'ast> + ?Sized>(
    visitor: &mut V,
    path: &'ast FieldPath,
    state: &mut VisitState,
) -> Result<(), V::Error> {
    on_visit(visitor, NodeRef::FieldPath(path), state, |v, state| {
        for segment in &path.segments {
            v.visit_field_reference(segment, state)?;
        }
        Ok(())
    })
}

pub fn walk_field_reference<'ast, V: Visitor<'ast> + ?Sized>(
    visitor: &mut V,
    reference: &'ast FieldReference,
    state: &mut VisitState,
) -> Result<(), V::Error> {
    on_visit(visitor, NodeRef::FieldReference(reference), state, |_, _| Ok(()))
}

pub fn walk_constant<'ast, V: Visitor<'ast> + ?Sized>(
    visitor: &mut V,
    constant: &'ast Constant,
    state: &mut VisitState,
) -> Result<(), V::Error> {
    on_visit(visitor, NodeRef::Constant(constant), state, |_, _| Ok(()))
}

impl<'ast> NodeRef<'ast> {
    /// Dispatches to the `visit_*` method for this node's family.
    pub fn accept<V: Visitor<'ast> + ?Sized>(
        self,
        visitor: &mut V,
        state: &mut VisitState,
    ) -> Result<(), V::Error> {
        match self {
            NodeRef::Request(request) => visitor.visit_request(request, state),
            NodeRef::Parameter(parameter) => visitor.visit_parameter(parameter, state),
            NodeRef::SortExpression(key) => visitor.visit_sort_expression(key, state),
            NodeRef::BooleanExpression(expression) => {
                visitor.visit_boolean_expression(expression, state)
            }
            NodeRef::FieldFunction(function) => visitor.visit_field_function(function, state),
            NodeRef::FieldPath(path) => visitor.visit_field_path(path, state),
            NodeRef::FieldReference(reference) => visitor.visit_field_reference(reference, state),
            NodeRef::Constant(constant) => visitor.visit_constant(constant, state),
        }
    }
}
