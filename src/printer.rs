//! Canonical text form of a parsed request.
//!
//! The printer is a [`Visitor`] writing to any [`fmt::Write`] sink.
//! Arguments are separated by `", "`, field names that are not identifiers
//! use bracket form and left-nested chains of the same junction are written
//! as one n-ary call, so printing and re-parsing yields an equal tree.
//! Cancellation is checked before every write.

use std::fmt;

use thiserror::Error;

use crate::{
    ast::{
        BooleanExpression, Constant, FieldFunction, FieldOperand, FieldPath, Literal, NodeRef,
        Parameter, Request, SortExpression,
    },
    lexer::quote,
    visitor::{on_visit, Cancellation, VisitState, Visitor},
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PrintError {
    #[error("printing was cancelled")]
    Cancelled,

    #[error("failed to write output")]
    Format(#[from] fmt::Error),
}

pub struct Printer<W> {
    out: W,
}

impl<W: fmt::Write> Printer<W> {
    pub fn new(out: W) -> Self {
        Printer { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write(&mut self, state: &VisitState, text: &str) -> Result<(), PrintError> {
        if state.is_cancelled() {
            return Err(PrintError::Cancelled);
        }
        self.out.write_str(text)?;
        Ok(())
    }

    fn operand<'ast>(
        &mut self,
        operand: &'ast FieldOperand,
        state: &mut VisitState,
    ) -> Result<(), PrintError> {
        match operand {
            FieldOperand::Path(path) => self.visit_field_path(path, state),
            FieldOperand::Function(function) => self.visit_field_function(function, state),
        }
    }

    /// `name(` + arguments separated by `, ` + `)`.
    fn call<'ast, T: 'ast>(
        &mut self,
        state: &mut VisitState,
        name: &str,
        arguments: impl IntoIterator<Item = &'ast T>,
        mut each: impl FnMut(&mut Self, &'ast T, &mut VisitState) -> Result<(), PrintError>,
    ) -> Result<(), PrintError> {
        self.write(state, name)?;
        self.write(state, "(")?;
        for (index, argument) in arguments.into_iter().enumerate() {
            if index > 0 {
                self.write(state, ", ")?;
            }
            each(self, argument, state)?;
        }
        self.write(state, ")")
    }
}

impl<'ast, W: fmt::Write> Visitor<'ast> for Printer<W> {
    type Error = PrintError;

    fn visit_request(
        &mut self,
        request: &'ast Request,
        state: &mut VisitState,
    ) -> Result<(), PrintError> {
        on_visit(self, NodeRef::Request(request), state, |p, state| {
            p.call(state, &request.name, &request.parameters, |p, parameter, state| {
                p.visit_parameter(parameter, state)
            })
        })
    }

    fn visit_parameter(
        &mut self,
        parameter: &'ast Parameter,
        state: &mut VisitState,
    ) -> Result<(), PrintError> {
        on_visit(self, NodeRef::Parameter(parameter), state, |p, state| {
            let name = parameter.name();
            match parameter {
                Parameter::Filter(filter) => p.call(state, name, [&filter.predicate], |p, e, s| {
                    p.visit_boolean_expression(e, s)
                }),
                Parameter::Sort(sort) => p.call(state, name, &sort.keys, |p, key, s| {
                    p.visit_sort_expression(key, s)
                }),
                Parameter::Skip(paging) | Parameter::Limit(paging) => {
                    p.call(state, name, [&paging.amount], |p, c, s| p.visit_constant(c, s))
                }
                Parameter::Count(_) => p.call(state, name, [] as [&Constant; 0], |_, _, _| Ok(())),
                Parameter::Input(input) => {
                    p.call(state, name, [&input.value], |p, c, s| p.visit_constant(c, s))
                }
            }
        })
    }

    fn visit_sort_expression(
        &mut self,
        key: &'ast SortExpression,
        state: &mut VisitState,
    ) -> Result<(), PrintError> {
        on_visit(self, NodeRef::SortExpression(key), state, |p, state| {
            p.call(state, key.direction.name(), [&key.operand], |p, operand, s| {
                p.operand(operand, s)
            })
        })
    }

    fn visit_boolean_expression(
        &mut self,
        expression: &'ast BooleanExpression,
        state: &mut VisitState,
    ) -> Result<(), PrintError> {
        on_visit(
            self,
            NodeRef::BooleanExpression(expression),
            state,
            |p, state| match expression {
                BooleanExpression::And(_) => {
                    p.call(state, "and", junction_operands(expression), |p, e, s| {
                        p.visit_boolean_expression(e, s)
                    })
                }
                BooleanExpression::Or(_) => {
                    p.call(state, "or", junction_operands(expression), |p, e, s| {
                        p.visit_boolean_expression(e, s)
                    })
                }
                BooleanExpression::Not(not) => p.call(state, "not", [&*not.operand], |p, e, s| {
                    p.visit_boolean_expression(e, s)
                }),
                BooleanExpression::Comparison(comparison) => {
                    p.write(state, comparison.operator.name())?;
                    p.write(state, "(")?;
                    p.operand(&comparison.left, state)?;
                    p.write(state, ", ")?;
                    p.visit_constant(&comparison.right, state)?;
                    p.write(state, ")")
                }
                BooleanExpression::Quantifier(quantifier) => {
                    p.write(state, quantifier.kind.name())?;
                    p.write(state, "(")?;
                    p.visit_field_path(&quantifier.collection, state)?;
                    p.write(state, ", ")?;
                    p.visit_boolean_expression(&quantifier.predicate, state)?;
                    p.write(state, ")")
                }
            },
        )
    }

    fn visit_field_function(
        &mut self,
        function: &'ast FieldFunction,
        state: &mut VisitState,
    ) -> Result<(), PrintError> {
        on_visit(self, NodeRef::FieldFunction(function), state, |p, state| {
            p.call(state, function.function.name(), [&function.path], |p, path, s| {
                p.visit_field_path(path, s)
            })
        })
    }

    fn visit_field_path(
        &mut self,
        path: &'ast FieldPath,
        state: &mut VisitState,
    ) -> Result<(), PrintError> {
        on_visit(self, NodeRef::FieldPath(path), state, |p, state| {
            p.write(state, &path.to_string())
        })
    }

    fn visit_constant(
        &mut self,
        constant: &'ast Constant,
        state: &mut VisitState,
    ) -> Result<(), PrintError> {
        on_visit(self, NodeRef::Constant(constant), state, |p, state| {
            if constant.text.is_empty() {
                p.write(state, &render_literal(&constant.value))
            } else {
                p.write(state, &constant.text)
            }
        })
    }
}

/// Operands of a left-nested chain of the same junction, in source order.
fn junction_operands(expression: &BooleanExpression) -> Vec<&BooleanExpression> {
    let mut operands = Vec::new();
    let mut current = expression;
    loop {
        match (expression, current) {
            (BooleanExpression::And(_), BooleanExpression::And(binary))
            | (BooleanExpression::Or(_), BooleanExpression::Or(binary)) => {
                operands.push(binary.right.as_ref());
                current = &binary.left;
            }
            _ => {
                operands.push(current);
                break;
            }
        }
    }
    operands.reverse();
    operands
}

/// Source text for a literal built without one.
fn render_literal(literal: &Literal) -> String {
    match literal {
        Literal::Null => "null".to_string(),
        Literal::Boolean(value) => value.to_string(),
        Literal::Integer(value) => value.to_string(),
        Literal::Decimal(value) => value.to_string(),
        Literal::String(value) => quote(value),
        Literal::Date(date) => quote(&date.format("%Y-%m-%d").to_string()),
        Literal::DateTime(timestamp) => quote(&timestamp.to_rfc3339()),
        Literal::Object(map) => serde_json::Value::Object(map.clone()).to_string(),
        Literal::Array(items) => serde_json::Value::Array(items.clone()).to_string(),
    }
}

/// Renders `node` into `out`, observing the cancellation signal of `state`.
pub fn print_to<W: fmt::Write>(
    node: NodeRef<'_>,
    out: W,
    state: &mut VisitState,
) -> Result<W, PrintError> {
    let mut printer = Printer::new(out);
    node.accept(&mut printer, state)?;
    Ok(printer.into_inner())
}

pub fn print_request(request: &Request) -> Result<String, PrintError> {
    print_to(NodeRef::Request(request), String::new(), &mut VisitState::new())
}

pub fn print_boolean(expression: &BooleanExpression) -> Result<String, PrintError> {
    print_to(
        NodeRef::BooleanExpression(expression),
        String::new(),
        &mut VisitState::new(),
    )
}

/// Like [`print_request`], giving up once `cancellation` fires.
pub fn print_request_cancellable(
    request: &Request,
    cancellation: Cancellation,
) -> Result<String, PrintError> {
    let mut state = VisitState::with_cancellation(cancellation);
    print_to(NodeRef::Request(request), String::new(), &mut state)
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        print_to(NodeRef::Request(self), f, &mut VisitState::new())
            .map(|_| ())
            .map_err(|_| fmt::Error)
    }
}

impl fmt::Display for BooleanExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        print_to(NodeRef::BooleanExpression(self), f, &mut VisitState::new())
            .map(|_| ())
            .map_err(|_| fmt::Error)
    }
}
