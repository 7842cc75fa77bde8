//! Constant typing: the constant of a comparison must have the type the
//! schema expects for it.
//!
//! Five rules share one [`ConstantScope`] on the traversal's context stack.
//! The filter creates it, the comparison and the field function record their
//! names, the field path resolves the expected type and the constant checks
//! itself against it.

use regex::Regex;

use crate::{
    ast::{ComparisonOperator, FieldFunctionName, Literal, NodeKind},
    schema::{expected_constant, resolve_path, Expectation},
    validator::{ContractViolation, Rule, RuleContext, RuleEngine, ValidationErrorKind},
    visitor::VisitState,
};

pub(super) fn register(engine: &mut RuleEngine<'_>) {
    engine.register(OpenScope);
    engine.register(RecordComparison);
    engine.register(RecordFunction);
    engine.register(ResolveExpected);
    engine.register(CheckConstant);
}

/// Opens the scope for a bare filter validated without a request.
pub(super) fn open_scope(state: &mut VisitState) {
    state.context.enter(ConstantScope::default());
}

#[derive(Debug, Default)]
struct ConstantScope {
    comparison: Option<ComparisonOperator>,
    function: Option<FieldFunctionName>,
    path: Option<String>,
    expected: Option<Expectation>,
}

impl ConstantScope {
    fn reset(&mut self, comparison: Option<ComparisonOperator>) {
        *self = ConstantScope {
            comparison,
            ..ConstantScope::default()
        };
    }
}

struct OpenScope;

impl Rule for OpenScope {
    fn kind(&self) -> NodeKind {
        NodeKind::Filter
    }

    fn enter<'a>(&self, cx: &mut RuleContext<'a, '_>) -> Result<(), ContractViolation> {
        open_scope(cx.state);
        Ok(())
    }

    fn exit<'a>(&self, cx: &mut RuleContext<'a, '_>) -> Result<(), ContractViolation> {
        cx.state.context.exit::<ConstantScope>()?;
        Ok(())
    }
}

struct RecordComparison;

impl Rule for RecordComparison {
    fn kind(&self) -> NodeKind {
        NodeKind::Comparison
    }

    fn enter<'a>(&self, cx: &mut RuleContext<'a, '_>) -> Result<(), ContractViolation> {
        let comparison = cx
            .node
            .as_comparison()
            .ok_or_else(|| cx.wrong_node::<Self>(NodeKind::Comparison))?;
        if let Some(scope) = cx.state.context.find_mut::<ConstantScope>() {
            scope.reset(Some(comparison.operator));
        }
        Ok(())
    }

    fn exit<'a>(&self, cx: &mut RuleContext<'a, '_>) -> Result<(), ContractViolation> {
        if let Some(scope) = cx.state.context.find_mut::<ConstantScope>() {
            scope.reset(None);
        }
        Ok(())
    }
}

struct RecordFunction;

impl Rule for RecordFunction {
    fn kind(&self) -> NodeKind {
        NodeKind::FieldFunction
    }

    fn enter<'a>(&self, cx: &mut RuleContext<'a, '_>) -> Result<(), ContractViolation> {
        let function = cx
            .node
            .as_field_function()
            .ok_or_else(|| cx.wrong_node::<Self>(NodeKind::FieldFunction))?;
        if let Some(scope) = cx.state.context.find_mut::<ConstantScope>()
            && scope.comparison.is_some()
        {
            scope.function = Some(function.function);
        }
        Ok(())
    }
}

/// Resolves the expected constant type from the compared path.
struct ResolveExpected;

impl Rule for ResolveExpected {
    fn kind(&self) -> NodeKind {
        NodeKind::FieldPath
    }

    fn enter<'a>(&self, cx: &mut RuleContext<'a, '_>) -> Result<(), ContractViolation> {
        let path = cx
            .node
            .as_field_path()
            .ok_or_else(|| cx.wrong_node::<Self>(NodeKind::FieldPath))?;

        let (comparison, function) = match cx.state.context.find::<ConstantScope>() {
            Some(ConstantScope {
                comparison: Some(comparison),
                function,
                path: None,
                ..
            }) => (*comparison, *function),
            _ => return Ok(()),
        };

        let field = cx.root().and_then(|root| resolve_path(root, path).ok());
        let expected = expected_constant(cx.schema, comparison, function, field);

        if let Some(scope) = cx.state.context.find_mut::<ConstantScope>() {
            scope.path = Some(path.to_string());
            scope.expected = expected;
        }
        Ok(())
    }
}

struct CheckConstant;

impl Rule for CheckConstant {
    fn kind(&self) -> NodeKind {
        NodeKind::Constant
    }

    fn enter<'a>(&self, cx: &mut RuleContext<'a, '_>) -> Result<(), ContractViolation> {
        let constant = cx
            .node
            .as_constant()
            .ok_or_else(|| cx.wrong_node::<Self>(NodeKind::Constant))?;

        let (comparison, function, path, expected) = match cx.state.context.find::<ConstantScope>() {
            Some(ConstantScope {
                comparison: Some(comparison),
                function,
                path,
                expected,
            }) => (
                *comparison,
                *function,
                path.clone().unwrap_or_default(),
                *expected,
            ),
            _ => return Ok(()),
        };

        if let Some(expected) = expected {
            if constant.value.is_null() {
                if !expected.nullable {
                    cx.report(ValidationErrorKind::NullNotAllowed {
                        comparison,
                        function,
                        path,
                    });
                }
                return Ok(());
            }

            let actual = constant.value.literal_type();
            if !expected.value_type.admits(actual) {
                cx.report(ValidationErrorKind::TypeMismatch {
                    comparison,
                    function,
                    path,
                    expected: expected.value_type,
                    actual,
                });
                return Ok(());
            }
        }

        if comparison == ComparisonOperator::Regex
            && let Literal::String(pattern) = &constant.value
            && let Err(e) = Regex::new(pattern)
        {
            cx.report(ValidationErrorKind::InvalidPattern {
                pattern: pattern.clone(),
                reason: e.to_string(),
            });
        }
        Ok(())
    }
}
