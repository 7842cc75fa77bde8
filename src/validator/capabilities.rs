//! Capability checks driven by per-field schema extensions.
//!
//! Under a filter, the field path of a comparison must list the comparison
//! (and field function, if any) in its `filter` extension. Under a sort, the
//! field must not be marked `sortable: false`.

use crate::{
    ast::{ComparisonOperator, FieldFunctionName, NodeKind},
    schema::{resolve_path, FILTER_CAPABILITY},
    validator::{ContractViolation, Rule, RuleContext, RuleEngine, ValidationErrorKind},
    visitor::VisitState,
};

pub(super) fn register(engine: &mut RuleEngine<'_>) {
    engine.register(OpenScope {
        kind: NodeKind::Filter,
    });
    engine.register(OpenScope {
        kind: NodeKind::Sort,
    });
    engine.register(RecordComparison);
    engine.register(RecordFunction);
    engine.register(CheckCapability);
}

pub(super) fn open_filter_scope(state: &mut VisitState) {
    state.context.enter(CapabilityScope::new(Mode::Filter));
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Filter,
    Sort,
}

#[derive(Debug)]
struct CapabilityScope {
    mode: Mode,
    comparison: Option<ComparisonOperator>,
    function: Option<FieldFunctionName>,
}

impl CapabilityScope {
    fn new(mode: Mode) -> Self {
        CapabilityScope {
            mode,
            comparison: None,
            function: None,
        }
    }
}

struct OpenScope {
    kind: NodeKind,
}

impl Rule for OpenScope {
    fn kind(&self) -> NodeKind {
        self.kind
    }

    fn enter<'a>(&self, cx: &mut RuleContext<'a, '_>) -> Result<(), ContractViolation> {
        let mode = match cx.node.kind() {
            NodeKind::Filter => Mode::Filter,
            NodeKind::Sort => Mode::Sort,
            _ => return Err(cx.wrong_node::<Self>(self.kind)),
        };
        cx.state.context.enter(CapabilityScope::new(mode));
        Ok(())
    }

    fn exit<'a>(&self, cx: &mut RuleContext<'a, '_>) -> Result<(), ContractViolation> {
        cx.state.context.exit::<CapabilityScope>()?;
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
        if let Some(scope) = cx.state.context.find_mut::<CapabilityScope>() {
            scope.comparison = Some(comparison.operator);
        }
        Ok(())
    }

    fn exit<'a>(&self, cx: &mut RuleContext<'a, '_>) -> Result<(), ContractViolation> {
        if let Some(scope) = cx.state.context.find_mut::<CapabilityScope>() {
            scope.comparison = None;
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
        if let Some(scope) = cx.state.context.find_mut::<CapabilityScope>() {
            scope.function = Some(function.function);
        }
        Ok(())
    }

    fn exit<'a>(&self, cx: &mut RuleContext<'a, '_>) -> Result<(), ContractViolation> {
        if let Some(scope) = cx.state.context.find_mut::<CapabilityScope>() {
            scope.function = None;
        }
        Ok(())
    }
}

struct CheckCapability;

impl Rule for CheckCapability {
    fn kind(&self) -> NodeKind {
        NodeKind::FieldPath
    }

    fn enter<'a>(&self, cx: &mut RuleContext<'a, '_>) -> Result<(), ContractViolation> {
        let path = cx
            .node
            .as_field_path()
            .ok_or_else(|| cx.wrong_node::<Self>(NodeKind::FieldPath))?;

        let (mode, comparison, function) = match cx.state.context.find::<CapabilityScope>() {
            Some(scope) => (scope.mode, scope.comparison, scope.function),
            None => return Ok(()),
        };
        let Some(descriptor) = cx.root().and_then(|root| resolve_path(root, path).ok()) else {
            return Ok(());
        };

        let finding = match (mode, comparison) {
            (Mode::Filter, Some(comparison)) => match descriptor.capabilities() {
                Ok(Some(capabilities))
                    if !capabilities.allows(comparison.name(), function.map(|f| f.name())) =>
                {
                    Some(ValidationErrorKind::UnsupportedOperation {
                        comparison,
                        function,
                        path: path.to_string(),
                    })
                }
                Ok(_) => None,
                Err(e) => Some(ValidationErrorKind::InvalidExtension {
                    key: FILTER_CAPABILITY,
                    path: path.to_string(),
                    reason: e.to_string(),
                }),
            },
            (Mode::Sort, _) if !descriptor.sortable() => Some(ValidationErrorKind::NotSortable {
                path: path.to_string(),
            }),
            _ => None,
        };

        if let Some(finding) = finding {
            cx.report(finding);
        }
        Ok(())
    }
}
