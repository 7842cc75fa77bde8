use std::sync::Arc;

use crate::{
    ast::{FieldPath, FieldReference, NodeKind, NodeRef},
    schema::{resolve_path, ResolveError, ValueType},
    validator::{ContractViolation, Rule, RuleContext, RuleEngine, ValidationErrorKind},
};

pub(super) fn register(engine: &mut RuleEngine<'_>) {
    engine.register(KnownFields);
    engine.register(FunctionArgument);
    engine.register(ScalarSortKey);
    engine.register(QuantifiedCollection);
    engine.register(QuantifierScope);
    engine.register(BoundCurrentItem);
}

/// Collection path of a quantifier being visited.
#[derive(Debug)]
struct EnclosingQuantifier(Arc<FieldPath>);

/// Every segment of a path must exist in the schema.
struct KnownFields;

impl Rule for KnownFields {
    fn kind(&self) -> NodeKind {
        NodeKind::FieldPath
    }

    fn enter<'a>(&self, cx: &mut RuleContext<'a, '_>) -> Result<(), ContractViolation> {
        let path = cx
            .node
            .as_field_path()
            .ok_or_else(|| cx.wrong_node::<Self>(NodeKind::FieldPath))?;
        let Some(root) = cx.root() else {
            return Ok(());
        };

        // Faults in the collection a `$it` iterates are reported on the
        // quantifier, not on every path that uses the marker.
        if let Some(FieldReference::CurrentItem(item)) = path.segments.first() {
            let iterable = item
                .collection()
                .and_then(|collection| resolve_path(root, &collection).ok())
                .is_some_and(|collection| collection.element().is_some());
            if !iterable {
                return Ok(());
            }
        }

        let finding = match resolve_path(root, path) {
            Ok(_) | Err(ResolveError::UnboundCurrentItem) => None,
            Err(ResolveError::UnknownField { field, path }) => {
                Some(ValidationErrorKind::UnknownField { field, path })
            }
            Err(ResolveError::NotAnObject { field, path }) => {
                Some(ValidationErrorKind::NotAnObject { field, path })
            }
            Err(ResolveError::NotACollection { path }) => {
                Some(ValidationErrorKind::NotACollection { path })
            }
        };
        if let Some(finding) = finding {
            cx.report(finding);
        }
        Ok(())
    }
}

/// The path under a field function must fit the function's declared argument.
struct FunctionArgument;

impl Rule for FunctionArgument {
    fn kind(&self) -> NodeKind {
        NodeKind::FieldFunction
    }

    fn enter<'a>(&self, cx: &mut RuleContext<'a, '_>) -> Result<(), ContractViolation> {
        let function = cx
            .node
            .as_field_function()
            .ok_or_else(|| cx.wrong_node::<Self>(NodeKind::FieldFunction))?;

        let declared = cx
            .schema
            .function(function.function.name())
            .and_then(|signature| signature.arguments.first())
            .map(|argument| argument.value_type());
        let actual = cx
            .root()
            .and_then(|root| resolve_path(root, &function.path).ok())
            .map(|descriptor| descriptor.value_type());

        if let (Some(expected), Some(actual)) = (declared, actual)
            && !expected.accepts(actual)
        {
            cx.report(ValidationErrorKind::FunctionArgumentMismatch {
                function: function.function,
                path: function.path.to_string(),
                expected,
                actual,
            });
        }
        Ok(())
    }
}

/// Sort keys without a field function must be scalar.
struct ScalarSortKey;

impl Rule for ScalarSortKey {
    fn kind(&self) -> NodeKind {
        NodeKind::SortExpression
    }

    fn enter<'a>(&self, cx: &mut RuleContext<'a, '_>) -> Result<(), ContractViolation> {
        let key = cx
            .node
            .as_sort_expression()
            .ok_or_else(|| cx.wrong_node::<Self>(NodeKind::SortExpression))?;
        if key.operand.function().is_some() {
            return Ok(());
        }

        let path = key.operand.path();
        let actual = cx
            .root()
            .and_then(|root| resolve_path(root, path).ok())
            .map(|descriptor| descriptor.value_type());
        if let Some(actual) = actual
            && !actual.is_scalar()
        {
            cx.report(ValidationErrorKind::UnsortableType {
                path: path.to_string(),
                actual,
            });
        }
        Ok(())
    }
}

/// A quantifier must range over a list.
struct QuantifiedCollection;

impl Rule for QuantifiedCollection {
    fn kind(&self) -> NodeKind {
        NodeKind::Quantifier
    }

    fn enter<'a>(&self, cx: &mut RuleContext<'a, '_>) -> Result<(), ContractViolation> {
        let quantifier = cx
            .node
            .as_quantifier()
            .ok_or_else(|| cx.wrong_node::<Self>(NodeKind::Quantifier))?;

        let actual = cx
            .root()
            .and_then(|root| resolve_path(root, &quantifier.collection).ok())
            .map(|descriptor| descriptor.value_type());
        if actual.is_some_and(|actual| !matches!(actual, ValueType::List | ValueType::Any)) {
            cx.report_at(
                NodeRef::FieldPath(quantifier.collection.as_ref()),
                ValidationErrorKind::NotACollection {
                    path: quantifier.collection.to_string(),
                },
            );
        }
        Ok(())
    }
}

/// Tracks the quantifiers enclosing the node being visited.
struct QuantifierScope;

impl Rule for QuantifierScope {
    fn kind(&self) -> NodeKind {
        NodeKind::Quantifier
    }

    fn enter<'a>(&self, cx: &mut RuleContext<'a, '_>) -> Result<(), ContractViolation> {
        let quantifier = cx
            .node
            .as_quantifier()
            .ok_or_else(|| cx.wrong_node::<Self>(NodeKind::Quantifier))?;
        cx.state
            .context
            .enter(EnclosingQuantifier(Arc::clone(&quantifier.collection)));
        Ok(())
    }

    fn exit<'a>(&self, cx: &mut RuleContext<'a, '_>) -> Result<(), ContractViolation> {
        cx.state.context.exit::<EnclosingQuantifier>()?;
        Ok(())
    }
}

/// `$it` must be bound to the collection of a quantifier enclosing it.
struct BoundCurrentItem;

impl Rule for BoundCurrentItem {
    fn kind(&self) -> NodeKind {
        NodeKind::CurrentItem
    }

    fn enter<'a>(&self, cx: &mut RuleContext<'a, '_>) -> Result<(), ContractViolation> {
        let item = cx
            .node
            .as_current_item()
            .ok_or_else(|| cx.wrong_node::<Self>(NodeKind::CurrentItem))?;

        let bound = item.collection().is_some_and(|collection| {
            cx.state
                .context
                .find_all::<EnclosingQuantifier>()
                .any(|enclosing| Arc::ptr_eq(&enclosing.0, &collection))
        });
        if !bound {
            cx.report(ValidationErrorKind::CurrentItemOutsideQuantifier);
        }
        Ok(())
    }
}
