use std::collections::HashSet;

use crate::{
    ast::{Literal, LiteralType, NodeKind, NodeRef, Parameter},
    schema::item_type,
    validator::{
        ContractViolation, RootType, Rule, RuleContext, RuleEngine, ValidationErrorKind,
        ValidatorConfig,
    },
};

pub(super) fn register(engine: &mut RuleEngine<'_>, config: ValidatorConfig) {
    engine.register(KnownRequest);
    engine.register(UniqueParameters);
    engine.register(Paging {
        kind: NodeKind::Skip,
        max: None,
    });
    engine.register(Paging {
        kind: NodeKind::Limit,
        max: config.max_limit,
    });
    engine.register(InputLiteral);
}

/// The request name must be known; its item type becomes the root that
/// field paths resolve against.
struct KnownRequest;

impl Rule for KnownRequest {
    fn kind(&self) -> NodeKind {
        NodeKind::Request
    }

    fn enter<'a>(&self, cx: &mut RuleContext<'a, '_>) -> Result<(), ContractViolation> {
        let request = cx
            .node
            .as_request()
            .ok_or_else(|| cx.wrong_node::<Self>(NodeKind::Request))?;

        let root = cx
            .schema
            .request(&request.name)
            .map(|returns| item_type(returns).clone());
        if root.is_none() {
            cx.report(ValidationErrorKind::UnknownRequest {
                name: request.name.clone(),
            });
        }
        cx.state.context.enter(RootType(root));
        Ok(())
    }

    fn exit<'a>(&self, cx: &mut RuleContext<'a, '_>) -> Result<(), ContractViolation> {
        cx.state.context.exit::<RootType>()?;
        Ok(())
    }
}

/// Each parameter kind appears at most once.
struct UniqueParameters;

impl Rule for UniqueParameters {
    fn kind(&self) -> NodeKind {
        NodeKind::Request
    }

    fn enter<'a>(&self, cx: &mut RuleContext<'a, '_>) -> Result<(), ContractViolation> {
        let request = cx
            .node
            .as_request()
            .ok_or_else(|| cx.wrong_node::<Self>(NodeKind::Request))?;

        let mut seen = HashSet::new();
        for parameter in &request.parameters {
            if !seen.insert(parameter.name()) {
                cx.report_at(
                    NodeRef::Parameter(parameter),
                    ValidationErrorKind::DuplicateParameter {
                        name: parameter.name(),
                    },
                );
            }
        }
        Ok(())
    }
}

/// `skip`/`limit` take a non-negative integer; `limit` may be capped.
struct Paging {
    kind: NodeKind,
    max: Option<u64>,
}

impl Rule for Paging {
    fn kind(&self) -> NodeKind {
        self.kind
    }

    fn enter<'a>(&self, cx: &mut RuleContext<'a, '_>) -> Result<(), ContractViolation> {
        let (name, paging) = match cx.node.as_parameter() {
            Some(Parameter::Skip(paging)) => ("skip", paging),
            Some(Parameter::Limit(paging)) => ("limit", paging),
            _ => return Err(cx.wrong_node::<Self>(self.kind)),
        };

        let reason = match &paging.amount.value {
            Literal::Integer(amount) if *amount < 0 => Some("must not be negative".to_string()),
            Literal::Integer(amount) => self
                .max
                .filter(|max| amount.unsigned_abs() > *max)
                .map(|max| format!("{} exceeds the maximum of {}", amount, max)),
            other => Some(format!("expected an integer, found {}", other.literal_type())),
        };
        if let Some(reason) = reason {
            cx.report(ValidationErrorKind::InvalidPaging {
                parameter: name,
                reason,
            });
        }
        Ok(())
    }
}

struct InputLiteral;

impl Rule for InputLiteral {
    fn kind(&self) -> NodeKind {
        NodeKind::Input
    }

    fn enter<'a>(&self, cx: &mut RuleContext<'a, '_>) -> Result<(), ContractViolation> {
        let input = match cx.node.as_parameter() {
            Some(Parameter::Input(input)) => input,
            _ => return Err(cx.wrong_node::<Self>(NodeKind::Input)),
        };

        let actual = input.value.value.literal_type();
        if !matches!(actual, LiteralType::Object | LiteralType::Array) {
            cx.report(ValidationErrorKind::InvalidInput { actual });
        }
        Ok(())
    }
}
