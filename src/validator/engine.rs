//! Composite rule dispatcher.
//!
//! A [`Rule`] is registered for one [`NodeKind`] and fires for that kind and
//! every kind below it in the hierarchy. For each concrete kind the engine
//! collects the matching rules once, ancestors first, and replays the list
//! on every later node of that kind: forward on enter, reverse on exit.

use std::{any::type_name, collections::HashMap, sync::Arc};

use thiserror::Error;
use tracing::debug;

use crate::{
    ast::{NodeKind, NodeRef},
    context::ContextError,
    schema::{SchemaLookup, TypeDescriptor},
    validator::{ValidationError, ValidationErrorKind},
    visitor::{VisitState, Visitor},
};

/// A defect in the code hosting the rules. Aborts validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractViolation {
    #[error("rule {rule} expects a {expected} node, got {actual}")]
    WrongNodeType {
        rule: &'static str,
        expected: NodeKind,
        actual: NodeKind,
    },

    #[error("exit from {kind} without a matching enter")]
    ExitWithoutEnter { kind: NodeKind },

    #[error(transparent)]
    Context(#[from] ContextError),
}

/// Item type that field paths resolve against during one traversal.
#[derive(Debug, Clone)]
pub(crate) struct RootType(pub Option<TypeDescriptor>);

/// What a rule sees when it fires.
pub struct RuleContext<'a, 'e> {
    pub node: NodeRef<'a>,
    pub schema: &'e dyn SchemaLookup,
    pub state: &'e mut VisitState,
    errors: &'e mut Vec<ValidationError<'a>>,
}

impl<'a> RuleContext<'a, '_> {
    /// Records a finding against the current node.
    pub fn report(&mut self, kind: ValidationErrorKind) {
        let node = self.node;
        self.report_at(node, kind);
    }

    pub fn report_at(&mut self, node: NodeRef<'a>, kind: ValidationErrorKind) {
        debug!(node = %node.kind(), error = %kind, "validation error");
        self.errors.push(ValidationError { kind, node });
    }

    /// The violation a rule returns when handed a node it was not written for.
    pub fn wrong_node<R: ?Sized>(&self, expected: NodeKind) -> ContractViolation {
        ContractViolation::WrongNodeType {
            rule: type_name::<R>(),
            expected,
            actual: self.node.kind(),
        }
    }

    /// Item type of the request under validation, when the schema knows it.
    pub fn root(&self) -> Option<&TypeDescriptor> {
        self.state
            .context
            .find::<RootType>()
            .and_then(|root| root.0.as_ref())
    }
}

/// A single-kind validation rule.
///
/// Rules are stateless; anything they share with other rules lives on the
/// traversal's context stack.
pub trait Rule: Send + Sync {
    /// The kind this rule is registered for.
    fn kind(&self) -> NodeKind;

    fn enter<'a>(&self, _cx: &mut RuleContext<'a, '_>) -> Result<(), ContractViolation> {
        Ok(())
    }

    fn exit<'a>(&self, _cx: &mut RuleContext<'a, '_>) -> Result<(), ContractViolation> {
        Ok(())
    }
}

pub struct RuleEngine<'s> {
    schema: &'s dyn SchemaLookup,
    rules: Vec<Box<dyn Rule>>,
    by_kind: HashMap<NodeKind, Vec<usize>>,
    cache: HashMap<NodeKind, Arc<[usize]>>,
    entered: Vec<NodeKind>,
}

impl<'s> RuleEngine<'s> {
    pub fn new(schema: &'s dyn SchemaLookup) -> Self {
        RuleEngine {
            schema,
            rules: Vec::new(),
            by_kind: HashMap::new(),
            cache: HashMap::new(),
            entered: Vec::new(),
        }
    }

    /// Registers a rule. Rules registered for the same kind fire in
    /// registration order.
    pub fn register(&mut self, rule: impl Rule + 'static) {
        let index = self.rules.len();
        self.by_kind.entry(rule.kind()).or_default().push(index);
        self.rules.push(Box::new(rule));
        self.cache.clear();
    }

    pub fn with_rule(mut self, rule: impl Rule + 'static) -> Self {
        self.register(rule);
        self
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Number of concrete kinds with a memoized rule list.
    pub fn cached_kinds(&self) -> usize {
        self.cache.len()
    }

    /// Rules firing for `kind`, most general registration first.
    fn rules_for(&mut self, kind: NodeKind) -> Arc<[usize]> {
        if let Some(list) = self.cache.get(&kind) {
            return Arc::clone(list);
        }

        let list: Arc<[usize]> = kind
            .ancestry()
            .into_iter()
            .rev()
            .flat_map(|ancestor| self.by_kind.get(&ancestor).into_iter().flatten().copied())
            .collect();
        debug!(%kind, rules = list.len(), "memoized rule list");
        self.cache.insert(kind, Arc::clone(&list));
        list
    }

    /// Fires every rule for `node` in order.
    pub fn enter<'a>(
        &mut self,
        node: NodeRef<'a>,
        state: &mut VisitState,
        errors: &mut Vec<ValidationError<'a>>,
    ) -> Result<(), ContractViolation> {
        let kind = node.kind();
        let list = self.rules_for(kind);
        let mut cx = RuleContext {
            node,
            schema: self.schema,
            state,
            errors,
        };
        for &index in list.iter() {
            self.rules[index].enter(&mut cx)?;
        }
        self.entered.push(kind);
        Ok(())
    }

    /// Fires every rule for `node` in reverse order.
    pub fn exit<'a>(
        &mut self,
        node: NodeRef<'a>,
        state: &mut VisitState,
        errors: &mut Vec<ValidationError<'a>>,
    ) -> Result<(), ContractViolation> {
        let kind = node.kind();
        match self.entered.last() {
            Some(&entered) if entered == kind => {
                self.entered.pop();
            }
            _ => return Err(ContractViolation::ExitWithoutEnter { kind }),
        }

        let list = self.rules_for(kind);
        let mut cx = RuleContext {
            node,
            schema: self.schema,
            state,
            errors,
        };
        for &index in list.iter().rev() {
            self.rules[index].exit(&mut cx)?;
        }
        Ok(())
    }

    /// Walks the subtree under `node`, collecting every finding.
    pub fn run<'a>(
        &mut self,
        node: NodeRef<'a>,
        state: &mut VisitState,
    ) -> Result<Vec<ValidationError<'a>>, ContractViolation> {
        self.entered.clear();
        let mut traversal = Traversal {
            engine: self,
            errors: Vec::new(),
        };
        node.accept(&mut traversal, state)?;
        Ok(traversal.errors)
    }
}

struct Traversal<'e, 's, 'a> {
    engine: &'e mut RuleEngine<'s>,
    errors: Vec<ValidationError<'a>>,
}

impl<'a> Visitor<'a> for Traversal<'_, '_, 'a> {
    type Error = ContractViolation;

    fn enter(&mut self, node: NodeRef<'a>, state: &mut VisitState) -> Result<(), Self::Error> {
        self.engine.enter(node, state, &mut self.errors)
    }

    fn exit(&mut self, node: NodeRef<'a>, state: &mut VisitState) -> Result<(), Self::Error> {
        self.engine.exit(node, state, &mut self.errors)
    }
}
