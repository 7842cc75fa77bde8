//! Predicate compiler.
//!
//! Compiles a parsed request into closures that run against [`Value`]
//! documents. The compiler is a [`Visitor`] that only implements `exit`:
//! children leave fragments (accessors, constants, predicates, sort keys) on
//! a stack, and each node's `exit` pops its children's fragments and pushes
//! its own.
//!
//! `$it` paths read the element bound by the quantifier whose collection the
//! marker points at, so nested quantifiers resolve unambiguously.

use std::{cmp::Ordering, fmt, sync::Arc};

use chrono::{Datelike, Timelike};
use rust_decimal::RoundingStrategy;
use thiserror::Error;
use tracing::debug;

use crate::{
    ast::{
        BooleanExpression, ComparisonOperator, FieldFunctionName, FieldPath, FieldReference,
        NodeRef, Parameter, QuantifierKind, Request, SortDirection,
    },
    value::Value,
    visitor::{VisitState, Visitor},
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("missing {expected} while compiling {node}")]
    MissingFragment {
        expected: &'static str,
        node: String,
    },

    #[error("expected {expected}, found {found} on the fragment stack")]
    UnexpectedFragment {
        expected: &'static str,
        found: &'static str,
    },

    #[error("invalid regular expression '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("'{parameter}' expects a non-negative integer, found {found}")]
    InvalidPaging {
        parameter: &'static str,
        found: String,
    },
}

/// Documents and bound collection items visible to a predicate.
pub struct Scope<'v> {
    root: &'v Value,
    items: Vec<(usize, &'v Value)>,
}

impl<'v> Scope<'v> {
    pub fn new(root: &'v Value) -> Self {
        Scope {
            root,
            items: Vec::new(),
        }
    }

    fn with_item<'w>(&'w self, key: usize, item: &'w Value) -> Scope<'w> {
        let mut items = self.items.clone();
        items.push((key, item));
        Scope {
            root: self.root,
            items,
        }
    }

    fn item(&self, key: usize) -> Option<&'v Value> {
        self.items
            .iter()
            .rev()
            .find(|(bound, _)| *bound == key)
            .map(|(_, item)| *item)
    }
}

type Accessor = Arc<dyn Fn(&Scope<'_>) -> Value + Send + Sync>;
type Predicate = Arc<dyn Fn(&Scope<'_>) -> bool + Send + Sync>;

/// Identity of a quantifier's collection, shared with the `$it` bound to it.
fn binding_key(collection: &Arc<FieldPath>) -> usize {
    Arc::as_ptr(collection) as usize
}

#[derive(Clone)]
pub struct SortKey {
    accessor: Accessor,
    direction: SortDirection,
}

enum Fragment {
    Accessor(Accessor),
    Constant(Value),
    Predicate(Predicate),
    SortKey(SortKey),
}

impl Fragment {
    fn describe(&self) -> &'static str {
        match self {
            Fragment::Accessor(_) => "field accessor",
            Fragment::Constant(_) => "constant",
            Fragment::Predicate(_) => "predicate",
            Fragment::SortKey(_) => "sort key",
        }
    }
}

/// Result of running a compiled request.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub items: Vec<Value>,
    /// Matching documents before paging, when `count()` was requested.
    pub count: Option<usize>,
}

/// A request compiled into executable form.
#[derive(Clone, Default)]
pub struct CompiledRequest {
    pub name: String,
    filter: Option<Predicate>,
    sort: Vec<SortKey>,
    pub skip: Option<usize>,
    pub limit: Option<usize>,
    pub count: bool,
    pub input: Option<Value>,
}

impl fmt::Debug for CompiledRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledRequest")
            .field("name", &self.name)
            .field("filter", &self.filter.is_some())
            .field("sort", &self.sort.len())
            .field("skip", &self.skip)
            .field("limit", &self.limit)
            .field("count", &self.count)
            .field("input", &self.input)
            .finish()
    }
}

impl CompiledRequest {
    pub fn matches(&self, document: &Value) -> bool {
        self.filter
            .as_ref()
            .is_none_or(|filter| filter(&Scope::new(document)))
    }

    /// Filters, counts, sorts and pages `documents`.
    pub fn execute(&self, documents: Vec<Value>) -> QueryResult {
        let matching: Vec<Value> = documents
            .into_iter()
            .filter(|document| self.matches(document))
            .collect();
        let count = self.count.then_some(matching.len());

        let mut keyed: Vec<(Vec<Value>, Value)> = matching
            .into_iter()
            .map(|document| {
                let scope = Scope::new(&document);
                let keys = self.sort.iter().map(|key| (key.accessor)(&scope)).collect();
                (keys, document)
            })
            .collect();
        if !self.sort.is_empty() {
            keyed.sort_by(|(a, _), (b, _)| self.compare_keys(a, b));
        }

        let items = keyed
            .into_iter()
            .map(|(_, document)| document)
            .skip(self.skip.unwrap_or(0))
            .take(self.limit.unwrap_or(usize::MAX))
            .collect();
        QueryResult { items, count }
    }

    fn compare_keys(&self, a: &[Value], b: &[Value]) -> Ordering {
        self.sort
            .iter()
            .zip(a.iter().zip(b))
            .map(|(key, (x, y))| match key.direction {
                SortDirection::Ascending => x.sort_cmp(y),
                SortDirection::Descending => y.sort_cmp(x),
            })
            .find(|ordering| *ordering != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }
}

/// A bare filter compiled into a predicate.
#[derive(Clone)]
pub struct CompiledFilter(Predicate);

impl CompiledFilter {
    pub fn matches(&self, document: &Value) -> bool {
        (self.0)(&Scope::new(document))
    }
}

pub fn compile_request(request: &Request) -> Result<CompiledRequest, CompileError> {
    let mut compiler = Compiler::default();
    compiler.compiled.name = request.name.clone();
    NodeRef::Request(request).accept(&mut compiler, &mut VisitState::new())?;
    debug!(request = %request.name, compiled = ?compiler.compiled, "compiled request");
    Ok(compiler.compiled)
}

pub fn compile_filter(expression: &BooleanExpression) -> Result<CompiledFilter, CompileError> {
    let mut compiler = Compiler::default();
    NodeRef::BooleanExpression(expression).accept(&mut compiler, &mut VisitState::new())?;
    compiler.pop_predicate("filter").map(CompiledFilter)
}

#[derive(Default)]
struct Compiler {
    fragments: Vec<Fragment>,
    compiled: CompiledRequest,
}

impl Compiler {
    fn pop(&mut self, expected: &'static str, node: &str) -> Result<Fragment, CompileError> {
        self.fragments.pop().ok_or_else(|| CompileError::MissingFragment {
            expected,
            node: node.to_string(),
        })
    }

    fn mismatch(expected: &'static str, found: &Fragment) -> CompileError {
        CompileError::UnexpectedFragment {
            expected,
            found: found.describe(),
        }
    }

    fn pop_accessor(&mut self, node: &'static str) -> Result<Accessor, CompileError> {
        match self.pop("field accessor", node)? {
            Fragment::Accessor(accessor) => Ok(accessor),
            other => Err(Self::mismatch("field accessor", &other)),
        }
    }

    fn pop_constant(&mut self, node: &'static str) -> Result<Value, CompileError> {
        match self.pop("constant", node)? {
            Fragment::Constant(value) => Ok(value),
            other => Err(Self::mismatch("constant", &other)),
        }
    }

    fn pop_predicate(&mut self, node: &'static str) -> Result<Predicate, CompileError> {
        match self.pop("predicate", node)? {
            Fragment::Predicate(predicate) => Ok(predicate),
            other => Err(Self::mismatch("predicate", &other)),
        }
    }

    fn pop_paging(&mut self, parameter: &'static str) -> Result<usize, CompileError> {
        let amount = self.pop_constant(parameter)?;
        match amount {
            Value::Integer(n) if n >= 0 => Ok(usize::try_from(n).unwrap_or(usize::MAX)),
            other => Err(CompileError::InvalidPaging {
                parameter,
                found: format!("{:?}", other),
            }),
        }
    }

    fn exit_boolean(&mut self, expression: &BooleanExpression) -> Result<(), CompileError> {
        let predicate: Predicate = match expression {
            BooleanExpression::And(_) => {
                let right = self.pop_predicate("and")?;
                let left = self.pop_predicate("and")?;
                Arc::new(move |scope: &Scope<'_>| left(scope) && right(scope))
            }
            BooleanExpression::Or(_) => {
                let right = self.pop_predicate("or")?;
                let left = self.pop_predicate("or")?;
                Arc::new(move |scope: &Scope<'_>| left(scope) || right(scope))
            }
            BooleanExpression::Not(_) => {
                let operand = self.pop_predicate("not")?;
                Arc::new(move |scope: &Scope<'_>| !operand(scope))
            }
            BooleanExpression::Comparison(comparison) => {
                let name = comparison.operator.name();
                let constant = self.pop_constant(name)?;
                let operand = self.pop_accessor(name)?;
                compare(comparison.operator, operand, constant)?
            }
            BooleanExpression::Quantifier(quantifier) => {
                let name = quantifier.kind.name();
                let predicate = self.pop_predicate(name)?;
                let collection = self.pop_accessor(name)?;
                let key = binding_key(&quantifier.collection);
                let kind = quantifier.kind;
                Arc::new(move |scope: &Scope<'_>| match collection(scope) {
                    Value::Array(items) => {
                        let holds = |item: &Value| predicate(&scope.with_item(key, item));
                        match kind {
                            QuantifierKind::Any => items.iter().any(holds),
                            QuantifierKind::All => items.iter().all(holds),
                        }
                    }
                    _ => false,
                })
            }
        };
        self.fragments.push(Fragment::Predicate(predicate));
        Ok(())
    }

    fn exit_parameter(&mut self, parameter: &Parameter) -> Result<(), CompileError> {
        match parameter {
            Parameter::Filter(_) => {
                self.compiled.filter = Some(self.pop_predicate("filter")?);
            }
            Parameter::Sort(sort) => {
                let mut keys = Vec::with_capacity(sort.keys.len());
                for _ in &sort.keys {
                    match self.pop("sort key", "sort")? {
                        Fragment::SortKey(key) => keys.push(key),
                        other => return Err(Self::mismatch("sort key", &other)),
                    }
                }
                keys.reverse();
                self.compiled.sort = keys;
            }
            Parameter::Skip(_) => self.compiled.skip = Some(self.pop_paging("skip")?),
            Parameter::Limit(_) => self.compiled.limit = Some(self.pop_paging("limit")?),
            Parameter::Count(_) => self.compiled.count = true,
            Parameter::Input(_) => self.compiled.input = Some(self.pop_constant("input")?),
        }
        Ok(())
    }
}

impl<'ast> Visitor<'ast> for Compiler {
    type Error = CompileError;

    fn exit(&mut self, node: NodeRef<'ast>, _state: &mut VisitState) -> Result<(), CompileError> {
        match node {
            NodeRef::Request(_) | NodeRef::FieldReference(_) => {}
            NodeRef::Parameter(parameter) => self.exit_parameter(parameter)?,
            NodeRef::SortExpression(key) => {
                let accessor = self.pop_accessor(key.direction.name())?;
                self.fragments.push(Fragment::SortKey(SortKey {
                    accessor,
                    direction: key.direction,
                }));
            }
            NodeRef::BooleanExpression(expression) => self.exit_boolean(expression)?,
            NodeRef::FieldFunction(function) => {
                let path = self.pop_accessor(function.function.name())?;
                let name = function.function;
                self.fragments
                    .push(Fragment::Accessor(Arc::new(move |scope: &Scope<'_>| {
                        apply_function(name, path(scope))
                    })));
            }
            NodeRef::FieldPath(path) => {
                self.fragments.push(Fragment::Accessor(path_accessor(path)));
            }
            NodeRef::Constant(constant) => {
                self.fragments
                    .push(Fragment::Constant(Value::from(&constant.value)));
            }
        }
        Ok(())
    }
}

/// Reads `path` from the scope. Missing fields read as null.
fn path_accessor(path: &FieldPath) -> Accessor {
    let (start, rest) = match path.segments.split_first() {
        Some((FieldReference::CurrentItem(item), rest)) => {
            (Some(item.collection().as_ref().map(binding_key)), rest)
        }
        _ => (None, path.segments.as_slice()),
    };
    let names: Vec<String> = rest
        .iter()
        .filter_map(|segment| match segment {
            FieldReference::Field(field) => Some(field.name.clone()),
            FieldReference::CurrentItem(_) => None,
        })
        .collect();

    Arc::new(move |scope: &Scope<'_>| {
        let base = match start {
            None => Some(scope.root),
            Some(Some(key)) => scope.item(key),
            Some(None) => None,
        };
        let Some(base) = base else {
            return Value::Null;
        };
        names
            .iter()
            .try_fold(base, |value, name| value.get(name))
            .cloned()
            .unwrap_or(Value::Null)
    })
}

fn apply_function(function: FieldFunctionName, value: Value) -> Value {
    use FieldFunctionName::*;

    match function {
        IsNull => return Value::Boolean(value.is_null()),
        Year | Month | Day | Hour | Minute | Second => {
            let Some(timestamp) = value.as_datetime() else {
                return Value::Null;
            };
            let part = match function {
                Year => i64::from(timestamp.year()),
                Month => i64::from(timestamp.month()),
                Day => i64::from(timestamp.day()),
                Hour => i64::from(timestamp.hour()),
                Minute => i64::from(timestamp.minute()),
                _ => i64::from(timestamp.second()),
            };
            return Value::Integer(part);
        }
        _ => {}
    }

    match (function, value) {
        (Round | Floor | Ceiling, Value::Integer(n)) => Value::Integer(n),
        (Round, Value::Decimal(d)) => {
            Value::Decimal(d.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
        }
        (Floor, Value::Decimal(d)) => Value::Decimal(d.floor()),
        (Ceiling, Value::Decimal(d)) => Value::Decimal(d.ceil()),
        (ToLower, Value::String(s)) => Value::String(s.to_lowercase()),
        (ToUpper, Value::String(s)) => Value::String(s.to_uppercase()),
        _ => Value::Null,
    }
}

fn compare(
    operator: ComparisonOperator,
    operand: Accessor,
    constant: Value,
) -> Result<Predicate, CompileError> {
    use ComparisonOperator::*;

    let test: Box<dyn Fn(&Value) -> bool + Send + Sync> = match operator {
        Equal => Box::new(move |value: &Value| value.equals(&constant)),
        NotEqual => Box::new(move |value: &Value| !value.equals(&constant)),
        GreaterThan | GreaterEqual | LessThan | LessEqual => {
            Box::new(move |value: &Value| match value.compare(&constant) {
                Some(ordering) => match operator {
                    GreaterThan => ordering == Ordering::Greater,
                    GreaterEqual => ordering != Ordering::Less,
                    LessThan => ordering == Ordering::Less,
                    _ => ordering != Ordering::Greater,
                },
                None => false,
            })
        }
        Has => Box::new(move |value: &Value| match (value, &constant) {
            (Value::String(s), Value::String(needle)) => s.contains(needle.as_str()),
            (Value::Array(items), needle) => items.iter().any(|item| item.equals(needle)),
            _ => false,
        }),
        StartsWith => Box::new(move |value: &Value| match (value, &constant) {
            (Value::String(s), Value::String(prefix)) => s.starts_with(prefix.as_str()),
            _ => false,
        }),
        EndsWith => Box::new(move |value: &Value| match (value, &constant) {
            (Value::String(s), Value::String(suffix)) => s.ends_with(suffix.as_str()),
            _ => false,
        }),
        Regex => {
            let pattern = constant.as_str().unwrap_or_default();
            let re = regex::Regex::new(pattern).map_err(|e| CompileError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })?;
            Box::new(move |value: &Value| value.as_str().is_some_and(|s| re.is_match(s)))
        }
    };

    Ok(Arc::new(move |scope: &Scope<'_>| test(&operand(scope))))
}

/// Runs `compiled` over a JSON array of documents (or a single document).
///
/// With `count()` the result is `{"count": n, "items": [...]}`.
pub fn execute_json(
    compiled: &CompiledRequest,
    documents: serde_json::Value,
) -> serde_json::Value {
    let documents = match Value::from(documents) {
        Value::Array(items) => items,
        single => vec![single],
    };
    let result = compiled.execute(documents);
    let items = serde_json::Value::Array(result.items.into_iter().map(Into::into).collect());
    match result.count {
        Some(count) => serde_json::json!({ "count": count, "items": items }),
        None => items,
    }
}
