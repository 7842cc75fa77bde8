//! Schema description consumed by the parser and the validator.
//!
//! A schema maps request names to the type they return and function names
//! to their signatures. The core only reads it, through [`SchemaLookup`].
//! [`Schema`] is the default implementation; it deserializes from JSON and
//! comes pre-populated with the signatures of every built-in comparison and
//! field function:
//!
//! ```text
//! {
//!   "requests": {
//!     "users": {
//!       "type": "list",
//!       "element": {
//!         "type": "object",
//!         "fields": {
//!           "age": { "type": "integer" },
//!           "name": { "type": "string", "extensions": { "filter": { "comparisons": ["eq"] } } },
//!           "tags": { "type": "list", "element": { "type": "string" } }
//!         }
//!       }
//!     }
//!   }
//! }
//! ```

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ast::{
    ComparisonOperator, FieldFunctionName, FieldPath, FieldReference, LiteralType,
};

/// Extension key holding [`FilterCapabilities`].
pub const FILTER_CAPABILITY: &str = "filter";

/// Extension key holding a boolean; `false` forbids sorting on the field.
pub const SORTABLE_CAPABILITY: &str = "sortable";

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("invalid schema: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid '{key}' extension: {reason}")]
    InvalidExtension { key: &'static str, reason: String },
}

/// Read-only access to request and function shapes.
pub trait SchemaLookup {
    /// The type a named request returns.
    fn request(&self, name: &str) -> Option<&TypeDescriptor>;

    /// The signature of a named comparison or field function.
    fn function(&self, name: &str) -> Option<&FunctionSignature>;
}

/// Underlying value type of a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    /// Generic: defers to whatever the context provides
    Any,
    Boolean,
    Integer,
    Decimal,
    String,
    Date,
    #[serde(rename = "datetime")]
    DateTime,
    Object,
    List,
}

impl ValueType {
    /// Whether a value of type `other` may stand where `self` is declared.
    pub fn accepts(self, other: ValueType) -> bool {
        match (self, other) {
            (ValueType::Any, _) | (_, ValueType::Any) => true,
            (ValueType::Decimal, ValueType::Integer) => true,
            (ValueType::DateTime, ValueType::Date) => true,
            (declared, actual) => declared == actual,
        }
    }

    /// Whether a non-null literal of type `literal` is valid for this type.
    pub fn admits(self, literal: LiteralType) -> bool {
        match self {
            ValueType::Any => literal != LiteralType::Null,
            ValueType::Boolean => literal == LiteralType::Boolean,
            ValueType::Integer => literal == LiteralType::Integer,
            ValueType::Decimal => matches!(literal, LiteralType::Integer | LiteralType::Decimal),
            ValueType::String => literal == LiteralType::String,
            ValueType::Date => literal == LiteralType::Date,
            ValueType::DateTime => matches!(literal, LiteralType::Date | LiteralType::DateTime),
            ValueType::Object => literal == LiteralType::Object,
            ValueType::List => literal == LiteralType::Array,
        }
    }

    pub fn is_scalar(self) -> bool {
        !matches!(self, ValueType::Object | ValueType::List)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::Any => "any",
            ValueType::Boolean => "boolean",
            ValueType::Integer => "integer",
            ValueType::Decimal => "decimal",
            ValueType::String => "string",
            ValueType::Date => "date",
            ValueType::DateTime => "datetime",
            ValueType::Object => "object",
            ValueType::List => "list",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Shape {
    Any,
    Boolean,
    Integer,
    Decimal,
    String,
    Date,
    #[serde(rename = "datetime")]
    DateTime,
    Object {
        #[serde(default)]
        fields: BTreeMap<String, TypeDescriptor>,
    },
    List {
        element: Box<TypeDescriptor>,
    },
}

/// Shape of a value plus nullability and open extension metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    #[serde(flatten)]
    pub shape: Shape,

    #[serde(default)]
    pub nullable: bool,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extensions: BTreeMap<String, serde_json::Value>,
}

impl TypeDescriptor {
    pub fn new(shape: Shape) -> Self {
        TypeDescriptor {
            shape,
            nullable: false,
            extensions: BTreeMap::new(),
        }
    }

    pub fn any() -> Self {
        Self::new(Shape::Any)
    }

    pub fn boolean() -> Self {
        Self::new(Shape::Boolean)
    }

    pub fn integer() -> Self {
        Self::new(Shape::Integer)
    }

    pub fn decimal() -> Self {
        Self::new(Shape::Decimal)
    }

    pub fn string() -> Self {
        Self::new(Shape::String)
    }

    pub fn date() -> Self {
        Self::new(Shape::Date)
    }

    pub fn datetime() -> Self {
        Self::new(Shape::DateTime)
    }

    pub fn object<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, TypeDescriptor)>,
        K: Into<String>,
    {
        Self::new(Shape::Object {
            fields: fields
                .into_iter()
                .map(|(name, descriptor)| (name.into(), descriptor))
                .collect(),
        })
    }

    pub fn list(element: TypeDescriptor) -> Self {
        Self::new(Shape::List {
            element: Box::new(element),
        })
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn with_extension(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extensions.insert(key.into(), value);
        self
    }

    pub fn with_capabilities(self, capabilities: &FilterCapabilities) -> Self {
        let value = serde_json::to_value(capabilities).unwrap_or(serde_json::Value::Null);
        self.with_extension(FILTER_CAPABILITY, value)
    }

    pub fn unsortable(self) -> Self {
        self.with_extension(SORTABLE_CAPABILITY, serde_json::Value::Bool(false))
    }

    pub fn value_type(&self) -> ValueType {
        match self.shape {
            Shape::Any => ValueType::Any,
            Shape::Boolean => ValueType::Boolean,
            Shape::Integer => ValueType::Integer,
            Shape::Decimal => ValueType::Decimal,
            Shape::String => ValueType::String,
            Shape::Date => ValueType::Date,
            Shape::DateTime => ValueType::DateTime,
            Shape::Object { .. } => ValueType::Object,
            Shape::List { .. } => ValueType::List,
        }
    }

    /// Nested field descriptor of an object.
    pub fn field(&self, name: &str) -> Option<&TypeDescriptor> {
        match &self.shape {
            Shape::Object { fields } => fields.get(name),
            _ => None,
        }
    }

    /// Element descriptor of a list.
    pub fn element(&self) -> Option<&TypeDescriptor> {
        match &self.shape {
            Shape::List { element } => Some(element),
            _ => None,
        }
    }

    /// Filter capabilities, `None` when the field does not restrict them.
    pub fn capabilities(&self) -> Result<Option<FilterCapabilities>, SchemaError> {
        self.extensions
            .get(FILTER_CAPABILITY)
            .map(|value| {
                serde_json::from_value(value.clone()).map_err(|e| SchemaError::InvalidExtension {
                    key: FILTER_CAPABILITY,
                    reason: e.to_string(),
                })
            })
            .transpose()
    }

    pub fn sortable(&self) -> bool {
        self.extensions
            .get(SORTABLE_CAPABILITY)
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(true)
    }
}

/// Which comparisons a field may be filtered with.
///
/// `comparisons` governs comparisons applied to the field directly,
/// `functions` maps a field function name to the comparisons allowed on
/// its result. A missing list allows everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCapabilities {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comparisons: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub functions: Option<BTreeMap<String, Vec<String>>>,
}

impl FilterCapabilities {
    pub fn comparisons<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FilterCapabilities {
            comparisons: Some(names.into_iter().map(Into::into).collect()),
            functions: None,
        }
    }

    pub fn with_function<I, S>(mut self, function: &str, comparisons: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.functions
            .get_or_insert_with(BTreeMap::new)
            .insert(
                function.to_string(),
                comparisons.into_iter().map(Into::into).collect(),
            );
        self
    }

    pub fn allows(&self, comparison: &str, function: Option<&str>) -> bool {
        match function {
            None => self
                .comparisons
                .as_ref()
                .is_none_or(|allowed| allowed.iter().any(|name| name == comparison)),
            Some(function) => self.functions.as_ref().is_none_or(|functions| {
                functions
                    .get(function)
                    .is_some_and(|allowed| allowed.iter().any(|name| name == comparison))
            }),
        }
    }
}

/// Declared argument and return types of a function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionSignature {
    pub arguments: Vec<TypeDescriptor>,
    pub returns: TypeDescriptor,
}

impl FunctionSignature {
    pub fn new(arguments: Vec<TypeDescriptor>, returns: TypeDescriptor) -> Self {
        FunctionSignature { arguments, returns }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(default)]
    pub requests: BTreeMap<String, TypeDescriptor>,

    #[serde(default)]
    pub functions: BTreeMap<String, FunctionSignature>,
}

impl Schema {
    /// A schema with built-in function signatures and no requests.
    pub fn new() -> Self {
        Schema {
            requests: BTreeMap::new(),
            functions: builtin_functions(),
        }
    }

    /// Reads a JSON schema. Functions it declares override the built-ins.
    pub fn from_json(text: &str) -> Result<Self, SchemaError> {
        let mut schema: Schema = serde_json::from_str(text)?;
        for (name, signature) in builtin_functions() {
            schema.functions.entry(name).or_insert(signature);
        }
        Ok(schema)
    }

    pub fn with_request(mut self, name: impl Into<String>, returns: TypeDescriptor) -> Self {
        self.requests.insert(name.into(), returns);
        self
    }

    pub fn with_function(mut self, name: impl Into<String>, signature: FunctionSignature) -> Self {
        self.functions.insert(name.into(), signature);
        self
    }
}

impl SchemaLookup for Schema {
    fn request(&self, name: &str) -> Option<&TypeDescriptor> {
        self.requests.get(name)
    }

    fn function(&self, name: &str) -> Option<&FunctionSignature> {
        self.functions.get(name)
    }
}

fn builtin_functions() -> BTreeMap<String, FunctionSignature> {
    let mut functions = BTreeMap::new();
    let boolean = TypeDescriptor::boolean;

    for op in ComparisonOperator::ALL {
        let signature = if op.is_textual() {
            FunctionSignature::new(
                vec![TypeDescriptor::string(), TypeDescriptor::string()],
                boolean(),
            )
        } else {
            FunctionSignature::new(
                vec![TypeDescriptor::any().nullable(), TypeDescriptor::any().nullable()],
                boolean(),
            )
        };
        functions.insert(op.name().to_string(), signature);
    }

    for function in FieldFunctionName::ALL {
        let signature = match function {
            f if f.is_date_part() => {
                FunctionSignature::new(vec![TypeDescriptor::datetime()], TypeDescriptor::integer())
            }
            FieldFunctionName::Round | FieldFunctionName::Floor | FieldFunctionName::Ceiling => {
                FunctionSignature::new(vec![TypeDescriptor::decimal()], TypeDescriptor::any())
            }
            FieldFunctionName::ToLower | FieldFunctionName::ToUpper => {
                FunctionSignature::new(vec![TypeDescriptor::string()], TypeDescriptor::string())
            }
            _ => FunctionSignature::new(vec![TypeDescriptor::any().nullable()], boolean()),
        };
        functions.insert(function.name().to_string(), signature);
    }

    functions
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("unknown field '{field}' in '{path}'")]
    UnknownField { field: String, path: String },

    #[error("'{field}' in '{path}' is not an object")]
    NotAnObject { field: String, path: String },

    #[error("'$it' is not bound to an enclosing quantifier")]
    UnboundCurrentItem,

    #[error("'{path}' is not a collection")]
    NotACollection { path: String },
}

/// The type items of a request have: the element type for list requests.
pub fn item_type(request: &TypeDescriptor) -> &TypeDescriptor {
    request.element().unwrap_or(request)
}

/// Resolves `path` against `root`, following `$it` back to the element type
/// of the collection it is bound to.
pub fn resolve_path<'t>(
    root: &'t TypeDescriptor,
    path: &FieldPath,
) -> Result<&'t TypeDescriptor, ResolveError> {
    let mut current = root;
    let mut segments = path.segments.iter().peekable();

    if let Some(FieldReference::CurrentItem(item)) = segments.peek() {
        let collection = item.collection().ok_or(ResolveError::UnboundCurrentItem)?;
        let collection_type = resolve_path(root, &collection)?;
        current = collection_type
            .element()
            .ok_or_else(|| ResolveError::NotACollection {
                path: collection.to_string(),
            })?;
        segments.next();
    }

    for segment in segments {
        match segment {
            FieldReference::Field(field) => {
                if !matches!(current.shape, Shape::Object { .. } | Shape::Any) {
                    return Err(ResolveError::NotAnObject {
                        field: field.name.clone(),
                        path: path.to_string(),
                    });
                }
                if current.shape == Shape::Any {
                    continue;
                }
                current = current
                    .field(&field.name)
                    .ok_or_else(|| ResolveError::UnknownField {
                        field: field.name.clone(),
                        path: path.to_string(),
                    })?;
            }
            FieldReference::CurrentItem(_) => return Err(ResolveError::UnboundCurrentItem),
        }
    }

    Ok(current)
}

/// What a comparison's constant must look like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expectation {
    pub value_type: ValueType,
    pub nullable: bool,
}

/// Resolves the expected type of a comparison's constant.
///
/// Falls back in order: the comparison's declared second argument type,
/// the field function's declared return type, the field's own type. A
/// generic (`any`) declaration defers to the next step. The function's
/// return type precedes the field's because the constant is compared with
/// the function result, so `eq(year(created), 2020)` expects an integer.
pub fn expected_constant(
    schema: &dyn SchemaLookup,
    comparison: ComparisonOperator,
    function: Option<FieldFunctionName>,
    field: Option<&TypeDescriptor>,
) -> Option<Expectation> {
    let field_nullable = field.is_some_and(|descriptor| descriptor.nullable);

    if let Some(declared) = schema
        .function(comparison.name())
        .and_then(|signature| signature.arguments.get(1))
        .filter(|declared| declared.value_type() != ValueType::Any)
    {
        return Some(Expectation {
            value_type: declared.value_type(),
            nullable: declared.nullable,
        });
    }

    if let Some(function) = function
        && let Some(returns) = schema
            .function(function.name())
            .map(|signature| &signature.returns)
            .filter(|returns| returns.value_type() != ValueType::Any)
    {
        let propagates = function != FieldFunctionName::IsNull;
        return Some(Expectation {
            value_type: returns.value_type(),
            nullable: returns.nullable || (propagates && field_nullable),
        });
    }

    field.map(|descriptor| Expectation {
        value_type: descriptor.value_type(),
        nullable: descriptor.nullable,
    })
}
