pub mod ast;
pub mod cli;
pub mod compiler;
pub mod context;
pub mod lexer;
pub mod parser;
pub mod printer;
pub mod schema;
pub mod validator;
pub mod value;
pub mod visitor;

pub use ast::{BooleanExpression, NodeKind, NodeRef, Request, Token, TokenKind};
pub use compiler::{
    compile_filter, compile_request, execute_json, CompileError, CompiledFilter, CompiledRequest,
    QueryResult,
};
pub use context::{ContextError, ContextStack};
pub use lexer::{Lexer, SyntaxError, SyntaxErrorKind};
pub use parser::{Parser, ParserConfig, DEFAULT_MAX_DEPTH};
pub use printer::{print_boolean, print_request, PrintError, Printer};
pub use schema::{Schema, SchemaError, SchemaLookup, TypeDescriptor, ValueType};
pub use validator::{
    ContractViolation, Rule, RuleContext, RuleEngine, ValidationError, ValidationErrorKind,
    ValidationReport, Validator, ValidatorConfig,
};
pub use value::Value;
pub use visitor::{Cancellation, VisitState, Visitor};

/// Parses a complete request, choosing literal types from syntax alone.
///
/// ```
/// let request = sift_lang::parse_request("users(filter(ge(age, 18)), limit(10))").unwrap();
/// assert_eq!(request.name, "users");
/// assert_eq!(request.parameters.len(), 2);
/// ```
pub fn parse_request(text: &str) -> Result<Request, SyntaxError> {
    Parser::new(Lexer::new(text)?).parse_request()
}

/// Parses a complete request, typing constants from `schema`.
pub fn parse_request_with_schema(
    text: &str,
    schema: &dyn SchemaLookup,
) -> Result<Request, SyntaxError> {
    Parser::new(Lexer::new(text)?)
        .with_schema(schema)
        .parse_request()
}

/// Parses a bare boolean expression.
pub fn parse_filter(text: &str) -> Result<BooleanExpression, SyntaxError> {
    Parser::new(Lexer::new(text)?).parse_filter()
}

/// Parses a bare boolean expression whose paths resolve against `root`.
pub fn parse_filter_with_schema(
    text: &str,
    schema: &dyn SchemaLookup,
    root: &TypeDescriptor,
) -> Result<BooleanExpression, SyntaxError> {
    Parser::new(Lexer::new(text)?)
        .with_schema(schema)
        .with_root_type(root.clone())
        .parse_filter()
}
