//! Recursive-descent parser.
//!
//! The parser state is a cursor over the [`Lexer`], a [`ContextStack`] and a
//! recursion depth counter. Grammar rules live in the submodules, one per
//! construct, and all of them run through [`Parser::rule`], which brackets the
//! call with `increase_depth`/`decrease_depth`.

use std::any::{type_name, Any};
use std::sync::Arc;

use tracing::debug;

use crate::{
    ast::{
        BooleanExpression, ComparisonOperator, FieldOperand, FieldPath, Metadata, Span, Token,
        TokenKind,
    },
    context::ContextStack,
    lexer::{Lexer, SyntaxError, SyntaxErrorKind},
    schema::{SchemaLookup, TypeDescriptor, ValueType},
};

mod constants;
mod expressions;
mod fields;
mod parameters;

/// Default bound on nested rule calls.
pub const DEFAULT_MAX_DEPTH: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserConfig {
    /// Deepest allowed nesting of grammar rules.
    pub max_depth: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ParserConfig {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

/// Item type of the request being parsed, when the schema knows it.
#[derive(Debug, Clone)]
pub(crate) struct RequestScope {
    pub root: Option<TypeDescriptor>,
}

/// The comparison whose right-hand constant is being parsed.
#[derive(Debug, Clone)]
pub(crate) struct ComparisonScope {
    pub operator: ComparisonOperator,
    pub left: FieldOperand,
}

/// The quantifier whose predicate is being parsed.
#[derive(Debug, Clone)]
pub(crate) struct QuantifierScope {
    pub collection: Arc<FieldPath>,
}

/// Literal type wanted by a parameter that takes a constant.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LiteralHint(pub ValueType);

pub struct Parser<'s> {
    lexer: Lexer,
    context: ContextStack,
    depth: usize,
    previous_end: usize,
    config: ParserConfig,
    schema: Option<&'s dyn SchemaLookup>,
}

impl<'s> Parser<'s> {
    pub fn new(lexer: Lexer) -> Self {
        Parser {
            lexer,
            context: ContextStack::new(),
            depth: 0,
            previous_end: 0,
            config: ParserConfig::default(),
            schema: None,
        }
    }

    pub fn with_config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }

    /// Lets constants pick their literal type from the schema.
    pub fn with_schema(mut self, schema: &'s dyn SchemaLookup) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Item type that field paths of a bare filter resolve against.
    pub fn with_root_type(mut self, root: TypeDescriptor) -> Self {
        self.context.enter(RequestScope { root: Some(root) });
        self
    }

    /// Parse a bare boolean expression, e.g. `and(gt(age, 18), has(name, "a"))`.
    pub fn parse_filter(&mut self) -> Result<BooleanExpression, SyntaxError> {
        let expression = self.parse_boolean()?;
        self.expect(TokenKind::Eof, "end of input")?;
        Ok(expression)
    }

    // Services shared by every grammar rule

    pub fn increase_depth(&mut self) -> Result<(), SyntaxError> {
        if self.depth >= self.config.max_depth {
            return Err(self.error_at_current(SyntaxErrorKind::DepthExceeded(
                self.config.max_depth,
            )));
        }
        self.depth += 1;
        Ok(())
    }

    pub fn decrease_depth(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn enter_context<T: Any + Send>(&mut self, value: T) {
        self.context.enter(value);
    }

    pub fn exit_context<T: Any + Send>(&mut self) -> Result<T, SyntaxError> {
        self.context
            .exit::<T>()
            .map_err(|_| self.error_at_current(SyntaxErrorKind::MissingContext(type_name::<T>())))
    }

    pub fn find_context<T: Any>(&self) -> Option<&T> {
        self.context.find::<T>()
    }

    pub fn require_context<T: Any>(&self) -> Result<&T, SyntaxError> {
        self.context
            .find::<T>()
            .ok_or_else(|| self.error_at_current(SyntaxErrorKind::MissingContext(type_name::<T>())))
    }

    /// Runs a grammar rule one level deeper.
    fn rule<R>(
        &mut self,
        name: &'static str,
        body: impl FnOnce(&mut Self) -> Result<R, SyntaxError>,
    ) -> Result<R, SyntaxError> {
        self.increase_depth()?;
        debug!(
            rule = name,
            depth = self.depth,
            position = self.current().position,
            "parse"
        );
        let result = body(self);
        self.decrease_depth();
        result
    }

    /// Runs `body` with `value` pushed on the context stack.
    fn with_context<T: Any + Send, R>(
        &mut self,
        value: T,
        body: impl FnOnce(&mut Self) -> Result<R, SyntaxError>,
    ) -> Result<R, SyntaxError> {
        self.enter_context(value);
        let result = body(self);
        self.exit_context::<T>()?;
        result
    }

    // Token helpers

    fn current(&self) -> &Token {
        self.lexer.current()
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current().is(kind)
    }

    fn advance(&mut self) -> Result<Token, SyntaxError> {
        let token = self.lexer.advance()?;
        self.previous_end = token.end();
        Ok(token)
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<Token, SyntaxError> {
        if !self.check(kind) {
            return Err(self.unexpected(expected));
        }
        self.advance()
    }

    fn expect_identifier(&mut self, expected: &str) -> Result<Token, SyntaxError> {
        self.expect(TokenKind::Identifier, expected)
    }

    /// Consumes `name(`, returning the start offset of `name`.
    fn open_call(&mut self, name: &str) -> Result<usize, SyntaxError> {
        let start = self.current().position;
        if !self.current().is_identifier(name) {
            return Err(self.unexpected(&format!("'{}'", name)));
        }
        self.advance()?;
        self.expect(TokenKind::LParen, "'('")?;
        Ok(start)
    }

    fn close_call(&mut self) -> Result<(), SyntaxError> {
        self.expect(TokenKind::RParen, "')'")?;
        Ok(())
    }

    /// Metadata spanning from `start` to the end of the last consumed token.
    fn metadata_from(&self, start: usize) -> Metadata {
        Metadata::new(Span::new(start, self.previous_end.max(start)))
    }

    fn unexpected(&self, expected: &str) -> SyntaxError {
        self.error_at_current(SyntaxErrorKind::Unexpected {
            expected: expected.to_string(),
            found: self.current().to_string(),
        })
    }

    fn error_at_current(&self, kind: SyntaxErrorKind) -> SyntaxError {
        self.lexer.error(kind, self.current().position)
    }
}
