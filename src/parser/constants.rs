use std::str::FromStr;

use chrono::{DateTime, NaiveDate};
use rust_decimal::Decimal;

use crate::{
    ast::{Constant, Literal, Span, Token, TokenKind},
    lexer::{unescape, SyntaxError, SyntaxErrorKind},
    schema::{expected_constant, resolve_path, ValueType},
};

use super::{ComparisonScope, LiteralHint, Parser, RequestScope};

impl Parser<'_> {
    /// Parse a literal constant.
    ///
    /// The literal type follows the syntax of the token, or the type a
    /// surrounding parameter asks for through a [`LiteralHint`].
    pub fn parse_constant(&mut self) -> Result<Constant, SyntaxError> {
        let expected = self
            .find_context::<LiteralHint>()
            .map(|LiteralHint(value_type)| *value_type);
        self.parse_typed_constant(expected)
    }

    /// Parse the constant of the comparison being parsed.
    ///
    /// With a schema the literal is refined by the type the comparison
    /// expects: an integral number becomes a decimal where a decimal is
    /// expected and a string becomes a date or timestamp where one is
    /// expected. Fails outside of a comparison.
    pub fn parse_comparison_constant(&mut self) -> Result<Constant, SyntaxError> {
        let scope = self.require_context::<ComparisonScope>()?;
        let expected = self.comparison_expectation(scope);
        self.parse_typed_constant(expected)
    }

    fn parse_typed_constant(
        &mut self,
        expected: Option<ValueType>,
    ) -> Result<Constant, SyntaxError> {
        self.rule("constant", |p| {
            if p.check(TokenKind::LBracket) {
                p.lexer.reinterpret_current_as_array()?;
            }

            let token = p.current().clone();
            let value = match token.kind {
                TokenKind::Number => p.number_literal(&token, expected)?,
                TokenKind::String => string_literal(&token, expected),
                TokenKind::Boolean => Literal::Boolean(token.text == "true"),
                TokenKind::Null => Literal::Null,
                TokenKind::ObjectLiteral => match p.json_literal(&token, "object")? {
                    serde_json::Value::Object(map) => Literal::Object(map),
                    _ => return Err(p.unexpected("object literal")),
                },
                TokenKind::ArrayLiteral => match p.json_literal(&token, "array")? {
                    serde_json::Value::Array(items) => Literal::Array(items),
                    _ => return Err(p.unexpected("array literal")),
                },
                _ => return Err(p.unexpected("constant")),
            };
            p.advance()?;

            Ok(Constant {
                value,
                metadata: Span::new(token.position, token.end()).into(),
                text: token.text,
            })
        })
    }

    /// The value type the schema expects for the constant of `scope`.
    fn comparison_expectation(&self, scope: &ComparisonScope) -> Option<ValueType> {
        let schema = self.schema?;
        let field = self
            .find_context::<RequestScope>()
            .and_then(|request| request.root.as_ref())
            .and_then(|root| resolve_path(root, scope.left.path()).ok());

        expected_constant(schema, scope.operator, scope.left.function(), field)
            .map(|expectation| expectation.value_type)
    }

    fn number_literal(
        &self,
        token: &Token,
        expected: Option<ValueType>,
    ) -> Result<Literal, SyntaxError> {
        let out_of_range = || {
            self.lexer.error(
                SyntaxErrorKind::NumberOutOfRange(token.text.clone()),
                token.position,
            )
        };

        if token.text.contains('.') {
            return Decimal::from_str(&token.text)
                .map(Literal::Decimal)
                .map_err(|_| out_of_range());
        }

        let integer = i64::from_str(&token.text).map_err(|_| out_of_range())?;
        Ok(match expected {
            Some(ValueType::Decimal) => Literal::Decimal(Decimal::from(integer)),
            _ => Literal::Integer(integer),
        })
    }

    fn json_literal(
        &self,
        token: &Token,
        kind: &'static str,
    ) -> Result<serde_json::Value, SyntaxError> {
        serde_json::from_str(&token.text).map_err(|e| {
            self.lexer.error(
                SyntaxErrorKind::InvalidLiteral {
                    kind,
                    reason: e.to_string(),
                },
                token.position,
            )
        })
    }
}

/// A string token, read as a date or timestamp when one is expected and the
/// text parses as such.
fn string_literal(token: &Token, expected: Option<ValueType>) -> Literal {
    let text = unescape(&token.text);
    match expected {
        Some(ValueType::Date) => match NaiveDate::parse_from_str(&text, "%Y-%m-%d") {
            Ok(date) => Literal::Date(date),
            Err(_) => Literal::String(text),
        },
        Some(ValueType::DateTime) => {
            if let Ok(timestamp) = DateTime::parse_from_rfc3339(&text) {
                Literal::DateTime(timestamp)
            } else if let Ok(date) = NaiveDate::parse_from_str(&text, "%Y-%m-%d") {
                Literal::Date(date)
            } else {
                Literal::String(text)
            }
        }
        _ => Literal::String(text),
    }
}
