use std::sync::{Arc, Weak};

use crate::{
    ast::{
        CurrentItem, Field, FieldFunction, FieldFunctionName, FieldOperand, FieldPath,
        FieldReference, Span, TokenKind,
    },
    lexer::{unescape, SyntaxError},
};

use super::{Parser, QuantifierScope};

impl Parser<'_> {
    /// A field path, optionally wrapped in a field function.
    ///
    /// A field function name only starts a call when followed by `(`, so a
    /// field named `year` still parses as a path.
    pub fn parse_operand(&mut self) -> Result<FieldOperand, SyntaxError> {
        self.rule("operand", |p| {
            let function = match p.current().kind {
                TokenKind::Identifier => FieldFunctionName::from_name(&p.current().text),
                _ => None,
            };
            let is_call = match function {
                Some(_) => p.lexer.peek()?.is(TokenKind::LParen),
                None => false,
            };
            match function {
                Some(function) if is_call => {
                    Ok(FieldOperand::Function(p.parse_field_function(function)?))
                }
                _ => Ok(FieldOperand::Path(p.parse_field_path()?)),
            }
        })
    }

    fn parse_field_function(
        &mut self,
        function: FieldFunctionName,
    ) -> Result<FieldFunction, SyntaxError> {
        self.rule(function.name(), |p| {
            let start = p.open_call(function.name())?;
            let path = p.parse_field_path()?;
            p.close_call()?;
            Ok(FieldFunction {
                function,
                path,
                metadata: p.metadata_from(start),
            })
        })
    }

    /// `a.b`, `a["b c"]`, `$it.name`
    pub fn parse_field_path(&mut self) -> Result<FieldPath, SyntaxError> {
        self.rule("field path", |p| {
            let start = p.current().position;
            let first = match p.current().kind {
                TokenKind::Identifier => p.parse_plain_field()?,
                TokenKind::LBracket => p.parse_bracket_field()?,
                TokenKind::CurrentItem => {
                    let token = p.advance()?;
                    let binding = p
                        .find_context::<QuantifierScope>()
                        .map(|scope| Arc::downgrade(&scope.collection))
                        .unwrap_or_else(Weak::new);
                    FieldReference::CurrentItem(CurrentItem {
                        binding,
                        metadata: Span::new(token.position, token.end()).into(),
                    })
                }
                _ => return Err(p.unexpected("field path")),
            };

            let mut segments = vec![first];
            loop {
                match p.current().kind {
                    TokenKind::Dot => {
                        p.advance()?;
                        if !p.check(TokenKind::Identifier) {
                            return Err(p.unexpected("field name"));
                        }
                        segments.push(p.parse_plain_field()?);
                    }
                    TokenKind::LBracket => segments.push(p.parse_bracket_field()?),
                    _ => break,
                }
            }

            Ok(FieldPath {
                segments,
                metadata: p.metadata_from(start),
            })
        })
    }

    fn parse_plain_field(&mut self) -> Result<FieldReference, SyntaxError> {
        let token = self.expect_identifier("field name")?;
        Ok(FieldReference::Field(Field {
            metadata: Span::new(token.position, token.end()).into(),
            name: token.text,
        }))
    }

    fn parse_bracket_field(&mut self) -> Result<FieldReference, SyntaxError> {
        let start = self.expect(TokenKind::LBracket, "'['")?.position;
        let name = unescape(&self.expect(TokenKind::String, "quoted field name")?.text);
        self.expect(TokenKind::RBracket, "']'")?;
        Ok(FieldReference::Field(Field {
            name,
            metadata: self.metadata_from(start),
        }))
    }
}
