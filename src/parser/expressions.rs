use std::sync::Arc;

use crate::{
    ast::{
        Binary, BooleanExpression, Comparison, ComparisonOperator, Not, Quantifier,
        QuantifierKind, TokenKind,
    },
    lexer::{SyntaxError, SyntaxErrorKind},
};

use super::{ComparisonScope, Parser, QuantifierScope};

#[derive(Clone, Copy)]
enum Junction {
    And,
    Or,
}

impl Parser<'_> {
    /// Parse a boolean expression, dispatching on its leading name.
    pub fn parse_boolean(&mut self) -> Result<BooleanExpression, SyntaxError> {
        self.rule("boolean", |p| {
            if !p.check(TokenKind::Identifier) {
                return Err(p.unexpected("boolean expression"));
            }
            let name = p.current().text.clone();
            match name.as_str() {
                "and" => p.parse_junction(Junction::And),
                "or" => p.parse_junction(Junction::Or),
                "not" => p.parse_not(),
                "any" => p.parse_quantifier(QuantifierKind::Any),
                "all" => p.parse_quantifier(QuantifierKind::All),
                other => match ComparisonOperator::from_name(other) {
                    Some(operator) => p.parse_comparison(operator),
                    None => Err(p.error_at_current(SyntaxErrorKind::UnknownIdentifier(
                        other.to_string(),
                    ))),
                },
            }
        })
    }

    /// `and(a, b, c)` folds to `And(And(a, b), c)`; every folded node shares
    /// the metadata of the whole call.
    fn parse_junction(&mut self, junction: Junction) -> Result<BooleanExpression, SyntaxError> {
        let name = match junction {
            Junction::And => "and",
            Junction::Or => "or",
        };
        self.rule(name, |p| {
            let start = p.open_call(name)?;
            let first = p.parse_boolean()?;
            p.expect(TokenKind::Comma, "','")?;
            let mut rest = vec![p.parse_boolean()?];
            while p.check(TokenKind::Comma) {
                p.advance()?;
                rest.push(p.parse_boolean()?);
            }
            p.close_call()?;

            let metadata = p.metadata_from(start);
            Ok(rest.into_iter().fold(first, |left, right| {
                let binary = Binary {
                    left: Box::new(left),
                    right: Box::new(right),
                    metadata,
                };
                match junction {
                    Junction::And => BooleanExpression::And(binary),
                    Junction::Or => BooleanExpression::Or(binary),
                }
            }))
        })
    }

    fn parse_not(&mut self) -> Result<BooleanExpression, SyntaxError> {
        self.rule("not", |p| {
            let start = p.open_call("not")?;
            let operand = p.parse_boolean()?;
            p.close_call()?;
            Ok(BooleanExpression::Not(Not {
                operand: Box::new(operand),
                metadata: p.metadata_from(start),
            }))
        })
    }

    fn parse_comparison(
        &mut self,
        operator: ComparisonOperator,
    ) -> Result<BooleanExpression, SyntaxError> {
        self.rule(operator.name(), |p| {
            let start = p.open_call(operator.name())?;
            let left = p.parse_operand()?;
            p.expect(TokenKind::Comma, "','")?;

            let scope = ComparisonScope {
                operator,
                left: left.clone(),
            };
            let right = p.with_context(scope, |p| p.parse_comparison_constant())?;
            p.close_call()?;

            Ok(BooleanExpression::Comparison(Comparison {
                operator,
                left,
                right,
                metadata: p.metadata_from(start),
            }))
        })
    }

    /// `any(path, predicate)`: `$it` inside the predicate binds to `path`.
    fn parse_quantifier(&mut self, kind: QuantifierKind) -> Result<BooleanExpression, SyntaxError> {
        self.rule(kind.name(), |p| {
            let start = p.open_call(kind.name())?;
            let collection = Arc::new(p.parse_field_path()?);
            p.expect(TokenKind::Comma, "','")?;

            let scope = QuantifierScope {
                collection: Arc::clone(&collection),
            };
            let predicate = p.with_context(scope, |p| p.parse_boolean())?;
            p.close_call()?;

            Ok(BooleanExpression::Quantifier(Quantifier {
                kind,
                collection,
                predicate: Box::new(predicate),
                metadata: p.metadata_from(start),
            }))
        })
    }
}
