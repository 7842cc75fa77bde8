use crate::{
    ast::{
        Count, Filter, Input, Paging, Parameter, Request, Sort, SortDirection, SortExpression,
        TokenKind,
    },
    lexer::{SyntaxError, SyntaxErrorKind},
    schema::{item_type, ValueType},
};

use super::{LiteralHint, Parser, RequestScope};

impl Parser<'_> {
    /// Parse a complete request: `name(parameter, ...)`.
    pub fn parse_request(&mut self) -> Result<Request, SyntaxError> {
        self.rule("request", |p| {
            let start = p.current().position;
            let name = p.expect_identifier("request name")?.text;
            let root = p
                .schema
                .and_then(|schema| schema.request(&name))
                .map(|returns| item_type(returns).clone());

            let parameters = p.with_context(RequestScope { root }, |p| {
                p.expect(TokenKind::LParen, "'('")?;
                let mut parameters = vec![];
                if !p.check(TokenKind::RParen) {
                    loop {
                        parameters.push(p.parse_parameter()?);
                        if !p.check(TokenKind::Comma) {
                            break;
                        }
                        p.advance()?;
                    }
                }
                p.close_call()?;
                Ok(parameters)
            })?;

            let metadata = p.metadata_from(start);
            p.expect(TokenKind::Eof, "end of input")?;

            Ok(Request {
                name,
                parameters,
                metadata,
            })
        })
    }

    fn parse_parameter(&mut self) -> Result<Parameter, SyntaxError> {
        self.rule("parameter", |p| {
            if !p.check(TokenKind::Identifier) {
                return Err(p.unexpected("request parameter"));
            }
            let name = p.current().text.clone();
            match name.as_str() {
                "filter" => p.parse_filter_parameter(),
                "sort" => p.parse_sort(),
                "skip" => Ok(Parameter::Skip(p.parse_paging("skip")?)),
                "limit" => Ok(Parameter::Limit(p.parse_paging("limit")?)),
                "count" => p.parse_count(),
                "input" => p.parse_input(),
                other => Err(p.error_at_current(SyntaxErrorKind::UnknownIdentifier(
                    other.to_string(),
                ))),
            }
        })
    }

    fn parse_filter_parameter(&mut self) -> Result<Parameter, SyntaxError> {
        self.rule("filter", |p| {
            let start = p.open_call("filter")?;
            let predicate = p.parse_boolean()?;
            p.close_call()?;
            Ok(Parameter::Filter(Filter {
                predicate,
                metadata: p.metadata_from(start),
            }))
        })
    }

    fn parse_sort(&mut self) -> Result<Parameter, SyntaxError> {
        self.rule("sort", |p| {
            let start = p.open_call("sort")?;
            let mut keys = vec![p.parse_sort_expression()?];
            while p.check(TokenKind::Comma) {
                p.advance()?;
                keys.push(p.parse_sort_expression()?);
            }
            p.close_call()?;
            Ok(Parameter::Sort(Sort {
                keys,
                metadata: p.metadata_from(start),
            }))
        })
    }

    fn parse_sort_expression(&mut self) -> Result<SortExpression, SyntaxError> {
        self.rule("sort expression", |p| {
            if !p.check(TokenKind::Identifier) {
                return Err(p.unexpected("'asc' or 'desc'"));
            }
            let direction = match p.current().text.as_str() {
                "asc" => SortDirection::Ascending,
                "desc" => SortDirection::Descending,
                other => {
                    return Err(p.error_at_current(SyntaxErrorKind::UnknownIdentifier(
                        other.to_string(),
                    )));
                }
            };

            let start = p.open_call(direction.name())?;
            let operand = p.parse_operand()?;
            p.close_call()?;
            Ok(SortExpression {
                direction,
                operand,
                metadata: p.metadata_from(start),
            })
        })
    }

    fn parse_paging(&mut self, name: &'static str) -> Result<Paging, SyntaxError> {
        self.rule(name, |p| {
            let start = p.open_call(name)?;
            if !p.check(TokenKind::Number) {
                return Err(p.unexpected("number"));
            }
            let amount = p.with_context(LiteralHint(ValueType::Integer), |p| p.parse_constant())?;
            p.close_call()?;
            Ok(Paging {
                amount,
                metadata: p.metadata_from(start),
            })
        })
    }

    fn parse_count(&mut self) -> Result<Parameter, SyntaxError> {
        self.rule("count", |p| {
            let start = p.open_call("count")?;
            p.close_call()?;
            Ok(Parameter::Count(Count {
                metadata: p.metadata_from(start),
            }))
        })
    }

    fn parse_input(&mut self) -> Result<Parameter, SyntaxError> {
        self.rule("input", |p| {
            let start = p.open_call("input")?;
            let value = p.parse_constant()?;
            p.close_call()?;
            Ok(Parameter::Input(Input {
                value,
                metadata: p.metadata_from(start),
            }))
        })
    }
}
