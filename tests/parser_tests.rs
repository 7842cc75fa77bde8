// tests/parser_tests.rs

use std::sync::Arc;

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use sift_lang::ast::*;
use sift_lang::lexer::{Lexer, SyntaxErrorKind};
use sift_lang::parser::{Parser, ParserConfig};
use sift_lang::schema::{Schema, TypeDescriptor};
use sift_lang::{parse_filter, parse_filter_with_schema, parse_request, parse_request_with_schema};

fn comparison(operator: ComparisonOperator, path: &[&str], value: Literal, text: &str) -> BooleanExpression {
    BooleanExpression::Comparison(Comparison::new(
        operator,
        FieldOperand::Path(FieldPath::of(path)),
        Constant::new(value, text),
    ))
}

fn as_comparison(expression: &BooleanExpression) -> &Comparison {
    match expression {
        BooleanExpression::Comparison(comparison) => comparison,
        other => panic!("expected a comparison, got {:?}", other),
    }
}

fn users_schema() -> Schema {
    Schema::new().with_request(
        "users",
        TypeDescriptor::list(TypeDescriptor::object([
            ("age", TypeDescriptor::integer()),
            ("score", TypeDescriptor::decimal()),
            ("born", TypeDescriptor::date()),
            ("seen", TypeDescriptor::datetime().nullable()),
            ("name", TypeDescriptor::string()),
        ])),
    )
}

// ============================================================================
// Comparisons
// ============================================================================

#[test]
fn test_simple_comparison() {
    let expression = parse_filter("eq(age, 5)").unwrap();
    assert_eq!(
        expression,
        comparison(ComparisonOperator::Equal, &["age"], Literal::Integer(5), "5")
    );
}

#[test]
fn test_all_comparison_operators() {
    let test_cases = vec![
        ("eq", ComparisonOperator::Equal),
        ("ne", ComparisonOperator::NotEqual),
        ("gt", ComparisonOperator::GreaterThan),
        ("ge", ComparisonOperator::GreaterEqual),
        ("lt", ComparisonOperator::LessThan),
        ("le", ComparisonOperator::LessEqual),
        ("has", ComparisonOperator::Has),
        ("starts", ComparisonOperator::StartsWith),
        ("ends", ComparisonOperator::EndsWith),
        ("regex", ComparisonOperator::Regex),
    ];

    for (name, operator) in test_cases {
        let text = format!("{}(name, \"x\")", name);
        let expression = parse_filter(&text).unwrap();
        assert_eq!(as_comparison(&expression).operator, operator, "Failed for: {}", text);
    }
}

#[test]
fn test_literals_without_schema() {
    let test_cases = vec![
        ("1", Literal::Integer(1)),
        ("-12", Literal::Integer(-12)),
        ("2.50", Literal::Decimal(Decimal::new(250, 2))),
        ("true", Literal::Boolean(true)),
        ("false", Literal::Boolean(false)),
        ("null", Literal::Null),
        (r#""a\"b""#, Literal::String("a\"b".to_string())),
        (r#""2024-01-31""#, Literal::String("2024-01-31".to_string())),
    ];

    for (text, expected) in test_cases {
        let expression = parse_filter(&format!("eq(x, {})", text)).unwrap();
        let constant = &as_comparison(&expression).right;
        assert_eq!(constant.value, expected, "Failed for: {}", text);
        assert_eq!(constant.text, text);
    }
}

#[test]
fn test_object_and_array_literals() {
    let expression = parse_filter(r#"eq(meta, {"a": [1, 2]})"#).unwrap();
    let Literal::Object(map) = &as_comparison(&expression).right.value else {
        panic!("expected an object literal");
    };
    assert_eq!(map["a"], serde_json::json!([1, 2]));

    let expression = parse_filter(r#"has(tags, ["x", "y"])"#).unwrap();
    assert_eq!(
        as_comparison(&expression).right.value,
        Literal::Array(vec![serde_json::json!("x"), serde_json::json!("y")])
    );
}

#[test]
fn test_invalid_object_literal() {
    let err = parse_filter(r#"eq(meta, {a: 1})"#).unwrap_err();
    assert!(matches!(err.kind, SyntaxErrorKind::InvalidLiteral { kind: "object", .. }));
    assert_eq!(err.position, 9);
}

#[test]
fn test_integer_out_of_range() {
    let err = parse_filter("eq(x, 99999999999999999999)").unwrap_err();
    assert!(matches!(err.kind, SyntaxErrorKind::NumberOutOfRange(_)));
    assert_eq!(err.position, 6);
}

// ============================================================================
// Schema-typed constants
// ============================================================================

#[test]
fn test_schema_types_constants() {
    let schema = users_schema();
    let root = TypeDescriptor::object([
        ("score", TypeDescriptor::decimal()),
        ("born", TypeDescriptor::date()),
        ("seen", TypeDescriptor::datetime()),
    ]);

    let expression = parse_filter_with_schema("gt(score, 3)", &schema, &root).unwrap();
    assert_eq!(
        as_comparison(&expression).right.value,
        Literal::Decimal(Decimal::from(3))
    );

    let expression = parse_filter_with_schema(r#"lt(born, "2000-02-29")"#, &schema, &root).unwrap();
    assert_eq!(
        as_comparison(&expression).right.value,
        Literal::Date(NaiveDate::from_ymd_opt(2000, 2, 29).unwrap())
    );

    let expression =
        parse_filter_with_schema(r#"ge(seen, "2024-05-01T12:30:00+02:00")"#, &schema, &root).unwrap();
    assert!(matches!(as_comparison(&expression).right.value, Literal::DateTime(_)));

    let expression = parse_filter_with_schema(r#"eq(born, "soon")"#, &schema, &root).unwrap();
    assert_eq!(
        as_comparison(&expression).right.value,
        Literal::String("soon".to_string())
    );
}

#[test]
fn test_request_schema_types_constants() {
    let schema = users_schema();
    let request = parse_request_with_schema(r#"users(filter(eq(born, "1990-06-01")))"#, &schema).unwrap();
    let filter = request.filter().unwrap();
    assert!(matches!(
        as_comparison(&filter.predicate).right.value,
        Literal::Date(_)
    ));
}

#[test]
fn test_field_function_return_type_drives_literal() {
    let schema = users_schema();
    let root = TypeDescriptor::object([("score", TypeDescriptor::decimal())]);
    let expression = parse_filter_with_schema("eq(round(score), 4)", &schema, &root).unwrap();
    // `round` returns `any`, so the field's own type applies.
    assert_eq!(
        as_comparison(&expression).right.value,
        Literal::Decimal(Decimal::from(4))
    );
}

#[test]
fn test_field_function_return_type_wins_over_field_type() {
    let schema = users_schema();
    let root = TypeDescriptor::object([("born", TypeDescriptor::date())]);
    let expression = parse_filter_with_schema(r#"eq(year(born), 2020)"#, &schema, &root).unwrap();
    assert_eq!(as_comparison(&expression).right.value, Literal::Integer(2020));
}

#[test]
fn test_comparison_constant_requires_comparison() {
    let mut parser = Parser::new(Lexer::new("5").unwrap());
    let err = parser.parse_comparison_constant().unwrap_err();
    assert!(matches!(err.kind, SyntaxErrorKind::MissingContext(name) if name.ends_with("ComparisonScope")));
    assert_eq!(err.position, 0);
    assert_eq!(parser.depth(), 0);

    let constant = parser.parse_constant().unwrap();
    assert_eq!(constant.value, Literal::Integer(5));
}

// ============================================================================
// Boolean structure
// ============================================================================

#[test]
fn test_and_folds_left() {
    let expression = parse_filter("and(eq(a, 1), eq(b, 2), eq(c, 3))").unwrap();
    let a = comparison(ComparisonOperator::Equal, &["a"], Literal::Integer(1), "1");
    let b = comparison(ComparisonOperator::Equal, &["b"], Literal::Integer(2), "2");
    let c = comparison(ComparisonOperator::Equal, &["c"], Literal::Integer(3), "3");
    let expected = BooleanExpression::And(Binary::new(
        BooleanExpression::And(Binary::new(a, b)),
        c,
    ));
    assert_eq!(expression, expected);
}

#[test]
fn test_junction_shares_call_span() {
    let text = "or(eq(a, 1), eq(b, 2), eq(c, 3))";
    let BooleanExpression::Or(outer) = parse_filter(text).unwrap() else {
        panic!("expected or");
    };
    let BooleanExpression::Or(inner) = outer.left.as_ref() else {
        panic!("expected nested or");
    };
    assert_eq!(outer.metadata.span, Some(Span::new(0, text.len())));
    assert_eq!(inner.metadata.span, outer.metadata.span);
}

#[test]
fn test_junction_requires_two_operands() {
    let err = parse_filter("and(eq(a, 1))").unwrap_err();
    assert!(matches!(err.kind, SyntaxErrorKind::Unexpected { .. }));
    assert_eq!(err.position, 12);
}

#[test]
fn test_not() {
    let expression = parse_filter("not(eq(a, 1))").unwrap();
    let BooleanExpression::Not(not) = expression else {
        panic!("expected not");
    };
    assert_eq!(
        *not.operand,
        comparison(ComparisonOperator::Equal, &["a"], Literal::Integer(1), "1")
    );
}

#[test]
fn test_unknown_function_name() {
    let err = parse_filter("like(a, 1)").unwrap_err();
    assert_eq!(err.kind, SyntaxErrorKind::UnknownIdentifier("like".to_string()));
    assert_eq!(err.position, 0);
}

// ============================================================================
// Field paths and functions
// ============================================================================

#[test]
fn test_nested_and_bracketed_paths() {
    let expression = parse_filter(r#"eq(address["zip code"].city, "x")"#).unwrap();
    let path = as_comparison(&expression).left.path();
    assert_eq!(path, &FieldPath::of(&["address", "zip code", "city"]));
    assert_eq!(path.to_string(), r#"address["zip code"].city"#);
}

#[test]
fn test_field_function() {
    let expression = parse_filter("eq(year(created), 2024)").unwrap();
    let left = &as_comparison(&expression).left;
    assert_eq!(left.function(), Some(FieldFunctionName::Year));
    assert_eq!(left.path(), &FieldPath::of(&["created"]));
}

#[test]
fn test_function_name_as_field() {
    let expression = parse_filter("eq(year, 2024)").unwrap();
    let left = &as_comparison(&expression).left;
    assert_eq!(left.function(), None);
    assert_eq!(left.path(), &FieldPath::of(&["year"]));
}

#[test]
fn test_dot_requires_field_name() {
    let err = parse_filter("eq(a., 1)").unwrap_err();
    assert!(matches!(err.kind, SyntaxErrorKind::Unexpected { .. }));
    assert_eq!(err.position, 5);
}

// ============================================================================
// Quantifiers
// ============================================================================

#[test]
fn test_current_item_binds_to_enclosing_quantifier() {
    let expression = parse_filter("any(orders, gt($it.total, 100))").unwrap();
    let BooleanExpression::Quantifier(quantifier) = &expression else {
        panic!("expected quantifier");
    };
    assert_eq!(quantifier.kind, QuantifierKind::Any);

    let path = as_comparison(&quantifier.predicate).left.path();
    let Some(FieldReference::CurrentItem(item)) = path.segments.first() else {
        panic!("expected $it");
    };
    let bound = item.collection().unwrap();
    assert!(Arc::ptr_eq(&bound, &quantifier.collection));
}

#[test]
fn test_nested_quantifiers_bind_innermost() {
    let expression = parse_filter("all(orders, any($it.lines, eq($it.sku, \"A\")))").unwrap();
    let BooleanExpression::Quantifier(outer) = &expression else {
        panic!("expected quantifier");
    };
    let BooleanExpression::Quantifier(inner) = outer.predicate.as_ref() else {
        panic!("expected inner quantifier");
    };

    let Some(FieldReference::CurrentItem(outer_item)) = inner.collection.segments.first() else {
        panic!("expected $it in the inner collection");
    };
    assert!(Arc::ptr_eq(&outer_item.collection().unwrap(), &outer.collection));

    let path = as_comparison(&inner.predicate).left.path();
    let Some(FieldReference::CurrentItem(inner_item)) = path.segments.first() else {
        panic!("expected $it");
    };
    assert!(Arc::ptr_eq(&inner_item.collection().unwrap(), &inner.collection));
}

#[test]
fn test_current_item_outside_quantifier_is_unbound() {
    let expression = parse_filter("eq($it, 1)").unwrap();
    let path = as_comparison(&expression).left.path();
    let Some(FieldReference::CurrentItem(item)) = path.segments.first() else {
        panic!("expected $it");
    };
    assert!(item.collection().is_none());
}

// ============================================================================
// Requests
// ============================================================================

#[test]
fn test_full_request() {
    let request = parse_request(
        r#"users(filter(ge(age, 18)), sort(desc(age), asc(tolower(name))), skip(5), limit(10), count())"#,
    )
    .unwrap();
    assert_eq!(request.name, "users");

    let names: Vec<&str> = request.parameters.iter().map(Parameter::name).collect();
    assert_eq!(names, vec!["filter", "sort", "skip", "limit", "count"]);

    let Parameter::Sort(sort) = &request.parameters[1] else {
        panic!("expected sort");
    };
    assert_eq!(sort.keys[0].direction, SortDirection::Descending);
    assert_eq!(sort.keys[1].operand.function(), Some(FieldFunctionName::ToLower));

    let Parameter::Limit(limit) = &request.parameters[3] else {
        panic!("expected limit");
    };
    assert_eq!(limit.amount.value, Literal::Integer(10));
}

#[test]
fn test_request_without_parameters() {
    let request = parse_request("users()").unwrap();
    assert!(request.parameters.is_empty());
    assert_eq!(request.metadata.span, Some(Span::new(0, 7)));
}

#[test]
fn test_input_parameter() {
    let request = parse_request(r#"create(input({"name": "x"}))"#).unwrap();
    let Parameter::Input(input) = &request.parameters[0] else {
        panic!("expected input");
    };
    assert!(matches!(input.value.value, Literal::Object(_)));
}

#[test]
fn test_unknown_parameter() {
    let err = parse_request("users(page(1))").unwrap_err();
    assert_eq!(err.kind, SyntaxErrorKind::UnknownIdentifier("page".to_string()));
    assert_eq!(err.position, 6);
}

#[test]
fn test_paging_requires_number() {
    let err = parse_request(r#"users(limit("10"))"#).unwrap_err();
    assert!(matches!(err.kind, SyntaxErrorKind::Unexpected { .. }));
    assert_eq!(err.position, 12);
}

#[test]
fn test_trailing_input_is_rejected() {
    let err = parse_request("users() extra").unwrap_err();
    assert!(matches!(err.kind, SyntaxErrorKind::Unexpected { .. }));
    assert_eq!(err.position, 8);
}

#[test]
fn test_spans_cover_source_text() {
    let text = "users(filter(eq(age, 5)))";
    let request = parse_request(text).unwrap();
    let filter = request.filter().unwrap();
    assert_eq!(filter.metadata.span, Some(Span::new(6, 24)));

    let comparison = as_comparison(&filter.predicate);
    assert_eq!(comparison.metadata.span, Some(Span::new(13, 23)));
    assert_eq!(comparison.right.metadata.span, Some(Span::new(21, 22)));
}

// ============================================================================
// Depth guard
// ============================================================================

#[test]
fn test_depth_guard_stops_deep_nesting() {
    let text = "and(".repeat(50);
    let mut parser = Parser::new(Lexer::new(&text).unwrap())
        .with_config(ParserConfig::default().with_max_depth(10));
    let err = parser.parse_filter().unwrap_err();
    assert_eq!(err.kind, SyntaxErrorKind::DepthExceeded(10));
    assert_eq!(err.position, 20);
}

#[test]
fn test_depth_guard_allows_moderate_nesting() {
    let text = format!("{}eq(a, 1){}", "not(".repeat(20), ")".repeat(20));
    assert!(parse_filter(&text).is_ok());

    let mut parser = Parser::new(Lexer::new(&text).unwrap())
        .with_config(ParserConfig::default().with_max_depth(20));
    assert!(matches!(
        parser.parse_filter().unwrap_err().kind,
        SyntaxErrorKind::DepthExceeded(20)
    ));
}

#[test]
fn test_depth_is_restored_after_parse() {
    let mut parser = Parser::new(Lexer::new("not(eq(a, 1))").unwrap());
    parser.parse_filter().unwrap();
    assert_eq!(parser.depth(), 0);

    let mut parser = Parser::new(Lexer::new("not(eq(a, ))").unwrap());
    assert!(parser.parse_filter().is_err());
    assert_eq!(parser.depth(), 0);
}
