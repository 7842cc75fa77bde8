// tests/validator_tests.rs

use pretty_assertions::assert_eq;
use sift_lang::ast::{ComparisonOperator, FieldFunctionName, LiteralType, NodeKind};
use sift_lang::schema::{FilterCapabilities, Schema, TypeDescriptor, ValueType};
use sift_lang::validator::{ValidationErrorKind, Validator, ValidatorConfig};
use sift_lang::{parse_filter_with_schema, parse_request, parse_request_with_schema};

fn user() -> TypeDescriptor {
    TypeDescriptor::object([
        ("age", TypeDescriptor::integer()),
        ("nick", TypeDescriptor::string().nullable()),
        (
            "name",
            TypeDescriptor::string().with_capabilities(&FilterCapabilities::comparisons([
                "eq", "starts",
            ])),
        ),
        (
            "created",
            TypeDescriptor::datetime().with_capabilities(
                &FilterCapabilities::comparisons(["eq"]).with_function("year", ["eq", "gt"]),
            ),
        ),
        ("score", TypeDescriptor::decimal()),
        ("secret", TypeDescriptor::string().unsortable()),
        ("tags", TypeDescriptor::list(TypeDescriptor::string())),
        (
            "address",
            TypeDescriptor::object([("city", TypeDescriptor::string())]),
        ),
        (
            "orders",
            TypeDescriptor::list(TypeDescriptor::object([
                ("total", TypeDescriptor::decimal()),
                (
                    "lines",
                    TypeDescriptor::list(TypeDescriptor::object([(
                        "sku",
                        TypeDescriptor::string(),
                    )])),
                ),
            ])),
        ),
    ])
}

fn schema() -> Schema {
    Schema::new().with_request("users", TypeDescriptor::list(user()))
}

/// Parses `text` against the schema and returns every finding.
fn findings(text: &str) -> Vec<ValidationErrorKind> {
    findings_with(text, ValidatorConfig::default())
}

fn findings_with(text: &str, config: ValidatorConfig) -> Vec<ValidationErrorKind> {
    let schema = schema();
    let request = parse_request_with_schema(text, &schema).unwrap();
    let report = Validator::with_config(&schema, config)
        .validate_request(&request)
        .unwrap();
    report.kinds().cloned().collect()
}

// ============================================================================
// Constant typing
// ============================================================================

#[test]
fn test_matching_constant_is_valid() {
    assert_eq!(findings("users(filter(eq(age, 5)))"), vec![]);
}

#[test]
fn test_null_on_non_nullable_field() {
    assert_eq!(
        findings("users(filter(eq(age, null)))"),
        vec![ValidationErrorKind::NullNotAllowed {
            comparison: ComparisonOperator::Equal,
            function: None,
            path: "age".to_string(),
        }]
    );
}

#[test]
fn test_null_on_nullable_field() {
    assert_eq!(findings("users(filter(eq(nick, null)))"), vec![]);
}

#[test]
fn test_type_mismatch() {
    assert_eq!(
        findings(r#"users(filter(eq(age, "x")))"#),
        vec![ValidationErrorKind::TypeMismatch {
            comparison: ComparisonOperator::Equal,
            function: None,
            path: "age".to_string(),
            expected: ValueType::Integer,
            actual: LiteralType::String,
        }]
    );
}

#[test]
fn test_integer_widens_to_decimal() {
    assert_eq!(findings("users(filter(gt(score, 3)))"), vec![]);
    assert_eq!(findings("users(filter(gt(score, 3.5)))"), vec![]);
}

#[test]
fn test_decimal_does_not_narrow_to_integer() {
    let kinds = findings("users(filter(gt(age, 3.5)))");
    assert!(matches!(
        kinds.as_slice(),
        [ValidationErrorKind::TypeMismatch {
            expected: ValueType::Integer,
            actual: LiteralType::Decimal,
            ..
        }]
    ));
}

#[test]
fn test_date_string_against_datetime_field() {
    assert_eq!(findings(r#"users(filter(eq(created, "2024-01-01")))"#), vec![]);
    assert_eq!(
        findings(r#"users(filter(eq(created, "2024-01-01T08:00:00Z")))"#),
        vec![]
    );
}

#[test]
fn test_textual_comparison_expects_string() {
    let kinds = findings("users(filter(starts(name, 5)))");
    assert!(matches!(
        kinds.as_slice(),
        [ValidationErrorKind::TypeMismatch {
            comparison: ComparisonOperator::StartsWith,
            expected: ValueType::String,
            actual: LiteralType::Integer,
            ..
        }]
    ));
}

#[test]
fn test_field_function_return_type() {
    assert_eq!(findings("users(filter(eq(year(created), 2024)))"), vec![]);

    let kinds = findings(r#"users(filter(eq(year(created), "2024")))"#);
    assert!(matches!(
        kinds.as_slice(),
        [ValidationErrorKind::TypeMismatch {
            function: Some(FieldFunctionName::Year),
            expected: ValueType::Integer,
            ..
        }]
    ));
}

#[test]
fn test_isnull_does_not_inherit_nullability() {
    assert_eq!(findings("users(filter(eq(isnull(nick), true)))"), vec![]);
    assert!(matches!(
        findings("users(filter(eq(isnull(nick), null)))").as_slice(),
        [ValidationErrorKind::NullNotAllowed { .. }]
    ));
}

#[test]
fn test_tolower_inherits_nullability() {
    assert_eq!(findings("users(filter(eq(tolower(nick), null)))"), vec![]);
}

#[test]
fn test_invalid_regex() {
    assert!(matches!(
        findings(r#"users(filter(regex(nick, "(")))"#).as_slice(),
        [ValidationErrorKind::InvalidPattern { .. }]
    ));
    assert_eq!(findings(r#"users(filter(regex(nick, "^a.*")))"#), vec![]);
}

#[test]
fn test_each_comparison_is_checked() {
    let kinds = findings(r#"users(filter(and(eq(age, null), eq(age, "x"), eq(age, 1))))"#);
    assert_eq!(kinds.len(), 2);
    assert!(matches!(kinds[0], ValidationErrorKind::NullNotAllowed { .. }));
    assert!(matches!(kinds[1], ValidationErrorKind::TypeMismatch { .. }));
}

// ============================================================================
// Capabilities
// ============================================================================

#[test]
fn test_capability_allows_listed_comparison() {
    assert_eq!(findings(r#"users(filter(starts(name, "A")))"#), vec![]);
}

#[test]
fn test_capability_rejects_unlisted_comparison() {
    assert_eq!(
        findings(r#"users(filter(gt(name, "A")))"#),
        vec![ValidationErrorKind::UnsupportedOperation {
            comparison: ComparisonOperator::GreaterThan,
            function: None,
            path: "name".to_string(),
        }]
    );
}

#[test]
fn test_capability_per_field_function() {
    assert_eq!(findings("users(filter(gt(year(created), 2000)))"), vec![]);
    assert_eq!(
        findings("users(filter(lt(year(created), 2000)))"),
        vec![ValidationErrorKind::UnsupportedOperation {
            comparison: ComparisonOperator::LessThan,
            function: Some(FieldFunctionName::Year),
            path: "created".to_string(),
        }]
    );
    assert!(matches!(
        findings("users(filter(eq(month(created), 1)))").as_slice(),
        [ValidationErrorKind::UnsupportedOperation { .. }]
    ));
}

#[test]
fn test_malformed_capability_extension() {
    let schema = Schema::new().with_request(
        "users",
        TypeDescriptor::list(TypeDescriptor::object([(
            "age",
            TypeDescriptor::integer()
                .with_extension("filter", serde_json::json!({"comparisons": "eq"})),
        )])),
    );
    let request = parse_request_with_schema("users(filter(eq(age, 1)))", &schema).unwrap();
    let report = Validator::new(&schema).validate_request(&request).unwrap();
    assert!(matches!(
        report.kinds().collect::<Vec<_>>().as_slice(),
        [ValidationErrorKind::InvalidExtension { key: "filter", .. }]
    ));
}

// ============================================================================
// Sorting
// ============================================================================

#[test]
fn test_sortable_fields() {
    assert_eq!(findings("users(sort(asc(age), desc(tolower(name))))"), vec![]);
}

#[test]
fn test_unsortable_field() {
    assert_eq!(
        findings("users(sort(asc(secret)))"),
        vec![ValidationErrorKind::NotSortable {
            path: "secret".to_string(),
        }]
    );
}

#[test]
fn test_sort_by_list_field() {
    assert_eq!(
        findings("users(sort(asc(tags)))"),
        vec![ValidationErrorKind::UnsortableType {
            path: "tags".to_string(),
            actual: ValueType::List,
        }]
    );
}

// ============================================================================
// Field paths
// ============================================================================

#[test]
fn test_unknown_field() {
    assert_eq!(
        findings("users(filter(eq(agee, 1)))"),
        vec![ValidationErrorKind::UnknownField {
            field: "agee".to_string(),
            path: "agee".to_string(),
        }]
    );
}

#[test]
fn test_nested_field() {
    assert_eq!(findings(r#"users(filter(eq(address.city, "Oslo")))"#), vec![]);
    assert_eq!(
        findings(r#"users(filter(eq(address.zip, "0150")))"#),
        vec![ValidationErrorKind::UnknownField {
            field: "zip".to_string(),
            path: "address.zip".to_string(),
        }]
    );
}

#[test]
fn test_path_through_scalar() {
    assert_eq!(
        findings("users(filter(eq(age.value, 1)))"),
        vec![ValidationErrorKind::NotAnObject {
            field: "value".to_string(),
            path: "age.value".to_string(),
        }]
    );
}

#[test]
fn test_function_argument_type() {
    assert_eq!(
        findings("users(filter(eq(year(name), 2024)))"),
        vec![ValidationErrorKind::FunctionArgumentMismatch {
            function: FieldFunctionName::Year,
            path: "name".to_string(),
            expected: ValueType::DateTime,
            actual: ValueType::String,
        }]
    );
    assert_eq!(findings("users(filter(eq(round(score), 2)))"), vec![]);
}

// ============================================================================
// Quantifiers and $it
// ============================================================================

#[test]
fn test_quantifier_over_list() {
    assert_eq!(findings("users(filter(any(orders, gt($it.total, 100))))"), vec![]);
    assert_eq!(findings(r#"users(filter(all(tags, ne($it, "x"))))"#), vec![]);
}

#[test]
fn test_nested_quantifiers() {
    assert_eq!(
        findings(r#"users(filter(any(orders, any($it.lines, eq($it.sku, "A-1")))))"#),
        vec![]
    );
    assert!(matches!(
        findings(r#"users(filter(any(orders, any($it.lines, eq($it.total, 1)))))"#).as_slice(),
        [ValidationErrorKind::UnknownField { .. }]
    ));
}

#[test]
fn test_quantifier_over_scalar() {
    assert_eq!(
        findings("users(filter(any(age, eq($it, 1))))"),
        vec![ValidationErrorKind::NotACollection {
            path: "age".to_string(),
        }]
    );
}

#[test]
fn test_current_item_outside_quantifier() {
    assert_eq!(
        findings("users(filter(eq($it.total, 1)))"),
        vec![ValidationErrorKind::CurrentItemOutsideQuantifier]
    );
}

#[test]
fn test_current_item_finding_points_at_marker() {
    let schema = schema();
    let request = parse_request_with_schema("users(filter(eq($it, 1)))", &schema).unwrap();
    let report = Validator::new(&schema).validate_request(&request).unwrap();
    let error = report.iter().next().unwrap();
    assert_eq!(error.node.kind(), NodeKind::CurrentItem);
    assert_eq!(
        error.to_string(),
        "'$it' used outside of an enclosing quantifier at 16..19"
    );
}

// ============================================================================
// Request-level rules
// ============================================================================

#[test]
fn test_unknown_request() {
    assert_eq!(
        findings("people(filter(eq(age, 1)))"),
        vec![ValidationErrorKind::UnknownRequest {
            name: "people".to_string(),
        }]
    );
}

#[test]
fn test_duplicate_parameter() {
    assert_eq!(
        findings("users(limit(1), skip(2), limit(3))"),
        vec![ValidationErrorKind::DuplicateParameter { name: "limit" }]
    );
}

#[test]
fn test_paging_values() {
    assert_eq!(findings("users(skip(0), limit(50))"), vec![]);
    assert!(matches!(
        findings("users(skip(-1))").as_slice(),
        [ValidationErrorKind::InvalidPaging { parameter: "skip", .. }]
    ));
    assert!(matches!(
        findings("users(limit(1.5))").as_slice(),
        [ValidationErrorKind::InvalidPaging { parameter: "limit", .. }]
    ));
}

#[test]
fn test_limit_cap() {
    let config = ValidatorConfig::default().with_max_limit(100);
    assert_eq!(findings_with("users(limit(100))", config), vec![]);
    assert_eq!(
        findings_with("users(limit(101))", config),
        vec![ValidationErrorKind::InvalidPaging {
            parameter: "limit",
            reason: "101 exceeds the maximum of 100".to_string(),
        }]
    );
}

#[test]
fn test_input_literal() {
    let schema = schema().with_request("create", user());
    for (text, valid) in [
        (r#"create(input({"age": 3}))"#, true),
        ("create(input([1, 2]))", true),
        ("create(input(3))", false),
    ] {
        let request = parse_request_with_schema(text, &schema).unwrap();
        let report = Validator::new(&schema).validate_request(&request).unwrap();
        assert_eq!(report.is_valid(), valid, "Failed for: {}", text);
    }
}

#[test]
fn test_findings_accumulate() {
    let kinds = findings(r#"users(filter(and(eq(agee, 1), gt(name, "A"))), sort(asc(secret)), skip(-2))"#);
    assert_eq!(kinds.len(), 4);
}

// ============================================================================
// Bare filters and schema-less parsing
// ============================================================================

#[test]
fn test_validate_bare_filter() {
    let schema = schema();
    let root = user();
    let filter = parse_filter_with_schema(r#"and(eq(age, null), gt(name, "A"))"#, &schema, &root).unwrap();
    let report = Validator::new(&schema).validate_filter(&filter, &root).unwrap();
    let kinds: Vec<_> = report.kinds().cloned().collect();
    assert_eq!(kinds.len(), 2);
    assert!(matches!(kinds[0], ValidationErrorKind::NullNotAllowed { .. }));
    assert!(matches!(kinds[1], ValidationErrorKind::UnsupportedOperation { .. }));
}

#[test]
fn test_schema_less_parse_keeps_dates_as_strings() {
    let schema = schema();
    let request = parse_request(r#"users(filter(eq(created, "2024-01-01")))"#).unwrap();
    let report = Validator::new(&schema).validate_request(&request).unwrap();
    assert!(matches!(
        report.kinds().collect::<Vec<_>>().as_slice(),
        [ValidationErrorKind::TypeMismatch {
            expected: ValueType::DateTime,
            actual: LiteralType::String,
            ..
        }]
    ));
}

#[test]
fn test_schema_from_json() {
    let schema = Schema::from_json(
        r#"{
            "requests": {
                "users": {
                    "type": "list",
                    "element": {
                        "type": "object",
                        "fields": {
                            "age": { "type": "integer" },
                            "name": {
                                "type": "string",
                                "extensions": { "filter": { "comparisons": ["eq"] } }
                            }
                        }
                    }
                }
            }
        }"#,
    )
    .unwrap();
    let request = parse_request_with_schema(r#"users(filter(and(eq(age, null), starts(name, "x"))))"#, &schema).unwrap();
    let report = Validator::new(&schema).validate_request(&request).unwrap();
    assert_eq!(report.len(), 2);
}
