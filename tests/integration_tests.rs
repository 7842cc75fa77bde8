use pretty_assertions::assert_eq;
use serde_json::json;
use sift_lang::cli::{
    self, execute_check, execute_run, CheckOptions, CheckResult, CliError, DocCategory, RunOptions,
};
use sift_lang::compiler::{compile_filter, compile_request, execute_json};
use sift_lang::schema::{Schema, TypeDescriptor};
use sift_lang::{parse_filter, parse_filter_with_schema, parse_request, Value};

fn documents() -> serde_json::Value {
    json!([
        {
            "name": "Ada",
            "age": 36,
            "nick": null,
            "score": 9.5,
            "created": "2024-03-01T10:00:00Z",
            "tags": ["admin", "dev"],
            "orders": [{"total": 120.5, "lines": [{"sku": "A-1"}]}]
        },
        {
            "name": "bob",
            "age": 17,
            "nick": "bobby",
            "score": 4,
            "created": "2023-12-31",
            "tags": [],
            "orders": []
        },
        {
            "name": "Cy",
            "age": 52,
            "score": 7.25,
            "created": "2024-01-15T08:30:00+02:00",
            "tags": ["dev"],
            "orders": [{"total": 40, "lines": [{"sku": "B-2"}, {"sku": "A-9"}]}, {"total": 80, "lines": []}]
        }
    ])
}

/// Runs `request` over the sample documents.
fn run(request: &str) -> serde_json::Value {
    let compiled = compile_request(&parse_request(request).unwrap()).unwrap();
    execute_json(&compiled, documents())
}

fn names(request: &str) -> Vec<String> {
    run(request)
        .as_array()
        .unwrap()
        .iter()
        .map(|document| document["name"].as_str().unwrap().to_string())
        .collect()
}

fn matches(filter: &str, document: serde_json::Value) -> bool {
    compile_filter(&parse_filter(filter).unwrap())
        .unwrap()
        .matches(&Value::from(document))
}

// ============================================================================
// Filtering
// ============================================================================

#[test]
fn test_no_parameters_returns_everything() {
    assert_eq!(names("users()"), vec!["Ada", "bob", "Cy"]);
}

#[test]
fn test_comparisons() {
    let test_cases = vec![
        ("users(filter(ge(age, 36)))", vec!["Ada", "Cy"]),
        ("users(filter(lt(age, 18)))", vec!["bob"]),
        (r#"users(filter(eq(name, "Cy")))"#, vec!["Cy"]),
        (r#"users(filter(ne(name, "Cy")))"#, vec!["Ada", "bob"]),
        ("users(filter(gt(score, 7)))", vec!["Ada", "Cy"]),
        ("users(filter(eq(score, 4.0)))", vec!["bob"]),
    ];
    for (request, expected) in test_cases {
        assert_eq!(names(request), expected, "Failed for: {}", request);
    }
}

#[test]
fn test_missing_field_reads_as_null() {
    assert_eq!(names("users(filter(eq(nick, null)))"), vec!["Ada", "Cy"]);
    assert_eq!(names("users(filter(ne(nick, null)))"), vec!["bob"]);
}

#[test]
fn test_textual_comparisons() {
    assert_eq!(names(r#"users(filter(starts(name, "A")))"#), vec!["Ada"]);
    assert_eq!(names(r#"users(filter(ends(name, "b")))"#), vec!["bob"]);
    assert_eq!(names(r#"users(filter(has(name, "o")))"#), vec!["bob"]);
    assert_eq!(names(r#"users(filter(has(tags, "dev")))"#), vec!["Ada", "Cy"]);
    assert_eq!(names(r#"users(filter(regex(name, "^[A-Z][a-z]$")))"#), vec!["Cy"]);
}

#[test]
fn test_junctions() {
    assert_eq!(
        names(r#"users(filter(and(ge(age, 18), starts(name, "C"))))"#),
        vec!["Cy"]
    );
    assert_eq!(
        names("users(filter(or(lt(age, 18), gt(age, 50), eq(age, 36))))"),
        vec!["Ada", "bob", "Cy"]
    );
    assert_eq!(names("users(filter(not(ge(age, 18))))"), vec!["bob"]);
}

#[test]
fn test_field_functions() {
    assert_eq!(names("users(filter(eq(year(created), 2024)))"), vec!["Ada", "Cy"]);
    assert_eq!(names("users(filter(eq(month(created), 12)))"), vec!["bob"]);
    assert_eq!(names(r#"users(filter(eq(tolower(name), "ada")))"#), vec!["Ada"]);
    assert_eq!(names(r#"users(filter(eq(toupper(name), "BOB")))"#), vec!["bob"]);
    assert_eq!(names("users(filter(eq(round(score), 10)))"), vec!["Ada"]);
    assert_eq!(names("users(filter(eq(floor(score), 7)))"), vec!["Cy"]);
    assert_eq!(names("users(filter(eq(ceiling(score), 8)))"), vec!["Cy"]);
    assert_eq!(names("users(filter(eq(isnull(nick), false)))"), vec!["bob"]);
}

#[test]
fn test_hour_keeps_offset() {
    assert!(matches(
        "eq(hour(at), 8)",
        json!({"at": "2024-01-15T08:30:00+02:00"})
    ));
}

#[test]
fn test_quantifiers() {
    assert_eq!(names("users(filter(any(orders, gt($it.total, 100))))"), vec!["Ada"]);
    assert_eq!(names("users(filter(all(orders, lt($it.total, 100))))"), vec!["bob", "Cy"]);
    assert_eq!(names(r#"users(filter(any(tags, eq($it, "admin"))))"#), vec!["Ada"]);
}

#[test]
fn test_nested_quantifiers_bind_innermost() {
    assert_eq!(
        names(r#"users(filter(any(orders, any($it.lines, starts($it.sku, "A")))))"#),
        vec!["Ada", "Cy"]
    );
    assert_eq!(
        names(r#"users(filter(any(orders, all($it.lines, starts($it.sku, "A")))))"#),
        vec!["Ada", "Cy"]
    );
}

#[test]
fn test_quantifier_over_non_list_is_false() {
    assert!(!matches("any(age, eq($it, 1))", json!({"age": 1})));
    assert!(!matches("all(age, eq($it, 1))", json!({})));
}

#[test]
fn test_unordered_comparison_is_false() {
    assert!(!matches("gt(name, 3)", json!({"name": "x"})));
    assert!(!matches("lt(name, 3)", json!({"name": "x"})));
}

#[test]
fn test_typed_dates_compare_as_timestamps() {
    let schema = Schema::new();
    let root = TypeDescriptor::object([("created", TypeDescriptor::datetime())]);
    let document = Value::from(json!({"created": "2024-01-15T08:30:00+02:00"}));

    for (filter, expected) in [
        (r#"gt(created, "2024-01-15T07:00:00Z")"#, false),
        (r#"lt(created, "2024-01-15T07:00:00Z")"#, true),
        (r#"eq(created, "2024-01-15T06:30:00Z")"#, true),
        (r#"gt(created, "2024-01-15")"#, true),
    ] {
        let expression = parse_filter_with_schema(filter, &schema, &root).unwrap();
        let compiled = compile_filter(&expression).unwrap();
        assert_eq!(compiled.matches(&document), expected, "Failed for: {}", filter);
    }
}

// ============================================================================
// Sorting and paging
// ============================================================================

#[test]
fn test_sort() {
    assert_eq!(names("users(sort(asc(age)))"), vec!["bob", "Ada", "Cy"]);
    assert_eq!(names("users(sort(desc(score)))"), vec!["Ada", "Cy", "bob"]);
    assert_eq!(names("users(sort(asc(tolower(name))))"), vec!["Ada", "bob", "Cy"]);
}

#[test]
fn test_sort_orders_nulls_lowest() {
    assert_eq!(names("users(sort(asc(nick), asc(name)))"), vec!["Ada", "Cy", "bob"]);
    assert_eq!(names("users(sort(desc(nick)))"), vec!["bob", "Ada", "Cy"]);
}

#[test]
fn test_sort_is_stable() {
    assert_eq!(
        names("users(sort(asc(year(created))))"),
        vec!["bob", "Ada", "Cy"]
    );
}

#[test]
fn test_sort_mixed_types_by_class() {
    let compiled = compile_request(&parse_request("items(sort(asc(k)))").unwrap()).unwrap();
    let documents = json!([
        {"id": 0, "k": 3},
        {"id": 1, "k": "s12"},
        {"id": 2, "k": null},
        {"id": 3, "k": {"x": 1}},
        {"id": 4, "k": 1},
        {"id": 5, "k": true},
        {"id": 6, "k": [1, "a"]},
        {"id": 7},
        {"id": 8, "k": "a"},
        {"id": 9, "k": 2.5},
        {"id": 10, "k": [1]}
    ]);

    let ids: Vec<i64> = execute_json(&compiled, documents)
        .as_array()
        .unwrap()
        .iter()
        .map(|document| document["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![2, 7, 5, 4, 9, 0, 8, 1, 10, 6, 3]);
}

#[test]
fn test_sort_many_mixed_keys() {
    let compiled = compile_request(&parse_request("items(sort(desc(k)))").unwrap()).unwrap();
    let documents: Vec<serde_json::Value> = (0..64)
        .map(|i| match i % 3 {
            0 => json!({"k": i}),
            1 => json!({"k": format!("s{}", i)}),
            _ => json!({"k": i % 5 == 0}),
        })
        .collect();

    let sorted = execute_json(&compiled, serde_json::Value::Array(documents));
    let keys: Vec<&serde_json::Value> = sorted
        .as_array()
        .unwrap()
        .iter()
        .map(|document| &document["k"])
        .collect();
    assert_eq!(keys.len(), 64);
    assert!(keys[0].is_string());
    assert!(keys[63].is_boolean());
}

#[test]
fn test_paging() {
    assert_eq!(names("users(sort(asc(age)), skip(1))"), vec!["Ada", "Cy"]);
    assert_eq!(names("users(sort(asc(age)), limit(2))"), vec!["bob", "Ada"]);
    assert_eq!(names("users(sort(asc(age)), skip(1), limit(1))"), vec!["Ada"]);
    assert_eq!(names("users(skip(10))"), Vec::<String>::new());
}

#[test]
fn test_count_counts_before_paging() {
    let result = run("users(filter(ge(age, 18)), limit(1), count())");
    assert_eq!(result["count"], json!(2));
    assert_eq!(result["items"].as_array().unwrap().len(), 1);
}

#[test]
fn test_single_document_input() {
    let compiled = compile_request(&parse_request("users(filter(eq(a, 1)))").unwrap()).unwrap();
    assert_eq!(execute_json(&compiled, json!({"a": 1})), json!([{"a": 1}]));
    assert_eq!(execute_json(&compiled, json!({"a": 2})), json!([]));
}

#[test]
fn test_compiled_request_fields() {
    let compiled =
        compile_request(&parse_request(r#"create(input({"name": "x"}), skip(2), count())"#).unwrap())
            .unwrap();
    assert_eq!(compiled.name, "create");
    assert_eq!(compiled.skip, Some(2));
    assert_eq!(compiled.limit, None);
    assert!(compiled.count);
    assert_eq!(compiled.input, Some(Value::from(json!({"name": "x"}))));
}

#[test]
fn test_compile_rejects_bad_regex() {
    let filter = parse_filter(r#"regex(name, "(")"#).unwrap();
    assert!(compile_filter(&filter).is_err());
}

#[test]
fn test_compile_rejects_negative_paging() {
    assert!(compile_request(&parse_request("users(skip(-1))").unwrap()).is_err());
}

// ============================================================================
// CLI
// ============================================================================

const SCHEMA: &str = r#"{
    "requests": {
        "users": {
            "type": "list",
            "element": {
                "type": "object",
                "fields": {
                    "name": { "type": "string" },
                    "age": { "type": "integer" },
                    "created": { "type": "datetime" },
                    "secret": { "type": "string", "extensions": { "sortable": false } }
                }
            }
        }
    }
}"#;

fn check(request: &str, schema: Option<&str>) -> Result<CheckResult, CliError> {
    execute_check(&CheckOptions {
        request: request.to_string(),
        schema: schema.map(str::to_string),
        ..CheckOptions::default()
    })
}

#[test]
fn test_check_syntax_only() {
    assert_eq!(
        check("users(filter(eq(whatever, 1)))", None).unwrap(),
        CheckResult::SyntaxValid
    );
    assert!(matches!(
        check("users(filter(eq(age 1)))", None),
        Err(CliError::Syntax(_))
    ));
}

#[test]
fn test_check_with_schema() {
    assert_eq!(
        check("users(filter(ge(age, 18)))", Some(SCHEMA)).unwrap(),
        CheckResult::Valid
    );

    let err = check(r#"users(filter(eq(age, "x")), sort(asc(secret)))"#, Some(SCHEMA)).unwrap_err();
    match &err {
        CliError::Validation(messages) => assert_eq!(messages.len(), 2),
        other => panic!("expected validation error, got {:?}", other),
    }
    assert!(err.to_string().starts_with("Invalid request:\n  "));
}

#[test]
fn test_check_prints_canonical_form() {
    let result = execute_check(&CheckOptions {
        request: "users(filter(ge(age,18)),limit(5))".to_string(),
        print: true,
        ..CheckOptions::default()
    })
    .unwrap();
    assert_eq!(
        result,
        CheckResult::Printed("users(filter(ge(age, 18)), limit(5))".to_string())
    );
}

#[test]
fn test_check_max_depth_and_limit() {
    let deep = execute_check(&CheckOptions {
        request: "users(filter(not(not(not(eq(a, 1))))))".to_string(),
        max_depth: 4,
        ..CheckOptions::default()
    });
    assert!(matches!(deep, Err(CliError::Syntax(_))));

    let capped = execute_check(&CheckOptions {
        request: "users(limit(500))".to_string(),
        schema: Some(SCHEMA.to_string()),
        max_limit: Some(100),
        ..CheckOptions::default()
    });
    assert!(matches!(capped, Err(CliError::Validation(_))));
}

#[test]
fn test_check_bad_schema() {
    assert!(matches!(
        check("users()", Some("{\"requests\": 3}")),
        Err(CliError::Schema(_))
    ));
}

#[test]
fn test_run_with_schema_types_dates() {
    let output = execute_run(&RunOptions {
        request: r#"users(filter(gt(created, "2024-01-01")), sort(asc(name)))"#.to_string(),
        schema: Some(SCHEMA.to_string()),
        input: Some(
            r#"[
                {"name": "b", "created": "2024-02-01T00:00:00+05:00"},
                {"name": "a", "created": "2023-06-01"},
                {"name": "c", "created": "2024-01-01T00:00:01Z"}
            ]"#
            .to_string(),
        ),
        ..RunOptions::default()
    })
    .unwrap();
    assert_eq!(
        output,
        json!([
            {"name": "b", "created": "2024-02-01T00:00:00+05:00"},
            {"name": "c", "created": "2024-01-01T00:00:01Z"}
        ])
    );
}

#[test]
fn test_run_errors() {
    let no_input = execute_run(&RunOptions {
        request: "users()".to_string(),
        ..RunOptions::default()
    });
    assert!(matches!(no_input, Err(CliError::NoInput)));

    let bad_json = execute_run(&RunOptions {
        request: "users()".to_string(),
        input: Some("[1,".to_string()),
        ..RunOptions::default()
    });
    assert!(matches!(bad_json, Err(CliError::Json(_))));

    let invalid = execute_run(&RunOptions {
        request: "people()".to_string(),
        schema: Some(SCHEMA.to_string()),
        input: Some("[]".to_string()),
        ..RunOptions::default()
    });
    assert!(matches!(invalid, Err(CliError::Validation(_))));
}

#[test]
fn test_docs() {
    for category in DocCategory::ALL {
        assert!(!category.content().is_empty());
    }
    assert_eq!(DocCategory::from_name("ops"), Some(DocCategory::Comparisons));
    assert!(cli::get_docs_overview().contains("quantifiers"));
    assert!(cli::get_doc_category("Schema").unwrap().contains("\"type\""));
    assert!(matches!(
        cli::get_doc_category("nope"),
        Err(CliError::UnknownCategory(name)) if name == "nope"
    ));
}
