// tests/property_tests.rs

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use sift_lang::{parse_filter, parse_request, print_boolean, print_request};

fn field() -> impl Strategy<Value = String> {
    prop::sample::select(vec![
        "age",
        "name",
        "created",
        "address.city",
        r#"meta["zip code"]"#,
        r#"["first"].last"#,
    ])
    .prop_map(str::to_string)
}

fn constant() -> impl Strategy<Value = String> {
    prop_oneof![
        any::<i32>().prop_map(|n| n.to_string()),
        (0..10_000i32, 0..100u32).prop_map(|(whole, cents)| format!("{}.{:02}", whole, cents)),
        "[a-z é]{0,8}".prop_map(|s| format!("\"{}\"", s)),
        Just(r#""tab\tquote\"""#.to_string()),
        Just("null".to_string()),
        Just("true".to_string()),
    ]
}

fn operand() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => field(),
        1 => (prop::sample::select(vec!["year", "tolower", "round", "isnull"]), field())
            .prop_map(|(function, path)| format!("{}({})", function, path)),
    ]
}

fn comparison() -> impl Strategy<Value = String> {
    (
        prop::sample::select(vec![
            "eq", "ne", "gt", "ge", "lt", "le", "has", "starts", "ends", "regex",
        ]),
        operand(),
        constant(),
    )
        .prop_map(|(operator, operand, constant)| format!("{}({},{})", operator, operand, constant))
}

/// Filter text with arbitrary nesting and irregular spacing.
fn filter() -> impl Strategy<Value = String> {
    comparison().prop_recursive(4, 32, 4, |inner| {
        prop_oneof![
            (prop::sample::select(vec!["and", "or"]), prop::collection::vec(inner.clone(), 2..5))
                .prop_map(|(junction, operands)| format!("{}( {} )", junction, operands.join(" ,"))),
            inner.clone().prop_map(|operand| format!("not({})", operand)),
            (prop::sample::select(vec!["any", "all"]), inner).prop_map(|(kind, predicate)| {
                format!("{}(orders,and(gt($it.total,1),{}))", kind, predicate)
            }),
        ]
    })
}

proptest! {
    #[test]
    fn test_printed_filter_reparses_to_same_tree(text in filter()) {
        let parsed = parse_filter(&text).unwrap();
        let printed = print_boolean(&parsed).unwrap();
        let reparsed = parse_filter(&printed).unwrap();
        assert_eq!(reparsed, parsed);
        assert_eq!(print_boolean(&reparsed).unwrap(), printed);
    }

    #[test]
    fn test_printed_request_reparses_to_same_tree(
        text in filter(),
        sort in prop::collection::vec((prop::sample::select(vec!["asc", "desc"]), operand()), 0..3),
        skip in prop::option::of(0..1000u32),
        limit in prop::option::of(0..1000u32),
    ) {
        let mut parameters = vec![format!("filter({})", text)];
        if !sort.is_empty() {
            let keys: Vec<String> = sort
                .iter()
                .map(|(direction, operand)| format!("{}({})", direction, operand))
                .collect();
            parameters.push(format!("sort({})", keys.join(",")));
        }
        if let Some(skip) = skip {
            parameters.push(format!("skip({})", skip));
        }
        if let Some(limit) = limit {
            parameters.push(format!("limit({})", limit));
        }
        let source = format!("users({})", parameters.join(","));

        let parsed = parse_request(&source).unwrap();
        let reparsed = parse_request(&print_request(&parsed).unwrap()).unwrap();
        assert_eq!(reparsed, parsed);
    }

    #[test]
    fn test_arbitrary_input_never_panics(text in "\\PC{0,64}") {
        let _ = parse_request(&text);
        let _ = parse_filter(&text);
    }

    #[test]
    fn test_deep_nesting_is_an_error_not_a_crash(depth in 200usize..2000) {
        let text = format!("{}eq(a,1){}", "not(".repeat(depth), ")".repeat(depth));
        prop_assert!(parse_filter(&text).is_err());
    }
}
