mod common;

use common::*;
use serde_json::{Value, json};
use wizflow::extraction::{QueryPayload, extract, extract_all};
use wizflow::prelude::*;

fn names(values: &[&str]) -> TabularResult {
    let rows: Vec<Value> = values.iter().map(|v| json!({ "name": v })).collect();
    table(&["name"], Value::Array(rows))
}

fn extracted(result: &TabularResult, spec: ExtractionSpec) -> Value {
    extract(result, &spec)
        .expect("extraction must not fail")
        .expect("column must resolve")
}

fn inventory() -> TabularResult {
    table(
        &["TABLE_NAME", "ROW_COUNT", "OWNER"],
        json!([
            {"TABLE_NAME": "ORDERS", "ROW_COUNT": 120, "OWNER": "SALES"},
            {"TABLE_NAME": "EMPTY_STAGE", "ROW_COUNT": 0, "OWNER": "ETL"},
            {"TABLE_NAME": "ORDERS", "ROW_COUNT": 120, "OWNER": "SALES"},
            {"TABLE_NAME": "CUSTOMERS", "ROW_COUNT": "42", "OWNER": null},
            {"TABLE_NAME": "AUDIT", "ROW_COUNT": 7, "OWNER": "SEC"}
        ]),
    )
}

#[test]
fn test_collect_array_preserves_duplicates_and_order() {
    let result = names(&["A", "B", "A"]);
    assert_eq!(
        extracted(&result, ExtractionSpec::collect("name")),
        json!(["A", "B", "A"])
    );
}

#[test]
fn test_unique_array_keeps_first_occurrence() {
    let result = names(&["A", "B", "A"]);
    assert_eq!(
        extracted(&result, ExtractionSpec::unique("name")),
        json!(["A", "B"])
    );
}

#[test]
fn test_find_first_match_and_miss() {
    let hit = names(&["X", "PROCESS_ENTITY"]);
    let miss = names(&["X", "Y"]);
    let spec = ExtractionSpec::find_first("name", "PROCESS_ENTITY");

    assert_eq!(extracted(&hit, spec.clone()), json!("PROCESS_ENTITY"));
    assert_eq!(extracted(&miss, spec), Value::Null);
}

#[test]
fn test_find_first_is_strict() {
    let result = table(&["ID"], json!([{"ID": "1"}, {"ID": 1}]));
    let found = extracted(&result, ExtractionSpec::find_first("ID", 1));
    assert_eq!(found, json!(1));
}

#[test]
fn test_has_rows_ignores_column() {
    let empty = table(&["name"], json!([]));
    let filled = names(&["A"]);

    let mut spec = ExtractionSpec::has_rows();
    assert_eq!(extracted(&empty, spec.clone()), json!(false));
    assert_eq!(extracted(&filled, spec.clone()), json!(true));

    // A bogus column does not change the answer.
    spec.from_column = Some("does_not_exist".to_string());
    assert_eq!(extracted(&filled, spec), json!(true));
}

#[test]
fn test_row_count_counts_every_row() {
    assert_eq!(
        extracted(&table(&["name"], json!([])), ExtractionSpec::row_count()),
        json!(0)
    );
    assert_eq!(extracted(&inventory(), ExtractionSpec::row_count()), json!(5));
}

#[test]
fn test_first_value() {
    assert_eq!(
        extracted(&inventory(), ExtractionSpec::first_value("TABLE_NAME")),
        json!("ORDERS")
    );
    assert_eq!(
        extracted(
            &table(&["TABLE_NAME"], json!([])),
            ExtractionSpec::first_value("TABLE_NAME")
        ),
        Value::Null
    );
}

#[test]
fn test_has_value() {
    let result = inventory();
    assert_eq!(
        extracted(&result, ExtractionSpec::has_value("OWNER", "SEC")),
        json!(true)
    );
    assert_eq!(
        extracted(&result, ExtractionSpec::has_value("OWNER", "HR")),
        json!(false)
    );
    // Numbers and numeric strings are different values.
    assert_eq!(
        extracted(&result, ExtractionSpec::has_value("ROW_COUNT", 42)),
        json!(false)
    );
}

#[test]
fn test_rows_slice_default_and_explicit_limit() {
    let many: Vec<String> = (0..15).map(|i| format!("T{}", i)).collect();
    let refs: Vec<&str> = many.iter().map(String::as_str).collect();
    let result = names(&refs);

    let default = extracted(&result, ExtractionSpec::new(ExtractionMode::RowsSlice));
    assert_eq!(default.as_array().unwrap().len(), 10);
    assert_eq!(default[0], json!({"name": "T0"}));

    let two = extracted(&result, ExtractionSpec::rows_slice(2));
    assert_eq!(two, json!([{"name": "T0"}, {"name": "T1"}]));
}

#[test]
fn test_object_array_projects_columns() {
    let value = extracted(
        &inventory(),
        ExtractionSpec::object_array(["TABLE_NAME", "MISSING"]).with_limit(2),
    );
    assert_eq!(
        value,
        json!([
            {"TABLE_NAME": "ORDERS", "MISSING": null},
            {"TABLE_NAME": "EMPTY_STAGE", "MISSING": null}
        ])
    );
}

#[test]
fn test_object_array_without_columns_fails() {
    let err = extract(&inventory(), &ExtractionSpec::new(ExtractionMode::ObjectArray)).unwrap_err();
    assert_eq!(err, ExtractionError::MissingColumns("objectArray".to_string()));
}

#[test]
fn test_sum_treats_non_numeric_as_zero() {
    let result = table(
        &["N"],
        json!([{"N": 1}, {"N": 2.5}, {"N": "3"}, {"N": "x"}, {"N": null}, {}]),
    );
    assert_eq!(extracted(&result, ExtractionSpec::sum("N")), json!(6.5));
    assert_eq!(extracted(&inventory(), ExtractionSpec::sum("ROW_COUNT")), json!(289));
    assert_eq!(
        extracted(&table(&["N"], json!([])), ExtractionSpec::sum("N")),
        json!(0)
    );
}

#[test]
fn test_candidates_pick_first_present_column() {
    let result = table(&["NAME"], json!([{"NAME": "A"}]));
    let spec = ExtractionSpec::collect("ignored").with_candidates(["name", "NAME"]);
    assert_eq!(extracted(&result, spec), json!(["A"]));
}

#[test]
fn test_unresolvable_column_yields_nothing() {
    let result = names(&["A"]);
    let spec = ExtractionSpec::collect("x").with_candidates(["TABLE_NAME"]);
    assert_eq!(extract(&result, &spec).unwrap(), None);
    assert_eq!(
        extract(&result, &ExtractionSpec::new(ExtractionMode::FirstValue)).unwrap(),
        None
    );
}

#[test]
fn test_missing_from_column_reads_as_null() {
    let result = names(&["A", "B"]);
    assert_eq!(
        extracted(&result, ExtractionSpec::collect("other")),
        json!([null, null])
    );
    assert_eq!(
        extracted(&result, ExtractionSpec::has_value("other", "A")),
        json!(false)
    );
}

#[test]
fn test_filter_applies_before_collecting() {
    let result = inventory();
    let populated = ExtractionSpec::unique("TABLE_NAME").with_filter("ROW_COUNT", FilterOp::GreaterThan, 0);
    // "42" is a string and does not compare with a number.
    assert_eq!(extracted(&result, populated), json!(["ORDERS", "AUDIT"]));

    let not_sales =
        ExtractionSpec::collect("TABLE_NAME").with_filter("OWNER", FilterOp::NotEqual, "SALES");
    assert_eq!(
        extracted(&result, not_sales),
        json!(["EMPTY_STAGE", "CUSTOMERS", "AUDIT"])
    );

    let small =
        ExtractionSpec::collect("TABLE_NAME").with_filter("ROW_COUNT", FilterOp::SmallerThan, 10);
    assert_eq!(extracted(&result, small), json!(["EMPTY_STAGE", "AUDIT"]));

    let exact = ExtractionSpec::collect("OWNER").with_filter("TABLE_NAME", FilterOp::Equal, "ORDERS");
    assert_eq!(extracted(&result, exact), json!(["SALES", "SALES"]));
}

#[test]
fn test_unique_array_is_deduplicated_collect_prefix() {
    let result = inventory();
    for limit in 1..=4 {
        let collected = extracted(&result, ExtractionSpec::collect("TABLE_NAME"));
        let mut expected: Vec<Value> = Vec::new();
        for value in collected.as_array().unwrap() {
            if !expected.contains(value) {
                expected.push(value.clone());
            }
        }
        expected.truncate(limit);

        let unique = extracted(&result, ExtractionSpec::unique("TABLE_NAME").with_limit(limit));
        assert_eq!(unique, Value::Array(expected), "limit {}", limit);
    }
}

#[test]
fn test_collect_limit_truncates() {
    let result = names(&["A", "B", "C"]);
    assert_eq!(
        extracted(&result, ExtractionSpec::collect("name").with_limit(2)),
        json!(["A", "B"])
    );
}

#[test]
fn test_zero_limit_yields_empty_arrays() {
    let result = names(&["A", "B", "A"]);
    assert_eq!(extracted(&result, ExtractionSpec::collect("name").with_limit(0)), json!([]));
    assert_eq!(extracted(&result, ExtractionSpec::unique("name").with_limit(0)), json!([]));
    assert_eq!(extracted(&result, ExtractionSpec::rows_slice(0)), json!([]));
    assert_eq!(
        extracted(&result, ExtractionSpec::object_array(["name"]).with_limit(0)),
        json!([])
    );

    let recipe = Recipe::builder("peek")
        .step(
            Step::new("build", StepKind::BuildFinal, "final")
                .output("none", ExtractionSpec::rows_slice(0)),
        )
        .build();
    assert!(recipe.is_ok());
}

#[test]
fn test_extract_all_omits_unresolved_bindings() {
    let result = inventory();
    let outputs = [
        ("tables".to_string(), ExtractionSpec::unique("TABLE_NAME")),
        (
            "names".to_string(),
            ExtractionSpec::collect("x").with_candidates(["name"]),
        ),
        ("count".to_string(), ExtractionSpec::row_count()),
    ]
    .into_iter()
    .collect();

    let values = extract_all(&result, &outputs).unwrap();
    assert_eq!(values.len(), 2);
    assert_eq!(values["count"], json!(5));
    assert!(!values.contains_key("names"));
}

#[test]
fn test_decoded_positional_payload_extracts() {
    let QueryPayload::Table(result) = QueryPayload::decode(describe_payload()).unwrap() else {
        panic!("expected a table");
    };
    assert_eq!(
        extracted(&result, ExtractionSpec::collect("COLUMN_NAME")),
        json!(["ID", "PARENT_ID", "NAME"])
    );
    assert_eq!(
        extracted(&result, ExtractionSpec::has_value("COLUMN_NAME", "PARENT_ID")),
        json!(true)
    );
}

#[test]
fn test_from_positional_rejects_ragged_rows() {
    let err = TabularResult::from_positional(
        vec!["A".to_string(), "B".to_string()],
        vec![vec![json!(1), json!(2)], vec![json!(3)]],
    )
    .unwrap_err();
    assert!(matches!(err, ExtractionError::MalformedResult(_)));
}
