//! Derives typed context values from tabular results.
//!
//! Empty or missing data never fails an extraction: it degrades to `null`,
//! `false`, `0` or `[]` depending on the mode. Only a malformed result or an
//! `objectArray` without `fromColumns` is an error.

use crate::context::value::{compare, number_value, strict_eq};
use crate::error::ExtractionError;
use crate::recipe::{ExtractionMode, ExtractionSpec, FilterOp, RowFilter};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::BTreeMap;

mod result;

pub use result::{QueryPayload, Row, TabularResult};

/// Rows returned by `rowsSlice` when the extraction sets no limit.
pub const DEFAULT_SLICE_LIMIT: usize = 10;

const NULL: Value = Value::Null;

/// Extracts one value from a result.
///
/// Returns `Ok(None)` when the mode reads a single column and none could be
/// resolved: no `fromColumn` is set and no `fromColumnCandidates` entry is
/// among the result's columns.
pub fn extract(
    result: &TabularResult,
    spec: &ExtractionSpec,
) -> Result<Option<Value>, ExtractionError> {
    let rows = &result.rows;
    let value = match spec.mode {
        ExtractionMode::HasRows => Value::Bool(!rows.is_empty()),
        ExtractionMode::RowCount => Value::from(rows.len()),
        ExtractionMode::RowsSlice => Value::Array(
            rows.iter()
                .take(spec.limit.unwrap_or(DEFAULT_SLICE_LIMIT))
                .map(|row| Value::Object(row.clone()))
                .collect(),
        ),
        ExtractionMode::ObjectArray => {
            let columns = spec
                .from_columns
                .as_ref()
                .ok_or_else(|| ExtractionError::MissingColumns(spec.mode.to_string()))?;
            Value::Array(
                rows.iter()
                    .take(spec.limit.unwrap_or(usize::MAX))
                    .map(|row| project(row, columns))
                    .collect(),
            )
        }
        ExtractionMode::FirstValue => return Ok(read_column(result, spec, ColumnMode::FirstValue)),
        ExtractionMode::CollectArray => return Ok(read_column(result, spec, ColumnMode::Collect)),
        ExtractionMode::UniqueArray => return Ok(read_column(result, spec, ColumnMode::Unique)),
        ExtractionMode::FindFirst => return Ok(read_column(result, spec, ColumnMode::FindFirst)),
        ExtractionMode::HasValue => return Ok(read_column(result, spec, ColumnMode::HasValue)),
        ExtractionMode::Sum => return Ok(read_column(result, spec, ColumnMode::Sum)),
    };
    Ok(Some(value))
}

/// Runs every output binding of a step. Bindings that resolve to nothing are omitted.
pub fn extract_all(
    result: &TabularResult,
    outputs: &BTreeMap<String, ExtractionSpec>,
) -> Result<BTreeMap<String, Value>, ExtractionError> {
    let mut extracted = BTreeMap::new();
    for (key, spec) in outputs {
        if let Some(value) = extract(result, spec)? {
            extracted.insert(key.clone(), value);
        }
    }
    Ok(extracted)
}

/// Modes that read a single resolved column.
#[derive(Debug, Clone, Copy)]
enum ColumnMode {
    FirstValue,
    Collect,
    Unique,
    FindFirst,
    HasValue,
    Sum,
}

fn read_column(result: &TabularResult, spec: &ExtractionSpec, mode: ColumnMode) -> Option<Value> {
    let column = resolve_column(result, spec)?;
    Some(extract_column(&result.rows, column, mode, spec))
}

fn resolve_column<'a>(result: &TabularResult, spec: &'a ExtractionSpec) -> Option<&'a str> {
    if let Some(column) = &spec.from_column {
        return Some(column);
    }
    spec.from_column_candidates
        .as_ref()?
        .iter()
        .find(|c| result.has_column(c))
        .map(String::as_str)
}

fn extract_column(rows: &[Row], column: &str, mode: ColumnMode, spec: &ExtractionSpec) -> Value {
    let limit = spec.limit.unwrap_or(usize::MAX);
    match mode {
        ColumnMode::FirstValue => rows.first().map_or(Value::Null, |row| cell(row, column).clone()),
        ColumnMode::Collect => Value::Array(
            filtered(rows, spec.filter.as_ref())
                .map(|row| cell(row, column).clone())
                .take(limit)
                .collect(),
        ),
        ColumnMode::Unique => {
            let mut seen: Vec<Value> = Vec::new();
            for row in filtered(rows, spec.filter.as_ref()) {
                if seen.len() >= limit {
                    break;
                }
                let value = cell(row, column);
                if !seen.iter().any(|v| strict_eq(v, value)) {
                    seen.push(value.clone());
                }
            }
            Value::Array(seen)
        }
        ColumnMode::FindFirst => spec
            .match_value
            .as_ref()
            .and_then(|target| {
                rows.iter()
                    .map(|row| cell(row, column))
                    .find(|v| strict_eq(v, target))
            })
            .cloned()
            .unwrap_or(Value::Null),
        ColumnMode::HasValue => Value::Bool(spec.match_value.as_ref().is_some_and(|target| {
            rows.iter().any(|row| strict_eq(cell(row, column), target))
        })),
        ColumnMode::Sum => number_value(rows.iter().map(|row| numeric(cell(row, column))).sum()),
    }
}

fn cell<'a>(row: &'a Row, column: &str) -> &'a Value {
    row.get(column).unwrap_or(&NULL)
}

fn project(row: &Row, columns: &[String]) -> Value {
    Value::Object(
        columns
            .iter()
            .map(|c| (c.clone(), cell(row, c).clone()))
            .collect(),
    )
}

fn filtered<'a>(rows: &'a [Row], filter: Option<&'a RowFilter>) -> impl Iterator<Item = &'a Row> {
    rows.iter()
        .filter(move |row| filter.is_none_or(|f| passes(row, f)))
}

fn passes(row: &Row, filter: &RowFilter) -> bool {
    let value = cell(row, &filter.column);
    match filter.op {
        FilterOp::Equal => strict_eq(value, &filter.value),
        FilterOp::NotEqual => !strict_eq(value, &filter.value),
        FilterOp::GreaterThan => compare(value, &filter.value) == Some(Ordering::Greater),
        FilterOp::SmallerThan => compare(value, &filter.value) == Some(Ordering::Less),
    }
}

/// Numbers count at face value, numeric strings are parsed, everything else is 0.
fn numeric(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()).unwrap_or(0.0),
        _ => 0.0,
    }
}
