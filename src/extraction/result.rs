use crate::error::ExtractionError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One result row: column name to scalar.
pub type Row = Map<String, Value>;

/// A decoded tabular query result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TabularResult {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl TabularResult {
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }

    /// Builds a result from positional rows, the shape the query backend returns.
    pub fn from_positional(
        columns: Vec<String>,
        rows: Vec<Vec<Value>>,
    ) -> Result<Self, ExtractionError> {
        let rows = rows
            .into_iter()
            .enumerate()
            .map(|(i, values)| zip_row(&columns, values, i))
            .collect::<Result<_, _>>()?;
        Ok(Self { columns, rows })
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// What a query executor's JSON payload turned out to be.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryPayload {
    Table(TabularResult),
    /// The backend reported a failure inside an otherwise well-formed payload.
    Failed(String),
}

impl QueryPayload {
    /// Decodes an executor payload.
    ///
    /// `{ "status": "FAILED", "error_message": .. }` and `{ "error": .. }` are reported
    /// failures. Anything else must carry a `columns` string array and a `rows` array
    /// of records or positional arrays, or it is a malformed result.
    pub fn decode(payload: Value) -> Result<QueryPayload, ExtractionError> {
        let Value::Object(mut object) = payload else {
            return Err(ExtractionError::MalformedResult(
                "payload is not a JSON object".to_string(),
            ));
        };

        if let Some(message) = reported_failure(&object) {
            return Ok(QueryPayload::Failed(message));
        }

        let columns = match object.remove("columns") {
            Some(Value::Array(columns)) => columns
                .into_iter()
                .map(|c| match c {
                    Value::String(name) => Ok(name),
                    other => Err(ExtractionError::MalformedResult(format!(
                        "column name {} is not a string",
                        other
                    ))),
                })
                .collect::<Result<Vec<_>, _>>()?,
            Some(_) => {
                return Err(ExtractionError::MalformedResult(
                    "'columns' is not an array".to_string(),
                ));
            }
            None => {
                return Err(ExtractionError::MalformedResult(
                    "missing 'columns'".to_string(),
                ));
            }
        };

        let rows = match object.remove("rows") {
            Some(Value::Array(rows)) => rows,
            Some(_) => {
                return Err(ExtractionError::MalformedResult(
                    "'rows' is not an array".to_string(),
                ));
            }
            None => {
                return Err(ExtractionError::MalformedResult("missing 'rows'".to_string()));
            }
        };

        let rows = rows
            .into_iter()
            .enumerate()
            .map(|(i, row)| match row {
                Value::Object(record) => Ok(record),
                Value::Array(values) => zip_row(&columns, values, i),
                other => Err(ExtractionError::MalformedResult(format!(
                    "row {} is neither a record nor an array: {}",
                    i, other
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(QueryPayload::Table(TabularResult { columns, rows }))
    }
}

fn reported_failure(object: &Map<String, Value>) -> Option<String> {
    let failed_status = object
        .get("status")
        .and_then(Value::as_str)
        .is_some_and(|s| s.eq_ignore_ascii_case("FAILED"));

    let error = object.get("error").filter(|v| !v.is_null());
    if !failed_status && error.is_none() {
        return None;
    }

    let message = object
        .get("error_message")
        .filter(|v| !v.is_null())
        .or(error)
        .map_or_else(
            || "query failed".to_string(),
            |v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            },
        );
    Some(message)
}

fn zip_row(columns: &[String], values: Vec<Value>, index: usize) -> Result<Row, ExtractionError> {
    if values.len() != columns.len() {
        return Err(ExtractionError::MalformedResult(format!(
            "row {} has {} values for {} columns",
            index,
            values.len(),
            columns.len()
        )));
    }
    Ok(columns.iter().cloned().zip(values).collect())
}
