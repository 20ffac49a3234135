use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// The closed set of ways a step output can be derived from a tabular result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExtractionMode {
    CollectArray,
    UniqueArray,
    FindFirst,
    HasRows,
    HasValue,
    RowsSlice,
    FirstValue,
    RowCount,
    ObjectArray,
    Sum,
}

impl ExtractionMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ExtractionMode::CollectArray => "collectArray",
            ExtractionMode::UniqueArray => "uniqueArray",
            ExtractionMode::FindFirst => "findFirst",
            ExtractionMode::HasRows => "hasRows",
            ExtractionMode::HasValue => "hasValue",
            ExtractionMode::RowsSlice => "rowsSlice",
            ExtractionMode::FirstValue => "firstValue",
            ExtractionMode::RowCount => "rowCount",
            ExtractionMode::ObjectArray => "objectArray",
            ExtractionMode::Sum => "sum",
        }
    }
}

impl fmt::Display for ExtractionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comparison operator of a row filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterOp {
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = "<")]
    SmallerThan,
    #[serde(rename = "=")]
    Equal,
    #[serde(rename = "!=")]
    NotEqual,
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            FilterOp::GreaterThan => ">",
            FilterOp::SmallerThan => "<",
            FilterOp::Equal => "=",
            FilterOp::NotEqual => "!=",
        };
        f.write_str(symbol)
    }
}

/// `row[column] <op> value`, applied before collecting a row's value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowFilter {
    pub column: String,
    pub op: FilterOp,
    pub value: Value,
}

/// Declares how one context value is extracted from a step's result.
///
/// `from_column`, `from_column_candidates` and `from_columns` are mutually exclusive;
/// `ObjectArray` is the only mode that reads `from_columns`, and it requires it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionSpec {
    pub mode: ExtractionMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_column: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_column_candidates: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_columns: Option<Vec<String>>,
    #[serde(default, rename = "match", skip_serializing_if = "Option::is_none")]
    pub match_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<RowFilter>,
}

impl ExtractionSpec {
    pub fn new(mode: ExtractionMode) -> Self {
        Self {
            mode,
            from_column: None,
            from_column_candidates: None,
            from_columns: None,
            match_value: None,
            limit: None,
            filter: None,
        }
    }

    pub fn column(mode: ExtractionMode, column: impl Into<String>) -> Self {
        Self {
            from_column: Some(column.into()),
            ..Self::new(mode)
        }
    }

    pub fn collect(column: impl Into<String>) -> Self {
        Self::column(ExtractionMode::CollectArray, column)
    }

    pub fn unique(column: impl Into<String>) -> Self {
        Self::column(ExtractionMode::UniqueArray, column)
    }

    pub fn find_first(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::column(ExtractionMode::FindFirst, column).with_match(value)
    }

    pub fn has_value(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::column(ExtractionMode::HasValue, column).with_match(value)
    }

    pub fn first_value(column: impl Into<String>) -> Self {
        Self::column(ExtractionMode::FirstValue, column)
    }

    pub fn sum(column: impl Into<String>) -> Self {
        Self::column(ExtractionMode::Sum, column)
    }

    pub fn has_rows() -> Self {
        Self::new(ExtractionMode::HasRows)
    }

    pub fn row_count() -> Self {
        Self::new(ExtractionMode::RowCount)
    }

    pub fn rows_slice(limit: usize) -> Self {
        Self::new(ExtractionMode::RowsSlice).with_limit(limit)
    }

    pub fn object_array<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            from_columns: Some(columns.into_iter().map(Into::into).collect()),
            ..Self::new(ExtractionMode::ObjectArray)
        }
    }

    /// Replaces any column selector with an ordered list of candidate columns.
    pub fn with_candidates<I, S>(mut self, candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.from_column = None;
        self.from_column_candidates = Some(candidates.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_match(mut self, value: impl Into<Value>) -> Self {
        self.match_value = Some(value.into());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_filter(mut self, column: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> Self {
        self.filter = Some(RowFilter {
            column: column.into(),
            op,
            value: value.into(),
        });
        self
    }

    /// Checks the selector invariants. Returns a human-readable reason on failure.
    pub fn check(&self) -> Result<(), String> {
        let selectors = [
            self.from_column.is_some(),
            self.from_column_candidates.is_some(),
            self.from_columns.is_some(),
        ]
        .into_iter()
        .filter(|set| *set)
        .count();

        if self.mode == ExtractionMode::ObjectArray {
            match &self.from_columns {
                Some(columns) if !columns.is_empty() => {}
                _ => return Err("objectArray requires a non-empty 'fromColumns'".to_string()),
            }
            if selectors > 1 {
                return Err("objectArray reads only 'fromColumns'".to_string());
            }
        } else {
            if selectors > 1 {
                return Err(
                    "'fromColumn', 'fromColumnCandidates' and 'fromColumns' are mutually exclusive"
                        .to_string(),
                );
            }
            if self.from_columns.is_some() {
                return Err(format!("'fromColumns' is not read by {}", self.mode));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_camel_case_spec() {
        let spec: ExtractionSpec = serde_json::from_value(json!({
            "mode": "findFirst",
            "fromColumnCandidates": ["name", "NAME"],
            "match": "PROCESS_ENTITY",
            "filter": { "column": "ROW_COUNT", "op": ">", "value": 0 }
        }))
        .unwrap();

        assert_eq!(spec.mode, ExtractionMode::FindFirst);
        assert_eq!(spec.match_value, Some(json!("PROCESS_ENTITY")));
        assert_eq!(spec.filter.unwrap().op, FilterOp::GreaterThan);
    }

    #[test]
    fn rejects_conflicting_selectors() {
        let mut spec = ExtractionSpec::collect("name");
        spec.from_column_candidates = Some(vec!["NAME".to_string()]);
        assert!(spec.check().is_err());
    }

    #[test]
    fn object_array_requires_columns() {
        assert!(ExtractionSpec::new(ExtractionMode::ObjectArray).check().is_err());
        assert!(ExtractionSpec::object_array(["a", "b"]).check().is_ok());
        assert!(ExtractionSpec::collect("a").with_limit(0).check().is_ok());
    }
}
