use super::QueryExecutor;
use crate::error::QueryError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A captured backend payload, returned for any SQL text containing `pattern`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayFixture {
    #[serde(rename = "match")]
    pub pattern: String,
    pub payload: Value,
}

/// Replays captured payloads instead of talking to a backend.
///
/// Fixtures are tried in order and the first whose pattern occurs in the SQL
/// text wins (case-insensitive).
#[derive(Debug, Clone, Default)]
pub struct ReplayExecutor {
    fixtures: Vec<ReplayFixture>,
}

impl ReplayExecutor {
    pub fn new(fixtures: Vec<ReplayFixture>) -> Self {
        Self { fixtures }
    }

    pub fn with_fixture(mut self, pattern: impl Into<String>, payload: Value) -> Self {
        self.fixtures.push(ReplayFixture {
            pattern: pattern.into(),
            payload,
        });
        self
    }

    fn lookup(&self, sql: &str) -> Option<&Value> {
        let sql = sql.to_ascii_uppercase();
        self.fixtures
            .iter()
            .find(|f| sql.contains(&f.pattern.to_ascii_uppercase()))
            .map(|f| &f.payload)
    }
}

#[async_trait]
impl QueryExecutor for ReplayExecutor {
    async fn execute(&self, sql: &str) -> Result<Value, QueryError> {
        self.lookup(sql)
            .cloned()
            .ok_or_else(|| QueryError::Execution(format!("no fixture matches query: {}", sql)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn first_matching_fixture_wins() {
        let executor = ReplayExecutor::default()
            .with_fixture("information_schema.tables", json!({"columns": [], "rows": [1]}))
            .with_fixture("FROM", json!({"columns": [], "rows": [2]}));

        let payload =
            tokio_test::block_on(executor.execute("select * from INFORMATION_SCHEMA.TABLES"))
                .unwrap();
        assert_eq!(payload["rows"], json!([1]));

        let missing = tokio_test::block_on(executor.execute("SHOW SCHEMAS"));
        assert!(matches!(missing, Err(QueryError::Execution(_))));
    }
}
