use crate::query::{ReplayExecutor, ReplayFixture, TemplateResolver};
use serde::{Deserialize, Serialize};
use std::fs;

/// Captured query templates and backend payloads for running recipes offline.
///
/// ```json
/// {
///   "templates": { "describe_table": "DESCRIBE TABLE {{database}}.{{schema}}.{{table}}" },
///   "results": [ { "match": "DESCRIBE TABLE", "payload": { "columns": [], "rows": [] } } ]
/// }
/// ```
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct FixtureSet {
    #[serde(default)]
    pub templates: TemplateResolver,
    #[serde(default)]
    pub results: Vec<ReplayFixture>,
}

impl FixtureSet {
    /// Load fixtures from a JSON file.
    pub fn from_file(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let content = fs::read_to_string(path)?;
        let fixtures = serde_json::from_str(&content)?;
        Ok(fixtures)
    }

    /// Splits the set into the two collaborators the interpreter needs.
    pub fn into_collaborators(self) -> (TemplateResolver, ReplayExecutor) {
        (self.templates, ReplayExecutor::new(self.results))
    }
}
