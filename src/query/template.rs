use super::{QueryRequest, QueryResolver};
use crate::error::QueryError;
use ahash::AHashMap;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const COLUMNS_PLACEHOLDER: &str = "available_columns";

/// Resolves query ids against a table of SQL templates with `{{param}}` placeholders.
///
/// Strings are substituted as-is, arrays become a comma-separated list of SQL
/// literals, and unresolved inputs render as `NULL`. The special placeholder
/// `{{available_columns}}` expands to the registered column hints, or `*`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateResolver {
    templates: AHashMap<String, String>,
}

impl TemplateResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_template(mut self, query_id: impl Into<String>, sql: impl Into<String>) -> Self {
        self.templates.insert(query_id.into(), sql.into());
        self
    }

    pub fn contains(&self, query_id: &str) -> bool {
        self.templates.contains_key(query_id)
    }

    fn render(&self, template: &str, request: &QueryRequest<'_>) -> Result<String, QueryError> {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(start) = rest.find("{{") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let end = after.find("}}").ok_or_else(|| QueryError::Resolution {
                query_id: request.query_id.to_string(),
                message: "unterminated placeholder".to_string(),
            })?;
            let name = after[..end].trim();

            if name == COLUMNS_PLACEHOLDER {
                match request.available_columns {
                    Some(columns) if !columns.is_empty() => out.push_str(&columns.join(", ")),
                    _ => out.push('*'),
                }
            } else if request.inputs.declares(name) {
                out.push_str(&render_value(request.inputs.get(name)));
            } else {
                return Err(QueryError::Resolution {
                    query_id: request.query_id.to_string(),
                    message: format!("placeholder '{}' is not bound by the step", name),
                });
            }
            rest = &after[end + 2..];
        }
        out.push_str(rest);
        Ok(out)
    }
}

impl QueryResolver for TemplateResolver {
    fn resolve(&self, request: &QueryRequest<'_>) -> Result<String, QueryError> {
        let template =
            self.templates
                .get(request.query_id)
                .ok_or_else(|| QueryError::Resolution {
                    query_id: request.query_id.to_string(),
                    message: "no template registered".to_string(),
                })?;
        self.render(template, request)
    }
}

fn render_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "NULL".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => items.iter().map(sql_literal).join(", "),
        Some(other) => other.to_string(),
    }
}

fn sql_literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::String(s) => format!("'{}'", s.replace('\'', "''")),
        Value::Number(_) | Value::Bool(_) => value.to_string(),
        other => format!("'{}'", other.to_string().replace('\'', "''")),
    }
}
