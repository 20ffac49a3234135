use crate::interpreter::{FlowRunResult, RunStatus, StepResult, StepStatus};
use itertools::Itertools;
use serde_json::Value;

const MAX_VALUE_CHARS: usize = 60;

/// Formats run traces into human-readable reports.
pub struct RunFormatter;

impl RunFormatter {
    /// One line per step, then the outcome and the final query if there is one.
    pub fn format(run: &FlowRunResult) -> String {
        let mut lines = vec![format!("Recipe '{}'", run.recipe_id)];
        lines.extend(run.steps.iter().map(Self::format_step));

        match run.status {
            RunStatus::Completed => lines.push("=> completed".to_string()),
            RunStatus::Aborted => lines.push(format!(
                "=> aborted: {}",
                run.abort_reason
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_else(|| "unknown reason".to_string())
            )),
        }

        if let Some(sql) = &run.final_query {
            lines.push("Final query:".to_string());
            lines.extend(sql.lines().map(|l| format!("  {}", l)));
        }
        lines.join("\n")
    }

    fn format_step(step: &StepResult) -> String {
        match step.status {
            StepStatus::Success => {
                let rows = step.raw_row_count.unwrap_or(0);
                if step.extracted.is_empty() {
                    format!("  [ok]   {} ({} rows)", step.step_id, rows)
                } else {
                    let extracted = step
                        .extracted
                        .iter()
                        .map(|(k, v)| format!("{} = {}", k, Self::format_value(v)))
                        .join(", ");
                    format!("  [ok]   {} ({} rows): {}", step.step_id, rows, extracted)
                }
            }
            StepStatus::Skipped => format!(
                "  [skip] {}: {}",
                step.step_id,
                step.message.as_deref().unwrap_or_default()
            ),
            StepStatus::Failed => format!(
                "  [fail] {}: {}",
                step.step_id,
                step.message.as_deref().unwrap_or_default()
            ),
        }
    }

    /// Compact rendering; long arrays and objects are truncated.
    fn format_value(value: &Value) -> String {
        let text = match value {
            Value::String(s) => format!("'{}'", s),
            Value::Array(items) if items.len() > 5 => format!(
                "[{}, ... {} more]",
                items.iter().take(5).join(", "),
                items.len() - 5
            ),
            other => other.to_string(),
        };
        if text.chars().count() > MAX_VALUE_CHARS {
            let truncated: String = text.chars().take(MAX_VALUE_CHARS).collect();
            format!("{}...", truncated)
        } else {
            text
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn long_arrays_are_truncated() {
        let value = json!([1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(RunFormatter::format_value(&value), "[1, 2, 3, 4, 5, ... 2 more]");
        assert_eq!(RunFormatter::format_value(&json!("A")), "'A'");
    }
}
