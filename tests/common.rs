//! Common test utilities: payload builders and scripted query collaborators.
use ahash::AHashMap;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use wizflow::prelude::*;

/// Builds a `{ columns, rows }` payload from record rows.
#[allow(dead_code)]
pub fn payload(columns: &[&str], rows: Value) -> Value {
    json!({ "columns": columns, "rows": rows })
}

/// Builds a decoded result from record rows.
#[allow(dead_code)]
pub fn table(columns: &[&str], rows: Value) -> TabularResult {
    serde_json::from_value(payload(columns, rows)).expect("test rows must be records")
}

/// Renders `query_id?param=value&...` so tests can see exactly which inputs a
/// step was resolved with. Unresolved inputs render as `undefined`.
#[allow(dead_code)]
pub fn keyed_sql(request: &QueryRequest<'_>) -> Result<String, QueryError> {
    let params: Vec<String> = request
        .inputs
        .iter()
        .map(|(k, v)| match v {
            Some(Value::String(s)) => format!("{}={}", k, s),
            Some(other) => format!("{}={}", k, other),
            None => format!("{}=undefined", k),
        })
        .collect();
    Ok(format!("{}?{}", request.query_id, params.join("&")))
}

/// Answers queries by query id (the text before `?`), and records every SQL text it sees.
#[allow(dead_code)]
#[derive(Default)]
pub struct ScriptedExecutor {
    responses: AHashMap<String, Result<Value, QueryError>>,
    calls: Arc<Mutex<Vec<String>>>,
    cancel_on: Option<(String, CancellationToken)>,
}

#[allow(dead_code)]
impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, query_id: &str, payload: Value) -> Self {
        self.responses.insert(query_id.to_string(), Ok(payload));
        self
    }

    pub fn fail(mut self, query_id: &str, error: QueryError) -> Self {
        self.responses.insert(query_id.to_string(), Err(error));
        self
    }

    /// Cancels `token` while executing `query_id`, the way a user closing a wizard would.
    pub fn cancel_during(mut self, query_id: &str, token: CancellationToken) -> Self {
        self.cancel_on = Some((query_id.to_string(), token));
        self
    }

    pub fn call_log(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl QueryExecutor for ScriptedExecutor {
    async fn execute(&self, sql: &str) -> Result<Value, QueryError> {
        self.calls.lock().unwrap().push(sql.to_string());
        let query_id = sql.split('?').next().unwrap_or_default();
        if let Some((id, token)) = &self.cancel_on {
            if id == query_id {
                token.cancel();
            }
        }
        self.responses
            .get(query_id)
            .cloned()
            .unwrap_or_else(|| Err(QueryError::Execution(format!("no response for {}", sql))))
    }
}

/// Query ids recorded by an executor's call log, in call order.
#[allow(dead_code)]
pub fn called_ids(log: &Arc<Mutex<Vec<String>>>) -> Vec<String> {
    log.lock()
        .unwrap()
        .iter()
        .map(|sql| sql.split('?').next().unwrap_or_default().to_string())
        .collect()
}

/// discover -> examine (skipped without a process table) -> sample (optional) -> build.
#[allow(dead_code)]
pub fn create_lineage_recipe() -> Recipe {
    Recipe::builder("process_lineage")
        .label("Trace process lineage")
        .domain("lineage")
        .supports(EntityType::Process)
        .supports(EntityType::Schema)
        .default_input("maxDepth", 3)
        .step(
            Step::new("discover_process_tables", StepKind::Discover, "discover_process_tables")
                .bind("schema", "schema")
                .output(
                    "processTable",
                    ExtractionSpec::find_first("TABLE_NAME", "PROCESS_ENTITY"),
                )
                .output("tables", ExtractionSpec::unique("TABLE_NAME")),
        )
        .step(
            Step::new("examine_structure", StepKind::Inspect, "describe_table")
                .bind("table", "processTable")
                .output("processColumns", ExtractionSpec::collect("COLUMN_NAME"))
                .skip_when(
                    SkipPredicate::custom(|ctx| !ctx.is_truthy("processTable")),
                    "No process table found",
                ),
        )
        .step(
            Step::new("sample_processes", StepKind::Sample, "sample_table")
                .bind("table", "processTable")
                .output("sampleRows", ExtractionSpec::rows_slice(2))
                .optional(),
        )
        .step(
            Step::new("build_lineage_query", StepKind::BuildFinal, "lineage_final")
                .bind("table", "processTable")
                .bind("depth", "maxDepth"),
        )
        .build()
        .expect("lineage recipe is valid")
}

#[allow(dead_code)]
pub fn discover_payload() -> Value {
    payload(
        &["TABLE_NAME"],
        json!([
            {"TABLE_NAME": "PROCESS_RUN"},
            {"TABLE_NAME": "PROCESS_ENTITY"},
            {"TABLE_NAME": "PROCESS_RUN"}
        ]),
    )
}

#[allow(dead_code)]
pub fn describe_payload() -> Value {
    json!({
        "columns": ["COLUMN_NAME", "DATA_TYPE"],
        "rows": [["ID", "NUMBER"], ["PARENT_ID", "NUMBER"], ["NAME", "TEXT"]]
    })
}

/// An executor that answers every step of the lineage recipe.
#[allow(dead_code)]
pub fn lineage_executor() -> ScriptedExecutor {
    ScriptedExecutor::new()
        .respond("discover_process_tables", discover_payload())
        .respond("describe_table", describe_payload())
        .respond(
            "sample_table",
            payload(&["ID"], json!([{"ID": 1}, {"ID": 2}, {"ID": 3}])),
        )
        .respond("lineage_final", payload(&["ID"], json!([])))
}

#[allow(dead_code)]
pub fn process_entity() -> Entity {
    Entity::new(EntityType::Process)
        .named("nightly_load")
        .with_attribute("schema", "OPS")
}

#[allow(dead_code)]
pub fn run(
    interpreter: &FlowInterpreter,
    recipe: &Recipe,
    entity: &Entity,
    options: RunOptions,
) -> FlowRunResult {
    tokio_test::block_on(interpreter.run_flow(recipe, entity, options)).expect("run must not error")
}
