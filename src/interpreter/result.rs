use crate::context::RunContext;
use crate::recipe::EntityType;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Success,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Completed,
    Aborted,
}

/// Why a run stopped before completing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum AbortReason {
    /// The recipe does not list the entity's type (nor `UNKNOWN`).
    #[serde(rename_all = "camelCase")]
    UnsupportedEntity { entity_type: EntityType },
    /// A non-optional step could not resolve one of its bindings.
    #[serde(rename_all = "camelCase")]
    MissingBinding {
        step_id: String,
        param: String,
        context_key: String,
    },
    /// A non-optional step's query could not be resolved or executed.
    #[serde(rename_all = "camelCase")]
    StepFailed { step_id: String, message: String },
    /// The caller's cancellation signal was observed before a step started.
    #[serde(rename_all = "camelCase")]
    Cancelled { before_step: String },
    /// The terminal query could not be resolved against the final context.
    #[serde(rename_all = "camelCase")]
    FinalQuery { step_id: String, message: String },
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbortReason::UnsupportedEntity { entity_type } => {
                write!(f, "entity type {} is not supported by this recipe", entity_type)
            }
            AbortReason::MissingBinding {
                step_id,
                param,
                context_key,
            } => write!(
                f,
                "step '{}' is missing required input '{}' (context key '{}')",
                step_id, param, context_key
            ),
            AbortReason::StepFailed { step_id, message } => {
                write!(f, "step '{}' failed: {}", step_id, message)
            }
            AbortReason::Cancelled { before_step } => {
                write!(f, "cancelled before step '{}'", before_step)
            }
            AbortReason::FinalQuery { step_id, message } => write!(
                f,
                "final query of step '{}' could not be resolved: {}",
                step_id, message
            ),
        }
    }
}

/// The outcome of one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepResult {
    pub step_id: String,
    pub status: StepStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Values this step merged into the context.
    #[serde(default)]
    pub extracted: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_row_count: Option<usize>,
    /// The SQL text the step ran, when it got that far.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sql: Option<String>,
}

impl StepResult {
    pub(crate) fn success(
        step_id: &str,
        sql: String,
        extracted: BTreeMap<String, Value>,
        row_count: usize,
    ) -> Self {
        Self {
            step_id: step_id.to_string(),
            status: StepStatus::Success,
            message: None,
            extracted,
            raw_row_count: Some(row_count),
            sql: Some(sql),
        }
    }

    pub(crate) fn skipped(step_id: &str, message: String) -> Self {
        Self {
            step_id: step_id.to_string(),
            status: StepStatus::Skipped,
            message: Some(message),
            extracted: BTreeMap::new(),
            raw_row_count: None,
            sql: None,
        }
    }

    pub(crate) fn failed(step_id: &str, message: String, sql: Option<String>) -> Self {
        Self {
            step_id: step_id.to_string(),
            status: StepStatus::Failed,
            message: Some(message),
            extracted: BTreeMap::new(),
            raw_row_count: None,
            sql,
        }
    }
}

/// The full trace of one flow run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowRunResult {
    pub recipe_id: String,
    pub context: RunContext,
    pub steps: Vec<StepResult>,
    pub final_query: Option<String>,
    pub status: RunStatus,
    pub abort_reason: Option<AbortReason>,
}

impl FlowRunResult {
    pub(crate) fn new(recipe_id: &str) -> Self {
        Self {
            recipe_id: recipe_id.to_string(),
            context: RunContext::new(),
            steps: Vec::new(),
            final_query: None,
            status: RunStatus::Completed,
            abort_reason: None,
        }
    }

    pub(crate) fn abort(mut self, reason: AbortReason) -> Self {
        log::warn!("Run of recipe '{}' aborted: {}", self.recipe_id, reason);
        self.status = RunStatus::Aborted;
        self.abort_reason = Some(reason);
        self
    }

    pub fn is_completed(&self) -> bool {
        self.status == RunStatus::Completed
    }

    pub fn step(&self, step_id: &str) -> Option<&StepResult> {
        self.steps.iter().find(|s| s.step_id == step_id)
    }

    /// Steps that ran their query, successfully or not.
    pub fn executed_steps(&self) -> impl Iterator<Item = &StepResult> {
        self.steps.iter().filter(|s| s.status != StepStatus::Skipped)
    }
}
