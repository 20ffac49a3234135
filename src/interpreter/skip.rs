use crate::context::RunContext;
use crate::recipe::Step;

pub const DEFAULT_SKIP_MESSAGE: &str = "Step skipped: its precondition was not met";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkipDecision {
    pub skip: bool,
    pub message: Option<String>,
}

impl SkipDecision {
    fn run() -> Self {
        Self {
            skip: false,
            message: None,
        }
    }
}

/// Decides whether a step runs. Steps without a predicate always run.
pub fn should_skip(step: &Step, context: &RunContext) -> SkipDecision {
    match &step.should_skip {
        Some(predicate) if predicate.holds(context) => SkipDecision {
            skip: true,
            message: Some(
                step.skip_message
                    .clone()
                    .unwrap_or_else(|| DEFAULT_SKIP_MESSAGE.to_string()),
            ),
        },
        _ => SkipDecision::run(),
    }
}
