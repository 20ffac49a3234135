//! The flow interpreter: walks a recipe's steps in declaration order, threading
//! one [`RunContext`] through binding resolution, query execution and extraction.

use crate::context::{RunContext, StepInputs, resolve_inputs};
use crate::error::{FlowError, QueryError};
use crate::extraction::{QueryPayload, extract_all};
use crate::query::{QueryExecutor, QueryRequest, QueryResolver};
use crate::recipe::{Entity, Recipe, Step};
use ahash::AHashMap;
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

mod result;
mod skip;

pub use result::{AbortReason, FlowRunResult, RunStatus, StepResult, StepStatus};
pub use skip::{DEFAULT_SKIP_MESSAGE, SkipDecision, should_skip};

/// How the interpreter treats bindings that resolve to nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BindingPolicy {
    /// Every binding of a non-optional step is required; a missing one aborts the run.
    #[default]
    Strict,
    /// Missing bindings are passed to the resolver as `null` and never abort.
    PassThrough,
}

/// Per-run inputs.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub initial_inputs: AHashMap<String, Value>,
    /// Checked between steps, never while a query is in flight.
    pub cancel: Option<CancellationToken>,
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.initial_inputs.insert(key.into(), value.into());
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

/// What the loop does after a step.
enum Flow {
    Continue,
    Abort(AbortReason),
}

/// Runs recipes against injected query collaborators.
///
/// The interpreter holds no per-run state: every call to [`FlowInterpreter::run_flow`]
/// gets a fresh context, so one interpreter can serve concurrent runs.
pub struct FlowInterpreter {
    resolver: Arc<dyn QueryResolver>,
    executor: Arc<dyn QueryExecutor>,
    binding_policy: BindingPolicy,
    available_columns: AHashMap<String, Vec<String>>,
}

pub struct FlowInterpreterBuilder {
    resolver: Arc<dyn QueryResolver>,
    executor: Arc<dyn QueryExecutor>,
    binding_policy: BindingPolicy,
    available_columns: AHashMap<String, Vec<String>>,
}

impl FlowInterpreterBuilder {
    pub fn binding_policy(mut self, policy: BindingPolicy) -> Self {
        self.binding_policy = policy;
        self
    }

    /// Registers column hints for a query id, passed to the resolver with every request.
    pub fn available_columns<I, S>(mut self, query_id: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.available_columns.insert(
            query_id.into(),
            columns.into_iter().map(Into::into).collect(),
        );
        self
    }

    pub fn build(self) -> FlowInterpreter {
        FlowInterpreter {
            resolver: self.resolver,
            executor: self.executor,
            binding_policy: self.binding_policy,
            available_columns: self.available_columns,
        }
    }
}

impl FlowInterpreter {
    pub fn builder<R, E>(resolver: R, executor: E) -> FlowInterpreterBuilder
    where
        R: QueryResolver + 'static,
        E: QueryExecutor + 'static,
    {
        FlowInterpreterBuilder {
            resolver: Arc::new(resolver),
            executor: Arc::new(executor),
            binding_policy: BindingPolicy::default(),
            available_columns: AHashMap::new(),
        }
    }

    pub fn new<R, E>(resolver: R, executor: E) -> Self
    where
        R: QueryResolver + 'static,
        E: QueryExecutor + 'static,
    {
        Self::builder(resolver, executor).build()
    }

    /// Runs a recipe for an entity.
    ///
    /// Expected failures (unsupported entity, missing bindings, query errors,
    /// cancellation) come back as an `Aborted` result with the partial trace.
    /// `Err` is reserved for invalid recipes and malformed query results.
    pub async fn run_flow(
        &self,
        recipe: &Recipe,
        entity: &Entity,
        options: RunOptions,
    ) -> Result<FlowRunResult, FlowError> {
        recipe.validate()?;
        let mut run = FlowRunResult::new(&recipe.id);

        if !recipe.supports(entity.entity_type) {
            return Ok(run.abort(AbortReason::UnsupportedEntity {
                entity_type: entity.entity_type,
            }));
        }

        log::info!(
            "Running recipe '{}' ({} steps) for {} entity{}",
            recipe.id,
            recipe.steps.len(),
            entity.entity_type,
            entity
                .name
                .as_deref()
                .map(|n| format!(" '{}'", n))
                .unwrap_or_default()
        );

        run.context = seed_context(recipe, entity, options.initial_inputs);

        for step in &recipe.steps {
            if options.cancel.as_ref().is_some_and(|t| t.is_cancelled()) {
                return Ok(run.abort(AbortReason::Cancelled {
                    before_step: step.id.clone(),
                }));
            }

            if let Flow::Abort(reason) = self.run_step(step, &mut run).await? {
                return Ok(run.abort(reason));
            }
        }

        if let Err(reason) = self.compose_final_query(recipe, &mut run) {
            return Ok(run.abort(reason));
        }

        log::info!(
            "Recipe '{}' completed: {} steps, {} context keys",
            recipe.id,
            run.steps.len(),
            run.context.len()
        );
        Ok(run)
    }

    async fn run_step(&self, step: &Step, run: &mut FlowRunResult) -> Result<Flow, FlowError> {
        let decision = should_skip(step, &run.context);
        if decision.skip {
            let message = decision.message.unwrap_or_default();
            log::debug!("Skipping step '{}': {}", step.id, message);
            run.steps.push(StepResult::skipped(&step.id, message));
            return Ok(Flow::Continue);
        }

        let inputs = match self.step_inputs(step, &run.context) {
            Ok(inputs) => inputs,
            Err((param, context_key)) => {
                let reason = AbortReason::MissingBinding {
                    step_id: step.id.clone(),
                    param,
                    context_key,
                };
                run.steps
                    .push(StepResult::failed(&step.id, reason.to_string(), None));
                return Ok(Flow::Abort(reason));
            }
        };

        let sql = match self.resolve(step, &inputs) {
            Ok(sql) => sql,
            Err(e) => return Ok(fail_step(step, run, e, None)),
        };
        log::debug!("Step '{}' resolved to: {}", step.id, sql);

        let payload = match self.executor.execute(&sql).await {
            Ok(payload) => payload,
            Err(e) => return Ok(fail_step(step, run, e, Some(sql))),
        };

        let table = match QueryPayload::decode(payload).map_err(|source| {
            FlowError::Extraction {
                step_id: step.id.clone(),
                source,
            }
        })? {
            QueryPayload::Table(table) => table,
            QueryPayload::Failed(message) => {
                return Ok(fail_step(step, run, QueryError::Reported(message), Some(sql)));
            }
        };

        let extracted =
            extract_all(&table, &step.output_bindings).map_err(|source| FlowError::Extraction {
                step_id: step.id.clone(),
                source,
            })?;
        log::debug!(
            "Step '{}' returned {} rows, extracted {:?}",
            step.id,
            table.len(),
            extracted.keys().collect::<Vec<_>>()
        );

        run.context
            .merge(extracted.iter().map(|(k, v)| (k.clone(), v.clone())));
        run.steps
            .push(StepResult::success(&step.id, sql, extracted, table.len()));
        Ok(Flow::Continue)
    }

    /// Resolves a step's bindings, applying the binding policy.
    /// Returns the first missing `(param, context_key)` when the step must abort.
    fn step_inputs(&self, step: &Step, context: &RunContext) -> Result<StepInputs, (String, String)> {
        let mut inputs = resolve_inputs(&step.input_bindings, context);
        if self.binding_policy == BindingPolicy::PassThrough {
            inputs.fill_missing_with_null();
            return Ok(inputs);
        }
        if !step.optional {
            if let Some((param, key)) = inputs.missing().first() {
                return Err((param.to_string(), key.to_string()));
            }
        }
        Ok(inputs)
    }

    fn resolve(&self, step: &Step, inputs: &StepInputs) -> Result<String, QueryError> {
        let request = QueryRequest {
            query_id: &step.query_id,
            inputs,
            available_columns: self.available_columns.get(&step.query_id).map(Vec::as_slice),
        };
        self.resolver.resolve(&request)
    }

    /// Resolves the terminal step once more against the final context, when the last
    /// step that ran is a successful `BUILD_FINAL` step.
    fn compose_final_query(&self, recipe: &Recipe, run: &mut FlowRunResult) -> Result<(), AbortReason> {
        let Some(last) = run.executed_steps().last() else {
            return Ok(());
        };
        if last.status != StepStatus::Success {
            return Ok(());
        }
        let Some(step) = recipe.step(&last.step_id).filter(|s| s.is_terminal()) else {
            return Ok(());
        };

        let inputs = self
            .step_inputs(step, &run.context)
            .map_err(|(param, context_key)| AbortReason::MissingBinding {
                step_id: step.id.clone(),
                param,
                context_key,
            })?;
        let sql = self
            .resolve(step, &inputs)
            .map_err(|e| AbortReason::FinalQuery {
                step_id: step.id.clone(),
                message: e.to_string(),
            })?;
        run.final_query = Some(sql);
        Ok(())
    }
}

/// `defaultInputs`, then entity attributes, then caller inputs; later sources win.
fn seed_context(
    recipe: &Recipe,
    entity: &Entity,
    initial_inputs: AHashMap<String, Value>,
) -> RunContext {
    let mut context: RunContext = recipe
        .default_inputs
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    context.merge(entity.attributes.iter().map(|(k, v)| (k.clone(), v.clone())));
    context.merge(initial_inputs);
    context
}

/// Records a query failure and decides, from `optional`, whether the run goes on.
fn fail_step(step: &Step, run: &mut FlowRunResult, error: QueryError, sql: Option<String>) -> Flow {
    let message = error.to_string();
    run.steps
        .push(StepResult::failed(&step.id, message.clone(), sql));
    if step.optional {
        log::warn!("Optional step '{}' failed, continuing: {}", step.id, message);
        Flow::Continue
    } else {
        Flow::Abort(AbortReason::StepFailed {
            step_id: step.id.clone(),
            message,
        })
    }
}
