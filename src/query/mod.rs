//! Contracts for the two collaborators the interpreter talks to.
//!
//! The interpreter never builds SQL and never performs I/O itself: a
//! [`QueryResolver`] maps a query id and step inputs to SQL text, and a
//! [`QueryExecutor`] runs that text against the backend.

use crate::context::StepInputs;
use crate::error::QueryError;
use async_trait::async_trait;
use serde_json::Value;

mod replay;
mod template;

pub use replay::{ReplayExecutor, ReplayFixture};
pub use template::TemplateResolver;

/// Everything a resolver needs to produce the SQL text of one step.
#[derive(Debug, Clone, Copy)]
pub struct QueryRequest<'a> {
    pub query_id: &'a str,
    pub inputs: &'a StepInputs,
    /// Column hints registered for this query id, if any.
    pub available_columns: Option<&'a [String]>,
}

/// Maps a symbolic query id and resolved inputs to literal SQL.
///
/// Must be deterministic for identical requests.
pub trait QueryResolver: Send + Sync {
    fn resolve(&self, request: &QueryRequest<'_>) -> Result<String, QueryError>;
}

impl<F> QueryResolver for F
where
    F: Fn(&QueryRequest<'_>) -> Result<String, QueryError> + Send + Sync,
{
    fn resolve(&self, request: &QueryRequest<'_>) -> Result<String, QueryError> {
        self(request)
    }
}

/// Runs SQL text against the tabular backend.
///
/// Returns the backend's JSON payload: `{ "columns": [...], "rows": [...] }` on
/// success. A failure may be returned as `Err` or reported inside the payload
/// (`{ "error": ... }` or `{ "status": "FAILED", "error_message": ... }`).
/// An empty `rows` array is a valid result, not an error. Timeouts are the
/// executor's concern.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, sql: &str) -> Result<Value, QueryError>;
}
