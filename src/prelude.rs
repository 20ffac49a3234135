//! Prelude module for convenient imports
//!
//! Re-exports the types needed to define recipes, plug in query collaborators
//! and run flows.

// Catalog and recipe model
pub use crate::catalog::RecipeCatalog;
pub use crate::recipe::{
    Entity, EntityType, ExtractionMode, ExtractionSpec, FilterOp, Recipe, RowFilter,
    SkipPredicate, Step, StepKind,
};

// Runtime
pub use crate::context::RunContext;
pub use crate::extraction::TabularResult;
pub use crate::interpreter::{
    AbortReason, BindingPolicy, FlowInterpreter, FlowRunResult, RunOptions, RunStatus,
    StepResult, StepStatus,
};

// Collaborators
pub use crate::query::{
    QueryExecutor, QueryRequest, QueryResolver, ReplayExecutor, TemplateResolver,
};

// Error types
pub use crate::error::{CatalogError, ExtractionError, FlowError, QueryError};

// Trace formatting
pub use crate::trace::RunFormatter;

pub use tokio_util::sync::CancellationToken;
