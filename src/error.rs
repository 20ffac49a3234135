use thiserror::Error;

/// Errors raised while validating or loading recipe definitions.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CatalogError {
    #[error("Failed to parse recipe JSON: {0}")]
    JsonParseError(String),

    #[error("Recipe '{0}' has no steps")]
    EmptyRecipe(String),

    #[error("Recipe id '{0}' is defined more than once")]
    DuplicateRecipe(String),

    #[error("Recipe '{recipe_id}' declares step '{step_id}' more than once")]
    DuplicateStep { recipe_id: String, step_id: String },

    #[error(
        "Recipe '{recipe_id}': step '{step_id}' is a BUILD_FINAL step but only the last step may be terminal"
    )]
    MisplacedTerminalStep { recipe_id: String, step_id: String },

    #[error("Recipe '{recipe_id}' must end with a BUILD_FINAL step, but ends with '{step_id}'")]
    MissingTerminalStep { recipe_id: String, step_id: String },

    #[error("Recipe '{recipe_id}', step '{step_id}', output '{output_key}': {message}")]
    InvalidExtraction {
        recipe_id: String,
        step_id: String,
        output_key: String,
        message: String,
    },
}

/// Errors raised by the extraction engine. These indicate a broken contract between
/// the executor and the engine, never an empty or partial result.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractionError {
    #[error("Malformed query result: {0}")]
    MalformedResult(String),

    #[error("Extraction mode '{0}' requires 'fromColumns'")]
    MissingColumns(String),
}

/// Failures reported by the query collaborators.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    #[error("Could not resolve query '{query_id}': {message}")]
    Resolution { query_id: String, message: String },

    #[error("Query execution failed: {0}")]
    Execution(String),

    #[error("Query reported an error: {0}")]
    Reported(String),

    #[error("Query timed out after {0} ms")]
    Timeout(u64),
}

/// Contract violations that stop a flow run outright.
///
/// Expected backend failures (timeouts, empty results, missing tables) are never
/// returned through this type; they are recorded in the run trace instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FlowError {
    #[error("Step '{step_id}' produced an unusable result: {source}")]
    Extraction {
        step_id: String,
        #[source]
        source: ExtractionError,
    },

    #[error("Recipe is invalid: {0}")]
    InvalidRecipe(#[from] CatalogError),
}
