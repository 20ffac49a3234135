use crate::context::RunContext;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// A pure function over the run context deciding whether a step is skipped.
pub type SkipFn = Arc<dyn Fn(&RunContext) -> bool + Send + Sync>;

/// The condition under which a step does not run.
///
/// The declarative variants can be loaded from JSON. `Custom` carries a closure for
/// recipes defined in code and is never serialized.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SkipPredicate {
    /// Skip when the key is absent or `null`.
    WhenMissing(String),
    /// Skip when the key is falsy.
    WhenFalsy(String),
    /// Skip when the key is truthy.
    WhenTruthy(String),
    #[serde(skip)]
    Custom(SkipFn),
}

impl SkipPredicate {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&RunContext) -> bool + Send + Sync + 'static,
    {
        SkipPredicate::Custom(Arc::new(f))
    }

    pub fn holds(&self, context: &RunContext) -> bool {
        match self {
            SkipPredicate::WhenMissing(key) => {
                crate::context::value::is_missing(context.get(key))
            }
            SkipPredicate::WhenFalsy(key) => !context.is_truthy(key),
            SkipPredicate::WhenTruthy(key) => context.is_truthy(key),
            SkipPredicate::Custom(f) => f(context),
        }
    }
}

impl fmt::Debug for SkipPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipPredicate::WhenMissing(key) => write!(f, "WhenMissing({})", key),
            SkipPredicate::WhenFalsy(key) => write!(f, "WhenFalsy({})", key),
            SkipPredicate::WhenTruthy(key) => write!(f, "WhenTruthy({})", key),
            SkipPredicate::Custom(_) => f.write_str("Custom(<fn>)"),
        }
    }
}
