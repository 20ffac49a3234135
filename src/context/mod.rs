//! The shared key-value store threaded through a single flow run.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

mod binding;
pub mod value;

pub use binding::{StepInputs, resolve_inputs};

/// Mutable mapping from context key to value, owned by exactly one flow run.
///
/// Keys are never removed. Inserting an existing key overwrites it (last write wins),
/// which lets recipes reuse conventional output names across steps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunContext {
    values: AHashMap<String, Value>,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Inserts a value, returning the one it replaced.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.values.insert(key.into(), value)
    }

    /// Merges every entry of `other` into the context, overwriting on collision.
    pub fn merge<I, K>(&mut self, other: I)
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        for (key, value) in other {
            self.values.insert(key.into(), value);
        }
    }

    pub fn is_truthy(&self, key: &str) -> bool {
        value::is_truthy(self.values.get(key))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for RunContext {
    fn from_iter<T: IntoIterator<Item = (K, Value)>>(iter: T) -> Self {
        let mut context = RunContext::new();
        context.merge(iter);
        context
    }
}
