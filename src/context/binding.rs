use super::RunContext;
use super::value::is_missing;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// The concrete inputs handed to query templating for one step.
///
/// Every declared template parameter is present; parameters whose context key was
/// absent resolve to `None` rather than being dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StepInputs {
    values: BTreeMap<String, Option<Value>>,
    sources: BTreeMap<String, String>,
}

impl StepInputs {
    /// The resolved value of a template parameter. `None` for unknown or unresolved parameters.
    pub fn get(&self, param: &str) -> Option<&Value> {
        self.values.get(param).and_then(Option::as_ref)
    }

    /// Whether the parameter was declared by the step at all.
    pub fn declares(&self, param: &str) -> bool {
        self.values.contains_key(param)
    }

    /// Declared parameters whose value is absent or `null`, paired with their context key.
    pub fn missing(&self) -> Vec<(&str, &str)> {
        self.values
            .iter()
            .filter(|(_, v)| is_missing(v.as_ref()))
            .map(|(param, _)| {
                let key = self.sources.get(param).map_or("", String::as_str);
                (param.as_str(), key)
            })
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&Value>)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Replaces every unresolved parameter with an explicit `null`.
    pub(crate) fn fill_missing_with_null(&mut self) {
        for value in self.values.values_mut() {
            if value.is_none() {
                *value = Some(Value::Null);
            }
        }
    }
}

/// Resolves a step's `templateParam -> contextKey` bindings against the current context.
///
/// Pure: the context is only read.
pub fn resolve_inputs(bindings: &BTreeMap<String, String>, context: &RunContext) -> StepInputs {
    let mut inputs = StepInputs::default();
    for (param, key) in bindings {
        inputs
            .values
            .insert(param.clone(), context.get(key).cloned());
        inputs.sources.insert(param.clone(), key.clone());
    }
    inputs
}
