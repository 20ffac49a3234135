use super::{ExtractionSpec, SkipPredicate};
use crate::error::CatalogError;
use ahash::AHashMap;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Kinds of catalog entity a wizard can be opened on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    Table,
    View,
    Column,
    Schema,
    Database,
    Process,
    Dashboard,
    Report,
    Pipeline,
    /// Listed in a recipe, accepts any entity type.
    Unknown,
}

impl EntityType {
    pub const ALL: [EntityType; 10] = [
        EntityType::Table,
        EntityType::View,
        EntityType::Column,
        EntityType::Schema,
        EntityType::Database,
        EntityType::Process,
        EntityType::Dashboard,
        EntityType::Report,
        EntityType::Pipeline,
        EntityType::Unknown,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EntityType::Table => "TABLE",
            EntityType::View => "VIEW",
            EntityType::Column => "COLUMN",
            EntityType::Schema => "SCHEMA",
            EntityType::Database => "DATABASE",
            EntityType::Process => "PROCESS",
            EntityType::Dashboard => "DASHBOARD",
            EntityType::Report => "REPORT",
            EntityType::Pipeline => "PIPELINE",
            EntityType::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown entity type '{}'", s))
    }
}

/// The catalog entity a flow is run against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    #[serde(default)]
    pub name: Option<String>,
    /// Seeded into the run context ahead of caller inputs.
    #[serde(default)]
    pub attributes: AHashMap<String, Value>,
}

impl Entity {
    pub fn new(entity_type: EntityType) -> Self {
        Self {
            entity_type,
            name: None,
            attributes: AHashMap::new(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepKind {
    Discover,
    Inspect,
    Sample,
    BuildFinal,
    Search,
    Validate,
}

/// One query-backed stage of a recipe.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    pub id: String,
    pub kind: StepKind,
    /// Opaque reference to an external SQL template.
    pub query_id: String,
    /// `templateParam -> contextKey`
    #[serde(default)]
    pub input_bindings: BTreeMap<String, String>,
    /// `contextKey -> extraction`
    #[serde(default)]
    pub output_bindings: BTreeMap<String, ExtractionSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub should_skip: Option<SkipPredicate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_message: Option<String>,
    #[serde(default)]
    pub optional: bool,
}

impl Step {
    pub fn new(id: impl Into<String>, kind: StepKind, query_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            query_id: query_id.into(),
            input_bindings: BTreeMap::new(),
            output_bindings: BTreeMap::new(),
            should_skip: None,
            skip_message: None,
            optional: false,
        }
    }

    /// Binds a template parameter to a context key.
    pub fn bind(mut self, param: impl Into<String>, context_key: impl Into<String>) -> Self {
        self.input_bindings.insert(param.into(), context_key.into());
        self
    }

    /// Declares a context key extracted from this step's result.
    pub fn output(mut self, context_key: impl Into<String>, spec: ExtractionSpec) -> Self {
        self.output_bindings.insert(context_key.into(), spec);
        self
    }

    pub fn skip_when(mut self, predicate: SkipPredicate, message: impl Into<String>) -> Self {
        self.should_skip = Some(predicate);
        self.skip_message = Some(message.into());
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn is_terminal(&self) -> bool {
        self.kind == StepKind::BuildFinal
    }
}

/// A named, ordered sequence of steps describing one wizard flow.
///
/// Step order is dependency order: a step's bindings may reference any key
/// produced by the steps before it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: String,
    pub intent: String,
    pub label: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub domain: String,
    pub supported_entity_types: BTreeSet<EntityType>,
    #[serde(default)]
    pub default_inputs: BTreeMap<String, Value>,
    pub steps: Vec<Step>,
}

impl Recipe {
    pub fn builder(id: impl Into<String>) -> RecipeBuilder {
        RecipeBuilder::new(id)
    }

    /// Whether the recipe accepts the entity type, directly or through `UNKNOWN`.
    pub fn supports(&self, entity_type: EntityType) -> bool {
        self.supported_entity_types.contains(&entity_type)
            || self.supported_entity_types.contains(&EntityType::Unknown)
    }

    pub fn step(&self, id: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.id == id)
    }

    /// The last step, when it is a `BUILD_FINAL` step.
    pub fn terminal_step(&self) -> Option<&Step> {
        self.steps.last().filter(|s| s.is_terminal())
    }

    /// Checks the structural invariants of the recipe.
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.steps.is_empty() {
            return Err(CatalogError::EmptyRecipe(self.id.clone()));
        }

        if let Some(step_id) = self.steps.iter().map(|s| &s.id).duplicates().next() {
            return Err(CatalogError::DuplicateStep {
                recipe_id: self.id.clone(),
                step_id: step_id.clone(),
            });
        }

        let last = self.steps.len() - 1;
        if let Some((_, step)) = self
            .steps
            .iter()
            .enumerate()
            .find(|(i, s)| s.is_terminal() && *i != last)
        {
            return Err(CatalogError::MisplacedTerminalStep {
                recipe_id: self.id.clone(),
                step_id: step.id.clone(),
            });
        }
        if self.terminal_step().is_none() {
            return Err(CatalogError::MissingTerminalStep {
                recipe_id: self.id.clone(),
                step_id: self.steps[last].id.clone(),
            });
        }

        for step in &self.steps {
            for (key, spec) in &step.output_bindings {
                spec.check()
                    .map_err(|message| CatalogError::InvalidExtraction {
                        recipe_id: self.id.clone(),
                        step_id: step.id.clone(),
                        output_key: key.clone(),
                        message,
                    })?;
            }
        }
        Ok(())
    }
}

pub struct RecipeBuilder {
    recipe: Recipe,
}

impl RecipeBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            recipe: Recipe {
                label: id.clone(),
                intent: id.clone(),
                id,
                description: String::new(),
                domain: String::new(),
                supported_entity_types: BTreeSet::new(),
                default_inputs: BTreeMap::new(),
                steps: Vec::new(),
            },
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.recipe.label = label.into();
        self
    }

    pub fn intent(mut self, intent: impl Into<String>) -> Self {
        self.recipe.intent = intent.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.recipe.description = description.into();
        self
    }

    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.recipe.domain = domain.into();
        self
    }

    pub fn supports(mut self, entity_type: EntityType) -> Self {
        self.recipe.supported_entity_types.insert(entity_type);
        self
    }

    pub fn default_input(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.recipe.default_inputs.insert(key.into(), value.into());
        self
    }

    pub fn step(mut self, step: Step) -> Self {
        self.recipe.steps.push(step);
        self
    }

    /// Validates and returns the recipe.
    pub fn build(self) -> Result<Recipe, CatalogError> {
        self.recipe.validate()?;
        Ok(self.recipe)
    }
}
