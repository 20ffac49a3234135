//! Read-only registry of validated recipes.
//!
//! A catalog is constructed once at startup and handed to callers by reference;
//! nothing in the crate keeps a global copy.

use crate::error::CatalogError;
use crate::recipe::{EntityType, Recipe};
use ahash::AHashMap;
use itertools::Itertools;
use std::fs;
use std::path::Path;

const BUILTIN_RECIPES: &str = include_str!("../../recipes/builtin.json");

#[derive(Debug, Clone, Default)]
pub struct RecipeCatalog {
    recipes: Vec<Recipe>,
    by_id: AHashMap<String, usize>,
}

impl RecipeCatalog {
    /// Validates every recipe and builds the registry. Declaration order is kept.
    pub fn new(recipes: Vec<Recipe>) -> Result<Self, CatalogError> {
        if let Some(id) = recipes.iter().map(|r| &r.id).duplicates().next() {
            return Err(CatalogError::DuplicateRecipe(id.clone()));
        }
        for recipe in &recipes {
            recipe.validate()?;
        }

        let by_id = recipes
            .iter()
            .enumerate()
            .map(|(i, r)| (r.id.clone(), i))
            .collect();
        log::debug!("Loaded recipe catalog with {} recipes", recipes.len());
        Ok(Self { recipes, by_id })
    }

    /// Parses a JSON array of recipes.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let recipes: Vec<Recipe> =
            serde_json::from_str(json).map_err(|e| CatalogError::JsonParseError(e.to_string()))?;
        Self::new(recipes)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| {
            CatalogError::JsonParseError(format!("Could not read '{}': {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    /// The recipes bundled with the crate.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(BUILTIN_RECIPES)
    }

    pub fn get(&self, id: &str) -> Option<&Recipe> {
        self.by_id.get(id).map(|&i| &self.recipes[i])
    }

    /// Recipes that accept the entity type, including `UNKNOWN` wildcards.
    pub fn for_entity_type(&self, entity_type: EntityType) -> Vec<&Recipe> {
        self.recipes
            .iter()
            .filter(|r| r.supports(entity_type))
            .collect()
    }

    pub fn for_domain(&self, domain: &str) -> Vec<&Recipe> {
        self.recipes
            .iter()
            .filter(|r| r.domain.eq_ignore_ascii_case(domain))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Recipe> {
        self.recipes.iter()
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }
}
