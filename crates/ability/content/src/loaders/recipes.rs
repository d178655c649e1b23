//! Recipe library loader.
//!
//! Recipes are stored as [`RecipeSpec`] RON files keyed by stable step ids
//! and converted into shared [`Recipe`]s through a [`StepRegistry`].

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use ability_core::{Recipe, RecipeSpec, StepRegistry};

use crate::loaders::{LoadResult, read_file};

/// Recipes shipped with the crate, as `(file name, contents)`.
const EMBEDDED: &[(&str, &str)] = &[
    ("cleave.ron", include_str!("../../data/recipes/cleave.ron")),
    ("ember_burst.ron", include_str!("../../data/recipes/ember_burst.ron")),
    ("lance.ron", include_str!("../../data/recipes/lance.ron")),
    ("whirlwind.ron", include_str!("../../data/recipes/whirlwind.ron")),
];

/// Named recipes ready to be cast.
#[derive(Clone, Debug)]
pub struct RecipeLibrary {
    registry: StepRegistry,
    recipes: BTreeMap<String, Arc<Recipe>>,
}

impl RecipeLibrary {
    /// Empty library resolving step ids through `registry`.
    pub fn new(registry: StepRegistry) -> Self {
        Self {
            registry,
            recipes: BTreeMap::new(),
        }
    }

    /// Library holding every embedded recipe.
    pub fn embedded(registry: StepRegistry) -> LoadResult<Self> {
        let mut library = Self::new(registry);
        for (file, content) in EMBEDDED {
            library
                .insert_ron(content)
                .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", file, e))?;
        }
        Ok(library)
    }

    /// Loads every `.ron` file in `dir`. Later files replace recipes with the
    /// same name. Returns the number of recipes loaded.
    pub fn load_dir(&mut self, dir: &Path) -> LoadResult<usize> {
        let entries = std::fs::read_dir(dir)
            .map_err(|e| anyhow::anyhow!("Failed to read directory {}: {}", dir.display(), e))?;

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "ron") {
                paths.push(path);
            }
        }
        paths.sort();

        for path in &paths {
            self.load_file(path)?;
        }
        Ok(paths.len())
    }

    pub fn load_file(&mut self, path: &Path) -> LoadResult<Arc<Recipe>> {
        let content = read_file(path)?;
        self.insert_ron(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", path.display(), e))
    }

    /// Parses a recipe without adding it to the library.
    pub fn parse(&self, content: &str) -> LoadResult<Recipe> {
        let spec: RecipeSpec = ron::from_str(content)?;
        Ok(spec.build(&self.registry))
    }

    fn insert_ron(&mut self, content: &str) -> LoadResult<Arc<Recipe>> {
        let recipe = Arc::new(self.parse(content)?);
        if self
            .recipes
            .insert(recipe.name.clone(), Arc::clone(&recipe))
            .is_some()
        {
            tracing::debug!(recipe = %recipe.name, "recipe replaced");
        }
        Ok(recipe)
    }

    pub fn get(&self, name: &str) -> Option<Arc<Recipe>> {
        self.recipes.get(name).cloned()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.recipes.keys().map(String::as_str)
    }

    pub fn registry(&self) -> &StepRegistry {
        &self.registry
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }
}
