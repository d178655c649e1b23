//! Step catalog loader.
//!
//! Loads default step parameters from RON and layers them over the built-in
//! definitions. Kinds the file does not mention keep their built-in defaults.

use std::path::Path;

use ability_core::{StepDefinition, StepRegistry};

use crate::loaders::{LoadResult, read_file};

/// Loader for the step definition catalog.
pub struct StepCatalog;

impl StepCatalog {
    /// Registry built from the catalog shipped with the crate.
    pub fn embedded() -> LoadResult<StepRegistry> {
        Self::parse(include_str!("../../data/steps.ron"))
    }

    pub fn load(path: &Path) -> LoadResult<StepRegistry> {
        let content = read_file(path)?;
        Self::parse(&content)
            .map_err(|e| anyhow::anyhow!("Failed to load {}: {}", path.display(), e))
    }

    pub fn parse(content: &str) -> LoadResult<StepRegistry> {
        let definitions: Vec<StepDefinition> = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse step catalog: {}", e))?;

        let mut registry = StepRegistry::builtin();
        for definition in definitions {
            let mut merged = StepDefinition::builtin(definition.kind);
            merged.defaults.merge(&definition.defaults);
            tracing::debug!(
                step = %definition.kind,
                overrides = definition.defaults.len(),
                "registered step definition"
            );
            registry.register(merged);
        }
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ability_core::{ParamValue, StepKind, step::keys};

    #[test]
    fn embedded_catalog_loads() {
        let registry = StepCatalog::embedded().unwrap();
        let spawn = registry.get(StepKind::SpawnEffect);
        assert_eq!(
            spawn.defaults.get(keys::BASE_DURATION),
            Some(&ParamValue::Float(1.0))
        );
        let rectangle = registry.get(StepKind::DamageRectangle);
        assert_eq!(rectangle.defaults.get(keys::LENGTH), Some(&ParamValue::Float(3.0)));
    }

    #[test]
    fn file_defaults_overlay_builtins() {
        let registry = StepCatalog::parse(
            r#"[
                (kind: DamageCircle, defaults: {"radius": Float(4.0)}),
            ]"#,
        )
        .unwrap();
        let circle = registry.get(StepKind::DamageCircle);
        assert_eq!(circle.defaults.get(keys::RADIUS), Some(&ParamValue::Float(4.0)));
        assert_eq!(
            circle.defaults.get(keys::DAMAGE_MULTIPLIER),
            Some(&ParamValue::Float(1.0))
        );
        assert!(registry.lookup("Wait").is_some());
    }

    #[test]
    fn unknown_kind_is_a_parse_error() {
        assert!(StepCatalog::parse("[(kind: Teleport)]").is_err());
    }
}
