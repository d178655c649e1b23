//! Step definitions and the registry that shares them across recipes.

use std::collections::HashMap;
use std::sync::Arc;

use strum::IntoEnumIterator;

use super::kind::StepKind;
use super::param::{ParamTable, keys};

/// Immutable template for one step kind.
///
/// Definitions are shared (many entries point at one definition) and are never
/// mutated after registration; entries layer their overrides on top at lookup.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StepDefinition {
    /// The kind this definition describes. Its id is the stable key.
    pub kind: StepKind,

    /// Default parameters used when an entry does not override them.
    #[cfg_attr(feature = "serde", serde(default))]
    pub defaults: ParamTable,
}

impl StepDefinition {
    pub fn new(kind: StepKind, defaults: ParamTable) -> Self {
        Self { kind, defaults }
    }

    /// Definition with the engine's built-in defaults for `kind`.
    pub fn builtin(kind: StepKind) -> Self {
        let defaults = match kind {
            StepKind::SpawnEffect => ParamTable::new()
                .with(keys::OFFSET_FORWARD, 0.0)
                .with(keys::OFFSET_SIDE, 0.0)
                .with(keys::SCALE_MULTIPLIER, 1.0)
                .with(keys::BASE_DURATION, 1.0),
            StepKind::DamageCircle => ParamTable::new()
                .with(keys::OFFSET_FORWARD, 0.0)
                .with(keys::OFFSET_SIDE, 0.0)
                .with(keys::RADIUS, 1.0)
                .with(keys::DAMAGE_MULTIPLIER, 1.0),
            StepKind::DamageRectangle => ParamTable::new()
                .with(keys::OFFSET_FORWARD, 0.0)
                .with(keys::OFFSET_SIDE, 0.0)
                .with(keys::LENGTH, 2.0)
                .with(keys::WIDTH, 1.0)
                .with(keys::ANGLE_OFFSET, 0.0)
                .with(keys::DAMAGE_MULTIPLIER, 1.0),
            _ => ParamTable::new(),
        };
        Self::new(kind, defaults)
    }

    pub fn id(&self) -> &'static str {
        self.kind.id()
    }

    pub fn is_duration_step(&self) -> bool {
        self.kind.is_duration_step()
    }
}

/// Registry of shared step definitions, one per kind.
#[derive(Clone, Debug)]
pub struct StepRegistry {
    definitions: HashMap<StepKind, Arc<StepDefinition>>,
}

impl StepRegistry {
    /// Registry holding the built-in definition of every kind.
    pub fn builtin() -> Self {
        let definitions = StepKind::iter()
            .map(|kind| (kind, Arc::new(StepDefinition::builtin(kind))))
            .collect();
        Self { definitions }
    }

    /// Replaces the definition for its kind.
    ///
    /// Entries created before the call keep pointing at the old definition.
    pub fn register(&mut self, definition: StepDefinition) {
        self.definitions
            .insert(definition.kind, Arc::new(definition));
    }

    /// Returns the shared definition for a kind.
    pub fn get(&self, kind: StepKind) -> Arc<StepDefinition> {
        match self.definitions.get(&kind) {
            Some(definition) => Arc::clone(definition),
            None => Arc::new(StepDefinition::builtin(kind)),
        }
    }

    /// Looks a definition up by its stable id.
    pub fn lookup(&self, id: &str) -> Option<Arc<StepDefinition>> {
        StepKind::from_id(id).map(|kind| self.get(kind))
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

impl Default for StepRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::param::ParamValue;

    #[test]
    fn builtin_registry_covers_every_kind() {
        let registry = StepRegistry::builtin();
        assert_eq!(registry.len(), StepKind::iter().count());
        assert!(registry.lookup("Wait").is_some_and(|def| def.is_duration_step()));
        assert!(registry.lookup("Fireball").is_none());
    }

    #[test]
    fn register_does_not_touch_shared_handles() {
        let mut registry = StepRegistry::builtin();
        let before = registry.get(StepKind::DamageCircle);

        registry.register(StepDefinition::new(
            StepKind::DamageCircle,
            ParamTable::new().with(keys::RADIUS, 4.0),
        ));

        assert_eq!(before.defaults.get(keys::RADIUS), Some(&ParamValue::Float(1.0)));
        let after = registry.get(StepKind::DamageCircle);
        assert_eq!(after.defaults.get(keys::RADIUS), Some(&ParamValue::Float(4.0)));
    }
}
