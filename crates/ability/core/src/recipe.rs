//! Recipes - ordered step timelines with an optional channel loop.
//!
//! A [`Recipe`] is authored offline and read-only at cast time; the same
//! recipe is typically shared (`Arc<Recipe>`) by every cast of an ability.
//! [`RecipeSpec`] is the serializable form, keyed by stable step ids, that
//! content loaders turn into a `Recipe` through a [`StepRegistry`].

use crate::step::{ParamTable, StepEntry, StepIndex, StepRegistry};

/// Channel loop configuration.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChannelSettings {
    /// Steps excluded from the main pass and replayed every iteration.
    pub step_indices: Vec<StepIndex>,

    /// Seconds per channel iteration.
    pub tick_duration: f32,

    /// Hard limit on the channel loop, in seconds.
    pub max_duration: f32,
}

/// Declarative description of one ability.
#[derive(Clone, Debug, PartialEq)]
pub struct Recipe {
    pub name: String,
    pub steps: Vec<StepEntry>,
    pub is_channeling: bool,
    pub channel: ChannelSettings,
}

impl Recipe {
    pub fn new(name: impl Into<String>, steps: Vec<StepEntry>) -> Self {
        Self {
            name: name.into(),
            steps,
            is_channeling: false,
            channel: ChannelSettings::default(),
        }
    }

    /// Builder: enable the channel loop.
    pub fn with_channel(
        mut self,
        step_indices: impl IntoIterator<Item = usize>,
        tick_duration: f32,
        max_duration: f32,
    ) -> Self {
        self.is_channeling = true;
        self.channel = ChannelSettings {
            step_indices: step_indices.into_iter().map(StepIndex).collect(),
            tick_duration,
            max_duration,
        };
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Whether `index` is replayed by the channel loop instead of the main pass.
    pub fn is_channel_step(&self, index: StepIndex) -> bool {
        self.is_channeling && self.channel.step_indices.contains(&index)
    }
}

// ============================================================================
// Serializable Form
// ============================================================================

/// Serializable recipe keyed by stable step ids.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RecipeSpec {
    pub name: String,
    pub steps: Vec<StepSpec>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub channel: Option<ChannelSpec>,
}

/// Serializable step entry.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StepSpec {
    /// Stable step id (`"SpawnEffect"`, `"ParallelGroup"`, ...).
    pub id: String,
    pub start: f32,
    /// Defaults to `start` (instantaneous placement).
    #[cfg_attr(feature = "serde", serde(default))]
    pub end: Option<f32>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub params: ParamTable,
    /// Nested entries of a parallel group.
    #[cfg_attr(feature = "serde", serde(default))]
    pub steps: Vec<StepSpec>,
}

/// Serializable channel configuration.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelSpec {
    pub steps: Vec<usize>,
    pub tick_duration: f32,
    pub max_duration: f32,
}

impl RecipeSpec {
    /// Builds a recipe, sharing definitions from `registry`.
    ///
    /// Unknown step ids become placeholder entries so that every authored
    /// index keeps its position; they are skipped when the recipe runs.
    pub fn build(&self, registry: &StepRegistry) -> Recipe {
        let steps = self
            .steps
            .iter()
            .map(|spec| spec.build(registry, &self.name))
            .collect();
        let recipe = Recipe::new(self.name.clone(), steps);
        match &self.channel {
            Some(channel) => recipe.with_channel(
                channel.steps.iter().copied(),
                channel.tick_duration,
                channel.max_duration,
            ),
            None => recipe,
        }
    }
}

impl StepSpec {
    fn build(&self, registry: &StepRegistry, recipe: &str) -> StepEntry {
        let end = self.end.unwrap_or(self.start);
        let entry = match registry.lookup(&self.id) {
            Some(definition) => StepEntry::new(definition, self.start, end),
            None => {
                tracing::warn!(recipe, step = %self.id, "unknown step id in recipe data");
                StepEntry::unknown(self.id.clone(), self.start, end)
            }
        };
        let sub_entries: Vec<StepEntry> = self
            .steps
            .iter()
            .map(|spec| spec.build(registry, recipe))
            .collect();
        let entry = entry.with_overrides(self.params.clone());
        if sub_entries.is_empty() {
            entry
        } else {
            entry.with_sub_entries(sub_entries)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::{StepKind, keys};

    fn spec(id: &str, start: f32, end: Option<f32>) -> StepSpec {
        StepSpec {
            id: id.to_owned(),
            start,
            end,
            params: ParamTable::new(),
            steps: Vec::new(),
        }
    }

    #[test]
    fn build_keeps_unknown_ids_in_place() {
        let recipe = RecipeSpec {
            name: "test".into(),
            steps: vec![
                spec("LockMovement", 0.0, Some(1.0)),
                spec("Teleport", 0.2, None),
                spec("AnimateStrike", 0.4, None),
            ],
            channel: None,
        }
        .build(&StepRegistry::builtin());

        assert_eq!(recipe.len(), 3);
        assert_eq!(recipe.steps[1].kind(), None);
        assert_eq!(recipe.steps[1].id(), "Teleport");
        assert_eq!(recipe.steps[2].kind(), Some(StepKind::AnimateStrike));
        assert_eq!(recipe.steps[2].end_percent, 0.4);
        assert!(!recipe.is_channeling);
    }

    #[test]
    fn build_nests_groups_and_channel() {
        let mut group = spec("ParallelGroup", 0.5, None);
        let mut damage = spec("DamageCircle", 0.0, None);
        damage.params.insert(keys::RADIUS, 2.5);
        group.steps = vec![spec("AnimateStrike", 0.0, None), damage];

        let recipe = RecipeSpec {
            name: "burst".into(),
            steps: vec![group, spec("DamageCircle", 0.0, None)],
            channel: Some(ChannelSpec {
                steps: vec![1],
                tick_duration: 0.5,
                max_duration: 2.0,
            }),
        }
        .build(&StepRegistry::builtin());

        let subs = recipe.steps[0].sub_entries();
        assert_eq!(subs.len(), 2);
        assert_eq!(subs[1].get_float(keys::RADIUS, 0.0), 2.5);
        assert!(recipe.is_channel_step(StepIndex(1)));
        assert!(!recipe.is_channel_step(StepIndex(0)));
    }
}
