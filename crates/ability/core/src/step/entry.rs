//! Step entries - one placement of a definition on a recipe timeline.

use std::sync::Arc;

use super::definition::{StepDefinition, StepRegistry};
use super::kind::StepKind;
use super::param::{ObjectRef, ParamTable, ParamValue};

/// One placement of a step definition inside a recipe.
///
/// Percentages are stored as authored; clamping to `[0, 1]` and repairing
/// inverted windows happens when the entry is resolved for a cast.
#[derive(Clone, Debug, PartialEq)]
pub struct StepEntry {
    /// Authored step id, kept even when no definition matches it.
    id: String,

    /// Shared definition, `None` when the id is unknown.
    definition: Option<Arc<StepDefinition>>,

    /// Normalized start of the step in cast time.
    pub start_percent: f32,

    /// Normalized end of the step in cast time (duration kinds only).
    pub end_percent: f32,

    /// Sparse parameter overrides for this placement.
    overrides: ParamTable,

    /// Entries fired together by a parallel group.
    sub_entries: Vec<StepEntry>,
}

impl StepEntry {
    pub fn new(definition: Arc<StepDefinition>, start_percent: f32, end_percent: f32) -> Self {
        Self {
            id: definition.id().to_owned(),
            definition: Some(definition),
            start_percent,
            end_percent,
            overrides: ParamTable::new(),
            sub_entries: Vec::new(),
        }
    }

    /// Entry whose id has no registered definition.
    ///
    /// The entry keeps its slot (so later step indices stay valid) and is
    /// skipped when the recipe runs.
    pub fn unknown(id: impl Into<String>, start_percent: f32, end_percent: f32) -> Self {
        Self {
            id: id.into(),
            definition: None,
            start_percent,
            end_percent,
            overrides: ParamTable::new(),
            sub_entries: Vec::new(),
        }
    }

    /// Builder: override one parameter.
    pub fn with_param(mut self, key: &str, value: impl Into<ParamValue>) -> Self {
        self.overrides.insert(key, value);
        self
    }

    /// Builder: replace all overrides.
    pub fn with_overrides(mut self, overrides: ParamTable) -> Self {
        self.overrides = overrides;
        self
    }

    /// Builder: nested entries (only meaningful for parallel groups).
    pub fn with_sub_entries(mut self, sub_entries: Vec<StepEntry>) -> Self {
        if !self.is_parallel_group() && !sub_entries.is_empty() {
            tracing::warn!(
                step = %self.id,
                "sub-entries on a non-group step are ignored"
            );
        }
        self.sub_entries = sub_entries;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn definition(&self) -> Option<&Arc<StepDefinition>> {
        self.definition.as_ref()
    }

    pub fn kind(&self) -> Option<StepKind> {
        self.definition.as_ref().map(|def| def.kind)
    }

    pub fn overrides(&self) -> &ParamTable {
        &self.overrides
    }

    pub fn sub_entries(&self) -> &[StepEntry] {
        &self.sub_entries
    }

    pub fn is_duration_step(&self) -> bool {
        self.kind().is_some_and(StepKind::is_duration_step)
    }

    pub fn is_parallel_group(&self) -> bool {
        self.kind().is_some_and(StepKind::is_parallel_group)
    }

    // ========================================================================
    // Parameter resolution: override -> definition default -> fallback
    // ========================================================================

    fn resolve<'a, T>(&'a self, key: &str, read: impl Fn(&'a ParamValue) -> Option<T>) -> Option<T> {
        let layers = [
            self.overrides.get(key),
            self.definition.as_ref().and_then(|def| def.defaults.get(key)),
        ];
        for value in layers.into_iter().flatten() {
            match read(value) {
                Some(resolved) => return Some(resolved),
                None => tracing::debug!(
                    step = %self.id,
                    key,
                    found = value.type_name(),
                    "parameter has unexpected type, falling through"
                ),
            }
        }
        None
    }

    pub fn get_float(&self, key: &str, fallback: f32) -> f32 {
        self.resolve(key, ParamValue::as_float).unwrap_or(fallback)
    }

    pub fn get_int(&self, key: &str, fallback: i64) -> i64 {
        self.resolve(key, ParamValue::as_int).unwrap_or(fallback)
    }

    pub fn get_bool(&self, key: &str, fallback: bool) -> bool {
        self.resolve(key, ParamValue::as_bool).unwrap_or(fallback)
    }

    pub fn get_string<'a>(&'a self, key: &str, fallback: &'a str) -> &'a str {
        self.resolve(key, ParamValue::as_str).unwrap_or(fallback)
    }

    pub fn get_object<'a>(
        &'a self,
        key: &str,
        fallback: Option<&'a ObjectRef>,
    ) -> Option<&'a ObjectRef> {
        self.resolve(key, ParamValue::as_object).or(fallback)
    }
}

impl StepRegistry {
    /// Creates an entry for `kind` spanning `[start, end]`.
    pub fn entry(&self, kind: StepKind, start_percent: f32, end_percent: f32) -> StepEntry {
        StepEntry::new(self.get(kind), start_percent, end_percent)
    }

    /// Creates an instantaneous entry for `kind` at `at`.
    pub fn instant(&self, kind: StepKind, at: f32) -> StepEntry {
        self.entry(kind, at, at)
    }

    /// Creates a parallel group firing `sub_entries` at `at`.
    pub fn group(&self, at: f32, sub_entries: Vec<StepEntry>) -> StepEntry {
        self.instant(StepKind::ParallelGroup, at)
            .with_sub_entries(sub_entries)
    }
}
