//! Per-cast execution state.
//!
//! An [`ExecutionContext`] is created fresh for every activation and dropped
//! when the cast finishes. Stats are captured once at creation; later stat
//! changes on the owner never alter a cast that is already running.

use std::collections::BTreeMap;

use glam::Vec2;

use crate::config::EngineConfig;
use crate::stats::{StatSnapshot, StatsProvider};
use crate::step::{StepError, StepIndex};

/// Runtime outcome of a step, consumed by later steps that name it as source.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StepResult {
    pub position: Vec2,
    pub scale: f32,
    /// Seconds; zero for damage steps.
    pub lifetime: f32,
    /// Cast time in seconds when the result was produced.
    pub start_time: f32,
}

impl StepResult {
    /// Cast time at which `fraction` of the lifetime has passed.
    pub fn due_at(&self, fraction: f32) -> f32 {
        self.start_time + fraction * self.lifetime
    }
}

/// Sparse result cache keyed by top-level step index.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StepResults {
    len: usize,
    entries: BTreeMap<StepIndex, StepResult>,
}

impl StepResults {
    pub fn new(len: usize) -> Self {
        Self {
            len,
            entries: BTreeMap::new(),
        }
    }

    /// Number of steps in the recipe this cache serves.
    pub fn capacity(&self) -> usize {
        self.len
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn check(&self, index: StepIndex) -> Result<(), StepError> {
        if index.0 < self.len {
            Ok(())
        } else {
            Err(StepError::ResultIndexOutOfRange {
                index,
                len: self.len,
            })
        }
    }

    /// Looks up a result. Indices outside the recipe are logged and miss.
    pub fn get(&self, index: StepIndex) -> Option<&StepResult> {
        if let Err(error) = self.check(index) {
            tracing::warn!(%error, "rejected step result lookup");
            return None;
        }
        self.entries.get(&index)
    }

    /// Stores the first result for `index`. Returns `false` when a result
    /// already exists or the index is outside the recipe.
    pub fn record(&mut self, index: StepIndex, result: StepResult) -> bool {
        if let Err(error) = self.check(index) {
            tracing::warn!(%error, "rejected step result write");
            return false;
        }
        match self.entries.entry(index) {
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(result);
                true
            }
            std::collections::btree_map::Entry::Occupied(_) => {
                tracing::debug!(step = %index, "step result already recorded, keeping first");
                false
            }
        }
    }

    /// Replaces the result for `index` (channel iterations).
    pub fn refresh(&mut self, index: StepIndex, result: StepResult) -> bool {
        if let Err(error) = self.check(index) {
            tracing::warn!(%error, "rejected step result write");
            return false;
        }
        self.entries.insert(index, result);
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = (StepIndex, &StepResult)> {
        self.entries.iter().map(|(index, result)| (*index, result))
    }
}

/// State owned by one cast.
///
/// The result cache is read-only outside the interpreter:
///
/// ```compile_fail
/// fn overwrite(context: &mut ability_core::ExecutionContext) {
///     context.results_mut();
/// }
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct ExecutionContext {
    pub stats: StatSnapshot,

    /// Seconds for the normalized clock to go from 0 to 1.
    pub total_duration: f32,

    pub area_scale: f32,

    /// Unit facing direction of the owner at cast start.
    pub facing: Vec2,

    cancelled: bool,
    results: StepResults,
}

impl ExecutionContext {
    /// Snapshots `stats` and derives the cast timing from them.
    pub fn new(
        stats: &(impl StatsProvider + ?Sized),
        facing: Vec2,
        config: &EngineConfig,
    ) -> Self {
        Self::from_snapshot(StatSnapshot::capture(stats), facing, config)
    }

    pub fn from_snapshot(stats: StatSnapshot, facing: Vec2, config: &EngineConfig) -> Self {
        let total_duration = config.total_duration(stats.attack_speed());
        let area_scale = stats.area_of_effect().max(0.0);
        let facing = facing.try_normalize().unwrap_or_else(|| {
            tracing::debug!(?facing, "degenerate facing, using +x");
            Vec2::X
        });
        Self {
            stats,
            total_duration,
            area_scale,
            facing,
            cancelled: false,
            results: StepResults::default(),
        }
    }

    /// Requests cancellation; honored on the next tick.
    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn results(&self) -> &StepResults {
        &self.results
    }

    pub(crate) fn results_mut(&mut self) -> &mut StepResults {
        &mut self.results
    }

    /// Sizes the result cache for a recipe of `len` steps, dropping any
    /// previous results.
    pub(crate) fn bind_results(&mut self, len: usize) {
        self.results = StepResults::new(len);
    }

    /// Converts an owner-local offset (`x` forward, `y` left) to world space.
    pub fn oriented_offset(&self, offset: Vec2) -> Vec2 {
        self.facing.rotate(offset)
    }

    /// Facing angle in radians from +x.
    pub fn facing_angle(&self) -> f32 {
        self.facing.y.atan2(self.facing.x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::StatKind;

    fn result(start_time: f32) -> StepResult {
        StepResult {
            position: Vec2::ZERO,
            scale: 1.0,
            lifetime: 2.0,
            start_time,
        }
    }

    #[test]
    fn duration_and_area_come_from_the_snapshot() {
        let stats = StatSnapshot::neutral()
            .with(StatKind::AttackSpeed, 2.0)
            .with(StatKind::AreaOfEffect, 1.5);
        let context = ExecutionContext::new(&stats, Vec2::new(0.0, 3.0), &EngineConfig::new());
        assert!((context.total_duration - 0.5).abs() < 1e-6);
        assert_eq!(context.area_scale, 1.5);
        assert_eq!(context.facing, Vec2::Y);
    }

    #[test]
    fn zero_attack_speed_uses_the_floor() {
        let stats = StatSnapshot::neutral().with(StatKind::AttackSpeed, 0.0);
        let context = ExecutionContext::from_snapshot(stats, Vec2::X, &EngineConfig::new());
        assert!(context.total_duration.is_finite());
        assert!(context.total_duration > 1000.0);
    }

    #[test]
    fn offsets_rotate_with_facing() {
        let context =
            ExecutionContext::from_snapshot(StatSnapshot::neutral(), Vec2::Y, &EngineConfig::new());
        let world = context.oriented_offset(Vec2::new(2.0, 1.0));
        assert!((world - Vec2::new(-1.0, 2.0)).length() < 1e-6);
        assert!((context.facing_angle() - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn results_are_write_once_and_range_checked() {
        let mut results = StepResults::new(3);
        assert!(results.record(StepIndex(1), result(0.5)));
        assert!(!results.record(StepIndex(1), result(0.9)));
        assert_eq!(results.get(StepIndex(1)).map(|r| r.start_time), Some(0.5));

        assert!(!results.record(StepIndex(3), result(0.1)));
        assert_eq!(results.get(StepIndex(3)), None);

        assert!(results.refresh(StepIndex(1), result(0.9)));
        assert_eq!(results.get(StepIndex(1)).map(|r| r.start_time), Some(0.9));
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn due_at_scales_lifetime() {
        assert_eq!(result(1.0).due_at(0.5), 2.0);
    }
}
