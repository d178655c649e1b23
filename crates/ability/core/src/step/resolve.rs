//! Per-cast resolution of step entries into typed payloads.
//!
//! Resolution runs once per activation. It reads every parameter through the
//! override -> default -> fallback chain, repairs malformed windows, and
//! produces a [`ResolvedStep`] whose [`StepOp`] carries exactly the typed
//! parameters its kind needs. The interpreter dispatches on `StepOp` by
//! pattern matching and never touches string keys again.

use glam::Vec2;

use crate::config::EngineConfig;

use super::StepIndex;
use super::entry::StepEntry;
use super::error::StepError;
use super::kind::StepKind;
use super::param::{ObjectRef, keys};

// ============================================================================
// Typed Payloads
// ============================================================================

/// Parameters of a spawn-effect step.
#[derive(Clone, Debug, PartialEq)]
pub struct SpawnEffectParams {
    /// Offset in owner-local space (`x` forward, `y` left).
    pub offset: Vec2,
    pub scale_multiplier: f32,
    /// Lifetime before cast speed scaling, in seconds.
    pub base_duration: f32,
    pub asset: Option<ObjectRef>,
}

/// Parameters of a circular damage step.
#[derive(Clone, Debug, PartialEq)]
pub struct DamageCircleParams {
    pub offset: Vec2,
    pub radius: f32,
    pub damage_multiplier: f32,
}

/// Parameters of a rectangular damage step.
#[derive(Clone, Debug, PartialEq)]
pub struct DamageRectangleParams {
    pub offset: Vec2,
    /// Extent along the facing direction.
    pub length: f32,
    /// Extent across the facing direction.
    pub width: f32,
    /// Extra rotation relative to facing, in radians.
    pub angle_offset: f32,
    pub damage_multiplier: f32,
}

/// Typed operation of a resolved step.
#[derive(Clone, Debug, PartialEq)]
pub enum StepOp {
    LockMovement,
    UnlockMovement,
    AnimateWindup,
    AnimateStrike,
    AnimateRecovery,
    Wait,
    SpawnEffect(SpawnEffectParams),
    DamageCircle(DamageCircleParams),
    DamageRectangle(DamageRectangleParams),
    ParallelGroup(Vec<ResolvedStep>),
}

/// Deferred-trigger gate: fire once `fraction` of the source's lifetime passed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Dependency {
    pub source: StepIndex,
    pub fraction: f32,
}

// ============================================================================
// Resolved Step
// ============================================================================

/// A step entry resolved for one cast.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedStep {
    /// Top-level index owning this step. Sub-entries share their group's index.
    pub index: StepIndex,

    pub kind: StepKind,

    /// Trigger instant (instantaneous kinds) or window start, in `[0, 1]`.
    pub start: f32,

    /// Window end. Equal to `start` for instantaneous kinds and strictly
    /// greater than `start` for duration kinds.
    pub end: f32,

    /// Step whose cached result shapes this one (damage kinds).
    pub source: Option<StepIndex>,

    /// Fraction of the source's lifetime to wait before firing.
    pub fire_at_fraction: f32,

    pub op: StepOp,
}

impl ResolvedStep {
    /// Resolves a top-level entry.
    ///
    /// `recipe_len` is used to diagnose source indices outside the recipe;
    /// such steps are kept and simply never find their dependency.
    pub fn resolve(
        entry: &StepEntry,
        index: StepIndex,
        recipe_len: usize,
        config: &EngineConfig,
    ) -> Result<Self, StepError> {
        let kind = entry
            .kind()
            .ok_or_else(|| StepError::UnknownStepKind(entry.id().to_owned()))?;

        let start = clamp_percent(entry.start_percent, index, "start");
        let end = if kind.is_duration_step() {
            let end = clamp_percent(entry.end_percent, index, "end");
            if end <= start {
                tracing::warn!(
                    step = %index,
                    kind = %kind,
                    start,
                    end,
                    "duration window is empty or inverted, clamping end to start + epsilon"
                );
                start + config.percent_epsilon
            } else {
                end
            }
        } else {
            if (entry.end_percent - entry.start_percent).abs() > config.percent_epsilon {
                tracing::debug!(
                    step = %index,
                    kind = %kind,
                    "instantaneous step ignores its end percent"
                );
            }
            start
        };

        let source = StepIndex::from_authored(entry.get_int(keys::SOURCE_STEP_INDEX, -1));
        if let Some(source) = source
            && source.0 >= recipe_len
        {
            let error = StepError::ResultIndexOutOfRange {
                index: source,
                len: recipe_len,
            };
            tracing::warn!(step = %index, %error, "source step index can never be produced");
        }

        let fraction = entry.get_float(keys::FIRE_AT_SOURCE_FRACTION, 0.0);
        let fire_at_fraction = if fraction.is_finite() { fraction.max(0.0) } else { 0.0 };

        let op = resolve_op(entry, kind, index, recipe_len, config);

        Ok(Self {
            index,
            kind,
            start,
            end,
            source,
            fire_at_fraction,
            op,
        })
    }

    pub fn is_duration_step(&self) -> bool {
        self.kind.is_duration_step()
    }

    pub fn is_parallel_group(&self) -> bool {
        self.kind.is_parallel_group()
    }

    /// Deferred-trigger gate, present only for instantaneous steps that name
    /// a source and a positive lifetime fraction.
    pub fn dependency(&self) -> Option<Dependency> {
        if self.is_duration_step() || self.fire_at_fraction <= 0.0 {
            return None;
        }
        self.source.map(|source| Dependency {
            source,
            fraction: self.fire_at_fraction,
        })
    }

    /// Nested steps of a parallel group (empty for every other kind).
    pub fn sub_steps(&self) -> &[ResolvedStep] {
        match &self.op {
            StepOp::ParallelGroup(steps) => steps,
            _ => &[],
        }
    }

    /// Normalized progress of a duration window at clock `t`.
    pub fn phase_at(&self, t: f32) -> f32 {
        let span = self.end - self.start;
        if span <= 0.0 {
            return 1.0;
        }
        ((t - self.start) / span).clamp(0.0, 1.0)
    }
}

fn resolve_op(
    entry: &StepEntry,
    kind: StepKind,
    index: StepIndex,
    recipe_len: usize,
    config: &EngineConfig,
) -> StepOp {
    match kind {
        StepKind::LockMovement => StepOp::LockMovement,
        StepKind::UnlockMovement => StepOp::UnlockMovement,
        StepKind::AnimateWindup => StepOp::AnimateWindup,
        StepKind::AnimateStrike => StepOp::AnimateStrike,
        StepKind::AnimateRecovery => StepOp::AnimateRecovery,
        StepKind::Wait => StepOp::Wait,
        StepKind::SpawnEffect => StepOp::SpawnEffect(SpawnEffectParams {
            offset: read_offset(entry),
            scale_multiplier: entry.get_float(keys::SCALE_MULTIPLIER, 1.0),
            base_duration: entry.get_float(keys::BASE_DURATION, 1.0).max(0.0),
            asset: entry.get_object(keys::EFFECT_ASSET, None).cloned(),
        }),
        StepKind::DamageCircle => StepOp::DamageCircle(DamageCircleParams {
            offset: read_offset(entry),
            radius: entry.get_float(keys::RADIUS, 1.0).max(0.0),
            damage_multiplier: entry.get_float(keys::DAMAGE_MULTIPLIER, 1.0),
        }),
        StepKind::DamageRectangle => StepOp::DamageRectangle(DamageRectangleParams {
            offset: read_offset(entry),
            length: entry.get_float(keys::LENGTH, 2.0).max(0.0),
            width: entry.get_float(keys::WIDTH, 1.0).max(0.0),
            angle_offset: entry.get_float(keys::ANGLE_OFFSET, 0.0).to_radians(),
            damage_multiplier: entry.get_float(keys::DAMAGE_MULTIPLIER, 1.0),
        }),
        StepKind::ParallelGroup => {
            let steps = entry
                .sub_entries()
                .iter()
                .filter_map(|sub| match ResolvedStep::resolve(sub, index, recipe_len, config) {
                    Ok(step) => Some(step),
                    Err(error) => {
                        tracing::warn!(step = %index, %error, "skipping group sub-entry");
                        None
                    }
                })
                .collect();
            StepOp::ParallelGroup(steps)
        }
    }
}

fn read_offset(entry: &StepEntry) -> Vec2 {
    Vec2::new(
        entry.get_float(keys::OFFSET_FORWARD, 0.0),
        entry.get_float(keys::OFFSET_SIDE, 0.0),
    )
}

fn clamp_percent(value: f32, index: StepIndex, which: &'static str) -> f32 {
    if value.is_nan() {
        tracing::warn!(step = %index, which, "percent is NaN, using 0");
        return 0.0;
    }
    let clamped = value.clamp(0.0, 1.0);
    if clamped != value {
        tracing::warn!(step = %index, which, value, "percent outside [0, 1] clamped");
    }
    clamped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::StepRegistry;

    fn resolve(entry: &StepEntry) -> ResolvedStep {
        ResolvedStep::resolve(entry, StepIndex(0), 8, &EngineConfig::new()).unwrap()
    }

    #[test]
    fn inverted_duration_window_is_clamped_to_epsilon() {
        let registry = StepRegistry::builtin();
        let step = resolve(&registry.entry(StepKind::AnimateWindup, 0.6, 0.2));
        assert_eq!(step.start, 0.6);
        assert!((step.end - (0.6 + EngineConfig::DEFAULT_PERCENT_EPSILON)).abs() < 1e-7);
    }

    #[test]
    fn instantaneous_end_follows_start() {
        let registry = StepRegistry::builtin();
        let step = resolve(&registry.entry(StepKind::AnimateStrike, 0.35, 0.9));
        assert_eq!(step.end, 0.35);
    }

    #[test]
    fn out_of_range_percents_are_clamped() {
        let registry = StepRegistry::builtin();
        let step = resolve(&registry.entry(StepKind::Wait, -0.5, 1.7));
        assert_eq!((step.start, step.end), (0.0, 1.0));

        let step = resolve(&registry.instant(StepKind::AnimateStrike, f32::NAN));
        assert_eq!(step.start, 0.0);
    }

    #[test]
    fn dependency_requires_source_and_positive_fraction() {
        let registry = StepRegistry::builtin();
        let immediate = resolve(
            &registry
                .instant(StepKind::DamageCircle, 0.3)
                .with_param(keys::SOURCE_STEP_INDEX, 2),
        );
        assert_eq!(immediate.source, Some(StepIndex(2)));
        assert_eq!(immediate.dependency(), None);

        let deferred = resolve(
            &registry
                .instant(StepKind::DamageCircle, 0.3)
                .with_param(keys::SOURCE_STEP_INDEX, 2)
                .with_param(keys::FIRE_AT_SOURCE_FRACTION, 0.5),
        );
        assert_eq!(
            deferred.dependency(),
            Some(Dependency {
                source: StepIndex(2),
                fraction: 0.5
            })
        );

        let no_source = resolve(
            &registry
                .instant(StepKind::DamageCircle, 0.3)
                .with_param(keys::FIRE_AT_SOURCE_FRACTION, 0.5),
        );
        assert_eq!(no_source.dependency(), None);
    }

    #[test]
    fn unknown_kind_is_an_error() {
        let entry = StepEntry::unknown("Teleport", 0.1, 0.1);
        let err = ResolvedStep::resolve(&entry, StepIndex(3), 8, &EngineConfig::new());
        assert_eq!(err, Err(StepError::UnknownStepKind("Teleport".into())));
    }

    #[test]
    fn group_drops_unknown_sub_entries_and_shares_index() {
        let registry = StepRegistry::builtin();
        let group = registry.group(
            0.5,
            vec![
                registry.instant(StepKind::AnimateStrike, 0.0),
                StepEntry::unknown("Teleport", 0.0, 0.0),
                registry.entry(StepKind::AnimateRecovery, 0.0, 1.0),
            ],
        );
        let step = ResolvedStep::resolve(&group, StepIndex(4), 8, &EngineConfig::new()).unwrap();
        let kinds: Vec<_> = step.sub_steps().iter().map(|s| s.kind).collect();
        assert_eq!(kinds, vec![StepKind::AnimateStrike, StepKind::AnimateRecovery]);
        assert!(step.sub_steps().iter().all(|s| s.index == StepIndex(4)));
    }

    #[test]
    fn rectangle_angle_is_read_in_degrees() {
        let registry = StepRegistry::builtin();
        let step = resolve(
            &registry
                .instant(StepKind::DamageRectangle, 0.5)
                .with_param(keys::ANGLE_OFFSET, 90.0),
        );
        match step.op {
            StepOp::DamageRectangle(params) => {
                assert!((params.angle_offset - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
                assert_eq!((params.length, params.width), (2.0, 1.0));
            }
            other => panic!("unexpected op {other:?}"),
        }
    }
}
