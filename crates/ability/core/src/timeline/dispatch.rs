//! Per-kind side effects.
//!
//! The [`Dispatcher`] borrows everything one tick needs and turns signals on
//! resolved steps into collaborator calls. Failures are contained to the step
//! that raised them: they are logged and the tick carries on.

use glam::Vec2;

use crate::config::EngineConfig;
use crate::context::{ExecutionContext, StepResult};
use crate::env::{CastHost, EffectRequest, EnvError};
use crate::error::AbilityError;
use crate::step::{
    DamageCircleParams, DamageRectangleParams, ResolvedStep, SpawnEffectParams, StepError,
    StepIndex, StepOp,
};

use super::deferred::{DeferredQueue, PendingTrigger};
use super::report::{Signal, TickReport};

/// How produced results enter the cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ResultWrite {
    /// Main pass: the first result for an index wins.
    Record,
    /// Channel iterations: each firing replaces the previous result.
    Refresh,
}

pub(crate) struct Dispatcher<'a, H: CastHost + ?Sized> {
    pub context: &'a mut ExecutionContext,
    pub config: &'a EngineConfig,
    pub deferred: &'a mut DeferredQueue,
    pub host: &'a mut H,
    pub report: &'a mut TickReport,
    /// Cast time in seconds.
    pub now: f32,
    pub write: ResultWrite,
    /// Source result of the deferred trigger being fired.
    pub pinned: Option<StepResult>,
}

impl<H: CastHost + ?Sized> Dispatcher<'_, H> {
    pub fn begin(&mut self, step: &ResolvedStep) {
        self.report.push(step.index, step.kind, Signal::Begin);
        let outcome = match step.op {
            StepOp::LockMovement => self.with_movement(|movement| movement.set_locked(true)),
            StepOp::AnimateWindup => self.with_animation(|animation| animation.begin_windup()),
            StepOp::AnimateRecovery => {
                self.with_animation(|animation| animation.set_recovery_phase(0.0))
            }
            _ => Ok(()),
        };
        self.settle(step, outcome);
    }

    pub fn progress(&mut self, step: &ResolvedStep, phase: f32) {
        self.report.push(step.index, step.kind, Signal::Progress(phase));
        let outcome = match step.op {
            StepOp::AnimateWindup => {
                self.with_animation(|animation| animation.set_windup_phase(phase))
            }
            StepOp::AnimateRecovery => {
                self.with_animation(|animation| animation.set_recovery_phase(phase))
            }
            _ => Ok(()),
        };
        self.settle(step, outcome);
    }

    pub fn end(&mut self, step: &ResolvedStep) {
        self.report.push(step.index, step.kind, Signal::End);
        let outcome = match step.op {
            StepOp::LockMovement => self.with_movement(|movement| movement.set_locked(false)),
            StepOp::AnimateWindup => self.with_animation(|animation| animation.set_windup_phase(1.0)),
            StepOp::AnimateRecovery => {
                self.with_animation(|animation| animation.set_recovery_phase(1.0))
            }
            _ => Ok(()),
        };
        self.settle(step, outcome);
    }

    /// Fires an instantaneous step now, or queues it when it waits on a source.
    pub fn trigger(&mut self, step: &ResolvedStep) {
        let Some(dependency) = step.dependency() else {
            self.fire(step);
            return;
        };

        if dependency.source.0 >= self.context.results().capacity() {
            tracing::debug!(
                step = %step.index,
                source = %dependency.source,
                "deferred trigger can never resolve, abandoning"
            );
            self.report.push(step.index, step.kind, Signal::Abandoned);
            return;
        }

        self.report.push(step.index, step.kind, Signal::Deferred);
        let source_result = self.context.results().get(dependency.source).copied();
        self.deferred.push(PendingTrigger {
            step: step.clone(),
            dependency,
            from_channel: self.write == ResultWrite::Refresh,
            source_result,
        });
    }

    /// Fires an instantaneous step (or a group) immediately.
    pub fn fire(&mut self, step: &ResolvedStep) {
        self.report.push(step.index, step.kind, Signal::Fire);
        let outcome = match &step.op {
            StepOp::UnlockMovement => self.with_movement(|movement| movement.set_locked(false)),
            StepOp::AnimateStrike => self.with_animation(|animation| animation.snap_to_strike()),
            StepOp::SpawnEffect(params) => self.spawn_effect(step.index, params),
            StepOp::DamageCircle(params) => self.damage_circle(step, params),
            StepOp::DamageRectangle(params) => self.damage_rectangle(step, params),
            StepOp::ParallelGroup(sub_steps) => {
                for sub in sub_steps {
                    if sub.is_duration_step() {
                        self.progress(sub, 1.0);
                    } else {
                        self.trigger(sub);
                    }
                }
                Ok(())
            }
            StepOp::LockMovement | StepOp::AnimateWindup | StepOp::AnimateRecovery | StepOp::Wait => {
                Ok(())
            }
        };
        self.settle(step, outcome);
    }

    /// Fires a deferred trigger whose threshold was reached.
    pub fn fire_deferred(&mut self, trigger: &PendingTrigger) {
        let write = self.write;
        if trigger.from_channel {
            self.write = ResultWrite::Refresh;
        }
        self.pinned = trigger.source(self.context.results()).copied();
        self.fire(&trigger.step);
        self.pinned = None;
        self.write = write;
    }

    pub fn abandon(&mut self, trigger: &PendingTrigger, reason: &'static str) {
        tracing::debug!(
            step = %trigger.step.index,
            source = %trigger.dependency.source,
            reason,
            "abandoning deferred trigger"
        );
        self.report
            .push(trigger.step.index, trigger.step.kind, Signal::Abandoned);
    }

    // ========================================================================
    // Effects and damage
    // ========================================================================

    fn spawn_effect(&mut self, index: StepIndex, params: &SpawnEffectParams) -> Result<(), StepError> {
        let owner = self.host.owner()?.position();
        let position = owner + self.context.oriented_offset(params.offset);
        let scale = self.context.area_scale * params.scale_multiplier;
        let lifetime = self
            .config
            .effect_lifetime(params.base_duration, self.context.stats.cast_speed());

        self.store(
            index,
            StepResult {
                position,
                scale,
                lifetime,
                start_time: self.now,
            },
        );

        let request = EffectRequest {
            asset: params.asset.clone(),
            position,
            scale,
            facing: self.context.facing,
            lifetime,
        };
        match self.host.effects() {
            Ok(spawner) => {
                let handle = spawner.spawn(&request);
                tracing::trace!(step = %index, ?handle, "spawned effect");
            }
            Err(EnvError::EffectsNotAvailable) => {
                tracing::trace!(step = %index, "no effect spawner configured");
            }
            Err(error) => return Err(error.into()),
        }
        Ok(())
    }

    /// Center and scale of a damage shape: the source result when the step
    /// names one, otherwise the owner position plus the step's own offset.
    fn damage_origin(&self, step: &ResolvedStep, offset: Vec2) -> Result<(Vec2, f32), StepError> {
        match step.source {
            Some(source) => self
                .pinned
                .as_ref()
                .or_else(|| self.context.results().get(source))
                .map(|result| (result.position, result.scale))
                .ok_or(StepError::MissingDependency { dependency: source }),
            None => {
                let owner = self.host.owner()?.position();
                Ok((
                    owner + self.context.oriented_offset(offset),
                    self.context.area_scale,
                ))
            }
        }
    }

    fn damage_circle(
        &mut self,
        step: &ResolvedStep,
        params: &DamageCircleParams,
    ) -> Result<(), StepError> {
        let (center, scale) = self.damage_origin(step, params.offset)?;
        let radius = params.radius * scale;

        let snapshot = self
            .host
            .damage_factory()?
            .create(&self.context.stats, params.damage_multiplier);
        let targets = self.host.damageables()?.query_circle(center, radius);
        let hits = targets.len();
        for target in targets {
            target.take_damage(&snapshot);
        }
        tracing::trace!(step = %step.index, hits, radius, "circle damage applied");

        self.store_damage(step.index, center, scale);
        Ok(())
    }

    fn damage_rectangle(
        &mut self,
        step: &ResolvedStep,
        params: &DamageRectangleParams,
    ) -> Result<(), StepError> {
        let (center, scale) = self.damage_origin(step, params.offset)?;
        let size = Vec2::new(params.length, params.width) * scale;
        let angle = self.context.facing_angle() + params.angle_offset;

        let snapshot = self
            .host
            .damage_factory()?
            .create(&self.context.stats, params.damage_multiplier);
        let targets = self.host.damageables()?.query_rectangle(center, size, angle);
        let hits = targets.len();
        for target in targets {
            target.take_damage(&snapshot);
        }
        tracing::trace!(step = %step.index, hits, ?size, angle, "rectangle damage applied");

        self.store_damage(step.index, center, scale);
        Ok(())
    }

    fn store_damage(&mut self, index: StepIndex, center: Vec2, scale: f32) {
        self.store(
            index,
            StepResult {
                position: center,
                scale,
                lifetime: 0.0,
                start_time: self.now,
            },
        );
    }

    fn store(&mut self, index: StepIndex, result: StepResult) {
        let results = self.context.results_mut();
        match self.write {
            ResultWrite::Record => results.record(index, result),
            ResultWrite::Refresh => results.refresh(index, result),
        };
    }

    // ========================================================================
    // Collaborator access
    // ========================================================================

    fn with_movement(
        &mut self,
        call: impl FnOnce(&mut dyn crate::env::MovementLock),
    ) -> Result<(), StepError> {
        call(self.host.movement()?);
        Ok(())
    }

    fn with_animation(
        &mut self,
        call: impl FnOnce(&mut dyn crate::env::AnimationFeedback),
    ) -> Result<(), StepError> {
        call(self.host.animation()?);
        Ok(())
    }

    fn settle(&self, step: &ResolvedStep, outcome: Result<(), StepError>) {
        let Err(error) = outcome else {
            return;
        };
        if error.severity().is_recoverable() {
            tracing::debug!(
                step = %step.index,
                kind = %step.kind,
                code = error.error_code(),
                %error,
                "step skipped"
            );
        } else {
            tracing::warn!(
                step = %step.index,
                kind = %step.kind,
                code = error.error_code(),
                %error,
                "step failed"
            );
        }
    }
}
