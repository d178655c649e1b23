//! Timeline interpreter - advances one cast through its recipe.
//!
//! The interpreter is an explicit state object. The caller's frame loop calls
//! [`TimelineInterpreter::tick`] with the frame delta and a [`CastHost`];
//! every tick returns a [`TickReport`] listing the signals dispatched, in the
//! order their side effects ran.
//!
//! # Tick order
//!
//! 1. Cancellation and owner-disable checks (cleanup, then stop)
//! 2. Main pass: every non-channel step in recipe order
//! 3. Channel loop, once the main pass is over
//! 4. Deferred triggers whose source result is old enough
//! 5. End-of-pass reconciliation on the tick the normalized clock reaches 1
//!
//! # Module Structure
//!
//! - `slot`: Per-step progress flags of the main pass
//! - `dispatch`: Per-kind collaborator calls and result caching
//! - `deferred`: Queue of triggers waiting on another step's result
//! - `channel`: Iteration bookkeeping of the channel loop
//! - `report`: Dispatch trace and cast lifecycle types
//! - `error`: Activation errors
mod channel;
mod deferred;
mod dispatch;
mod error;
mod report;
mod slot;

pub use error::ActivationError;
pub use report::{CastOutcome, CastPhase, Dispatch, Signal, TickReport};
pub use slot::SlotFlags;

use std::sync::Arc;

use crate::config::EngineConfig;
use crate::context::ExecutionContext;
use crate::env::CastHost;
use crate::error::AbilityError;
use crate::recipe::Recipe;
use crate::step::{ResolvedStep, StepIndex};

use channel::ChannelLoop;
use deferred::DeferredQueue;
use dispatch::{Dispatcher, ResultWrite};
use slot::Slot;

/// Scheduler for one in-flight cast.
#[derive(Clone, Debug)]
pub struct TimelineInterpreter {
    recipe: Arc<Recipe>,
    context: ExecutionContext,
    config: EngineConfig,
    slots: Vec<Slot>,
    channel: Option<ChannelLoop>,
    deferred: DeferredQueue,
    /// Cast time in seconds since activation.
    elapsed: f32,
    /// Normalized main-pass clock.
    clock: f32,
    phase: CastPhase,
    drain_started: f32,
}

impl TimelineInterpreter {
    /// Resolves the recipe for this cast and returns an interpreter ready for
    /// its first tick.
    ///
    /// # Errors
    ///
    /// Returns [`ActivationError`] when the recipe is empty or none of its
    /// steps can run. No collaborator is touched in that case.
    pub fn activate(
        recipe: Arc<Recipe>,
        mut context: ExecutionContext,
        config: EngineConfig,
    ) -> Result<Self, ActivationError> {
        if recipe.is_empty() {
            let error = ActivationError::EmptyRecipe {
                recipe: recipe.name.clone(),
            };
            tracing::warn!(code = error.error_code(), %error, "activation rejected");
            return Err(error);
        }

        let len = recipe.len();
        let mut slots = Vec::with_capacity(len);
        let mut channel_steps = Vec::new();
        for (position, entry) in recipe.steps.iter().enumerate() {
            let index = StepIndex(position);
            match ResolvedStep::resolve(entry, index, len, &config) {
                Ok(step) if recipe.is_channel_step(index) => channel_steps.push(step),
                Ok(step) => slots.push(Slot::new(step)),
                Err(error) => tracing::warn!(
                    recipe = %recipe.name,
                    step = %index,
                    code = error.error_code(),
                    %error,
                    "skipping step"
                ),
            }
        }

        let channel = if recipe.is_channeling {
            for index in &recipe.channel.step_indices {
                if index.0 >= len {
                    tracing::warn!(
                        recipe = %recipe.name,
                        step = %index,
                        len,
                        "channel step index outside the recipe"
                    );
                }
            }
            Some(ChannelLoop::new(channel_steps, &recipe.channel, &config))
        } else {
            None
        };

        if slots.is_empty() && channel.as_ref().is_none_or(ChannelLoop::is_empty) {
            let error = ActivationError::NoValidSteps {
                recipe: recipe.name.clone(),
            };
            tracing::warn!(code = error.error_code(), %error, "activation rejected");
            return Err(error);
        }

        context.bind_results(len);
        tracing::debug!(
            recipe = %recipe.name,
            steps = slots.len(),
            channel_iterations = channel.as_ref().map_or(0, ChannelLoop::iterations),
            total_duration = context.total_duration,
            "cast activated"
        );

        Ok(Self {
            recipe,
            context,
            config,
            slots,
            channel,
            deferred: DeferredQueue::default(),
            elapsed: 0.0,
            clock: 0.0,
            phase: CastPhase::MainPass,
            drain_started: 0.0,
        })
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn is_active(&self) -> bool {
        !self.phase.is_finished()
    }

    pub fn phase(&self) -> CastPhase {
        self.phase
    }

    /// Normalized main-pass clock in `[0, 1]`.
    pub fn clock(&self) -> f32 {
        self.clock
    }

    /// Seconds since activation.
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn recipe(&self) -> &Arc<Recipe> {
        &self.recipe
    }

    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    /// Deferred triggers still waiting on their source.
    pub fn pending_triggers(&self) -> usize {
        self.deferred.len()
    }

    /// Completed channel iterations.
    pub fn channel_iterations(&self) -> u32 {
        self.channel.as_ref().map_or(0, ChannelLoop::completed)
    }

    // ========================================================================
    // Control
    // ========================================================================

    /// Requests cancellation. Cleanup runs at the start of the next tick.
    pub fn cancel(&mut self) {
        if self.is_active() {
            tracing::debug!(recipe = %self.recipe.name, elapsed = self.elapsed, "cast cancel requested");
            self.context.cancel();
        }
    }

    /// The owning entity was disabled or destroyed: clean up immediately.
    pub fn disable<H: CastHost + ?Sized>(&mut self, host: &mut H) -> TickReport {
        let mut report = TickReport::new(self.clock, self.phase);
        self.finish(CastOutcome::OwnerDisabled, host, &mut report);
        report.phase = self.phase;
        report
    }

    /// Advances the cast by `delta` seconds.
    pub fn tick<H: CastHost + ?Sized>(&mut self, delta: f32, host: &mut H) -> TickReport {
        let mut report = TickReport::new(self.clock, self.phase);
        if self.phase.is_finished() {
            return report;
        }

        if self.context.is_cancelled() {
            self.finish(CastOutcome::Cancelled, host, &mut report);
            report.phase = self.phase;
            return report;
        }
        if host.owner().is_ok_and(|owner| !owner.is_active()) {
            self.finish(CastOutcome::OwnerDisabled, host, &mut report);
            report.phase = self.phase;
            return report;
        }

        let delta = if delta.is_finite() && delta >= 0.0 {
            delta
        } else {
            tracing::warn!(delta, "invalid tick delta, treating as zero");
            0.0
        };
        self.elapsed += delta;

        match self.phase {
            CastPhase::MainPass => {
                self.run_main_pass(host, &mut report);
                self.resolve_deferred(host, &mut report);
                if self.clock >= 1.0 {
                    self.reconcile(host, &mut report);
                    self.end_main_pass(host, &mut report);
                }
            }
            CastPhase::Channel => {
                let done = self.run_channel(host, &mut report);
                self.resolve_deferred(host, &mut report);
                if done {
                    self.end_passes(host, &mut report);
                }
            }
            CastPhase::Draining => {
                self.resolve_deferred(host, &mut report);
                self.drain(host, &mut report);
            }
            CastPhase::Finished(_) => {}
        }

        report.clock = self.clock;
        report.phase = self.phase;
        report
    }

    // ========================================================================
    // Passes
    // ========================================================================

    fn run_main_pass<H: CastHost + ?Sized>(&mut self, host: &mut H, report: &mut TickReport) {
        self.clock = (self.elapsed / self.context.total_duration).clamp(0.0, 1.0);
        let t = self.clock;
        let eps = self.config.percent_epsilon;

        let mut dispatcher = Dispatcher {
            context: &mut self.context,
            config: &self.config,
            deferred: &mut self.deferred,
            host,
            report,
            now: self.elapsed,
            write: ResultWrite::Record,
            pinned: None,
        };

        for slot in &mut self.slots {
            let step = &slot.step;
            if !step.is_duration_step() {
                if !slot.flags.contains(SlotFlags::EXECUTED) && t >= step.start - eps {
                    slot.flags.insert(SlotFlags::EXECUTED);
                    if step.is_parallel_group() {
                        dispatcher.fire(step);
                    } else {
                        dispatcher.trigger(step);
                    }
                }
                continue;
            }

            if !slot.flags.contains(SlotFlags::STARTED) && t >= step.start - eps {
                slot.flags.insert(SlotFlags::STARTED);
                dispatcher.begin(step);
            }
            if slot.flags.contains(SlotFlags::STARTED) && !slot.flags.contains(SlotFlags::ENDED) {
                if t >= step.end - eps {
                    slot.flags.insert(SlotFlags::ENDED);
                    dispatcher.end(step);
                } else {
                    dispatcher.progress(step, step.phase_at(t));
                }
            }
        }
    }

    /// Forces every step still owing a dispatch once the clock reaches 1.
    fn reconcile<H: CastHost + ?Sized>(&mut self, host: &mut H, report: &mut TickReport) {
        let mut dispatcher = Dispatcher {
            context: &mut self.context,
            config: &self.config,
            deferred: &mut self.deferred,
            host,
            report,
            now: self.elapsed,
            write: ResultWrite::Record,
            pinned: None,
        };

        for slot in self.slots.iter_mut().filter(|slot| slot.is_pending()) {
            let step = &slot.step;
            tracing::debug!(step = %step.index, kind = %step.kind, "reconciling at end of pass");
            if !step.is_duration_step() {
                slot.flags.insert(SlotFlags::EXECUTED);
                if step.is_parallel_group() {
                    dispatcher.fire(step);
                } else {
                    dispatcher.trigger(step);
                }
                continue;
            }
            if !slot.flags.contains(SlotFlags::STARTED) {
                slot.flags.insert(SlotFlags::STARTED);
                dispatcher.begin(step);
            }
            slot.flags.insert(SlotFlags::ENDED);
            dispatcher.end(step);
        }
    }

    fn end_main_pass<H: CastHost + ?Sized>(&mut self, host: &mut H, report: &mut TickReport) {
        let elapsed = self.elapsed;
        match self.channel.as_mut().filter(|channel| !channel.is_done()) {
            Some(channel) => {
                channel.start(elapsed);
                self.phase = CastPhase::Channel;
            }
            None => self.end_passes(host, report),
        }
    }

    fn run_channel<H: CastHost + ?Sized>(&mut self, host: &mut H, report: &mut TickReport) -> bool {
        let Some(channel) = self.channel.as_mut() else {
            return true;
        };
        let mut dispatcher = Dispatcher {
            context: &mut self.context,
            config: &self.config,
            deferred: &mut self.deferred,
            host,
            report,
            now: self.elapsed,
            write: ResultWrite::Refresh,
            pinned: None,
        };
        channel.advance(&mut dispatcher)
    }

    /// Main pass and channel are over.
    fn end_passes<H: CastHost + ?Sized>(&mut self, host: &mut H, report: &mut TickReport) {
        self.phase = CastPhase::Draining;
        self.drain_started = self.elapsed;
        if !self.deferred.is_empty() {
            tracing::debug!(pending = self.deferred.len(), "waiting on deferred triggers");
        }
        self.drain(host, report);
    }

    // ========================================================================
    // Deferred triggers
    // ========================================================================

    fn resolve_deferred<H: CastHost + ?Sized>(&mut self, host: &mut H, report: &mut TickReport) {
        let tolerance = self.config.percent_epsilon * self.context.total_duration;
        let due = self
            .deferred
            .take_due(self.context.results(), self.elapsed, tolerance);
        if due.is_empty() {
            return;
        }

        let mut dispatcher = Dispatcher {
            context: &mut self.context,
            config: &self.config,
            deferred: &mut self.deferred,
            host,
            report,
            now: self.elapsed,
            write: ResultWrite::Record,
            pinned: None,
        };
        for trigger in &due {
            dispatcher.fire_deferred(trigger);
        }
    }

    /// Drops triggers that can no longer fire and finishes once none remain.
    fn drain<H: CastHost + ?Sized>(&mut self, host: &mut H, report: &mut TickReport) {
        let mut abandoned = self.deferred.take_unreachable(self.context.results());
        let mut reason = "source produced no result";
        if self.elapsed - self.drain_started >= self.config.deferred_timeout {
            abandoned.extend(self.deferred.take_all());
            reason = "deferred timeout elapsed";
        }

        if !abandoned.is_empty() {
            let mut dispatcher = Dispatcher {
                context: &mut self.context,
                config: &self.config,
                deferred: &mut self.deferred,
                host: &mut *host,
                report: &mut *report,
                now: self.elapsed,
                write: ResultWrite::Record,
                pinned: None,
            };
            for trigger in &abandoned {
                dispatcher.abandon(trigger, reason);
            }
        }

        if self.deferred.is_empty() {
            self.finish(CastOutcome::Completed, host, report);
        }
    }

    // ========================================================================
    // Cleanup
    // ========================================================================

    /// Runs cleanup and ends the cast. Cleanup always unlocks movement,
    /// resets animation and clears the casting flag.
    fn finish<H: CastHost + ?Sized>(
        &mut self,
        outcome: CastOutcome,
        host: &mut H,
        report: &mut TickReport,
    ) {
        if self.phase.is_finished() {
            return;
        }

        for trigger in self.deferred.take_all() {
            tracing::debug!(step = %trigger.step.index, ?outcome, "dropping deferred trigger");
            report.push(trigger.step.index, trigger.step.kind, Signal::Abandoned);
        }

        match host.movement() {
            Ok(movement) => movement.set_locked(false),
            Err(error) => tracing::debug!(%error, "cleanup: movement unlock skipped"),
        }
        match host.animation() {
            Ok(animation) => animation.reset(),
            Err(error) => tracing::debug!(%error, "cleanup: animation reset skipped"),
        }
        host.clear_casting();

        report.cleanup = true;
        self.phase = CastPhase::Finished(outcome);
        tracing::debug!(
            recipe = %self.recipe.name,
            ?outcome,
            elapsed = self.elapsed,
            "cast finished"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{HostCall, RecordingHost, TrainingDummy};
    use crate::stats::{StatKind, StatSnapshot};
    use crate::step::{StepEntry, StepKind, StepRegistry, keys};
    use glam::Vec2;
    use proptest::prelude::*;

    const DT: f32 = 0.05;

    fn context(attack_speed: f32) -> ExecutionContext {
        let stats = StatSnapshot::neutral()
            .with(StatKind::AttackSpeed, attack_speed)
            .with(StatKind::BaseDamage, 10.0);
        ExecutionContext::from_snapshot(stats, Vec2::X, &EngineConfig::new())
    }

    fn activate(recipe: Recipe) -> TimelineInterpreter {
        TimelineInterpreter::activate(Arc::new(recipe), context(1.0), EngineConfig::new())
            .unwrap()
    }

    /// Ticks until the cast finishes, collecting every report.
    fn run(
        interpreter: &mut TimelineInterpreter,
        host: &mut RecordingHost,
        dt: f32,
    ) -> Vec<TickReport> {
        let mut reports = Vec::new();
        for _ in 0..10_000 {
            if !interpreter.is_active() {
                break;
            }
            reports.push(interpreter.tick(dt, host));
        }
        assert!(!interpreter.is_active(), "cast never finished");
        reports
    }

    fn signals(reports: &[TickReport], index: usize) -> Vec<Signal> {
        reports
            .iter()
            .flat_map(|report| report.for_step(StepIndex(index)))
            .map(|dispatch| dispatch.signal)
            .collect()
    }

    #[test]
    fn empty_recipe_is_rejected() {
        let err = TimelineInterpreter::activate(
            Arc::new(Recipe::new("nothing", Vec::new())),
            context(1.0),
            EngineConfig::new(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            ActivationError::EmptyRecipe {
                recipe: "nothing".into()
            }
        );
    }

    #[test]
    fn recipe_of_unknown_steps_is_rejected() {
        let recipe = Recipe::new("typos", vec![StepEntry::unknown("Teleport", 0.2, 0.2)]);
        let err =
            TimelineInterpreter::activate(Arc::new(recipe), context(1.0), EngineConfig::new())
                .unwrap_err();
        assert!(matches!(err, ActivationError::NoValidSteps { .. }));
    }

    #[test]
    fn unknown_step_is_skipped_and_the_rest_runs() {
        let registry = StepRegistry::builtin();
        let recipe = Recipe::new(
            "partial",
            vec![
                StepEntry::unknown("Teleport", 0.1, 0.1),
                registry.instant(StepKind::AnimateStrike, 0.5),
            ],
        );
        let mut interpreter = activate(recipe);
        let mut host = RecordingHost::default();
        let reports = run(&mut interpreter, &mut host, DT);

        assert!(signals(&reports, 0).is_empty());
        assert_eq!(signals(&reports, 1), vec![Signal::Fire]);
        assert_eq!(interpreter.phase(), CastPhase::Finished(CastOutcome::Completed));
    }

    #[test]
    fn duration_step_begins_progresses_and_ends() {
        let registry = StepRegistry::builtin();
        let recipe = Recipe::new(
            "windup",
            vec![registry.entry(StepKind::AnimateWindup, 0.2, 0.6)],
        );
        let mut interpreter = activate(recipe);
        let mut host = RecordingHost::default();
        let reports = run(&mut interpreter, &mut host, 0.1);

        let trace = signals(&reports, 0);
        assert_eq!(trace.first(), Some(&Signal::Begin));
        assert_eq!(trace.last(), Some(&Signal::End));
        assert_eq!(trace.iter().filter(|s| **s == Signal::End).count(), 1);
        assert_eq!(host.calls.first(), Some(&HostCall::BeginWindup));
        assert!(host.calls.contains(&HostCall::WindupPhase(1.0)));
    }

    #[test]
    fn inverted_window_still_begins_and_ends() {
        let registry = StepRegistry::builtin();
        let recipe = Recipe::new(
            "inverted",
            vec![registry.entry(StepKind::LockMovement, 0.5, 0.2)],
        );
        let mut interpreter = activate(recipe);
        let mut host = RecordingHost::default();
        run(&mut interpreter, &mut host, DT);

        let locks: Vec<_> = host
            .calls
            .iter()
            .filter_map(|call| match call {
                HostCall::SetLocked(locked) => Some(*locked),
                _ => None,
            })
            .collect();
        // begin, end, then the cleanup release.
        assert_eq!(locks, vec![true, false, false]);
        assert!(!host.locked);
    }

    #[test]
    fn group_fires_all_sub_entries_in_one_tick_once() {
        let registry = StepRegistry::builtin();
        let group = registry.group(
            0.4,
            vec![
                registry.instant(StepKind::AnimateStrike, 0.0),
                registry.entry(StepKind::AnimateRecovery, 0.0, 1.0),
                registry.instant(StepKind::SpawnEffect, 0.0),
            ],
        );
        let mut interpreter = activate(Recipe::new("group", vec![group]));
        let mut host = RecordingHost::default();
        let reports = run(&mut interpreter, &mut host, DT);

        let firing: Vec<_> = reports
            .iter()
            .filter(|report| !report.dispatches.is_empty())
            .collect();
        assert_eq!(firing.len(), 1);
        let kinds: Vec<_> = firing[0]
            .dispatches
            .iter()
            .map(|d| (d.kind, d.signal))
            .collect();
        assert_eq!(
            kinds,
            vec![
                (StepKind::ParallelGroup, Signal::Fire),
                (StepKind::AnimateStrike, Signal::Fire),
                (StepKind::AnimateRecovery, Signal::Progress(1.0)),
                (StepKind::SpawnEffect, Signal::Fire),
            ]
        );
        assert!(interpreter.context().results().get(StepIndex(0)).is_some());
    }

    #[test]
    fn cancel_runs_cleanup_on_next_tick() {
        let registry = StepRegistry::builtin();
        let recipe = Recipe::new(
            "locked",
            vec![
                registry.entry(StepKind::LockMovement, 0.0, 1.0),
                registry.entry(StepKind::AnimateWindup, 0.0, 0.8),
            ],
        );
        let mut interpreter = activate(recipe);
        let mut host = RecordingHost::default();
        interpreter.tick(0.3, &mut host);
        assert!(host.locked);

        interpreter.cancel();
        assert!(interpreter.is_active());
        let report = interpreter.tick(0.1, &mut host);

        assert!(report.cleanup);
        assert!(report.dispatches.is_empty());
        assert_eq!(report.phase, CastPhase::Finished(CastOutcome::Cancelled));
        assert!(!host.locked);
        assert!(!host.casting);
        assert_eq!(
            &host.calls[host.calls.len() - 3..],
            &[
                HostCall::SetLocked(false),
                HostCall::ResetAnimation,
                HostCall::ClearCasting
            ]
        );
        assert!(interpreter.tick(0.1, &mut host).is_empty());
    }

    #[test]
    fn disabled_owner_ends_the_cast() {
        let registry = StepRegistry::builtin();
        let recipe = Recipe::new(
            "locked",
            vec![registry.entry(StepKind::LockMovement, 0.0, 1.0)],
        );
        let mut interpreter = activate(recipe);
        let mut host = RecordingHost::default();
        interpreter.tick(0.2, &mut host);

        host.active = false;
        let report = interpreter.tick(0.1, &mut host);
        assert_eq!(report.phase, CastPhase::Finished(CastOutcome::OwnerDisabled));
        assert!(!host.locked);
    }

    #[test]
    fn deferred_damage_waits_for_source_lifetime() {
        let registry = StepRegistry::builtin();
        let recipe = Recipe::new(
            "ember",
            vec![
                registry
                    .instant(StepKind::SpawnEffect, 0.5)
                    .with_param(keys::BASE_DURATION, 3.0),
                registry
                    .instant(StepKind::DamageCircle, 0.5)
                    .with_param(keys::SOURCE_STEP_INDEX, 0)
                    .with_param(keys::FIRE_AT_SOURCE_FRACTION, 0.5),
            ],
        );
        let mut interpreter = activate(recipe);
        let mut host =
            RecordingHost::default().with_dummy(TrainingDummy::new(1, Vec2::ZERO, 0.5));
        let reports = run(&mut interpreter, &mut host, 0.1);

        // Spawned at 0.5 s with a 3 s lifetime: due at 2.0 s, after the 1 s pass.
        let fired_at = reports
            .iter()
            .position(|report| report.for_step(StepIndex(1)).any(|d| d.signal == Signal::Fire))
            .unwrap();
        assert!(((fired_at + 1) as f32 * 0.1 - 2.0).abs() < 0.11);
        assert_eq!(signals(&reports, 1), vec![Signal::Deferred, Signal::Fire]);
        assert_eq!(host.dummy(1).unwrap().hits.len(), 1);
    }

    #[test]
    fn deferred_damage_on_missing_source_is_abandoned() {
        let registry = StepRegistry::builtin();
        let recipe = Recipe::new(
            "dangling",
            vec![
                registry.instant(StepKind::AnimateStrike, 0.2),
                registry
                    .instant(StepKind::DamageCircle, 0.5)
                    .with_param(keys::SOURCE_STEP_INDEX, 0)
                    .with_param(keys::FIRE_AT_SOURCE_FRACTION, 0.5),
            ],
        );
        let mut interpreter = activate(recipe);
        let mut host =
            RecordingHost::default().with_dummy(TrainingDummy::new(1, Vec2::ZERO, 0.5));
        let reports = run(&mut interpreter, &mut host, 0.1);

        assert_eq!(signals(&reports, 1), vec![Signal::Deferred, Signal::Abandoned]);
        assert!(host.dummy(1).unwrap().hits.is_empty());
        assert_eq!(interpreter.phase(), CastPhase::Finished(CastOutcome::Completed));
    }

    #[test]
    fn deferred_timeout_bounds_the_cast() {
        let registry = StepRegistry::builtin();
        let recipe = Recipe::new(
            "slow",
            vec![
                registry
                    .instant(StepKind::SpawnEffect, 0.0)
                    .with_param(keys::BASE_DURATION, 100.0),
                registry
                    .instant(StepKind::DamageCircle, 0.0)
                    .with_param(keys::SOURCE_STEP_INDEX, 0)
                    .with_param(keys::FIRE_AT_SOURCE_FRACTION, 1.0),
            ],
        );
        let config = EngineConfig::new().with_deferred_timeout(2.0);
        let mut interpreter =
            TimelineInterpreter::activate(Arc::new(recipe), context(1.0), config).unwrap();
        let mut host = RecordingHost::default();
        let reports = run(&mut interpreter, &mut host, 0.25);

        assert_eq!(signals(&reports, 1).last(), Some(&Signal::Abandoned));
        assert!(interpreter.elapsed() < 3.5);
    }

    #[test]
    fn channel_replays_instant_step_per_iteration() {
        let registry = StepRegistry::builtin();
        let recipe = Recipe::new(
            "channel",
            vec![
                registry.instant(StepKind::AnimateStrike, 0.1),
                registry.instant(StepKind::SpawnEffect, 0.0),
            ],
        )
        .with_channel([1], 0.5, 2.0);
        let mut interpreter = activate(recipe);
        let mut host = RecordingHost::default();
        let reports = run(&mut interpreter, &mut host, 0.1);

        assert_eq!(signals(&reports, 1).len(), 4);
        assert_eq!(interpreter.channel_iterations(), 4);
        assert_eq!(host.count(|call| matches!(call, HostCall::Spawn(_))), 4);
    }

    #[test]
    fn channel_duration_step_cycles_each_iteration() {
        let registry = StepRegistry::builtin();
        let recipe = Recipe::new(
            "spin",
            vec![
                registry.instant(StepKind::AnimateStrike, 0.0),
                registry.entry(StepKind::AnimateRecovery, 0.0, 1.0),
            ],
        )
        .with_channel([1], 0.5, 1.0);
        let mut interpreter = activate(recipe);
        let mut host = RecordingHost::default();
        let reports = run(&mut interpreter, &mut host, 0.1);

        let trace = signals(&reports, 1);
        assert_eq!(trace.iter().filter(|s| **s == Signal::Begin).count(), 2);
        assert_eq!(trace.iter().filter(|s| **s == Signal::End).count(), 2);
    }

    #[test]
    fn channel_cancelled_before_first_boundary_fires_nothing() {
        let registry = StepRegistry::builtin();
        let recipe = Recipe::new(
            "channel",
            vec![
                registry.instant(StepKind::AnimateStrike, 0.0),
                registry.instant(StepKind::SpawnEffect, 0.0),
            ],
        )
        .with_channel([1], 0.5, 2.0);
        let mut interpreter = activate(recipe);
        let mut host = RecordingHost::default();
        interpreter.tick(1.0, &mut host);
        assert_eq!(interpreter.phase(), CastPhase::Channel);

        interpreter.tick(0.2, &mut host);
        interpreter.cancel();
        let report = interpreter.tick(0.2, &mut host);

        assert_eq!(report.phase, CastPhase::Finished(CastOutcome::Cancelled));
        assert_eq!(host.count(|call| matches!(call, HostCall::Spawn(_))), 0);
    }

    fn channeled_ember() -> Recipe {
        let registry = StepRegistry::builtin();
        Recipe::new(
            "ember_channel",
            vec![
                registry.instant(StepKind::AnimateStrike, 0.0),
                registry
                    .instant(StepKind::SpawnEffect, 0.0)
                    .with_param(keys::BASE_DURATION, 1.0),
                registry
                    .instant(StepKind::DamageCircle, 0.0)
                    .with_param(keys::SOURCE_STEP_INDEX, 1)
                    .with_param(keys::FIRE_AT_SOURCE_FRACTION, 0.8),
            ],
        )
        .with_channel([1, 2], 0.5, 2.0)
    }

    #[test]
    fn channel_deferred_damage_fires_once_per_iteration() {
        let mut interpreter = activate(channeled_ember());
        let mut host =
            RecordingHost::default().with_dummy(TrainingDummy::new(1, Vec2::ZERO, 0.5));

        let mut fired_at = Vec::new();
        while interpreter.is_active() {
            let report = interpreter.tick(0.1, &mut host);
            let fires = report
                .for_step(StepIndex(2))
                .filter(|d| d.signal == Signal::Fire)
                .count();
            fired_at.extend(std::iter::repeat_n(interpreter.elapsed(), fires));
        }

        // Spawns at 1.5, 2.0, 2.5 and 3.0 s, each due 0.8 s later.
        let expected = [2.3, 2.8, 3.3, 3.8];
        assert_eq!(fired_at.len(), expected.len(), "fired at {fired_at:?}");
        for (actual, expected) in fired_at.iter().zip(expected) {
            assert!((actual - expected).abs() < 0.05, "fired at {fired_at:?}");
        }
        assert_eq!(host.dummy(1).unwrap().hits.len(), 4);
    }

    #[test]
    fn cancel_keeps_channel_damage_that_already_fired() {
        let mut interpreter = activate(channeled_ember());
        let mut host =
            RecordingHost::default().with_dummy(TrainingDummy::new(1, Vec2::ZERO, 0.5));

        while interpreter.elapsed() < 2.35 {
            interpreter.tick(0.1, &mut host);
        }
        interpreter.cancel();
        let report = interpreter.tick(0.1, &mut host);

        assert_eq!(report.phase, CastPhase::Finished(CastOutcome::Cancelled));
        // Only the trigger due at 2.3 s had fired; the one due at 2.8 s is dropped.
        assert_eq!(host.dummy(1).unwrap().hits.len(), 1);
        let dropped: Vec<_> = report.for_step(StepIndex(2)).map(|d| d.signal).collect();
        assert_eq!(dropped, vec![Signal::Abandoned]);
    }

    #[test]
    fn one_snapshot_per_firing_shared_by_every_target() {
        let registry = StepRegistry::builtin();
        let recipe = Recipe::new(
            "sweep",
            vec![
                registry.instant(StepKind::DamageCircle, 0.2),
                registry.instant(StepKind::DamageCircle, 0.6),
            ],
        );
        let stats = StatSnapshot::neutral()
            .with(StatKind::BaseDamage, 10.0)
            .with(StatKind::CritChance, 0.5)
            .with(StatKind::CritMultiplier, 2.0);
        let context = ExecutionContext::from_snapshot(stats, Vec2::X, &EngineConfig::new());

        for seed in 0..16 {
            let mut interpreter = TimelineInterpreter::activate(
                Arc::new(recipe.clone()),
                context.clone(),
                EngineConfig::new(),
            )
            .unwrap();
            let mut host = RecordingHost::default()
                .with_seed(seed)
                .with_dummy(TrainingDummy::new(1, Vec2::new(0.2, 0.0), 0.3))
                .with_dummy(TrainingDummy::new(2, Vec2::new(-0.2, 0.1), 0.3));
            run(&mut interpreter, &mut host, 0.1);

            assert_eq!(
                host.count(|call| matches!(call, HostCall::CreateSnapshot { .. })),
                2
            );
            let first = &host.dummy(1).unwrap().hits;
            let second = &host.dummy(2).unwrap().hits;
            assert_eq!(first.len(), 2);
            assert_eq!(first, second, "seed {seed}");
        }
    }

    #[test]
    fn missing_collaborators_do_not_stop_the_cast() {
        let registry = StepRegistry::builtin();
        let recipe = Recipe::new(
            "bare",
            vec![
                registry.entry(StepKind::LockMovement, 0.0, 1.0),
                registry.instant(StepKind::DamageCircle, 0.5),
            ],
        );
        let mut interpreter = activate(recipe);
        let mut host = crate::env::CastEnv::empty();
        let mut reports = Vec::new();
        while interpreter.is_active() {
            reports.push(interpreter.tick(0.1, &mut host));
        }
        assert_eq!(signals(&reports, 1), vec![Signal::Fire]);
        assert_eq!(interpreter.phase(), CastPhase::Finished(CastOutcome::Completed));
    }

    fn arbitrary_entry() -> impl Strategy<Value = StepEntry> {
        let kinds = prop::sample::select(vec![
            StepKind::LockMovement,
            StepKind::UnlockMovement,
            StepKind::AnimateWindup,
            StepKind::AnimateStrike,
            StepKind::AnimateRecovery,
            StepKind::Wait,
            StepKind::SpawnEffect,
            StepKind::DamageCircle,
        ]);
        (kinds, -0.2f32..1.2, -0.2f32..1.2).prop_map(|(kind, start, end)| {
            StepRegistry::builtin().entry(kind, start, end)
        })
    }

    proptest! {
        #[test]
        fn instantaneous_steps_fire_at_most_once(
            entries in prop::collection::vec(arbitrary_entry(), 1..10),
            dt in 0.01f32..0.4,
        ) {
            let recipe = Recipe::new("generated", entries);
            let instants: Vec<usize> = recipe
                .steps
                .iter()
                .enumerate()
                .filter(|(_, entry)| !entry.is_duration_step())
                .map(|(index, _)| index)
                .collect();
            let mut interpreter = activate(recipe);
            let mut host = RecordingHost::default();
            let reports = run(&mut interpreter, &mut host, dt);

            for index in instants {
                let fires = signals(&reports, index)
                    .into_iter()
                    .filter(|signal| *signal == Signal::Fire)
                    .count();
                prop_assert!(fires <= 1);
            }
            prop_assert!(!host.locked);
        }

        #[test]
        fn duration_phase_is_monotonic_and_bounded(
            entries in prop::collection::vec(arbitrary_entry(), 1..10),
            dt in 0.01f32..0.4,
        ) {
            let recipe = Recipe::new("generated", entries);
            let len = recipe.len();
            let mut interpreter = activate(recipe);
            let mut host = RecordingHost::default();
            let reports = run(&mut interpreter, &mut host, dt);

            for index in 0..len {
                let trace = signals(&reports, index);
                let phases: Vec<f32> = trace
                    .iter()
                    .filter_map(|signal| match signal {
                        Signal::Progress(phase) => Some(*phase),
                        _ => None,
                    })
                    .collect();
                prop_assert!(phases.iter().all(|phase| (0.0..=1.0).contains(phase)));
                prop_assert!(phases.windows(2).all(|pair| pair[0] <= pair[1]));

                let begins = trace.iter().filter(|s| **s == Signal::Begin).count();
                let ends = trace.iter().filter(|s| **s == Signal::End).count();
                prop_assert_eq!(begins, ends);
            }
        }
    }
}
