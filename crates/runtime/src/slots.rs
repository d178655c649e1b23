//! Ability slots of one caster.

use std::sync::Arc;

use ability_core::{
    CastHost, EngineConfig, ExecutionContext, Recipe, TickReport, TimelineInterpreter,
};

use crate::error::{Result, RuntimeError};

/// Tick report of one slot.
#[derive(Clone, Debug, PartialEq)]
pub struct SlotReport {
    pub slot: usize,
    pub recipe: String,
    pub report: TickReport,
}

/// Fixed set of ability slots, each running at most one cast.
#[derive(Clone, Debug)]
pub struct AbilitySlots {
    config: EngineConfig,
    slots: Vec<Option<TimelineInterpreter>>,
}

impl AbilitySlots {
    pub fn new(count: usize, config: EngineConfig) -> Self {
        Self {
            config,
            slots: vec![None; count],
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn is_casting(&self, slot: usize) -> bool {
        self.slots.get(slot).is_some_and(Option::is_some)
    }

    pub fn active_count(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub fn interpreter(&self, slot: usize) -> Option<&TimelineInterpreter> {
        self.slots.get(slot)?.as_ref()
    }

    /// Starts `recipe` in `slot`.
    ///
    /// # Errors
    ///
    /// Rejects slots outside the caster, busy slots and recipes that fail
    /// activation. A rejected cast leaves the slot untouched.
    pub fn cast(
        &mut self,
        slot: usize,
        recipe: Arc<Recipe>,
        context: ExecutionContext,
    ) -> Result<()> {
        let len = self.slots.len();
        let entry = self
            .slots
            .get_mut(slot)
            .ok_or(RuntimeError::SlotOutOfRange { slot, len })?;

        if let Some(running) = entry {
            let error = RuntimeError::SlotBusy {
                slot,
                recipe: running.recipe().name.clone(),
            };
            tracing::debug!(%error, requested = %recipe.name, "cast rejected");
            return Err(error);
        }

        let interpreter = TimelineInterpreter::activate(recipe, context, self.config.clone())?;
        tracing::info!(slot, recipe = %interpreter.recipe().name, "cast started");
        *entry = Some(interpreter);
        Ok(())
    }

    /// Advances every running cast. Slots whose cast finished are freed.
    pub fn tick<H: CastHost + ?Sized>(&mut self, delta: f32, host: &mut H) -> Vec<SlotReport> {
        let mut reports = Vec::new();
        for (slot, entry) in self.slots.iter_mut().enumerate() {
            let Some(interpreter) = entry else {
                continue;
            };
            let report = interpreter.tick(delta, host);
            let recipe = interpreter.recipe().name.clone();
            if let Some(outcome) = report.phase.outcome() {
                tracing::info!(slot, %recipe, ?outcome, "cast finished");
                *entry = None;
            }
            reports.push(SlotReport {
                slot,
                recipe,
                report,
            });
        }
        reports
    }

    /// Requests cancellation of the cast in `slot`. Cleanup runs on the next
    /// tick. Returns `false` when the slot is idle.
    pub fn cancel(&mut self, slot: usize) -> Result<bool> {
        let len = self.slots.len();
        let entry = self
            .slots
            .get_mut(slot)
            .ok_or(RuntimeError::SlotOutOfRange { slot, len })?;
        match entry {
            Some(interpreter) => {
                interpreter.cancel();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// The caster was disabled or destroyed: clean up every running cast now.
    pub fn disable<H: CastHost + ?Sized>(&mut self, host: &mut H) -> Vec<SlotReport> {
        let mut reports = Vec::new();
        for (slot, entry) in self.slots.iter_mut().enumerate() {
            if let Some(mut interpreter) = entry.take() {
                let report = interpreter.disable(host);
                reports.push(SlotReport {
                    slot,
                    recipe: interpreter.recipe().name.clone(),
                    report,
                });
            }
        }
        if !reports.is_empty() {
            tracing::info!(casts = reports.len(), "owner disabled, casts cleaned up");
        }
        reports
    }
}
