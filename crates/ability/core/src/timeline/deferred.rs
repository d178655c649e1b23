//! Deferred triggers waiting on another step's runtime result.

use crate::context::{StepResult, StepResults};
use crate::step::{Dependency, ResolvedStep, StepIndex};

/// An instantaneous step queued until its source result is old enough.
#[derive(Clone, Debug)]
pub(crate) struct PendingTrigger {
    pub step: ResolvedStep,
    pub dependency: Dependency,
    /// Queued by a channel iteration; its result refreshes instead of recording.
    pub from_channel: bool,
    /// Source result as it was when the trigger was queued. Later refreshes
    /// of the source belong to later triggers.
    pub source_result: Option<StepResult>,
}

impl PendingTrigger {
    /// The pinned source result, or the cached one when the source had not
    /// produced anything at queue time.
    pub fn source<'a>(&'a self, results: &'a StepResults) -> Option<&'a StepResult> {
        self.source_result
            .as_ref()
            .or_else(|| results.get(self.dependency.source))
    }

    fn is_due(&self, results: &StepResults, now: f32, tolerance: f32) -> bool {
        self.source(results)
            .is_some_and(|result| now + tolerance >= result.due_at(self.dependency.fraction))
    }
}

/// Deferred triggers in the order they were queued.
#[derive(Clone, Debug, Default)]
pub(crate) struct DeferredQueue {
    pending: Vec<PendingTrigger>,
}

impl DeferredQueue {
    pub fn push(&mut self, trigger: PendingTrigger) {
        self.pending.push(trigger);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Removes and returns every trigger whose threshold has been reached.
    pub fn take_due(
        &mut self,
        results: &StepResults,
        now: f32,
        tolerance: f32,
    ) -> Vec<PendingTrigger> {
        self.take_where(|trigger, _| trigger.is_due(results, now, tolerance))
    }

    /// Removes triggers whose source has no result and nothing left in the
    /// queue could still produce one.
    pub fn take_unreachable(&mut self, results: &StepResults) -> Vec<PendingTrigger> {
        self.take_where(|trigger, producers| {
            trigger.source(results).is_none()
                && !producers.contains(&trigger.dependency.source)
        })
    }

    pub fn take_all(&mut self) -> Vec<PendingTrigger> {
        std::mem::take(&mut self.pending)
    }

    fn take_where(
        &mut self,
        predicate: impl Fn(&PendingTrigger, &[StepIndex]) -> bool,
    ) -> Vec<PendingTrigger> {
        let producers: Vec<StepIndex> = self
            .pending
            .iter()
            .filter(|trigger| trigger.step.kind.produces_result())
            .map(|trigger| trigger.step.index)
            .collect();
        let (taken, kept) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|trigger| predicate(trigger, &producers));
        self.pending = kept;
        taken
    }
}
