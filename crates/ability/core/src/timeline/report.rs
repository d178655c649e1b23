//! Per-tick dispatch trace.

use std::fmt;

use crate::step::{StepIndex, StepKind};

/// What the interpreter did with a step.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Signal {
    /// Duration window opened.
    Begin,
    /// Duration window advanced to the given phase.
    Progress(f32),
    /// Duration window closed.
    End,
    /// Instantaneous step or group fired.
    Fire,
    /// Instantaneous step queued until its source reaches the threshold.
    Deferred,
    /// Deferred step dropped without firing.
    Abandoned,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Begin => f.write_str("begin"),
            Signal::Progress(phase) => write!(f, "progress({phase:.3})"),
            Signal::End => f.write_str("end"),
            Signal::Fire => f.write_str("fire"),
            Signal::Deferred => f.write_str("deferred"),
            Signal::Abandoned => f.write_str("abandoned"),
        }
    }
}

/// One signal sent to one step.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Dispatch {
    pub index: StepIndex,
    pub kind: StepKind,
    pub signal: Signal,
}

impl fmt::Display for Dispatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.index, self.kind, self.signal)
    }
}

/// How a finished cast ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CastOutcome {
    Completed,
    Cancelled,
    OwnerDisabled,
}

/// Lifecycle of a cast.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CastPhase {
    /// Normalized clock advancing from 0 to 1.
    MainPass,
    /// Replaying the channel steps.
    Channel,
    /// Passes are over; only deferred triggers remain.
    Draining,
    Finished(CastOutcome),
}

impl CastPhase {
    pub fn is_finished(self) -> bool {
        matches!(self, CastPhase::Finished(_))
    }

    pub fn outcome(self) -> Option<CastOutcome> {
        match self {
            CastPhase::Finished(outcome) => Some(outcome),
            _ => None,
        }
    }
}

/// Everything that happened during one tick, in execution order.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TickReport {
    pub dispatches: Vec<Dispatch>,
    /// Cleanup ran at the end of this tick.
    pub cleanup: bool,
    /// Normalized main-pass clock after the tick.
    pub clock: f32,
    pub phase: CastPhase,
}

impl TickReport {
    pub(crate) fn new(clock: f32, phase: CastPhase) -> Self {
        Self {
            dispatches: Vec::new(),
            cleanup: false,
            clock,
            phase,
        }
    }

    pub(crate) fn push(&mut self, index: StepIndex, kind: StepKind, signal: Signal) {
        tracing::trace!(step = %index, %kind, %signal, "dispatch");
        self.dispatches.push(Dispatch {
            index,
            kind,
            signal,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.dispatches.is_empty() && !self.cleanup
    }

    /// Dispatches for one step index.
    pub fn for_step(&self, index: StepIndex) -> impl Iterator<Item = &Dispatch> {
        self.dispatches
            .iter()
            .filter(move |dispatch| dispatch.index == index)
    }
}
