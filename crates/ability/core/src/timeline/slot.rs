use bitflags::bitflags;

use crate::step::ResolvedStep;

bitflags! {
    /// Per-step progress within one pass.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct SlotFlags: u8 {
        /// Duration step has fired `begin`.
        const STARTED  = 1 << 0;
        /// Instantaneous step or group has fired (or been deferred).
        const EXECUTED = 1 << 1;
        /// Duration step has fired `end`.
        const ENDED    = 1 << 2;
    }
}

/// A main-pass step and its progress flags.
#[derive(Clone, Debug)]
pub(crate) struct Slot {
    pub step: ResolvedStep,
    pub flags: SlotFlags,
}

impl Slot {
    pub fn new(step: ResolvedStep) -> Self {
        Self {
            step,
            flags: SlotFlags::empty(),
        }
    }

    /// Whether the step still owes a dispatch.
    pub fn is_pending(&self) -> bool {
        if self.step.is_duration_step() {
            !self.flags.contains(SlotFlags::ENDED)
        } else {
            !self.flags.contains(SlotFlags::EXECUTED)
        }
    }
}
