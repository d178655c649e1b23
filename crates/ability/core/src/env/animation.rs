//! Animation feedback driven by wind-up, strike and recovery steps.

/// Receives animation phase updates for the casting entity.
///
/// Phases passed to `set_windup_phase` and `set_recovery_phase` are in
/// `[0, 1]` and never decrease within one step window.
pub trait AnimationFeedback {
    fn begin_windup(&mut self);

    fn set_windup_phase(&mut self, phase: f32);

    fn snap_to_strike(&mut self);

    fn set_recovery_phase(&mut self, phase: f32);

    /// Returns the animation to its neutral pose.
    fn reset(&mut self);
}
