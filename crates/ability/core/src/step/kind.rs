//! Step kind enumeration - the closed vocabulary of timeline operations.

/// Operation kinds a recipe can place on its timeline.
///
/// The variant name is the stable serialization id used in recipe data
/// (`"LockMovement"`, `"ParallelGroup"`, ...).
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StepKind {
    // ========================================================================
    // Locomotion
    // ========================================================================
    /// Locks movement when the window opens and releases it when it closes.
    LockMovement,

    /// Releases the movement lock at an instant.
    UnlockMovement,

    // ========================================================================
    // Animation
    // ========================================================================
    /// Wind-up pose interpolated over the window.
    AnimateWindup,

    /// Snaps the animation to the strike pose.
    AnimateStrike,

    /// Recovery pose interpolated over the window.
    AnimateRecovery,

    // ========================================================================
    // Timing
    // ========================================================================
    /// Occupies a window without any side effect.
    Wait,

    // ========================================================================
    // Effects & Damage
    // ========================================================================
    /// Spawns an area effect and caches where, how big and how long it lives.
    SpawnEffect,

    /// Damages every target inside a circle.
    DamageCircle,

    /// Damages every target inside an oriented rectangle.
    DamageRectangle,

    // ========================================================================
    // Composition
    // ========================================================================
    /// Fires all nested entries at the same instant.
    ParallelGroup,
}

impl StepKind {
    /// Stable id used as the serialization key.
    pub fn id(self) -> &'static str {
        match self {
            StepKind::LockMovement => "LockMovement",
            StepKind::UnlockMovement => "UnlockMovement",
            StepKind::AnimateWindup => "AnimateWindup",
            StepKind::AnimateStrike => "AnimateStrike",
            StepKind::AnimateRecovery => "AnimateRecovery",
            StepKind::Wait => "Wait",
            StepKind::SpawnEffect => "SpawnEffect",
            StepKind::DamageCircle => "DamageCircle",
            StepKind::DamageRectangle => "DamageRectangle",
            StepKind::ParallelGroup => "ParallelGroup",
        }
    }

    /// Looks a kind up by its stable id.
    pub fn from_id(id: &str) -> Option<Self> {
        id.parse().ok()
    }

    /// Whether the kind spans an interval instead of firing at an instant.
    pub const fn is_duration_step(self) -> bool {
        matches!(
            self,
            StepKind::LockMovement
                | StepKind::AnimateWindup
                | StepKind::AnimateRecovery
                | StepKind::Wait
        )
    }

    pub const fn is_parallel_group(self) -> bool {
        matches!(self, StepKind::ParallelGroup)
    }

    /// Kinds whose firing writes an entry into the step result cache.
    pub const fn produces_result(self) -> bool {
        matches!(
            self,
            StepKind::SpawnEffect | StepKind::DamageCircle | StepKind::DamageRectangle
        )
    }

    pub const fn is_damage(self) -> bool {
        matches!(self, StepKind::DamageCircle | StepKind::DamageRectangle)
    }
}
