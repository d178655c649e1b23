//! Collaborator access errors.

use crate::error::{AbilityError, ErrorSeverity};

/// A collaborator required by a step is not configured on the cast host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EnvError {
    #[error("OwnerOracle not available")]
    OwnerNotAvailable,

    #[error("MovementLock not available")]
    MovementNotAvailable,

    #[error("AnimationFeedback not available")]
    AnimationNotAvailable,

    #[error("EffectSpawner not available")]
    EffectsNotAvailable,

    #[error("DamageableQuery not available")]
    DamageQueryNotAvailable,

    #[error("DamageSnapshotFactory not available")]
    DamageFactoryNotAvailable,
}

impl AbilityError for EnvError {
    fn severity(&self) -> ErrorSeverity {
        // A missing collaborator skips the step; the cast carries on.
        ErrorSeverity::Recoverable
    }

    fn error_code(&self) -> &'static str {
        use EnvError::*;
        match self {
            OwnerNotAvailable => "ENV_OWNER_NOT_AVAILABLE",
            MovementNotAvailable => "ENV_MOVEMENT_NOT_AVAILABLE",
            AnimationNotAvailable => "ENV_ANIMATION_NOT_AVAILABLE",
            EffectsNotAvailable => "ENV_EFFECTS_NOT_AVAILABLE",
            DamageQueryNotAvailable => "ENV_DAMAGE_QUERY_NOT_AVAILABLE",
            DamageFactoryNotAvailable => "ENV_DAMAGE_FACTORY_NOT_AVAILABLE",
        }
    }
}
